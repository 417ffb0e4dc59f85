use super::DBClient;
use crate::{dtos::ReminderInputDto, models::PlantReminder};
use chrono::NaiveDate;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

const REMINDER_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.tracked_plant_id, tp.name AS plant_name, r.type,
           r.due_date, r.notes, r.completed, r.created_at, r.updated_at
    FROM plant_reminders r
    INNER JOIN tracked_plants tp ON tp.id = r.tracked_plant_id
"#;

/// Outcome of a reminder create or update.
#[derive(Debug)]
pub enum ReminderWrite {
    Saved(PlantReminder),
    /// The reminder does not exist for this user (update only).
    ReminderNotFound,
    /// The referenced tracked plant does not exist for this user.
    PlantNotOwned,
}

/// Lock the caller's tracked plant for the rest of the transaction.
/// `false` when it does not exist or belongs to someone else.
async fn lock_owned_plant(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    plant_id: i64,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM tracked_plants WHERE id = $1 AND user_id = $2 FOR SHARE",
    )
    .bind(plant_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(found.is_some())
}

pub trait ReminderExt {
    async fn get_reminders(&self, user_id: Uuid) -> Result<Vec<PlantReminder>, sqlx::Error>;

    async fn get_reminder(
        &self,
        user_id: Uuid,
        reminder_id: i64,
    ) -> Result<Option<PlantReminder>, sqlx::Error>;

    /// Incomplete reminders due within `from..=to`, soonest first.
    async fn get_upcoming_reminders(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PlantReminder>, sqlx::Error>;

    async fn create_reminder(
        &self,
        user_id: Uuid,
        input: &ReminderInputDto,
    ) -> Result<ReminderWrite, sqlx::Error>;

    async fn update_reminder(
        &self,
        user_id: Uuid,
        reminder_id: i64,
        input: &ReminderInputDto,
    ) -> Result<ReminderWrite, sqlx::Error>;

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: i64) -> Result<(), sqlx::Error>;

    async fn get_pending_reminder_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;
}

impl ReminderExt for DBClient {
    async fn get_reminders(&self, user_id: Uuid) -> Result<Vec<PlantReminder>, sqlx::Error> {
        let reminders = sqlx::query_as::<_, PlantReminder>(&format!(
            "{} WHERE r.user_id = $1 ORDER BY r.due_date ASC, r.id ASC",
            REMINDER_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }

    async fn get_reminder(
        &self,
        user_id: Uuid,
        reminder_id: i64,
    ) -> Result<Option<PlantReminder>, sqlx::Error> {
        let reminder = sqlx::query_as::<_, PlantReminder>(&format!(
            "{} WHERE r.id = $1 AND r.user_id = $2",
            REMINDER_SELECT
        ))
        .bind(reminder_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reminder)
    }

    async fn get_upcoming_reminders(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PlantReminder>, sqlx::Error> {
        let reminders = sqlx::query_as::<_, PlantReminder>(&format!(
            r#"{}
            WHERE r.user_id = $1
              AND r.completed = FALSE
              AND r.due_date BETWEEN $2 AND $3
            ORDER BY r.due_date ASC, r.id ASC
            "#,
            REMINDER_SELECT
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }

    async fn create_reminder(
        &self,
        user_id: Uuid,
        input: &ReminderInputDto,
    ) -> Result<ReminderWrite, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if !lock_owned_plant(&mut tx, user_id, input.tracked_plant).await? {
            tx.rollback().await?;
            return Ok(ReminderWrite::PlantNotOwned);
        }

        let reminder = sqlx::query_as::<_, PlantReminder>(
            r#"
            WITH r AS (
                INSERT INTO plant_reminders (user_id, tracked_plant_id, type, due_date, notes, completed)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT r.id, r.user_id, r.tracked_plant_id, tp.name AS plant_name, r.type,
                   r.due_date, r.notes, r.completed, r.created_at, r.updated_at
            FROM r
            INNER JOIN tracked_plants tp ON tp.id = r.tracked_plant_id
            "#,
        )
        .bind(user_id)
        .bind(input.tracked_plant)
        .bind(input.reminder_type)
        .bind(input.due_date)
        .bind(&input.notes)
        .bind(input.completed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ReminderWrite::Saved(reminder))
    }

    async fn update_reminder(
        &self,
        user_id: Uuid,
        reminder_id: i64,
        input: &ReminderInputDto,
    ) -> Result<ReminderWrite, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM plant_reminders WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(reminder_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_none() {
            tx.rollback().await?;
            return Ok(ReminderWrite::ReminderNotFound);
        }

        if !lock_owned_plant(&mut tx, user_id, input.tracked_plant).await? {
            tx.rollback().await?;
            return Ok(ReminderWrite::PlantNotOwned);
        }

        let reminder = sqlx::query_as::<_, PlantReminder>(
            r#"
            WITH r AS (
                UPDATE plant_reminders SET
                    tracked_plant_id = $3,
                    type = $4,
                    due_date = $5,
                    notes = $6,
                    completed = $7,
                    updated_at = NOW()
                WHERE id = $1 AND user_id = $2
                RETURNING *
            )
            SELECT r.id, r.user_id, r.tracked_plant_id, tp.name AS plant_name, r.type,
                   r.due_date, r.notes, r.completed, r.created_at, r.updated_at
            FROM r
            INNER JOIN tracked_plants tp ON tp.id = r.tracked_plant_id
            "#,
        )
        .bind(reminder_id)
        .bind(user_id)
        .bind(input.tracked_plant)
        .bind(input.reminder_type)
        .bind(input.due_date)
        .bind(&input.notes)
        .bind(input.completed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ReminderWrite::Saved(reminder))
    }

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM plant_reminders WHERE id = $1 AND user_id = $2")
            .bind(reminder_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_pending_reminder_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM plant_reminders WHERE user_id = $1 AND completed = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::ReminderType,
        test_support::{create_tracked_plant, create_user, date, start_database},
    };

    fn reminder_for(tracked_plant: i64) -> ReminderInputDto {
        ReminderInputDto {
            tracked_plant,
            reminder_type: ReminderType::Watering,
            due_date: date(2025, 6, 1),
            notes: None,
            completed: false,
        }
    }

    async fn reminder_rows(db_client: &DBClient) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM plant_reminders")
            .fetch_one(&db_client.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn reminder_on_someone_elses_plant_writes_nothing() {
        let db = start_database().await;
        let alice = create_user(&db.db_client, "alice", "alice-pass").await;
        let bob = create_user(&db.db_client, "bob", "bob-pass").await;
        let bobs_basil = create_tracked_plant(&db.db_client, &bob, "Basil").await;

        let outcome = db
            .db_client
            .create_reminder(alice.id, &reminder_for(bobs_basil.id))
            .await
            .unwrap();

        assert!(matches!(outcome, ReminderWrite::PlantNotOwned));
        assert_eq!(reminder_rows(&db.db_client).await, 0);

        let outcome = db
            .db_client
            .create_reminder(alice.id, &reminder_for(bobs_basil.id + 1000))
            .await
            .unwrap();
        assert!(matches!(outcome, ReminderWrite::PlantNotOwned));
        assert_eq!(reminder_rows(&db.db_client).await, 0);
    }

    #[tokio::test]
    async fn reminder_cannot_be_moved_to_someone_elses_plant() {
        let db = start_database().await;
        let alice = create_user(&db.db_client, "alice", "alice-pass").await;
        let bob = create_user(&db.db_client, "bob", "bob-pass").await;
        let alices_mint = create_tracked_plant(&db.db_client, &alice, "Mint").await;
        let bobs_basil = create_tracked_plant(&db.db_client, &bob, "Basil").await;

        let ReminderWrite::Saved(reminder) = db
            .db_client
            .create_reminder(alice.id, &reminder_for(alices_mint.id))
            .await
            .unwrap()
        else {
            panic!("reminder on own plant should be saved");
        };
        assert_eq!(reminder.plant_name, "Mint");
        assert_eq!(reminder.user_id, alice.id);

        let outcome = db
            .db_client
            .update_reminder(alice.id, reminder.id, &reminder_for(bobs_basil.id))
            .await
            .unwrap();
        assert!(matches!(outcome, ReminderWrite::PlantNotOwned));

        let outcome = db
            .db_client
            .update_reminder(bob.id, reminder.id, &reminder_for(bobs_basil.id))
            .await
            .unwrap();
        assert!(matches!(outcome, ReminderWrite::ReminderNotFound));

        let stored = db
            .db_client
            .get_reminder(alice.id, reminder.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.tracked_plant_id, alices_mint.id);
        assert!(db.db_client.get_reminder(bob.id, reminder.id).await.unwrap().is_none());
    }
}
