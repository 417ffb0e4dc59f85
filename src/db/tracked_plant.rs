use super::DBClient;
use crate::{dtos::TrackedPlantInputDto, models::TrackedPlant};
use uuid::Uuid;

/// Tracked plant operations. Every query is scoped to the owner, so another
/// user's plant is indistinguishable from a missing one.
pub trait TrackedPlantExt {
    async fn get_tracked_plants(&self, user_id: Uuid) -> Result<Vec<TrackedPlant>, sqlx::Error>;

    async fn get_tracked_plant(
        &self,
        user_id: Uuid,
        plant_id: i64,
    ) -> Result<Option<TrackedPlant>, sqlx::Error>;

    async fn create_tracked_plant(
        &self,
        user_id: Uuid,
        input: &TrackedPlantInputDto,
    ) -> Result<TrackedPlant, sqlx::Error>;

    async fn update_tracked_plant(
        &self,
        user_id: Uuid,
        plant_id: i64,
        input: &TrackedPlantInputDto,
    ) -> Result<Option<TrackedPlant>, sqlx::Error>;

    async fn delete_tracked_plant(&self, user_id: Uuid, plant_id: i64) -> Result<(), sqlx::Error>;

    async fn get_tracked_plant_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;
}

impl TrackedPlantExt for DBClient {
    async fn get_tracked_plants(&self, user_id: Uuid) -> Result<Vec<TrackedPlant>, sqlx::Error> {
        let plants = sqlx::query_as::<_, TrackedPlant>(
            "SELECT * FROM tracked_plants WHERE user_id = $1 ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(plants)
    }

    async fn get_tracked_plant(
        &self,
        user_id: Uuid,
        plant_id: i64,
    ) -> Result<Option<TrackedPlant>, sqlx::Error> {
        let plant = sqlx::query_as::<_, TrackedPlant>(
            "SELECT * FROM tracked_plants WHERE id = $1 AND user_id = $2",
        )
        .bind(plant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plant)
    }

    async fn create_tracked_plant(
        &self,
        user_id: Uuid,
        input: &TrackedPlantInputDto,
    ) -> Result<TrackedPlant, sqlx::Error> {
        let plant = sqlx::query_as::<_, TrackedPlant>(
            r#"
            INSERT INTO tracked_plants (
                user_id, name, type, planted_date, last_watered, last_fertilized,
                notes, health_status, growth_stage
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.plant_type)
        .bind(input.planted_date)
        .bind(input.last_watered)
        .bind(input.last_fertilized)
        .bind(&input.notes)
        .bind(input.health_status)
        .bind(input.growth_stage)
        .fetch_one(&self.pool)
        .await?;

        Ok(plant)
    }

    async fn update_tracked_plant(
        &self,
        user_id: Uuid,
        plant_id: i64,
        input: &TrackedPlantInputDto,
    ) -> Result<Option<TrackedPlant>, sqlx::Error> {
        let plant = sqlx::query_as::<_, TrackedPlant>(
            r#"
            UPDATE tracked_plants SET
                name = $3,
                type = $4,
                planted_date = $5,
                last_watered = $6,
                last_fertilized = $7,
                notes = $8,
                health_status = $9,
                growth_stage = $10,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(plant_id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.plant_type)
        .bind(input.planted_date)
        .bind(input.last_watered)
        .bind(input.last_fertilized)
        .bind(&input.notes)
        .bind(input.health_status)
        .bind(input.growth_stage)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plant)
    }

    async fn delete_tracked_plant(&self, user_id: Uuid, plant_id: i64) -> Result<(), sqlx::Error> {
        // reminders go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM tracked_plants WHERE id = $1 AND user_id = $2")
            .bind(plant_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_tracked_plant_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tracked_plants WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
