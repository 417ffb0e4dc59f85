use super::DBClient;
use crate::models::UserProfile;
use uuid::Uuid;

pub trait ProfileExt {
    /// Return the user's profile, creating a default one on first access.
    ///
    /// Safe under concurrent first reads: the unique constraint on `user_id`
    /// decides the winner and the loser re-reads the winner's row.
    async fn get_or_create_profile(
        &self,
        user_id: Uuid,
        default_full_name: &str,
    ) -> Result<UserProfile, sqlx::Error>;

    /// Persist every column of `profile` for its owner.
    async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile, sqlx::Error>;
}

impl ProfileExt for DBClient {
    async fn get_or_create_profile(
        &self,
        user_id: Uuid,
        default_full_name: &str,
    ) -> Result<UserProfile, sqlx::Error> {
        let inserted = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (user_id, full_name)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(default_full_name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(profile) = inserted {
            tracing::debug!(user_id = %user_id, "created default profile");
            return Ok(profile);
        }

        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(profile)
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile, sqlx::Error> {
        let saved = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles SET
                full_name = $2,
                phone_number = $3,
                address = $4,
                average_temperature = $5,
                average_humidity = $6,
                annual_rainfall = $7,
                climate_zone = $8,
                preferred_plant_types = $9,
                location = $10,
                zip_code = $11,
                soil_type = $12,
                skill_level = $13,
                watering_frequency = $14,
                maintenance_reminders = $15,
                pest_alerts = $16,
                disease_alerts = $17,
                community_notifications = $18,
                gardening_preferences = $19,
                experience_level = $20,
                specialization = $21,
                availability = $22,
                service_area = $23,
                certifications = $24,
                work_experience = $25,
                managed_projects = $26,
                responsibilities = $27,
                property_type = $28,
                garden_size = $29,
                preferred_plants = $30,
                organic_fertilizer = $31,
                plant_tracking = $32,
                admin_level = $33,
                assigned_responsibilities = $34
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.full_name)
        .bind(&profile.phone_number)
        .bind(&profile.address)
        .bind(&profile.average_temperature)
        .bind(&profile.average_humidity)
        .bind(&profile.annual_rainfall)
        .bind(&profile.climate_zone)
        .bind(&profile.preferred_plant_types)
        .bind(&profile.location)
        .bind(&profile.zip_code)
        .bind(&profile.soil_type)
        .bind(&profile.skill_level)
        .bind(&profile.watering_frequency)
        .bind(profile.maintenance_reminders)
        .bind(profile.pest_alerts)
        .bind(profile.disease_alerts)
        .bind(profile.community_notifications)
        .bind(&profile.gardening_preferences)
        .bind(&profile.experience_level)
        .bind(&profile.specialization)
        .bind(&profile.availability)
        .bind(&profile.service_area)
        .bind(&profile.certifications)
        .bind(profile.work_experience)
        .bind(&profile.managed_projects)
        .bind(&profile.responsibilities)
        .bind(&profile.property_type)
        .bind(&profile.garden_size)
        .bind(&profile.preferred_plants)
        .bind(profile.organic_fertilizer)
        .bind(&profile.plant_tracking)
        .bind(&profile.admin_level)
        .bind(&profile.assigned_responsibilities)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}
