use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A closed set of values with a fixed wire spelling and a display label.
///
/// Every enum exposed through the catalog option endpoints implements this,
/// so the `value -> label` maps are generated from the enum itself instead of
/// being maintained by hand next to it.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    /// Spelling used on the wire and in the database.
    fn value(&self) -> &'static str;

    /// Human-readable label.
    fn label(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.value() == value)
    }
}

/// Account role used for role-based access control.
///
/// Stored as the PostgreSQL ENUM `user_role`. The "System Admin" label carries
/// a space both on the wire and in the database.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    Gardener,
    Supervisor,
    Homeowner,
    #[serde(rename = "System Admin")]
    #[sqlx(rename = "System Admin")]
    SystemAdmin,
}

impl UserRole {
    pub fn to_str(&self) -> &'static str {
        self.value()
    }
}

impl Choice for UserRole {
    const ALL: &'static [Self] = &[
        UserRole::Gardener,
        UserRole::Supervisor,
        UserRole::Homeowner,
        UserRole::SystemAdmin,
    ];

    fn value(&self) -> &'static str {
        match self {
            UserRole::Gardener => "Gardener",
            UserRole::Supervisor => "Supervisor",
            UserRole::Homeowner => "Homeowner",
            UserRole::SystemAdmin => "System Admin",
        }
    }

    fn label(&self) -> &'static str {
        self.value()
    }
}

/// User model representing the `users` table.
///
/// `password` holds the Argon2 PHC string, never the plain text.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Extended attributes of a user, one row per user.
///
/// Created lazily the first time the owner reads their profile. Text fields
/// are never NULL in the database; an unset value is the empty string.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, Default, PartialEq)]
pub struct UserProfile {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: Uuid,

    // Basic information
    pub full_name: String,
    pub phone_number: String,
    pub address: String,

    // Climate information
    pub average_temperature: String,
    pub average_humidity: String,
    pub annual_rainfall: String,
    pub climate_zone: String,

    // General gardening preferences
    pub preferred_plant_types: Vec<String>,
    pub location: String,
    pub zip_code: String,
    pub soil_type: String,
    pub skill_level: String,
    pub watering_frequency: String,
    pub maintenance_reminders: bool,
    pub pest_alerts: bool,
    pub disease_alerts: bool,
    pub community_notifications: bool,
    pub gardening_preferences: String,

    // Gardener
    pub experience_level: String,
    pub specialization: String,
    pub availability: String,
    pub service_area: String,
    pub certifications: String,

    // Supervisor
    pub work_experience: Option<i32>,
    pub managed_projects: String,
    pub responsibilities: String,

    // Homeowner
    pub property_type: String,
    pub garden_size: String,
    pub preferred_plants: String,
    pub organic_fertilizer: bool,
    pub plant_tracking: String,

    // System Admin
    pub admin_level: String,
    pub assigned_responsibilities: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "plant_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlantCategory {
    Flower,
    Vegetable,
    Fruit,
}

impl Choice for PlantCategory {
    const ALL: &'static [Self] = &[
        PlantCategory::Flower,
        PlantCategory::Vegetable,
        PlantCategory::Fruit,
    ];

    fn value(&self) -> &'static str {
        match self {
            PlantCategory::Flower => "flower",
            PlantCategory::Vegetable => "vegetable",
            PlantCategory::Fruit => "fruit",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PlantCategory::Flower => "Flower Plant",
            PlantCategory::Vegetable => "Vegetable Plant",
            PlantCategory::Fruit => "Fruit Plant",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "soil_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SoilType {
    Sandy,
    Loamy,
    Clay,
    Silt,
}

impl Choice for SoilType {
    const ALL: &'static [Self] = &[SoilType::Sandy, SoilType::Loamy, SoilType::Clay, SoilType::Silt];

    fn value(&self) -> &'static str {
        match self {
            SoilType::Sandy => "sandy",
            SoilType::Loamy => "loamy",
            SoilType::Clay => "clay",
            SoilType::Silt => "silt",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SoilType::Sandy => "Sandy",
            SoilType::Loamy => "Loamy",
            SoilType::Clay => "Clay",
            SoilType::Silt => "Silt",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "sunlight", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Sunlight {
    FullSun,
    PartialSun,
    Shade,
}

impl Choice for Sunlight {
    const ALL: &'static [Self] = &[Sunlight::FullSun, Sunlight::PartialSun, Sunlight::Shade];

    fn value(&self) -> &'static str {
        match self {
            Sunlight::FullSun => "full_sun",
            Sunlight::PartialSun => "partial_sun",
            Sunlight::Shade => "shade",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Sunlight::FullSun => "Full Sun",
            Sunlight::PartialSun => "Partial Sun",
            Sunlight::Shade => "Shade",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "watering_schedule", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WateringSchedule {
    Daily,
    Weekly,
    Custom,
}

impl Choice for WateringSchedule {
    const ALL: &'static [Self] = &[
        WateringSchedule::Daily,
        WateringSchedule::Weekly,
        WateringSchedule::Custom,
    ];

    fn value(&self) -> &'static str {
        match self {
            WateringSchedule::Daily => "daily",
            WateringSchedule::Weekly => "weekly",
            WateringSchedule::Custom => "custom",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            WateringSchedule::Daily => "Daily",
            WateringSchedule::Weekly => "Weekly",
            WateringSchedule::Custom => "Custom",
        }
    }
}

/// Catalog entry of the global plant knowledge base.
///
/// Independent of any user. `image` is a path relative to the media root.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Plant {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub scientific_name: Option<String>,
    pub category: PlantCategory,
    pub soil_type: SoilType,
    pub sunlight: Sunlight,
    pub watering_schedule: WateringSchedule,
    pub fertilization_needs: bool,
    pub growth_stages: Vec<String>,
    pub pests: Vec<String>,
    pub climate_suitability: String,
    pub care_instructions: String,
    pub companion_plants: Vec<String>,
    pub lifespan: String,
    pub ideal_temperature: String,
    pub humidity_needs: String,
    pub characteristics: Option<String>,
    pub growth_time: Option<String>,
    pub harvest_time: Option<String>,
    pub yield_potential: Option<String>,
    pub disease_resistance: Option<String>,
    pub seasonal_preferences: Option<String>,
    pub propagation_methods: Option<String>,
    pub pruning_needs: Option<String>,
    pub soil_ph_preference: Option<String>,
    pub nutrient_requirements: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "health_status")]
pub enum HealthStatus {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "growth_stage")]
pub enum GrowthStage {
    #[default]
    Seedling,
    Vegetative,
    Flowering,
    Fruiting,
    Mature,
}

/// A user's own instance of growing a plant.
///
/// Not linked to the catalog: `plant_type` is free text.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct TrackedPlant {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub plant_type: Option<String>,
    pub planted_date: NaiveDate,
    pub last_watered: NaiveDate,
    pub last_fertilized: NaiveDate,
    pub notes: Option<String>,
    pub health_status: HealthStatus,
    pub growth_stage: GrowthStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "reminder_type")]
pub enum ReminderType {
    Watering,
    Fertilizing,
    Pruning,
    Repotting,
    #[serde(rename = "Pest Check")]
    #[sqlx(rename = "Pest Check")]
    PestCheck,
    Harvesting,
    Other,
}

/// Scheduled care task for one tracked plant of the same owner.
///
/// `plant_name` is read-only, joined from the referenced tracked plant.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct PlantReminder {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(rename = "tracked_plant")]
    pub tracked_plant_id: i64,
    pub plant_name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub reminder_type: ReminderType,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
