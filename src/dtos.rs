use crate::models::{
    Choice, GrowthStage, HealthStatus, Plant, PlantCategory, ReminderType, SoilType, Sunlight,
    User, UserProfile, UserRole, WateringSchedule,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// DTOs (Data Transfer Objects) define the structure of data exchanged with clients
// They are separate from database models to control exactly what data is exposed

/// Distinguish an absent key (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

const MAX_LIST_ENTRIES: usize = 50;
const MAX_LIST_ENTRY_LENGTH: usize = 100;

/// List-valued fields: bounded number of non-blank, bounded-length entries.
pub fn validate_string_list(values: &[String]) -> Result<(), ValidationError> {
    if values.len() > MAX_LIST_ENTRIES {
        return Err(ValidationError::new("too_many_entries")
            .with_message(format!("At most {} entries are allowed", MAX_LIST_ENTRIES).into()));
    }
    for value in values {
        if value.trim().is_empty() {
            return Err(ValidationError::new("blank_entry")
                .with_message("List entries must not be blank".into()));
        }
        if value.chars().count() > MAX_LIST_ENTRY_LENGTH {
            return Err(ValidationError::new("entry_too_long").with_message(
                format!(
                    "List entries must not be more than {} characters",
                    MAX_LIST_ENTRY_LENGTH
                )
                .into(),
            ));
        }
    }
    Ok(())
}

fn validate_list_field(values: &Vec<String>) -> Result<(), ValidationError> {
    validate_string_list(values)
}

// ============================================================================
// Generic envelopes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DataResponseDto<T> {
    pub status: String,
    pub data: T,
}

impl<T> DataResponseDto<T> {
    pub fn success(data: T) -> Self {
        DataResponseDto {
            status: "success".to_string(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponseDto<T> {
    pub status: String,
    pub data: Vec<T>,
    pub results: usize,
}

impl<T> ListResponseDto<T> {
    pub fn success(data: Vec<T>) -> Self {
        ListResponseDto {
            status: "success".to_string(),
            results: data.len(),
            data,
        }
    }
}

/// Generic success response
#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

// ============================================================================
// Authentication DTOs
// ============================================================================

/// Registration request. Fields default to empty so a missing key is reported
/// as "All fields are required" instead of a deserialization error.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[serde(default)]
    #[validate(length(max = 150, message = "Username must not be more than 150 characters"))]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[serde(default)]
    pub role: String,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,
}

impl RegisterUserDto {
    pub fn has_missing_fields(&self) -> bool {
        [&self.username, &self.email, &self.password, &self.role]
            .iter()
            .any(|field| field.trim().is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponseDto {
    pub status: String,
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login success response: both tokens plus a summary of the account
#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub access: String,
    pub refresh: String,
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

/// Body of `/token/refresh/` and `/logout/`. The cookie is used when absent.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshTokenDto {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponseDto {
    pub status: String,
    pub access: String,
}

// ============================================================================
// User DTOs (filtered data for client)
// ============================================================================

/// Filtered user data sent to clients (excludes the password hash)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FilterUserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            role: user.role,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

/// `?role=` filter for the user directory; blank means every role.
#[derive(Debug, Deserialize)]
pub struct UserListQueryDto {
    pub role: Option<String>,
}

impl UserListQueryDto {
    pub fn role_filter(&self) -> Result<Option<UserRole>, String> {
        parse_choice("role", self.role.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub message: String,
    pub tracked_plant_count: i64,
    pub pending_reminder_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_users: Option<i64>,
}

// ============================================================================
// Profile DTOs
// ============================================================================

/// Profile with its read-only owner summary nested under `user`
#[derive(Debug, Serialize)]
pub struct ProfileResponseDto {
    pub user: FilterUserDto,
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// Sparse profile update
///
/// Absent key: unchanged. Present value: overwrite (including `""`, `false`,
/// `[]`). Explicit `null`: clear (text to `""`, `work_experience` to NULL,
/// lists to `[]`). Flags cannot be cleared; a `null` flag is ignored.
/// Keys outside this allow-list are ignored.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdateDto {
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 255))]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 20))]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub average_temperature: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub average_humidity: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub annual_rainfall: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100))]
    pub climate_zone: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub preferred_plant_types: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 255))]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 10))]
    pub zip_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub soil_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub skill_level: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub watering_frequency: Option<Option<String>>,
    pub maintenance_reminders: Option<bool>,
    pub pest_alerts: Option<bool>,
    pub disease_alerts: Option<bool>,
    pub community_notifications: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub gardening_preferences: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub experience_level: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100))]
    pub specialization: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub availability: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 255))]
    pub service_area: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub certifications: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(range(min = 0, max = 100))]
    pub work_experience: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub managed_projects: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub responsibilities: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub property_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub garden_size: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub preferred_plants: Option<Option<String>>,
    pub organic_fertilizer: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub plant_tracking: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub admin_level: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_responsibilities: Option<Option<String>>,
}

fn merge_text(target: &mut String, change: Option<Option<String>>) {
    if let Some(value) = change {
        *target = value.unwrap_or_default();
    }
}

fn merge_flag(target: &mut bool, change: Option<bool>) {
    if let Some(value) = change {
        *target = value;
    }
}

impl ProfileUpdateDto {
    pub fn validate_lists(&self) -> Result<(), ValidationError> {
        match &self.preferred_plant_types {
            Some(Some(values)) => validate_string_list(values),
            _ => Ok(()),
        }
    }

    /// Merge the recognized changes into `profile`.
    pub fn apply(self, profile: &mut UserProfile) {
        merge_text(&mut profile.full_name, self.full_name);
        merge_text(&mut profile.phone_number, self.phone_number);
        merge_text(&mut profile.address, self.address);

        merge_text(&mut profile.average_temperature, self.average_temperature);
        merge_text(&mut profile.average_humidity, self.average_humidity);
        merge_text(&mut profile.annual_rainfall, self.annual_rainfall);
        merge_text(&mut profile.climate_zone, self.climate_zone);

        if let Some(types) = self.preferred_plant_types {
            profile.preferred_plant_types = types.unwrap_or_default();
        }
        merge_text(&mut profile.location, self.location);
        merge_text(&mut profile.zip_code, self.zip_code);
        merge_text(&mut profile.soil_type, self.soil_type);
        merge_text(&mut profile.skill_level, self.skill_level);
        merge_text(&mut profile.watering_frequency, self.watering_frequency);
        merge_flag(&mut profile.maintenance_reminders, self.maintenance_reminders);
        merge_flag(&mut profile.pest_alerts, self.pest_alerts);
        merge_flag(&mut profile.disease_alerts, self.disease_alerts);
        merge_flag(
            &mut profile.community_notifications,
            self.community_notifications,
        );
        merge_text(
            &mut profile.gardening_preferences,
            self.gardening_preferences,
        );

        merge_text(&mut profile.experience_level, self.experience_level);
        merge_text(&mut profile.specialization, self.specialization);
        merge_text(&mut profile.availability, self.availability);
        merge_text(&mut profile.service_area, self.service_area);
        merge_text(&mut profile.certifications, self.certifications);

        if let Some(years) = self.work_experience {
            profile.work_experience = years;
        }
        merge_text(&mut profile.managed_projects, self.managed_projects);
        merge_text(&mut profile.responsibilities, self.responsibilities);

        merge_text(&mut profile.property_type, self.property_type);
        merge_text(&mut profile.garden_size, self.garden_size);
        merge_text(&mut profile.preferred_plants, self.preferred_plants);
        merge_flag(&mut profile.organic_fertilizer, self.organic_fertilizer);
        merge_text(&mut profile.plant_tracking, self.plant_tracking);

        merge_text(&mut profile.admin_level, self.admin_level);
        merge_text(
            &mut profile.assigned_responsibilities,
            self.assigned_responsibilities,
        );
    }
}

// ============================================================================
// Plant catalog DTOs
// ============================================================================

/// Catalog query string. Enum filters arrive as raw strings so that an empty
/// parameter (`?category=`) means "no filter" rather than a parse error.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PlantQueryParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub soil_type: Option<String>,
    pub sunlight: Option<String>,
    pub watering_schedule: Option<String>,

    #[validate(range(min = 1))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

/// Parse an optional enum filter; blank means absent.
pub fn parse_choice<C: Choice>(field: &str, raw: Option<&str>) -> Result<Option<C>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => C::parse(value)
            .map(Some)
            .ok_or_else(|| format!("Invalid {}: {}", field, value)),
    }
}

/// Catalog create/update body (PUT replaces every field)
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PlantInputDto {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[validate(length(max = 150))]
    pub scientific_name: Option<String>,
    pub category: PlantCategory,
    pub soil_type: SoilType,
    pub sunlight: Sunlight,
    pub watering_schedule: WateringSchedule,
    #[serde(default = "default_true")]
    pub fertilization_needs: bool,
    #[serde(default)]
    #[validate(custom(function = "validate_list_field"))]
    pub growth_stages: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_list_field"))]
    pub pests: Vec<String>,
    #[validate(length(min = 1, max = 255, message = "Climate suitability is required."))]
    pub climate_suitability: String,
    #[validate(length(min = 1, message = "Care instructions are required."))]
    pub care_instructions: String,
    #[serde(default)]
    #[validate(custom(function = "validate_list_field"))]
    pub companion_plants: Vec<String>,
    #[validate(length(min = 1, max = 100, message = "Lifespan is required."))]
    pub lifespan: String,
    #[validate(length(min = 1, max = 100, message = "Ideal temperature is required."))]
    pub ideal_temperature: String,
    #[validate(length(min = 1, max = 100, message = "Humidity needs are required."))]
    pub humidity_needs: String,
    pub characteristics: Option<String>,
    #[validate(length(max = 100))]
    pub growth_time: Option<String>,
    #[validate(length(max = 100))]
    pub harvest_time: Option<String>,
    #[validate(length(max = 100))]
    pub yield_potential: Option<String>,
    #[validate(length(max = 50))]
    pub disease_resistance: Option<String>,
    #[validate(length(max = 100))]
    pub seasonal_preferences: Option<String>,
    #[validate(length(max = 255))]
    pub propagation_methods: Option<String>,
    #[validate(length(max = 255))]
    pub pruning_needs: Option<String>,
    #[validate(length(max = 100))]
    pub soil_ph_preference: Option<String>,
    #[validate(length(max = 50))]
    pub nutrient_requirements: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationDto {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PaginationDto {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        PaginationDto {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// Rows to skip for a 1-based `page`; `None` when it does not fit an `i64`.
pub fn page_offset(page: i64, limit: i64) -> Option<i64> {
    page.checked_sub(1)?.checked_mul(limit)
}

#[derive(Debug, Serialize)]
pub struct PlantsPaginationResponseDto {
    pub status: String,
    pub data: Vec<Plant>,
    pub pagination: PaginationDto,
}

/// Image upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub location: String,
    pub data: Plant,
}

// ============================================================================
// Tracked plant & reminder DTOs
// ============================================================================

/// Tracked plant create/update body. There is deliberately no owner field:
/// the owner is always the caller.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TrackedPlantInputDto {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(max = 100))]
    pub plant_type: Option<String>,
    pub planted_date: NaiveDate,
    pub last_watered: NaiveDate,
    pub last_fertilized: NaiveDate,
    pub notes: Option<String>,
    #[serde(default)]
    pub health_status: HealthStatus,
    #[serde(default)]
    pub growth_stage: GrowthStage,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ReminderInputDto {
    #[validate(range(min = 1, message = "tracked_plant is required"))]
    pub tracked_plant: i64,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            full_name: "Jane Green".to_string(),
            phone_number: "1234567890".to_string(),
            preferred_plant_types: vec!["Vegetables".to_string()],
            community_notifications: true,
            work_experience: Some(5),
            ..Default::default()
        }
    }

    #[test]
    fn absent_keys_leave_profile_unchanged() {
        let mut target = profile();
        let update: ProfileUpdateDto = serde_json::from_str("{}").unwrap();
        update.apply(&mut target);
        assert_eq!(target, profile());
    }

    #[test]
    fn present_values_overwrite_including_blank() {
        let mut target = profile();
        let update: ProfileUpdateDto = serde_json::from_str(
            r#"{"full_name": "", "location": "New York", "community_notifications": false,
                "preferred_plant_types": [], "work_experience": 7}"#,
        )
        .unwrap();
        update.apply(&mut target);

        assert_eq!(target.full_name, "");
        assert_eq!(target.location, "New York");
        assert!(!target.community_notifications);
        assert!(target.preferred_plant_types.is_empty());
        assert_eq!(target.work_experience, Some(7));
        assert_eq!(target.phone_number, "1234567890");
    }

    #[test]
    fn null_clears_and_null_flag_is_ignored() {
        let mut target = profile();
        let update: ProfileUpdateDto = serde_json::from_str(
            r#"{"phone_number": null, "work_experience": null,
                "preferred_plant_types": null, "community_notifications": null}"#,
        )
        .unwrap();
        update.apply(&mut target);

        assert_eq!(target.phone_number, "");
        assert_eq!(target.work_experience, None);
        assert!(target.preferred_plant_types.is_empty());
        assert!(target.community_notifications);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut target = profile();
        let update: ProfileUpdateDto =
            serde_json::from_str(r#"{"user_id": "someone-else", "is_staff": true}"#).unwrap();
        update.apply(&mut target);
        assert_eq!(target, profile());
    }

    #[test]
    fn profile_update_lengths_are_validated() {
        let update: ProfileUpdateDto =
            serde_json::from_str(r#"{"zip_code": "12345678901"}"#).unwrap();
        assert!(update.validate().is_err());

        let update: ProfileUpdateDto =
            serde_json::from_str(r#"{"preferred_plant_types": ["Flowers", " "]}"#).unwrap();
        assert!(update.validate_lists().is_err());
    }

    #[test]
    fn register_missing_fields() {
        let body: RegisterUserDto =
            serde_json::from_str(r#"{"username": "gardener1", "email": "g@example.com"}"#)
                .unwrap();
        assert!(body.has_missing_fields());

        let body: RegisterUserDto = serde_json::from_str(
            r#"{"username": "gardener1", "email": "g@example.com",
                "password": "gardener123", "role": "Gardener"}"#,
        )
        .unwrap();
        assert!(!body.has_missing_fields());
        assert!(body.validate().is_ok());
    }

    #[test]
    fn blank_choice_filter_is_ignored() {
        assert_eq!(parse_choice::<PlantCategory>("category", Some("")).unwrap(), None);
        assert_eq!(parse_choice::<PlantCategory>("category", None).unwrap(), None);
        assert_eq!(
            parse_choice::<SoilType>("soil_type", Some("loamy")).unwrap(),
            Some(SoilType::Loamy)
        );
        let err = parse_choice::<Sunlight>("sunlight", Some("moonlight")).unwrap_err();
        assert_eq!(err, "Invalid sunlight: moonlight");
    }

    #[test]
    fn string_lists_are_bounded() {
        assert!(validate_string_list(&["Aphids".to_string()]).is_ok());
        assert!(validate_string_list(&["".to_string()]).is_err());
        assert!(validate_string_list(&["x".repeat(101)]).is_err());
        assert!(validate_string_list(&vec!["Mint".to_string(); 51]).is_err());
    }

    #[test]
    fn tracked_plant_input_ignores_owner_and_defaults_enums() {
        let body: TrackedPlantInputDto = serde_json::from_str(
            r#"{"name": "Basil", "user": "00000000-0000-0000-0000-000000000001",
                "planted_date": "2025-04-01", "last_watered": "2025-04-02",
                "last_fertilized": "2025-04-03"}"#,
        )
        .unwrap();
        assert_eq!(body.name, "Basil");
        assert_eq!(body.health_status, HealthStatus::Good);
        assert_eq!(body.growth_stage, GrowthStage::Seedling);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PaginationDto::new(1, 50, 0).total_pages, 0);
        assert_eq!(PaginationDto::new(1, 50, 50).total_pages, 1);
        assert_eq!(PaginationDto::new(1, 50, 51).total_pages, 2);
    }

    #[test]
    fn page_offset_rejects_overflow() {
        assert_eq!(page_offset(1, 50), Some(0));
        assert_eq!(page_offset(3, 20), Some(40));
        assert_eq!(page_offset(i64::MAX, 100), None);
        assert_eq!(page_offset(i64::MIN, 1), None);
    }
}
