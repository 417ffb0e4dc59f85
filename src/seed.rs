//! Demo data for local development: `garden_backend seed-demo`.
//!
//! Rows that already exist (plants by name, users by username) are left alone,
//! so the command can be run repeatedly.

use rand::{Rng, seq::SliceRandom};

use crate::{
    db::{DBClient, PlantExt, ProfileExt, UserExt},
    dtos::PlantInputDto,
    models::{PlantCategory, SoilType, Sunlight, UserRole, WateringSchedule},
    utils::password,
};

pub type SeedResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const DEMO_PLANTS: [(&str, &str, PlantCategory); 20] = [
    ("Rose", "Rosa", PlantCategory::Flower),
    ("Tomato", "Solanum lycopersicum", PlantCategory::Vegetable),
    ("Apple Tree", "Malus domestica", PlantCategory::Fruit),
    ("Lavender", "Lavandula", PlantCategory::Flower),
    ("Carrot", "Daucus carota", PlantCategory::Vegetable),
    ("Strawberry", "Fragaria × ananassa", PlantCategory::Fruit),
    ("Sunflower", "Helianthus annuus", PlantCategory::Flower),
    ("Cucumber", "Cucumis sativus", PlantCategory::Vegetable),
    ("Lemon Tree", "Citrus limon", PlantCategory::Fruit),
    ("Tulip", "Tulipa", PlantCategory::Flower),
    ("Bell Pepper", "Capsicum annuum", PlantCategory::Vegetable),
    ("Blueberry", "Vaccinium corymbosum", PlantCategory::Fruit),
    ("Dahlia", "Dahlia pinnata", PlantCategory::Flower),
    ("Lettuce", "Lactuca sativa", PlantCategory::Vegetable),
    ("Orange Tree", "Citrus × sinensis", PlantCategory::Fruit),
    ("Peony", "Paeonia", PlantCategory::Flower),
    ("Spinach", "Spinacia oleracea", PlantCategory::Vegetable),
    ("Grape Vine", "Vitis vinifera", PlantCategory::Fruit),
    ("Chrysanthemum", "Chrysanthemum", PlantCategory::Flower),
    ("Broccoli", "Brassica oleracea var. italica", PlantCategory::Vegetable),
];

const SOIL_TYPES: [SoilType; 4] = [
    SoilType::Sandy,
    SoilType::Loamy,
    SoilType::Clay,
    SoilType::Silt,
];
const SUNLIGHT: [Sunlight; 3] = [Sunlight::FullSun, Sunlight::PartialSun, Sunlight::Shade];
const WATERING: [WateringSchedule; 3] = [
    WateringSchedule::Daily,
    WateringSchedule::Weekly,
    WateringSchedule::Custom,
];

const GROWTH_STAGES: [&[&str]; 3] = [
    &["Seedling", "Vegetative", "Flowering", "Fruiting"],
    &["Germination", "Leaf Development", "Maturity"],
    &["Early Growth", "Establishment", "Peak Growth", "Dormancy"],
];
const PESTS: [&str; 8] = [
    "Aphids",
    "Spider Mites",
    "Whiteflies",
    "Caterpillars",
    "Japanese Beetles",
    "Slugs",
    "Scale Insects",
    "Thrips",
];
const COMPANIONS: [&str; 10] = [
    "Marigold",
    "Basil",
    "Nasturtium",
    "Garlic",
    "Mint",
    "Dill",
    "Chamomile",
    "Oregano",
    "Thyme",
    "Chives",
];
const PROPAGATION: [&str; 4] = ["Seeds", "Cuttings", "Division", "Layering"];

/// `values` must not be empty.
fn pick<R: Rng, T: Copy>(rng: &mut R, values: &[T]) -> T {
    values[rng.gen_range(0..values.len())]
}

fn sample<R: Rng>(rng: &mut R, values: &[&str], min: usize, max: usize) -> Vec<String> {
    let amount = rng.gen_range(min..=max);
    values
        .choose_multiple(rng, amount)
        .map(|value| value.to_string())
        .collect()
}

/// The twenty demo catalog entries with randomized growing attributes
pub fn demo_plants<R: Rng>(rng: &mut R) -> Vec<PlantInputDto> {
    DEMO_PLANTS
        .iter()
        .map(|&(name, scientific_name, category)| {
            let yield_potential = match category {
                PlantCategory::Flower => "N/A".to_string(),
                _ => format!("{} kg per plant", rng.gen_range(1..=10)),
            };

            PlantInputDto {
                name: name.to_string(),
                scientific_name: Some(scientific_name.to_string()),
                category,
                soil_type: pick(rng, &SOIL_TYPES),
                sunlight: pick(rng, &SUNLIGHT),
                watering_schedule: pick(rng, &WATERING),
                fertilization_needs: rng.gen_bool(0.5),
                growth_stages: pick(rng, &GROWTH_STAGES)
                    .iter()
                    .map(|stage| stage.to_string())
                    .collect(),
                pests: sample(rng, &PESTS, 2, 4),
                climate_suitability: pick(
                    rng,
                    &["Tropical", "Mediterranean", "Temperate", "Continental"],
                )
                .to_string(),
                care_instructions: format!(
                    "1. Plant in well-draining soil\n2. Water {}\n3. Fertilize {}\n4. Prune as needed for shape and health",
                    pick(rng, &["regularly", "moderately", "sparingly"]),
                    pick(rng, &["monthly", "quarterly", "annually"]),
                ),
                companion_plants: sample(rng, &COMPANIONS, 2, 4),
                lifespan: pick(
                    rng,
                    &["Annual", "Biennial", "Perennial", "2-3 years", "5-10 years"],
                )
                .to_string(),
                ideal_temperature: format!(
                    "{}°C - {}°C",
                    rng.gen_range(15..=25),
                    rng.gen_range(26..=35)
                ),
                humidity_needs: format!("{}% - {}%", rng.gen_range(40..=60), rng.gen_range(61..=80)),
                characteristics: Some(format!(
                    "A {} plant with {}.",
                    pick(rng, &["hardy", "delicate", "robust", "versatile"]),
                    pick(
                        rng,
                        &[
                            "beautiful flowers",
                            "edible fruits",
                            "aromatic leaves",
                            "ornamental value"
                        ]
                    ),
                )),
                growth_time: Some(format!("{} days", rng.gen_range(60..=180))),
                harvest_time: Some(
                    pick(rng, &["Spring", "Summer", "Fall", "Winter", "Year-round"]).to_string(),
                ),
                yield_potential: Some(yield_potential),
                disease_resistance: Some(pick(rng, &["High", "Medium", "Low"]).to_string()),
                seasonal_preferences: Some(
                    pick(
                        rng,
                        &[
                            "Spring planting",
                            "Summer planting",
                            "Fall planting",
                            "Year-round planting",
                        ],
                    )
                    .to_string(),
                ),
                propagation_methods: Some(sample(rng, &PROPAGATION, 1, 3).join(", ")),
                pruning_needs: Some(
                    pick(
                        rng,
                        &[
                            "Regular pruning required",
                            "Minimal pruning needed",
                            "Annual pruning recommended",
                        ],
                    )
                    .to_string(),
                ),
                soil_ph_preference: Some(format!(
                    "{}.{} - {}.{}",
                    rng.gen_range(5..=7),
                    rng.gen_range(0..=9),
                    rng.gen_range(6..=8),
                    rng.gen_range(0..=9)
                )),
                nutrient_requirements: Some(pick(rng, &["High", "Medium", "Low"]).to_string()),
            }
        })
        .collect()
}

pub struct SampleUser {
    pub username: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub role: UserRole,
    pub first_name: &'static str,
    pub last_name: &'static str,
}

pub const SAMPLE_USERS: [SampleUser; 3] = [
    SampleUser {
        username: "gardener1",
        email: "gardener1@example.com",
        password: "gardener123",
        role: UserRole::Gardener,
        first_name: "John",
        last_name: "Green",
    },
    SampleUser {
        username: "supervisor1",
        email: "supervisor1@example.com",
        password: "supervisor123",
        role: UserRole::Supervisor,
        first_name: "Sarah",
        last_name: "Brown",
    },
    SampleUser {
        username: "homeowner1",
        email: "homeowner1@example.com",
        password: "homeowner123",
        role: UserRole::Homeowner,
        first_name: "Mike",
        last_name: "Wilson",
    },
];

async fn seed_users(db_client: &DBClient) -> SeedResult<usize> {
    let mut created = 0;

    for sample in &SAMPLE_USERS {
        let existing = db_client.get_user(None, Some(sample.username), None).await?;
        if existing.is_some() {
            tracing::info!(username = sample.username, "sample user exists, skipping");
            continue;
        }

        let hashed = password::hash(sample.password).map_err(|e| e.to_string())?;
        let user = db_client
            .save_user(
                sample.username,
                sample.email,
                hashed.as_str(),
                sample.role,
                sample.first_name,
                sample.last_name,
            )
            .await?;

        let full_name = format!("{} {}", sample.first_name, sample.last_name);
        let mut profile = db_client.get_or_create_profile(user.id, &full_name).await?;
        profile.phone_number = "1234567890".to_string();
        profile.address = "123 Garden Street".to_string();
        profile.preferred_plant_types = vec!["Vegetables".to_string(), "Flowers".to_string()];
        profile.location = "New York".to_string();
        profile.zip_code = "10001".to_string();
        profile.soil_type = "Loamy".to_string();
        profile.skill_level = "Intermediate".to_string();
        profile.gardening_preferences = "Organic gardening".to_string();
        profile.experience_level = "5 years".to_string();
        db_client.save_profile(&profile).await?;

        tracing::info!(username = sample.username, role = sample.role.to_str(), "sample user created");
        created += 1;
    }

    Ok(created)
}

async fn seed_plants<R: Rng>(db_client: &DBClient, rng: &mut R) -> SeedResult<usize> {
    let mut created = 0;

    for plant in demo_plants(rng) {
        if db_client.get_plant_by_name(&plant.name).await?.is_some() {
            tracing::info!(name = %plant.name, "demo plant exists, skipping");
            continue;
        }

        db_client.create_plant(&plant).await?;
        tracing::info!(name = %plant.name, "demo plant added");
        created += 1;
    }

    Ok(created)
}

pub async fn run(db_client: &DBClient) -> SeedResult<()> {
    let users = seed_users(db_client).await?;
    let plants = seed_plants(db_client, &mut rand::thread_rng()).await?;

    tracing::info!(users, plants, "demo data seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use validator::Validate;

    #[test]
    fn twenty_valid_plants() {
        let mut rng = StdRng::seed_from_u64(7);
        let plants = demo_plants(&mut rng);

        assert_eq!(plants.len(), 20);
        for plant in &plants {
            assert!(plant.validate().is_ok(), "{} failed validation", plant.name);
            assert!((2..=4).contains(&plant.pests.len()));
            assert!((2..=4).contains(&plant.companion_plants.len()));
        }
    }

    #[test]
    fn flowers_have_no_yield() {
        let mut rng = StdRng::seed_from_u64(42);
        for plant in demo_plants(&mut rng) {
            let yield_potential = plant.yield_potential.unwrap();
            match plant.category {
                PlantCategory::Flower => assert_eq!(yield_potential, "N/A"),
                _ => assert!(yield_potential.ends_with("kg per plant")),
            }
        }
    }

    #[test]
    fn same_seed_same_catalog() {
        let a = demo_plants(&mut StdRng::seed_from_u64(1));
        let b = demo_plants(&mut StdRng::seed_from_u64(1));
        let names = |plants: &[PlantInputDto]| {
            plants
                .iter()
                .map(|p| (p.soil_type, p.sunlight, p.pests.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn sample_users_cover_three_roles() {
        let roles: Vec<UserRole> = SAMPLE_USERS.iter().map(|u| u.role).collect();
        assert_eq!(
            roles,
            vec![UserRole::Gardener, UserRole::Supervisor, UserRole::Homeowner]
        );
        assert!(SAMPLE_USERS.iter().all(|u| u.password.len() >= 6));
    }
}
