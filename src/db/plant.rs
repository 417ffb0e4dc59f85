use super::DBClient;
use crate::{
    dtos::PlantInputDto,
    models::{Plant, PlantCategory, SoilType, Sunlight, WateringSchedule},
};
use sqlx::{Postgres, QueryBuilder};

/// Catalog filters; every `Some` narrows the result.
#[derive(Debug, Default, Clone)]
pub struct PlantFilter<'a> {
    pub q: Option<&'a str>,
    pub category: Option<PlantCategory>,
    pub soil_type: Option<SoilType>,
    pub sunlight: Option<Sunlight>,
    pub watering_schedule: Option<WateringSchedule>,
}

/// `ILIKE` pattern matching `q` anywhere, with wildcards in `q` taken literally.
fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &PlantFilter<'a>) {
    builder.push(" WHERE TRUE");

    if let Some(q) = filter.q.map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR scientific_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category);
    }
    if let Some(soil_type) = filter.soil_type {
        builder.push(" AND soil_type = ").push_bind(soil_type);
    }
    if let Some(sunlight) = filter.sunlight {
        builder.push(" AND sunlight = ").push_bind(sunlight);
    }
    if let Some(watering_schedule) = filter.watering_schedule {
        builder
            .push(" AND watering_schedule = ")
            .push_bind(watering_schedule);
    }
}

pub trait PlantExt {
    async fn get_plants(
        &self,
        filter: &PlantFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Plant>, sqlx::Error>;

    async fn get_plant_count(&self, filter: &PlantFilter<'_>) -> Result<i64, sqlx::Error>;

    async fn get_plant(&self, plant_id: i64) -> Result<Option<Plant>, sqlx::Error>;

    async fn get_plant_by_name(&self, name: &str) -> Result<Option<Plant>, sqlx::Error>;

    async fn create_plant(&self, input: &PlantInputDto) -> Result<Plant, sqlx::Error>;

    /// Replace every editable field; `None` when the plant does not exist.
    async fn update_plant(
        &self,
        plant_id: i64,
        input: &PlantInputDto,
    ) -> Result<Option<Plant>, sqlx::Error>;

    /// `sqlx::Error::RowNotFound` when nothing was deleted.
    async fn delete_plant(&self, plant_id: i64) -> Result<(), sqlx::Error>;

    async fn set_plant_image(
        &self,
        plant_id: i64,
        image: &str,
    ) -> Result<Option<Plant>, sqlx::Error>;
}

impl PlantExt for DBClient {
    async fn get_plants(
        &self,
        filter: &PlantFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Plant>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM plants");
        push_filters(&mut builder, filter);
        builder
            .push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let plants = builder
            .build_query_as::<Plant>()
            .fetch_all(&self.pool)
            .await?;

        Ok(plants)
    }

    async fn get_plant_count(&self, filter: &PlantFilter<'_>) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM plants");
        push_filters(&mut builder, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_plant(&self, plant_id: i64) -> Result<Option<Plant>, sqlx::Error> {
        let plant = sqlx::query_as::<_, Plant>("SELECT * FROM plants WHERE id = $1")
            .bind(plant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(plant)
    }

    async fn get_plant_by_name(&self, name: &str) -> Result<Option<Plant>, sqlx::Error> {
        let plant = sqlx::query_as::<_, Plant>(
            "SELECT * FROM plants WHERE name = $1 ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plant)
    }

    async fn create_plant(&self, input: &PlantInputDto) -> Result<Plant, sqlx::Error> {
        let plant = sqlx::query_as::<_, Plant>(
            r#"
            INSERT INTO plants (
                name, scientific_name, category, soil_type, sunlight, watering_schedule,
                fertilization_needs, growth_stages, pests, climate_suitability,
                care_instructions, companion_plants, lifespan, ideal_temperature,
                humidity_needs, characteristics, growth_time, harvest_time, yield_potential,
                disease_resistance, seasonal_preferences, propagation_methods, pruning_needs,
                soil_ph_preference, nutrient_requirements
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.scientific_name)
        .bind(input.category)
        .bind(input.soil_type)
        .bind(input.sunlight)
        .bind(input.watering_schedule)
        .bind(input.fertilization_needs)
        .bind(&input.growth_stages)
        .bind(&input.pests)
        .bind(&input.climate_suitability)
        .bind(&input.care_instructions)
        .bind(&input.companion_plants)
        .bind(&input.lifespan)
        .bind(&input.ideal_temperature)
        .bind(&input.humidity_needs)
        .bind(&input.characteristics)
        .bind(&input.growth_time)
        .bind(&input.harvest_time)
        .bind(&input.yield_potential)
        .bind(&input.disease_resistance)
        .bind(&input.seasonal_preferences)
        .bind(&input.propagation_methods)
        .bind(&input.pruning_needs)
        .bind(&input.soil_ph_preference)
        .bind(&input.nutrient_requirements)
        .fetch_one(&self.pool)
        .await?;

        Ok(plant)
    }

    async fn update_plant(
        &self,
        plant_id: i64,
        input: &PlantInputDto,
    ) -> Result<Option<Plant>, sqlx::Error> {
        let plant = sqlx::query_as::<_, Plant>(
            r#"
            UPDATE plants SET
                name = $2,
                scientific_name = $3,
                category = $4,
                soil_type = $5,
                sunlight = $6,
                watering_schedule = $7,
                fertilization_needs = $8,
                growth_stages = $9,
                pests = $10,
                climate_suitability = $11,
                care_instructions = $12,
                companion_plants = $13,
                lifespan = $14,
                ideal_temperature = $15,
                humidity_needs = $16,
                characteristics = $17,
                growth_time = $18,
                harvest_time = $19,
                yield_potential = $20,
                disease_resistance = $21,
                seasonal_preferences = $22,
                propagation_methods = $23,
                pruning_needs = $24,
                soil_ph_preference = $25,
                nutrient_requirements = $26,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(plant_id)
        .bind(&input.name)
        .bind(&input.scientific_name)
        .bind(input.category)
        .bind(input.soil_type)
        .bind(input.sunlight)
        .bind(input.watering_schedule)
        .bind(input.fertilization_needs)
        .bind(&input.growth_stages)
        .bind(&input.pests)
        .bind(&input.climate_suitability)
        .bind(&input.care_instructions)
        .bind(&input.companion_plants)
        .bind(&input.lifespan)
        .bind(&input.ideal_temperature)
        .bind(&input.humidity_needs)
        .bind(&input.characteristics)
        .bind(&input.growth_time)
        .bind(&input.harvest_time)
        .bind(&input.yield_potential)
        .bind(&input.disease_resistance)
        .bind(&input.seasonal_preferences)
        .bind(&input.propagation_methods)
        .bind(&input.pruning_needs)
        .bind(&input.soil_ph_preference)
        .bind(&input.nutrient_requirements)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plant)
    }

    async fn delete_plant(&self, plant_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM plants WHERE id = $1")
            .bind(plant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn set_plant_image(
        &self,
        plant_id: i64,
        image: &str,
    ) -> Result<Option<Plant>, sqlx::Error> {
        let plant = sqlx::query_as::<_, Plant>(
            "UPDATE plants SET image = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(plant_id)
        .bind(image)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{seed::demo_plants, test_support::start_database};
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rose"), "%rose%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn no_filters_selects_everything() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM plants");
        push_filters(&mut builder, &PlantFilter::default());
        assert_eq!(builder.sql(), "SELECT * FROM plants WHERE TRUE");
    }

    #[test]
    fn blank_query_is_ignored() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM plants");
        let filter = PlantFilter {
            q: Some("   "),
            ..Default::default()
        };
        push_filters(&mut builder, &filter);
        assert_eq!(builder.sql(), "SELECT * FROM plants WHERE TRUE");
    }

    #[test]
    fn filters_combine_with_and() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM plants");
        let filter = PlantFilter {
            q: Some("tom"),
            category: Some(PlantCategory::Vegetable),
            sunlight: Some(Sunlight::FullSun),
            ..Default::default()
        };
        push_filters(&mut builder, &filter);
        assert_eq!(
            builder.sql(),
            "SELECT * FROM plants WHERE TRUE AND (name ILIKE $1 OR scientific_name ILIKE $2) \
             AND category = $3 AND sunlight = $4"
        );
    }

    async fn insert_plant(
        db_client: &DBClient,
        template: &PlantInputDto,
        name: &str,
        category: PlantCategory,
        soil_type: SoilType,
    ) {
        let input = PlantInputDto {
            name: name.to_string(),
            scientific_name: None,
            category,
            soil_type,
            ..template.clone()
        };
        db_client.create_plant(&input).await.unwrap();
    }

    #[tokio::test]
    async fn combined_filters_only_return_matching_rows() {
        let db = start_database().await;
        let template = demo_plants(&mut StdRng::seed_from_u64(3)).remove(0);

        insert_plant(&db.db_client, &template, "Tomato", PlantCategory::Vegetable, SoilType::Loamy).await;
        insert_plant(&db.db_client, &template, "Carrot", PlantCategory::Vegetable, SoilType::Sandy).await;
        insert_plant(&db.db_client, &template, "Strawberry", PlantCategory::Fruit, SoilType::Loamy).await;
        insert_plant(&db.db_client, &template, "Kale", PlantCategory::Vegetable, SoilType::Loamy).await;

        let filter = PlantFilter {
            category: Some(PlantCategory::Vegetable),
            soil_type: Some(SoilType::Loamy),
            ..Default::default()
        };

        let plants = db.db_client.get_plants(&filter, 50, 0).await.unwrap();
        let names: Vec<&str> = plants.iter().map(|plant| plant.name.as_str()).collect();
        assert_eq!(names, vec!["Kale", "Tomato"]);
        assert!(plants.iter().all(|plant| {
            plant.category == PlantCategory::Vegetable && plant.soil_type == SoilType::Loamy
        }));
        assert_eq!(db.db_client.get_plant_count(&filter).await.unwrap(), 2);

        let second_page = db.db_client.get_plants(&filter, 1, 1).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].name, "Tomato");
    }

    fn search(q: &str) -> PlantFilter<'_> {
        PlantFilter {
            q: Some(q),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let db = start_database().await;
        let template = demo_plants(&mut StdRng::seed_from_u64(5)).remove(0);

        insert_plant(&db.db_client, &template, "Tomato", PlantCategory::Vegetable, SoilType::Loamy).await;
        insert_plant(&db.db_client, &template, "100% Mint", PlantCategory::Flower, SoilType::Silt).await;

        let plants = db.db_client.get_plants(&search("TOM"), 50, 0).await.unwrap();
        assert_eq!(plants.len(), 1);
        assert_eq!(plants[0].name, "Tomato");

        let plants = db.db_client.get_plants(&search("%"), 50, 0).await.unwrap();
        assert_eq!(plants.len(), 1);
        assert_eq!(plants[0].name, "100% Mint");
    }
}
