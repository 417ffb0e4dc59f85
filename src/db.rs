use sqlx::{Pool, Postgres};

mod user;
pub use user::UserExt;

mod profile;
pub use profile::ProfileExt;

mod plant;
pub use plant::{PlantExt, PlantFilter};

mod tracked_plant;
pub use tracked_plant::TrackedPlantExt;

mod reminder;
pub use reminder::{ReminderExt, ReminderWrite};

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    /// Apply the embedded migrations under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}
