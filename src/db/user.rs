use super::DBClient;
use crate::models::{User, UserRole};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password, role, first_name, last_name, \
                            is_staff, is_active, created_at, updated_at";

/// User database operations trait
pub trait UserExt {
    /// Get single user by ID, username or email (first `Some` wins)
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// List users, optionally restricted to one role
    async fn get_users(&self, role: Option<UserRole>) -> Result<Vec<User>, sqlx::Error>;

    /// Create new user; unique violations on username/email surface as `sqlx::Error::Database`
    async fn save_user<T: Into<String> + Send>(
        &self,
        username: T,
        email: T,
        password: T,
        role: UserRole,
        first_name: T,
        last_name: T,
    ) -> Result<User, sqlx::Error>;

    async fn get_user_count(&self) -> Result<i64, sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = $1",
                USER_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE username = $1",
                USER_COLUMNS
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            // emails are stored lowercased
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE email = LOWER($1)",
                USER_COLUMNS
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn get_users(&self, role: Option<UserRole>) -> Result<Vec<User>, sqlx::Error> {
        let users = match role {
            Some(role) => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {} FROM users WHERE role = $1 ORDER BY username ASC",
                    USER_COLUMNS
                ))
                .bind(role)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {} FROM users ORDER BY username ASC",
                    USER_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(users)
    }

    async fn save_user<T: Into<String> + Send>(
        &self,
        username: T,
        email: T,
        password: T,
        role: UserRole,
        first_name: T,
        last_name: T,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password, role, first_name, last_name)
            VALUES ($1, LOWER($2), $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username.into())
        .bind(email.into())
        .bind(password.into())
        .bind(role)
        .bind(first_name.into())
        .bind(last_name.into())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
