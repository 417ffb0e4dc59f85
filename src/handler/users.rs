use crate::{
    AppState,
    db::{ReminderExt, TrackedPlantExt, UserExt},
    dtos::{DashboardDto, DataResponseDto, FilterUserDto, ListResponseDto, UserListQueryDto},
    error::{ErrorMessage, HttpError},
    extract::{AppPath, AppQuery},
    middleware::JWTAuthMiddleware,
    models::{User, UserRole},
    utils::access::is_role,
};
use axum::{
    Extension, Json, Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;
use uuid::Uuid;

/// Router for user directory and identity endpoints
///
/// All routes are protected by the auth middleware (applied in routes.rs).
pub fn users_handler() -> Router<AppState> {
    Router::new()
        // GET /users/?role=Gardener
        .route("/users/", get(get_users))
        .route("/users/{user_id}/", get(get_user))
        .route("/dashboard/", get(dashboard))
        .route("/user-info/", get(user_info))
}

fn welcome_message(user: &User) -> String {
    format!("Welcome to your {} dashboard!", user.role.to_str())
}

/// List users, optionally only those with the given role
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_users(
    AppQuery(query_params): AppQuery<UserListQueryDto>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let role = query_params
        .role_filter()
        .map_err(HttpError::bad_request)?;

    let users = app_state
        .db_client
        .get_users(role)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting users: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(count = users.len(), "get_users successful");
    Ok(Json(ListResponseDto::success(FilterUserDto::filter_users(
        &users,
    ))))
}

#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_user(
    AppPath(user_id): AppPath<Uuid>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(DataResponseDto::success(FilterUserDto::filter_user(
        &user,
    ))))
}

/// Identity summary plus the caller's own counters; System Admins also see
/// the total number of accounts.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn dashboard(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let user = jwt.user;

    let tracked_plant_count = app_state
        .db_client
        .get_tracked_plant_count(user.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, counting tracked plants: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let pending_reminder_count = app_state
        .db_client
        .get_pending_reminder_count(user.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, counting pending reminders: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total_users = if is_role(&user, UserRole::SystemAdmin) {
        let count = app_state.db_client.get_user_count().await.map_err(|e| {
            tracing::error!("DB error, getting user count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;
        Some(count)
    } else {
        None
    };

    let response = DashboardDto {
        id: user.id,
        message: welcome_message(&user),
        username: user.username,
        email: user.email,
        role: user.role,
        tracked_plant_count,
        pending_reminder_count,
        total_users,
    };

    Ok(Json(response))
}

/// The caller's `{id, username, email, role}`
#[instrument(skip(jwt), fields(username = %jwt.user.username))]
pub async fn user_info(
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(FilterUserDto::filter_user(&jwt.user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::Uri};
    use chrono::Utc;

    fn role_filter(uri: &'static str) -> Result<Option<UserRole>, String> {
        let Query(params) = Query::<UserListQueryDto>::try_from_uri(&Uri::from_static(uri)).unwrap();
        params.role_filter()
    }

    #[test]
    fn blank_role_lists_everyone() {
        assert_eq!(role_filter("/users/?role="), Ok(None));
        assert_eq!(role_filter("/users/"), Ok(None));
    }

    #[test]
    fn role_filter_accepts_labels_only() {
        assert_eq!(
            role_filter("/users/?role=System%20Admin"),
            Ok(Some(UserRole::SystemAdmin))
        );
        assert_eq!(role_filter("/users/?role=Gardener"), Ok(Some(UserRole::Gardener)));
        assert_eq!(
            role_filter("/users/?role=Admin"),
            Err("Invalid role: Admin".to_string())
        );
    }

    #[test]
    fn welcome_message_uses_role_label() {
        let user = User {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: String::new(),
            role: UserRole::SystemAdmin,
            first_name: String::new(),
            last_name: String::new(),
            is_staff: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(
            welcome_message(&user),
            "Welcome to your System Admin dashboard!"
        );
    }
}
