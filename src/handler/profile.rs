use crate::{
    AppState,
    db::ProfileExt,
    dtos::{FilterUserDto, ProfileResponseDto, ProfileUpdateDto},
    error::{ErrorMessage, HttpError},
    extract::AppJson,
    middleware::JWTAuthMiddleware,
    models::{User, UserProfile},
    utils::access::assert_owned_by,
};
use axum::{
    Extension, Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, put},
};
use tracing::instrument;
use validator::Validate;

pub fn profile_handler() -> Router<AppState> {
    Router::new()
        .route("/profile/", get(get_profile))
        .route("/profile/update/", put(update_profile))
}

async fn load_profile(app_state: &AppState, user: &User) -> Result<UserProfile, HttpError> {
    let profile = app_state
        .db_client
        .get_or_create_profile(user.id, &user.username)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting profile: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    assert_owned_by(&profile, user)?;
    Ok(profile)
}

/// The caller's profile, created with defaults on first access
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_profile(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = load_profile(&app_state, &jwt.user).await?;

    Ok(Json(ProfileResponseDto {
        user: FilterUserDto::filter_user(&jwt.user),
        profile,
    }))
}

/// Sparse update of the caller's profile (see `ProfileUpdateDto`)
#[instrument(skip(app_state, jwt, body), fields(username = %jwt.user.username))]
pub async fn update_profile(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
    AppJson(body): AppJson<ProfileUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_profile input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;
    body.validate_lists().map_err(|e| {
        tracing::error!("Invalid preferred_plant_types: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let mut profile = load_profile(&app_state, &jwt.user).await?;
    body.apply(&mut profile);

    let profile = app_state
        .db_client
        .save_profile(&profile)
        .await
        .map_err(|e| {
            tracing::error!("DB error, saving profile: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("update_profile successful");
    Ok(Json(ProfileResponseDto {
        user: FilterUserDto::filter_user(&jwt.user),
        profile,
    }))
}
