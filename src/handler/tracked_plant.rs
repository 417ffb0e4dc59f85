use crate::{
    AppState,
    db::TrackedPlantExt,
    dtos::{DataResponseDto, ListResponseDto, Response, TrackedPlantInputDto},
    error::{ErrorMessage, HttpError},
    extract::{AppJson, AppPath},
    middleware::JWTAuthMiddleware,
};
use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;
use validator::Validate;

/// Router for the caller's own tracked plants
///
/// Every query is filtered by the caller's id, so someone else's plant is a 404.
pub fn tracked_plant_handler() -> Router<AppState> {
    Router::new()
        .route(
            "/tracked-plants/",
            get(get_tracked_plants).post(create_tracked_plant),
        )
        .route(
            "/tracked-plants/{plant_id}/",
            get(get_tracked_plant)
                .put(update_tracked_plant)
                .delete(delete_tracked_plant),
        )
}

fn not_found() -> HttpError {
    HttpError::not_found("Tracked plant not found")
}

#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_tracked_plants(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let plants = app_state
        .db_client
        .get_tracked_plants(jwt.user.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting tracked plants: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(ListResponseDto::success(plants)))
}

#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_tracked_plant(
    AppPath(plant_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let plant = app_state
        .db_client
        .get_tracked_plant(jwt.user.id, plant_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting tracked plant: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(not_found)?;

    Ok(Json(DataResponseDto::success(plant)))
}

/// Start tracking a plant; the owner is always the caller
#[instrument(skip(app_state, jwt, body), fields(username = %jwt.user.username, name = %body.name))]
pub async fn create_tracked_plant(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
    AppJson(body): AppJson<TrackedPlantInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_tracked_plant input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let plant = app_state
        .db_client
        .create_tracked_plant(jwt.user.id, &body)
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating tracked plant: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(plant_id = plant.id, "create_tracked_plant successful");
    Ok((StatusCode::CREATED, Json(DataResponseDto::success(plant))))
}

#[instrument(skip(app_state, jwt, body), fields(username = %jwt.user.username))]
pub async fn update_tracked_plant(
    AppPath(plant_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
    AppJson(body): AppJson<TrackedPlantInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_tracked_plant input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let plant = app_state
        .db_client
        .update_tracked_plant(jwt.user.id, plant_id, &body)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating tracked plant: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(not_found)?;

    tracing::info!("update_tracked_plant successful");
    Ok(Json(DataResponseDto::success(plant)))
}

#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_tracked_plant(
    AppPath(plant_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_tracked_plant(jwt.user.id, plant_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => not_found(),
            e => {
                tracing::error!("DB error, deleting tracked plant: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("delete_tracked_plant successful");
    Ok(Json(Response {
        status: "success",
        message: "Tracked plant deleted".to_string(),
    }))
}
