use std::path::Path;

use crate::{
    AppState,
    db::{PlantExt, PlantFilter},
    dtos::{
        DataResponseDto, PaginationDto, PlantInputDto, PlantQueryParams,
        PlantsPaginationResponseDto, Response, UploadResponse, page_offset, parse_choice,
    },
    error::{ErrorMessage, HttpError},
    extract::{AppJson, AppPath, AppQuery},
    middleware::JWTAuthMiddleware,
    models::{Choice, PlantCategory, SoilType, Sunlight, WateringSchedule},
};
use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Map, Value};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const PLANT_IMAGE_DIR: &str = "plant_images";
const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Router for the plant catalog
///
/// Static option routes are registered next to `/plants/{plant_id}/`; the
/// router prefers the literal segment.
pub fn plant_handler() -> Router<AppState> {
    Router::new()
        .route("/plants/", get(get_plants).post(create_plant))
        .route("/plants/categories/", get(categories))
        .route("/plants/soil-types/", get(soil_types))
        .route("/plants/sunlight-options/", get(sunlight_options))
        .route("/plants/watering-options/", get(watering_options))
        .route(
            "/plants/{plant_id}/",
            get(get_plant).put(update_plant).delete(delete_plant),
        )
        .route(
            "/plants/{plant_id}/image/",
            // multipart framing on top of the image itself
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
}

/// `{value: label}` for every variant of a closed enum
fn choices_map<C: Choice>() -> Map<String, Value> {
    C::ALL
        .iter()
        .map(|choice| {
            (
                choice.value().to_string(),
                Value::String(choice.label().to_string()),
            )
        })
        .collect()
}

pub async fn categories() -> impl IntoResponse {
    Json(choices_map::<PlantCategory>())
}

pub async fn soil_types() -> impl IntoResponse {
    Json(choices_map::<SoilType>())
}

pub async fn sunlight_options() -> impl IntoResponse {
    Json(choices_map::<Sunlight>())
}

pub async fn watering_options() -> impl IntoResponse {
    Json(choices_map::<WateringSchedule>())
}

fn multipart_error(e: MultipartError) -> HttpError {
    tracing::error!("Multipart error: {}", e);
    HttpError::new(e.body_text(), e.status())
}

/// File extension for an uploaded image, `None` unless the content type is `image/*`.
fn image_extension(content_type: &str) -> Option<String> {
    let subtype = content_type.strip_prefix("image/")?;
    let subtype = subtype.split(';').next().unwrap_or_default().trim();

    let extension = match subtype {
        "jpeg" | "pjpeg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        other => other
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(10)
            .collect::<String>()
            .to_ascii_lowercase(),
    };

    if extension.is_empty() {
        None
    } else {
        Some(extension)
    }
}

/// Catalog listing with optional filters and stable pagination
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_plants(
    AppQuery(query_params): AppQuery<PlantQueryParams>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate().map_err(|e| {
        tracing::error!("Invalid get_plants input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let filter = PlantFilter {
        q: query_params.q.as_deref(),
        category: parse_choice("category", query_params.category.as_deref())
            .map_err(HttpError::bad_request)?,
        soil_type: parse_choice("soil_type", query_params.soil_type.as_deref())
            .map_err(HttpError::bad_request)?,
        sunlight: parse_choice("sunlight", query_params.sunlight.as_deref())
            .map_err(HttpError::bad_request)?,
        watering_schedule: parse_choice(
            "watering_schedule",
            query_params.watering_schedule.as_deref(),
        )
        .map_err(HttpError::bad_request)?,
    };

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = page_offset(page, limit).ok_or_else(|| {
        tracing::error!(page, limit, "Page out of range");
        HttpError::bad_request("Page out of range")
    })?;

    let plants = app_state
        .db_client
        .get_plants(&filter, limit, offset)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting plants: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_plant_count(&filter)
        .await
        .map_err(|e| {
            tracing::error!("DB error, counting plants: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(PlantsPaginationResponseDto {
        status: "success".to_string(),
        data: plants,
        pagination: PaginationDto::new(page, limit, total),
    }))
}

#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_plant(
    AppPath(plant_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let plant = app_state
        .db_client
        .get_plant(plant_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting plant: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Plant not found"))?;

    Ok(Json(DataResponseDto::success(plant)))
}

// TODO: catalog writes are open to every role; restrict them to System Admin.
#[instrument(skip(app_state, jwt, body), fields(username = %jwt.user.username, name = %body.name))]
pub async fn create_plant(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
    AppJson(body): AppJson<PlantInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_plant input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let plant = app_state.db_client.create_plant(&body).await.map_err(|e| {
        tracing::error!("DB error, creating plant: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    tracing::info!(plant_id = plant.id, "create_plant successful");
    Ok((StatusCode::CREATED, Json(DataResponseDto::success(plant))))
}

#[instrument(skip(app_state, jwt, body), fields(username = %jwt.user.username))]
pub async fn update_plant(
    AppPath(plant_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
    AppJson(body): AppJson<PlantInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_plant input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let plant = app_state
        .db_client
        .update_plant(plant_id, &body)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating plant: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Plant not found"))?;

    tracing::info!("update_plant successful");
    Ok(Json(DataResponseDto::success(plant)))
}

#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_plant(
    AppPath(plant_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_plant(plant_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => HttpError::not_found("Plant not found"),
            e => {
                tracing::error!("DB error, deleting plant: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("delete_plant successful");
    Ok(Json(Response {
        status: "success",
        message: "Plant deleted".to_string(),
    }))
}

/// Store an uploaded image (multipart field `image`) and attach it to the plant
///
/// The file lands in `MEDIA_ROOT/plant_images/<uuid>.<ext>`; the plant keeps
/// the path relative to the media root, served under `/media/`.
#[instrument(skip(app_state, jwt, multipart), fields(username = %jwt.user.username))]
pub async fn upload_image(
    AppPath(plant_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let existing = app_state
        .db_client
        .get_plant(plant_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting plant: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Plant not found"))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }

        let extension = field
            .content_type()
            .and_then(image_extension)
            .ok_or_else(|| HttpError::bad_request("Uploaded file must be an image"))?;

        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((extension, data));
        break;
    }

    let (extension, data) =
        upload.ok_or_else(|| HttpError::bad_request("Multipart field 'image' is required"))?;

    if data.is_empty() {
        return Err(HttpError::bad_request("Uploaded image is empty"));
    }
    if data.len() > MAX_IMAGE_BYTES {
        return Err(HttpError::bad_request("Image must not be larger than 5 MiB"));
    }

    let media_root = Path::new(&app_state.env.media_root);
    let relative_path = format!("{}/{}.{}", PLANT_IMAGE_DIR, Uuid::new_v4(), extension);

    tokio::fs::create_dir_all(media_root.join(PLANT_IMAGE_DIR))
        .await
        .map_err(|e| {
            tracing::error!("Failed to create image directory: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tokio::fs::write(media_root.join(&relative_path), &data)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write image: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let plant = app_state
        .db_client
        .set_plant_image(plant_id, &relative_path)
        .await
        .map_err(|e| {
            tracing::error!("DB error, saving plant image: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Plant not found"))?;

    if let Some(previous) = existing.image.filter(|previous| previous != &relative_path) {
        if let Err(e) = tokio::fs::remove_file(media_root.join(&previous)).await {
            tracing::warn!(previous = %previous, "Failed to remove replaced image: {}", e);
        }
    }

    tracing::info!(plant_id, bytes = data.len(), "upload_image successful");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            location: format!("/media/{}", relative_path),
            data: plant,
        }),
    ))
}
