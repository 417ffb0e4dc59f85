use crate::{
    AppState,
    db::{ReminderExt, ReminderWrite},
    dtos::{DataResponseDto, ListResponseDto, ReminderInputDto, Response},
    error::{ErrorMessage, HttpError},
    extract::{AppJson, AppPath},
    middleware::JWTAuthMiddleware,
    models::PlantReminder,
};
use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{Days, Local, NaiveDate};
use tracing::instrument;
use validator::Validate;

/// Days after today still counted as "upcoming"
const UPCOMING_WINDOW_DAYS: u64 = 7;

pub fn reminder_handler() -> Router<AppState> {
    Router::new()
        .route(
            "/plant-reminders/",
            get(get_reminders).post(create_reminder),
        )
        .route(
            "/plant-reminders/{reminder_id}/",
            get(get_reminder).put(update_reminder).delete(delete_reminder),
        )
        .route("/upcoming-reminders/", get(upcoming_reminders))
}

/// Inclusive `[today, today + 7]`, compared as calendar dates
fn upcoming_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = today
        .checked_add_days(Days::new(UPCOMING_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX);
    (today, end)
}

fn not_found() -> HttpError {
    HttpError::not_found("Reminder not found")
}

fn saved_or_error(outcome: ReminderWrite) -> Result<PlantReminder, HttpError> {
    match outcome {
        ReminderWrite::Saved(reminder) => Ok(reminder),
        ReminderWrite::ReminderNotFound => Err(not_found()),
        ReminderWrite::PlantNotOwned => Err(HttpError::bad_request(
            ErrorMessage::PlantNotOwned.to_string(),
        )),
    }
}

/// The caller's reminders, soonest due first
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_reminders(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let reminders = app_state
        .db_client
        .get_reminders(jwt.user.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting reminders: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(ListResponseDto::success(reminders)))
}

#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn get_reminder(
    AppPath(reminder_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let reminder = app_state
        .db_client
        .get_reminder(jwt.user.id, reminder_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting reminder: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(not_found)?;

    Ok(Json(DataResponseDto::success(reminder)))
}

/// Schedule a care task for one of the caller's tracked plants
///
/// A plant that is missing or owned by someone else is a 400 and nothing is written.
#[instrument(skip(app_state, jwt, body), fields(username = %jwt.user.username, tracked_plant = body.tracked_plant))]
pub async fn create_reminder(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
    AppJson(body): AppJson<ReminderInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_reminder input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let outcome = app_state
        .db_client
        .create_reminder(jwt.user.id, &body)
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating reminder: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let reminder = saved_or_error(outcome).inspect_err(|_| {
        tracing::warn!("create_reminder rejected: tracked plant not owned");
    })?;

    tracing::info!(reminder_id = reminder.id, "create_reminder successful");
    Ok((StatusCode::CREATED, Json(DataResponseDto::success(reminder))))
}

#[instrument(skip(app_state, jwt, body), fields(username = %jwt.user.username))]
pub async fn update_reminder(
    AppPath(reminder_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
    AppJson(body): AppJson<ReminderInputDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_reminder input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let outcome = app_state
        .db_client
        .update_reminder(jwt.user.id, reminder_id, &body)
        .await
        .map_err(|e| {
            tracing::error!("DB error, updating reminder: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let reminder = saved_or_error(outcome)?;

    tracing::info!("update_reminder successful");
    Ok(Json(DataResponseDto::success(reminder)))
}

#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_reminder(
    AppPath(reminder_id): AppPath<i64>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_reminder(jwt.user.id, reminder_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => not_found(),
            e => {
                tracing::error!("DB error, deleting reminder: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("delete_reminder successful");
    Ok(Json(Response {
        status: "success",
        message: "Reminder deleted".to_string(),
    }))
}

/// Incomplete reminders due between today and seven days from today, inclusive
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn upcoming_reminders(
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let (from, to) = upcoming_window(Local::now().date_naive());

    let reminders = app_state
        .db_client
        .get_upcoming_reminders(jwt.user.id, from, to)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting upcoming reminders: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(ListResponseDto::success(reminders)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::ReminderType,
        routes::create_router,
        test_support::{create_tracked_plant, create_user, date, start_app, start_database},
        utils::token::{self, TokenType},
    };
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use tower::ServiceExt;

    fn in_window(window: (NaiveDate, NaiveDate), date: NaiveDate) -> bool {
        window.0 <= date && date <= window.1
    }

    #[test]
    fn window_includes_today_and_day_seven_only() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 28).unwrap();
        let window = upcoming_window(today);

        assert!(in_window(window, today));
        assert!(in_window(window, NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()));
        assert!(!in_window(window, NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()));
        assert!(!in_window(window, NaiveDate::from_ymd_opt(2025, 4, 27).unwrap()));
    }

    #[test]
    fn foreign_plant_is_a_validation_error() {
        let err = saved_or_error(ReminderWrite::PlantNotOwned).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.message,
            "The specified plant does not exist or does not belong to you."
        );

        let err = saved_or_error(ReminderWrite::ReminderNotFound).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    fn reminder_due(tracked_plant: i64, due_date: NaiveDate, completed: bool) -> ReminderInputDto {
        ReminderInputDto {
            tracked_plant,
            reminder_type: ReminderType::Watering,
            due_date,
            notes: None,
            completed,
        }
    }

    #[tokio::test]
    async fn upcoming_query_honours_the_window() {
        let db = start_database().await;
        let user = create_user(&db.db_client, "gardener1", "gardener123").await;
        let basil = create_tracked_plant(&db.db_client, &user, "Basil").await;

        let today = date(2025, 4, 28);
        for (due, completed, notes) in [
            (date(2025, 4, 27), false, "yesterday"),
            (date(2025, 4, 28), false, "day 0"),
            (date(2025, 5, 1), true, "done"),
            (date(2025, 5, 5), false, "day 7"),
            (date(2025, 5, 6), false, "day 8"),
        ] {
            let mut input = reminder_due(basil.id, due, completed);
            input.notes = Some(notes.to_string());
            db.db_client.create_reminder(user.id, &input).await.unwrap();
        }

        let (from, to) = upcoming_window(today);
        let upcoming = db
            .db_client
            .get_upcoming_reminders(user.id, from, to)
            .await
            .unwrap();

        let notes: Vec<&str> = upcoming
            .iter()
            .filter_map(|reminder| reminder.notes.as_deref())
            .collect();
        assert_eq!(notes, vec!["day 0", "day 7"]);
    }

    #[tokio::test]
    async fn posting_a_reminder_for_someone_elses_plant_is_rejected() {
        let app = start_app().await;
        let db_client = &app.state.db_client;
        let alice = create_user(db_client, "alice", "alice-pass").await;
        let bob = create_user(db_client, "bob", "bob-pass").await;
        let bobs_basil = create_tracked_plant(db_client, &bob, "Basil").await;

        let access = token::create_token(
            alice.id,
            app.state.env.jwt_secret.as_bytes(),
            app.state.env.jwt_maxage,
            TokenType::Access,
        )
        .unwrap();

        let body = serde_json::json!({
            "tracked_plant": bobs_basil.id,
            "type": "Watering",
            "due_date": "2025-06-01",
        });

        let response = create_router(app.state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/plant-reminders/")
                    .header(header::AUTHORIZATION, format!("Bearer {}", access))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(db_client.get_reminders(alice.id).await.unwrap().is_empty());
        assert!(db_client.get_reminders(bob.id).await.unwrap().is_empty());
    }
}
