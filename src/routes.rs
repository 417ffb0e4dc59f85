use axum::{Router, middleware};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    AppState,
    handler::{
        auth::{auth_handler, session_handler},
        plant::plant_handler,
        profile::profile_handler,
        reminder::reminder_handler,
        tracked_plant::tracked_plant_handler,
        users::users_handler,
    },
    middleware::auth,
};

pub fn create_router(app_state: AppState) -> Router {
    // everything except register/login/refresh needs an access token
    let protected = Router::new()
        .merge(session_handler())
        .merge(profile_handler())
        .merge(users_handler())
        .merge(plant_handler())
        .merge(tracked_plant_handler())
        .merge(reminder_handler())
        .layer(middleware::from_fn_with_state(app_state.clone(), auth));

    let api_route = Router::new()
        .merge(auth_handler())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state.clone());

    Router::new()
        .nest("/api", api_route)
        .nest_service("/media", ServeDir::new(&app_state.env.media_root))
}
