use axum::extract::{FromRequest, FromRequestParts};

use crate::error::HttpError;

/// `axum::Json` whose rejection is an `HttpError`, so malformed bodies get
/// the same `{"status": "fail", "error": ...}` shape as every other error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(HttpError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(HttpError))]
pub struct AppPath<T>(pub T);
