use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::IntoResponse,
};

use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    db::UserExt,
    error::{ErrorMessage, HttpError},
    models::User,
    utils::token::{self, TokenType},
};

/// Middleware extension that stores the authenticated user
///
/// Inserted into the request extensions after successful authentication.
/// Handlers behind the middleware extract it with
/// `Extension(auth): Extension<JWTAuthMiddleware>`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddleware {
    pub user: User,
}

/// Pick the access token: `access_token` cookie first, then
/// `Authorization: Bearer <token>`.
fn extract_token(cookie_jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    cookie_jar
        .get("access_token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_owned())
        })
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that validates access tokens
///
/// 1. Extracts the token from the cookie or the Authorization header
/// 2. Verifies signature, expiry and that it is an *access* token
/// 3. Loads the user, who must still exist and be active
/// 4. Attaches the user to the request extensions
///
/// # Errors
/// 401 Unauthorized if no token is provided, the token is invalid or expired,
/// or the user no longer exists or was deactivated.
pub async fn auth(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = extract_token(&cookie_jar, req.headers())
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let claims = token::decode_token(
        token,
        app_state.env.jwt_secret.as_bytes(),
        TokenType::Access,
    )?;

    let user = app_state
        .db_client
        .get_user(Some(claims.sub), None, None)
        .await
        .map_err(|e| {
            tracing::error!("DB error while loading user {}: {}", claims.sub, e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let user = user
        .filter(|user| user.is_active)
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    req.extensions_mut().insert(JWTAuthMiddleware { user });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn bearer_header_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        let token = extract_token(&CookieJar::new(), &headers);
        assert_eq!(token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        let jar = CookieJar::new().add(Cookie::new("access_token", "from-cookie"));
        let token = extract_token(&jar, &headers);
        assert_eq!(token.as_deref(), Some("from-cookie"));
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(extract_token(&CookieJar::new(), &headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&CookieJar::new(), &headers), None);
    }
}
