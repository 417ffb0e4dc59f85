use crate::{
    AppState,
    db::UserExt,
    dtos::{
        LoginUserDto, RefreshResponseDto, RefreshTokenDto, RegisterResponseDto, RegisterUserDto,
        Response, UserLoginResponseDto,
    },
    error::{ErrorMessage, HttpError},
    extract::AppJson,
    middleware::JWTAuthMiddleware,
    models::{Choice, UserRole},
    utils::{
        access::assert_owned_by,
        password,
        token::{self, TokenType},
    },
};
use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::instrument;
use validator::Validate;

/// Routes reachable without an access token
pub fn auth_handler() -> Router<AppState> {
    Router::new()
        .route("/register/", post(register))
        .route("/login/", post(login))
        .route("/token/refresh/", post(refresh))
}

/// Routes that sit behind the auth middleware
pub fn session_handler() -> Router<AppState> {
    Router::new().route("/logout/", post(logout))
}

fn token_cookie(name: &'static str, value: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .max_age(time::Duration::seconds(max_age_seconds))
        .http_only(true)
        .secure(true)
        .build()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build()
}

fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) -> Result<(), HttpError> {
    let value = HeaderValue::from_str(&cookie.to_string()).map_err(|e| {
        tracing::error!("Invalid Set-Cookie header: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;
    headers.append(header::SET_COOKIE, value);
    Ok(())
}

/// Refresh token from the JSON body (`{"refresh": "..."}`) or, failing that,
/// the `refresh_token` cookie. An empty body is allowed.
fn refresh_token_from(cookie_jar: &CookieJar, body: &Bytes) -> Result<Option<String>, HttpError> {
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshTokenDto>(body)
            .map_err(|e| HttpError::bad_request(format!("Invalid request body: {}", e)))?
            .refresh
    };

    Ok(from_body
        .or_else(|| {
            cookie_jar
                .get("refresh_token")
                .map(|cookie| cookie.value().to_string())
        })
        .filter(|token| !token.trim().is_empty()))
}

/// Create a user account
///
/// Body: `{username, email, password, role}`; role must be one of the four
/// canonical labels. Username and email are unique (409 otherwise).
#[instrument(skip(app_state, body), fields(username = %body.username, email = %body.email))]
pub async fn register(
    State(app_state): State<AppState>,
    AppJson(body): AppJson<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    if body.has_missing_fields() {
        return Err(HttpError::bad_request(
            ErrorMessage::MissingRegistrationFields.to_string(),
        ));
    }

    let role = UserRole::parse(body.role.trim()).ok_or_else(|| {
        tracing::error!(role = %body.role, "Unknown role at registration");
        HttpError::bad_request(ErrorMessage::InvalidRole.to_string())
    })?;

    body.validate().map_err(|e| {
        tracing::error!("Invalid register input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let hash_password = password::hash(&body.password).map_err(|e| {
        tracing::error!("Password hashing error: {}", e);
        match e {
            ErrorMessage::HashingError => {
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            e => HttpError::bad_request(e.to_string()),
        }
    })?;

    let result = app_state
        .db_client
        .save_user(
            body.username.trim(),
            body.email.trim(),
            hash_password.as_str(),
            role,
            body.first_name.as_deref().unwrap_or_default(),
            body.last_name.as_deref().unwrap_or_default(),
        )
        .await;

    match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %role.to_str(), "Register Successful");
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponseDto {
                    status: "success".to_string(),
                    message: "User registered successfully".to_string(),
                    user_id: user.id,
                }),
            ))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::error!("DB error, saving user, unique_violation: {}", db_err);
            let message = match db_err.constraint() {
                Some("users_username_key") => ErrorMessage::UsernameExists,
                _ => ErrorMessage::EmailExists,
            };
            Err(HttpError::unique_constraint_violation(message.to_string()))
        }
        Err(e) => {
            tracing::error!("DB error, saving user: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

/// Exchange email + password for an access/refresh token pair
///
/// Unknown email, wrong password and deactivated account all produce the
/// same "Invalid credentials" response.
#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn login(
    State(app_state): State<AppState>,
    AppJson(body): AppJson<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(HttpError::bad_request(
            "Please provide both email and password",
        ));
    }

    let user = app_state
        .db_client
        .get_user(None, None, Some(body.email.trim()))
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let invalid_credentials = || HttpError::unauthorized(ErrorMessage::InvalidCredentials.to_string());

    let Some(user) = user.filter(|user| user.is_active) else {
        password::compare_throwaway(&body.password);
        tracing::warn!("Login failed: no active user for email");
        return Err(invalid_credentials());
    };

    let password_matched = password::compare(&body.password, &user.password).unwrap_or_else(|e| {
        tracing::warn!(user_id = %user.id, "Password comparison error: {}", e);
        false
    });

    if !password_matched {
        tracing::warn!(user_id = %user.id, "Login failed: password mismatch");
        return Err(invalid_credentials());
    }

    let secret = app_state.env.jwt_secret.as_bytes();

    let access_token = token::create_token(
        user.id,
        secret,
        app_state.env.jwt_maxage,
        TokenType::Access,
    )
    .map_err(|e| {
        tracing::error!("Access token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let refresh_token = token::create_token(
        user.id,
        secret,
        app_state.env.refresh_token_maxage,
        TokenType::Refresh,
    )
    .map_err(|e| {
        tracing::error!("Refresh token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let mut headers = HeaderMap::new();
    append_cookie(
        &mut headers,
        token_cookie(
            "access_token",
            access_token.clone(),
            app_state.env.jwt_maxage,
        ),
    )?;
    append_cookie(
        &mut headers,
        token_cookie(
            "refresh_token",
            refresh_token.clone(),
            app_state.env.refresh_token_maxage,
        ),
    )?;

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        access: access_token,
        refresh: refresh_token,
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
    })
    .into_response();
    response.headers_mut().extend(headers);

    tracing::info!(user_id = %user.id, "Login Successful");
    Ok(response)
}

/// Mint a new access token from a refresh token that is valid and not blacklisted
#[instrument(skip(app_state, cookie_jar, body))]
pub async fn refresh(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let token = refresh_token_from(&cookie_jar, &body)?.ok_or_else(|| {
        tracing::error!("Refresh token not provided");
        HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string())
    })?;

    let claims = token::decode_token(
        token,
        app_state.env.jwt_secret.as_bytes(),
        TokenType::Refresh,
    )?;

    let blacklisted = app_state
        .redis_client
        .is_refresh_token_blacklisted(&claims.jti)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, checking blacklist: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if blacklisted {
        tracing::warn!(user_id = %claims.sub, "Blacklisted refresh token presented");
        return Err(HttpError::unauthorized(
            ErrorMessage::InvalidToken.to_string(),
        ));
    }

    let user = app_state
        .db_client
        .get_user(Some(claims.sub), None, None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .filter(|user| user.is_active)
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    let access_token = token::create_token(
        user.id,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
        TokenType::Access,
    )
    .map_err(|e| {
        tracing::error!("Access token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let mut headers = HeaderMap::new();
    append_cookie(
        &mut headers,
        token_cookie(
            "access_token",
            access_token.clone(),
            app_state.env.jwt_maxage,
        ),
    )?;

    let mut response = Json(RefreshResponseDto {
        status: "success".to_string(),
        access: access_token,
    })
    .into_response();
    response.headers_mut().extend(headers);

    tracing::info!(user_id = %user.id, "Access token refreshed successfully");
    Ok(response)
}

/// Blacklist the caller's refresh token and clear both cookies
///
/// The token must belong to the caller (403 otherwise); a token that cannot
/// be decoded is a 400 "Invalid token".
#[instrument(skip(app_state, jwt, cookie_jar, body), fields(username = %jwt.user.username))]
pub async fn logout(
    cookie_jar: CookieJar,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let token = refresh_token_from(&cookie_jar, &body)?
        .ok_or_else(|| HttpError::bad_request("Refresh token is required"))?;

    let claims = token::decode_token(
        token,
        app_state.env.jwt_secret.as_bytes(),
        TokenType::Refresh,
    )
    .map_err(|_| HttpError::bad_request("Invalid token"))?;

    assert_owned_by(&claims, &jwt.user)?;

    app_state
        .redis_client
        .blacklist_refresh_token(&claims.jti, claims.remaining_seconds())
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, blacklisting refresh token: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let mut headers = HeaderMap::new();
    append_cookie(&mut headers, expired_cookie("access_token"))?;
    append_cookie(&mut headers, expired_cookie("refresh_token"))?;

    let mut response = Json(Response {
        status: "success",
        message: "Logout successful".to_string(),
    })
    .into_response();
    response.headers_mut().extend(headers);

    tracing::info!("logout successful");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        routes::create_router,
        test_support::{TestApp, create_user, start_app},
    };
    use axum::{body::Body, http::Request};
    use serde_json::json;
    use tower::ServiceExt;

    #[test]
    fn body_token_wins_over_cookie() {
        let jar = CookieJar::new().add(Cookie::new("refresh_token", "from-cookie"));
        let body = Bytes::from_static(br#"{"refresh": "from-body"}"#);
        let token = refresh_token_from(&jar, &body).unwrap();
        assert_eq!(token.as_deref(), Some("from-body"));
    }

    #[test]
    fn empty_body_falls_back_to_cookie() {
        let jar = CookieJar::new().add(Cookie::new("refresh_token", "from-cookie"));
        let token = refresh_token_from(&jar, &Bytes::new()).unwrap();
        assert_eq!(token.as_deref(), Some("from-cookie"));

        let token = refresh_token_from(&CookieJar::new(), &Bytes::from_static(b"{}")).unwrap();
        assert_eq!(token, None);
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let err = refresh_token_from(&CookieJar::new(), &Bytes::from_static(b"not json"))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        let cookie = expired_cookie("refresh_token");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }

    async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> (StatusCode, Bytes) {
        let response = create_router(app.state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    #[tokio::test]
    async fn second_registration_with_same_email_conflicts() {
        let app = start_app().await;

        let (status, _) = post_json(
            &app,
            "/api/register/",
            json!({"username": "gardener1", "email": "grow@example.com",
                   "password": "gardener123", "role": "Gardener"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = post_json(
            &app,
            "/api/register/",
            json!({"username": "gardener2", "email": "grow@example.com",
                   "password": "gardener123", "role": "Gardener"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], ErrorMessage::EmailExists.to_string());

        let (status, _) = post_json(
            &app,
            "/api/register/",
            json!({"username": "gardener1", "email": "other@example.com",
                   "password": "gardener123", "role": "Gardener"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let app = start_app().await;
        create_user(&app.state.db_client, "homeowner1", "homeowner123").await;

        let (wrong_status, wrong_body) = post_json(
            &app,
            "/api/login/",
            json!({"email": "homeowner1@example.com", "password": "not-my-password"}),
        )
        .await;
        let (unknown_status, unknown_body) = post_json(
            &app,
            "/api/login/",
            json!({"email": "nobody@example.com", "password": "not-my-password"}),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);

        let (status, body) = post_json(
            &app,
            "/api/login/",
            json!({"email": "homeowner1@example.com", "password": "homeowner123"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["username"], "homeowner1");
    }
}
