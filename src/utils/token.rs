//Access tokens are verified without touching storage; only refresh tokens are checked against the blacklist.
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    //sub => user_id, iat => issued at, exp => expiration, jti => token id used by the blacklist
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

impl TokenClaims {
    /// Seconds until expiry, never less than one so it can be used as a TTL.
    pub fn remaining_seconds(&self) -> i64 {
        let now = Utc::now().timestamp();
        (self.exp as i64 - now).max(1)
    }
}

pub fn create_token(
    user_id: Uuid,
    secret: &[u8],
    expires_in_seconds: i64,
    token_type: TokenType,
) -> Result<String, jsonwebtoken::errors::Error> {
    if user_id.is_nil() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::seconds(expires_in_seconds)).timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id,
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Verify signature and expiry, then make sure the token is of the expected kind.
pub fn decode_token<T: Into<String>>(
    token: T,
    secret: &[u8],
    expected: TokenType,
) -> Result<TokenClaims, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token) if token.claims.token_type == expected => Ok(token.claims),
        _ => Err(HttpError::unauthorized(ErrorMessage::InvalidToken.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn access_token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, SECRET, 60, TokenType::Access).unwrap();
        let claims = decode_token(token, SECRET, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.remaining_seconds() <= 60);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let user_id = Uuid::new_v4();
        let refresh = create_token(user_id, SECRET, 60, TokenType::Refresh).unwrap();
        let err = decode_token(refresh, SECRET, TokenType::Access).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);

        let access = create_token(user_id, SECRET, 60, TokenType::Access).unwrap();
        assert!(decode_token(access, SECRET, TokenType::Refresh).is_err());
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let user_id = Uuid::new_v4();
        // Validation allows 60s of leeway.
        let expired = create_token(user_id, SECRET, -300, TokenType::Access).unwrap();
        assert!(decode_token(expired, SECRET, TokenType::Access).is_err());

        let foreign = create_token(user_id, b"other-secret", 60, TokenType::Access).unwrap();
        assert!(decode_token(foreign, SECRET, TokenType::Access).is_err());
    }

    #[test]
    fn every_token_gets_its_own_jti() {
        let user_id = Uuid::new_v4();
        let a = create_token(user_id, SECRET, 60, TokenType::Refresh).unwrap();
        let b = create_token(user_id, SECRET, 60, TokenType::Refresh).unwrap();
        let a = decode_token(a, SECRET, TokenType::Refresh).unwrap();
        let b = decode_token(b, SECRET, TokenType::Refresh).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn nil_subject_is_refused() {
        assert!(create_token(Uuid::nil(), SECRET, 60, TokenType::Access).is_err());
    }
}
