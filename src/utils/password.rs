use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use std::sync::LazyLock;

use crate::error::ErrorMessage;

/// Maximum allowed password length in characters
///
/// Argon2 is intentionally slow; an unbounded input lets a client burn CPU.
const MAX_PASSWORD_LENGTH: usize = 64;

/// Hash a password using Argon2id with a random salt
///
/// The output is a PHC string (`$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`)
/// that carries algorithm, parameters and salt, so it is the only thing that
/// needs to be stored. Each call produces a different hash for the same input.
pub fn hash(password: impl Into<String>) -> Result<String, ErrorMessage> {
    let password = password.into();

    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let salt = SaltString::generate(&mut OsRng);

    let hashed_password = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| ErrorMessage::HashingError)?
        .to_string();

    Ok(hashed_password)
}

/// Verify a password against a stored PHC hash
///
/// Verification re-hashes with the salt and parameters parsed from the
/// stored string and compares in constant time.
///
/// # Returns
/// - `Ok(true)`: password matches
/// - `Ok(false)`: password doesn't match
/// - `Err(ErrorMessage)`: empty/oversized input or corrupt hash
pub fn compare(password: &str, hashed_password: &str) -> Result<bool, ErrorMessage> {
    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let parsed_hash =
        PasswordHash::new(hashed_password).map_err(|_| ErrorMessage::InvalidHashFormat)?;

    let password_matched = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();

    Ok(password_matched)
}

static THROWAWAY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash("not-a-real-account").ok());

/// Run one Argon2 verification against a throwaway hash.
///
/// Login calls this when there is no stored hash to check, keeping the
/// unknown-account path as slow as a wrong password.
pub fn compare_throwaway(password: &str) {
    if let Some(hashed) = THROWAWAY_HASH.as_deref() {
        let _ = compare(password, hashed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_compare() {
        let hashed = hash("gardener123").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(compare("gardener123", &hashed).unwrap());
        assert!(!compare("gardener124", &hashed).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        assert_ne!(hash("basil-pesto").unwrap(), hash("basil-pesto").unwrap());
    }

    #[test]
    fn rejects_empty_and_oversized_passwords() {
        assert_eq!(hash(""), Err(ErrorMessage::EmptyPassword));
        let long = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert_eq!(
            hash(long.clone()),
            Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH))
        );
        assert_eq!(
            compare(&long, "$argon2id$whatever"),
            Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH))
        );
    }

    #[test]
    fn corrupt_hash_is_reported() {
        assert_eq!(
            compare("gardener123", "not-a-phc-string"),
            Err(ErrorMessage::InvalidHashFormat)
        );
    }

    #[test]
    fn throwaway_hash_is_a_real_argon2_hash() {
        let hashed = THROWAWAY_HASH.as_deref().unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(!compare("gardener123", hashed).unwrap());
        compare_throwaway("gardener123");
        compare_throwaway("");
    }
}
