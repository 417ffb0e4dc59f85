use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    models::{PlantReminder, TrackedPlant, User, UserProfile, UserRole},
    utils::token::TokenClaims,
};

/// Anything that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for UserProfile {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for TrackedPlant {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for PlantReminder {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for TokenClaims {
    fn owner_id(&self) -> Uuid {
        self.sub
    }
}

pub fn is_role(user: &User, role: UserRole) -> bool {
    user.role == role
}

/// Fails with 403 unless `record` belongs to `user`.
pub fn assert_owned_by<R: Owned>(record: &R, user: &User) -> Result<(), HttpError> {
    if record.owner_id() == user.id {
        Ok(())
    } else {
        Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            username: "gardener1".to_string(),
            email: "gardener1@example.com".to_string(),
            password: String::new(),
            role,
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_passes_and_stranger_is_forbidden() {
        let owner = user(UserRole::Gardener);
        let stranger = user(UserRole::SystemAdmin);
        let profile = UserProfile {
            user_id: owner.id,
            ..Default::default()
        };

        assert!(assert_owned_by(&profile, &owner).is_ok());
        let err = assert_owned_by(&profile, &stranger).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn is_role_compares_enum_values() {
        let admin = user(UserRole::SystemAdmin);
        assert!(is_role(&admin, UserRole::SystemAdmin));
        assert!(!is_role(&admin, UserRole::Supervisor));
    }
}
