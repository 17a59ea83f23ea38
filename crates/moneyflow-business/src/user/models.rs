//! API-facing user types.

use chrono::{DateTime, Utc};
use moneyflow_core::{roles, FieldErrors, Validate};
use serde::{Deserialize, Serialize};

/// A user as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// Granted roles.
    pub roles: Vec<String>,
    /// When the user was added.
    pub date_created: DateTime<Utc>,
    /// When the user was last modified.
    pub date_updated: DateTime<Utc>,
}

/// What clients send to add a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Roles to grant.
    pub roles: Vec<String>,
    /// Login password; only its hash is stored.
    pub password: String,
    /// Must repeat `password`.
    pub password_confirm: String,
}

/// What clients send to modify a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateUser {
    /// New display name.
    pub name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// Replacement role set.
    pub roles: Option<Vec<String>>,
    /// New login password.
    pub password: Option<String>,
    /// Must repeat `password` when it is set.
    pub password_confirm: Option<String>,
}

fn validate_password(errors: &mut FieldErrors, password: &str, confirm: &str) {
    errors.require("password", password);
    if password != confirm {
        errors.add("password_confirm", "password_confirm must match password");
    }
}

fn validate_roles(errors: &mut FieldErrors, granted: &[String]) {
    if granted.is_empty() {
        errors.add("roles", "roles is a required field");
    }
    for role in granted {
        errors.one_of("roles", role, roles::ALL);
    }
}

impl Validate for NewUser {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.require("name", &self.name);
        errors.email("email", &self.email);
        validate_roles(errors, &self.roles);
        validate_password(errors, &self.password, &self.password_confirm);
    }
}

impl Validate for UpdateUser {
    fn validate(&self, errors: &mut FieldErrors) {
        if let Some(name) = &self.name {
            errors.require("name", name);
        }
        if let Some(email) = &self.email {
            errors.email("email", email);
        }
        if let Some(granted) = &self.roles {
            validate_roles(errors, granted);
        }
        if let Some(password) = &self.password {
            validate_password(
                errors,
                password,
                self.password_confirm.as_deref().unwrap_or_default(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_rules() {
        let mut errors = FieldErrors::new();
        NewUser::default().validate(&mut errors);
        assert!(errors.contains("name"));
        assert!(errors.contains("email"));
        assert!(errors.contains("roles"));
        assert!(errors.contains("password"));

        let mut errors = FieldErrors::new();
        NewUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            roles: vec!["ADMIN".into(), "ROOT".into()],
            password: "gophers".into(),
            password_confirm: "gophers".into(),
        }
        .validate(&mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("roles"));

        let mut errors = FieldErrors::new();
        NewUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            roles: vec!["USER".into()],
            password: "gophers".into(),
            password_confirm: "gopher".into(),
        }
        .validate(&mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("password_confirm"));
    }

    #[test]
    fn test_update_user_checks_present_fields_only() {
        let mut errors = FieldErrors::new();
        UpdateUser::default().validate(&mut errors);
        assert!(errors.is_empty());

        let mut errors = FieldErrors::new();
        UpdateUser {
            email: Some("not-an-email".into()),
            roles: Some(vec![]),
            ..UpdateUser::default()
        }
        .validate(&mut errors);
        assert!(errors.contains("email"));
        assert!(errors.contains("roles"));
        assert!(!errors.contains("name"));
        assert!(!errors.contains("password"));

        let mut errors = FieldErrors::new();
        UpdateUser {
            password: Some("new secret".into()),
            ..UpdateUser::default()
        }
        .validate(&mut errors);
        assert!(errors.contains("password_confirm"));
    }
}
