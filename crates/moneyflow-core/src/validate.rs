//! Validation collaborators.
//!
//! Resource types implement [`Validate`] by pushing one [`FieldError`] per
//! broken rule; [`check`] turns a non-empty set into
//! [`ApiError::Validation`]. Identifier parsing lives in [`check_id`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON name of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub error: String,
}

/// An ordered set of field-level validation failures.
///
/// Serializes as a JSON array of `{"field", "error"}` objects.
///
/// # Example
///
/// ```
/// use moneyflow_core::FieldErrors;
///
/// let mut errors = FieldErrors::new();
/// errors.require("name", "");
/// errors.min_if_set("amount", 0, 1);
/// errors.min_if_set("duration", -4, 1);
///
/// assert_eq!(errors.len(), 2);
/// assert_eq!(errors.iter().next().unwrap().field, "name");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`.
    pub fn add(&mut self, field: impl Into<String>, error: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            error: error.into(),
        });
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates over failures in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Returns `true` if `field` has at least one failure.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Fails `field` when `value` is blank.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{field} is a required field"));
        }
    }

    /// Fails `field` when a non-zero `value` is below `min`.
    ///
    /// Zero means "not provided" for optional numeric fields.
    pub fn min_if_set(&mut self, field: &str, value: i64, min: i64) {
        if value != 0 && value < min {
            self.add(field, format!("{field} must be {min} or greater"));
        }
    }

    /// Fails `field` when `value` does not look like an email address.
    pub fn email(&mut self, field: &str, value: &str) {
        let valid = value
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            self.add(field, format!("{field} must be a valid email address"));
        }
    }

    /// Fails `field` when `value` is not one of `allowed`.
    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) {
        if !allowed.contains(&value) {
            self.add(
                field,
                format!("{field} must be one of [{}]", allowed.join(" ")),
            );
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", e.field, e.error)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Types that carry field-level rules.
pub trait Validate {
    /// Records every broken rule into `errors`.
    fn validate(&self, errors: &mut FieldErrors);
}

/// Runs `value`'s rules, failing with [`ApiError::Validation`] if any break.
pub fn check<T: Validate + ?Sized>(value: &T) -> ApiResult<()> {
    let mut errors = FieldErrors::new();
    value.validate(&mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

/// Parses a resource identifier, failing with [`ApiError::InvalidId`].
pub fn check_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::invalid_id("ID is not in its proper form"))
}

/// Generates a fresh resource identifier.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
