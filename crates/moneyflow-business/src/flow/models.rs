//! API-facing income and expense types.
//!
//! Incomes and expenses share one shape; the core they pass through
//! decides which table they live in.

use chrono::{DateTime, Utc};
use moneyflow_core::{FieldErrors, Validate};
use serde::{Deserialize, Serialize};

/// A recurring money movement as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category.
    pub category: String,
    /// Currency code.
    pub currency: String,
    /// Amount of money.
    pub amount: i64,
    /// How often it repeats, in `reoccurrence_type` units.
    pub reoccurrence: i64,
    /// How long it keeps repeating, in `duration_type` units.
    pub duration: i64,
    /// Repeat unit, e.g. `Monthly`, `Daily`, `Once`.
    pub reoccurrence_type: String,
    /// Duration unit, e.g. `Months`, `Days`.
    pub duration_type: String,
    /// Owning user.
    pub user_id: String,
    /// When the record was added.
    pub date_created: DateTime<Utc>,
    /// When the record was last modified.
    pub date_updated: DateTime<Utc>,
}

/// What clients send to add an income or expense.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewFlow {
    /// Display name.
    pub name: String,
    /// Category.
    pub category: String,
    /// Currency code.
    pub currency: String,
    /// Amount; zero means unset.
    pub amount: i64,
    /// Repeat count; zero means unset.
    pub reoccurrence: i64,
    /// Duration; zero means unset.
    pub duration: i64,
    /// Repeat unit.
    pub reoccurrence_type: String,
    /// Duration unit.
    pub duration_type: String,
    /// Owning user.
    pub user_id: String,
}

/// What clients send to modify an income or expense. Absent fields are
/// left unchanged; the owner cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateFlow {
    /// New display name.
    pub name: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New currency code.
    pub currency: Option<String>,
    /// New amount.
    pub amount: Option<i64>,
    /// New repeat count.
    pub reoccurrence: Option<i64>,
    /// New duration.
    pub duration: Option<i64>,
    /// New repeat unit.
    pub reoccurrence_type: Option<String>,
    /// New duration unit.
    pub duration_type: Option<String>,
}

fn validate_counts(errors: &mut FieldErrors, amount: i64, reoccurrence: i64, duration: i64) {
    errors.min_if_set("amount", amount, 1);
    errors.min_if_set("reoccurrence", reoccurrence, 1);
    errors.min_if_set("duration", duration, 1);
}

impl Validate for NewFlow {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.require("name", &self.name);
        errors.require("category", &self.category);
        errors.require("currency", &self.currency);
        errors.require("user_id", &self.user_id);
        validate_counts(errors, self.amount, self.reoccurrence, self.duration);
    }
}

impl Validate for UpdateFlow {
    fn validate(&self, errors: &mut FieldErrors) {
        for (field, value) in [
            ("name", &self.name),
            ("category", &self.category),
            ("currency", &self.currency),
        ] {
            if let Some(value) = value {
                errors.require(field, value);
            }
        }
        validate_counts(
            errors,
            self.amount.unwrap_or_default(),
            self.reoccurrence.unwrap_or_default(),
            self.duration.unwrap_or_default(),
        );
    }
}
