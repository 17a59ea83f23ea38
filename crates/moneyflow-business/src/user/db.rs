//! Storage-layer user record.

use chrono::{DateTime, Utc};
use moneyflow_store::Record;
use serde::{Deserialize, Serialize};

use super::models::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserRecord {
    pub(crate) user_id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) roles: Vec<String>,
    pub(crate) password_hash: String,
    pub(crate) date_created: DateTime<Utc>,
    pub(crate) date_updated: DateTime<Utc>,
}

impl Record for UserRecord {
    const TABLE: &'static str = super::TABLE;

    fn id(&self) -> &str {
        &self.user_id
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.user_id,
            name: record.name,
            email: record.email,
            roles: record.roles,
            date_created: record.date_created,
            date_updated: record.date_updated,
        }
    }
}
