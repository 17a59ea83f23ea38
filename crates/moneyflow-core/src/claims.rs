//! Verified identity claims.
//!
//! [`Claims`] is the decoded body of a bearer token. Authorization code
//! only ever asks it two questions, [`Claims::has_role`] and
//! [`Claims::is_owner`], or their combination [`Claims::authorizes`].

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role names understood by the API.
pub mod roles {
    /// Full access to every resource.
    pub const ADMIN: &str = "ADMIN";
    /// Access to the caller's own resources.
    pub const USER: &str = "USER";

    /// Every known role.
    pub const ALL: &[&str] = &[ADMIN, USER];
}

/// Reasons a decoded claim set is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    /// `sub` is empty.
    #[error("subject is empty")]
    EmptySubject,

    /// `exp` is not in the future.
    #[error("token expired at {expired_at}")]
    Expired {
        /// When the token expired.
        expired_at: DateTime<Utc>,
    },
}

/// Identity and roles asserted by a verified token.
///
/// Field names follow the registered JWT claim names so the struct can be
/// encoded and decoded as a token payload directly.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use moneyflow_core::{roles, Claims};
///
/// let claims = Claims::new("user-1", "moneyflow", [roles::USER], Utc::now(), Duration::hours(1));
///
/// assert!(claims.has_role(roles::USER));
/// assert!(!claims.has_role(roles::ADMIN));
/// assert!(claims.is_owner("user-1"));
/// assert!(claims.authorizes(roles::ADMIN, "user-1"));
/// assert!(!claims.authorizes(roles::ADMIN, "user-2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    subject: String,
    #[serde(rename = "iss")]
    issuer: String,
    #[serde(rename = "iat")]
    issued_at: i64,
    #[serde(rename = "exp")]
    expires_at: i64,
    #[serde(default)]
    roles: BTreeSet<String>,
}

impl Claims {
    /// Creates claims valid for `ttl` from `issued_at`.
    pub fn new<I, R>(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        roles: I,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            subject: subject.into(),
            issuer: issuer.into(),
            issued_at: issued_at.timestamp(),
            expires_at: (issued_at + ttl).timestamp(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the subject, the id of the authenticated user.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the roles in sorted order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }

    /// Returns when the token was issued.
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.issued_at, 0).single()
    }

    /// Returns when the token expires.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expires_at, 0).single()
    }

    /// Returns `true` if the role set contains `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns `true` if the caller is the owner identified by `owner_id`.
    #[must_use]
    pub fn is_owner(&self, owner_id: &str) -> bool {
        !self.subject.is_empty() && self.subject == owner_id
    }

    /// The single access rule used by resource handlers: the caller holds
    /// `role` or owns the resource.
    #[must_use]
    pub fn authorizes(&self, role: &str, owner_id: &str) -> bool {
        self.has_role(role) || self.is_owner(owner_id)
    }

    /// Checks the invariants a verified token must still satisfy at `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ClaimsError> {
        if self.subject.trim().is_empty() {
            return Err(ClaimsError::EmptySubject);
        }
        if self.expires_at <= now.timestamp() {
            return Err(ClaimsError::Expired {
                expired_at: self.expires_at().unwrap_or(DateTime::<Utc>::MIN_UTC),
            });
        }
        Ok(())
    }
}
