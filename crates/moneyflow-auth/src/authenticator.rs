//! Token verification and signing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, encode, Header, Validation};
use moneyflow_core::Claims;

use crate::error::AuthError;
use crate::keys::KeyStore;

/// Verifies bearer tokens and produces [`Claims`].
///
/// Verification is purely local: key lookup by `kid`, signature check,
/// issuer check, then the claim invariants at the current time. The
/// authenticator holds no mutable state and is shared behind an `Arc`.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use moneyflow_auth::{Authenticator, KeyStore};
/// use moneyflow_core::{roles, Claims};
///
/// let mut keys = KeyStore::new();
/// keys.add_secret("k1", b"0123456789abcdef0123456789abcdef");
/// let auth = Authenticator::new("k1", keys, "moneyflow").unwrap();
///
/// let claims = Claims::new("user-1", "moneyflow", [roles::USER], Utc::now(), Duration::hours(1));
/// let token = auth.generate_token(&claims).unwrap();
///
/// let verified = auth.authenticate(&token).unwrap();
/// assert_eq!(verified.subject(), "user-1");
/// assert!(auth.authenticate("garbage").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Authenticator {
    active_kid: String,
    keys: KeyStore,
    issuer: String,
}

impl Authenticator {
    /// Creates an authenticator that signs with `active_kid`.
    pub fn new(
        active_kid: impl Into<String>,
        keys: KeyStore,
        issuer: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let active_kid = active_kid.into();
        if !keys.contains(&active_kid) {
            return Err(AuthError::UnknownKey(active_kid));
        }
        Ok(Self {
            active_kid,
            keys,
            issuer: issuer.into(),
        })
    }

    /// Returns the key id used for signing.
    #[must_use]
    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    /// Returns the issuer every token must carry.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Signs `claims` with the active key.
    pub fn generate_token(&self, claims: &Claims) -> Result<String, AuthError> {
        let entry = self
            .keys
            .get(&self.active_kid)
            .ok_or_else(|| AuthError::UnknownKey(self.active_kid.clone()))?;
        let signing = entry
            .encoding
            .as_ref()
            .ok_or_else(|| AuthError::UnknownKey(self.active_kid.clone()))?;

        let mut header = Header::new(entry.algorithm);
        header.kid = Some(self.active_kid.clone());
        Ok(encode(&header, claims, signing)?)
    }

    /// Verifies `token` against the current time.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        self.authenticate_at(token, Utc::now())
    }

    /// Verifies `token` as of `now`.
    ///
    /// Tokens without a `kid` header are checked against the active key.
    pub fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.as_deref().unwrap_or(&self.active_kid);
        let entry = self
            .keys
            .get(kid)
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))?;

        let mut validation = Validation::new(entry.algorithm);
        // Expiry is checked by `Claims::validate` against `now`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[self.issuer.as_str()]);

        let claims = decode::<Claims>(token, &entry.decoding, &validation)?.claims;
        claims.validate(now)?;
        Ok(claims)
    }

    /// Verifies the value of an `Authorization` header.
    pub fn authenticate_header(&self, value: &str) -> Result<Claims, AuthError> {
        self.authenticate(parse_bearer(value)?)
    }
}

/// Extracts the token from `Bearer <token>`.
///
/// The scheme is matched case-insensitively.
pub fn parse_bearer(value: &str) -> Result<&str, AuthError> {
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Extracts the email and password from `Basic <base64(email:password)>`.
///
/// The credentials split at the first colon, so passwords may contain
/// colons.
pub fn parse_basic(value: &str) -> Result<(String, String), AuthError> {
    let (scheme, encoded) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedBasic)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::MalformedBasic);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::MalformedBasic)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedBasic)?;
    match decoded.split_once(':') {
        Some((email, password)) if !email.is_empty() => {
            Ok((email.to_string(), password.to_string()))
        }
        _ => Err(AuthError::MalformedBasic),
    }
}
