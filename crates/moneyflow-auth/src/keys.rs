//! Verification and signing keys, looked up by key id.

use std::collections::HashMap;
use std::path::Path;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use crate::error::AuthError;

/// Key material registered under one key id.
#[derive(Clone)]
pub(crate) struct KeyEntry {
    pub(crate) algorithm: Algorithm,
    pub(crate) decoding: DecodingKey,
    pub(crate) encoding: Option<EncodingKey>,
}

/// A set of keys addressed by `kid`.
///
/// Keys are loaded once at startup and then only read.
///
/// # Example
///
/// ```
/// use moneyflow_auth::KeyStore;
///
/// let mut keys = KeyStore::new();
/// keys.add_secret("2024-01", b"a long shared secret");
/// assert!(keys.contains("2024-01"));
/// assert!(!keys.contains("2023-12"));
/// ```
#[derive(Clone, Default)]
pub struct KeyStore {
    keys: HashMap<String, KeyEntry>,
}

impl KeyStore {
    /// Creates an empty key store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an HS256 shared secret.
    pub fn add_secret(&mut self, kid: impl Into<String>, secret: &[u8]) {
        self.keys.insert(
            kid.into(),
            KeyEntry {
                algorithm: Algorithm::HS256,
                decoding: DecodingKey::from_secret(secret),
                encoding: Some(EncodingKey::from_secret(secret)),
            },
        );
    }

    /// Registers an RS256 key pair from PEM text.
    ///
    /// Without a private key the entry can verify but not sign.
    pub fn add_rsa_pem(
        &mut self,
        kid: impl Into<String>,
        private_pem: Option<&[u8]>,
        public_pem: &[u8],
    ) -> Result<(), AuthError> {
        let decoding = DecodingKey::from_rsa_pem(public_pem)?;
        let encoding = private_pem.map(EncodingKey::from_rsa_pem).transpose()?;
        self.keys.insert(
            kid.into(),
            KeyEntry {
                algorithm: Algorithm::RS256,
                decoding,
                encoding,
            },
        );
        Ok(())
    }

    /// Registers an RS256 key pair read from PEM files.
    pub fn load_rsa_files(
        &mut self,
        kid: impl Into<String>,
        private_path: Option<&Path>,
        public_path: &Path,
    ) -> Result<(), AuthError> {
        let private_pem = private_path.map(read_key).transpose()?;
        let public_pem = read_key(public_path)?;
        self.add_rsa_pem(kid, private_pem.as_deref(), &public_pem)
    }

    /// Returns `true` if `kid` is registered.
    #[must_use]
    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    /// Returns the number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no key is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn get(&self, kid: &str) -> Option<&KeyEntry> {
        self.keys.get(kid)
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kids: Vec<_> = self.keys.keys().collect();
        kids.sort();
        f.debug_struct("KeyStore").field("kids", &kids).finish()
    }
}

fn read_key(path: &Path) -> Result<Vec<u8>, AuthError> {
    std::fs::read(path).map_err(|source| AuthError::KeyFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_secret() {
        let mut keys = KeyStore::new();
        assert!(keys.is_empty());
        keys.add_secret("k1", b"secret");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys.get("k1").unwrap().algorithm, Algorithm::HS256);
        assert!(keys.get("k1").unwrap().encoding.is_some());
    }

    #[test]
    fn test_invalid_pem_rejected() {
        let mut keys = KeyStore::new();
        let err = keys.add_rsa_pem("k1", None, b"not a pem").unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
        assert!(!keys.contains("k1"));
    }

    #[test]
    fn test_missing_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut keys = KeyStore::new();
        let err = keys
            .load_rsa_files("k1", None, &dir.path().join("absent.pem"))
            .unwrap_err();
        assert!(matches!(err, AuthError::KeyFile { .. }));
    }

    #[test]
    fn test_debug_hides_material() {
        let mut keys = KeyStore::new();
        keys.add_secret("k1", b"super-secret-value");
        let debug = format!("{keys:?}");
        assert!(debug.contains("k1"));
        assert!(!debug.contains("super-secret-value"));
    }
}
