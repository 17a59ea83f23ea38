//! Turning a loaded configuration into runtime collaborators.

use anyhow::{bail, Context};
use chrono::Utc;
use moneyflow_auth::{Authenticator, KeyStore};
use moneyflow_config::{Algorithm, AuthSection, DbSection, MoneyflowConfig};
use moneyflow_core::Claims;
use moneyflow_server::ServerConfig;
use moneyflow_store::PgTransactor;

/// Builds the authenticator described by `auth`.
///
/// # Errors
///
/// Fails when the key material is missing or unreadable.
pub fn authenticator(auth: &AuthSection) -> anyhow::Result<Authenticator> {
    let mut keys = KeyStore::new();
    match auth.algorithm {
        Algorithm::Hs256 => {
            let Some(secret) = auth.secret.as_deref() else {
                bail!("auth.secret is required for HS256");
            };
            keys.add_secret(&auth.active_kid, secret.as_bytes());
        }
        Algorithm::Rs256 => {
            let Some(public) = auth.public_key_path.as_deref() else {
                bail!("auth.public_key_path is required for RS256");
            };
            keys.load_rsa_files(&auth.active_kid, auth.private_key_path.as_deref(), public)
                .context("loading RSA key pair")?;
        }
    }

    Authenticator::new(&auth.active_kid, keys, &auth.issuer).context("creating authenticator")
}

/// Server settings from the `server` and `telemetry` sections.
pub fn server_config(config: &MoneyflowConfig) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(&config.server.http_addr)
        .shutdown_timeout(config.server.shutdown_timeout())
        .request_timeout(config.server.request_timeout())
        .cancel_grace(config.server.cancel_grace())
        .max_body_bytes(config.server.max_body_bytes)
        .service_name(&config.telemetry.service_name)
        .build()
}

/// Lifetime of issued tokens.
///
/// # Errors
///
/// Fails when the configured TTL does not fit a signed duration.
pub fn token_ttl(auth: &AuthSection) -> anyhow::Result<chrono::Duration> {
    chrono::Duration::from_std(auth.token_ttl()).context("auth.token_ttl_secs")
}

/// Connects to the Postgres database at `url` and creates missing tables.
///
/// # Errors
///
/// Fails when the database is unreachable or a table cannot be created.
pub async fn postgres(db: &DbSection, url: &str) -> anyhow::Result<PgTransactor> {
    let transactor = PgTransactor::connect(url, db.max_connections, db.acquire_timeout())
        .await
        .context("connecting to postgres")?;
    transactor
        .migrate(moneyflow_business::TABLES)
        .await
        .context("creating tables")?;
    tracing::info!(max_connections = db.max_connections, "postgres ready");
    Ok(transactor)
}

/// Signs a token for `subject` with `roles`, valid for the configured TTL.
///
/// # Errors
///
/// Fails when the authenticator cannot be built or cannot sign.
pub fn generate_token<I, R>(auth: &AuthSection, subject: &str, roles: I) -> anyhow::Result<String>
where
    I: IntoIterator<Item = R>,
    R: Into<String>,
{
    let authenticator = authenticator(auth)?;
    let claims = Claims::new(subject, &auth.issuer, roles, Utc::now(), token_ttl(auth)?);
    authenticator
        .generate_token(&claims)
        .context("signing token")
}
