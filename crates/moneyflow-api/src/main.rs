//! moneyflow-api entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use moneyflow_api::{bootstrap, build_app, ApiState};
use moneyflow_config::{ConfigLoader, MoneyflowConfig};
use moneyflow_middleware::MetricsMiddleware;
use moneyflow_server::{Server, ShutdownSignal};
use moneyflow_store::{MemoryDb, Transactor};
use moneyflow_telemetry::init_telemetry;

/// Config file read when `--config` is not given, if present.
const DEFAULT_CONFIG_FILE: &str = "moneyflow.toml";

/// Prefix of environment overrides, e.g. `MONEYFLOW__SERVER__HTTP_ADDR`.
const ENV_PREFIX: &str = "MONEYFLOW";

/// Moneyflow REST API
#[derive(Parser, Debug)]
#[command(name = "moneyflow-api", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML or JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Print a signed token for SUBJECT carrying ROLES.
    Gentoken {
        /// User id placed in the `sub` claim.
        subject: String,

        /// Roles to grant, e.g. ADMIN USER.
        roles: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Gentoken { subject, roles } => {
            let token = bootstrap::generate_token(&config.auth, &subject, roles)?;
            println!("{token}");
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<MoneyflowConfig> {
    let loader = ConfigLoader::new().with_dotenv();
    let loader = match path {
        Some(path) => loader.with_file(path)?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    loader
        .with_env_prefix(ENV_PREFIX)
        .load()
        .context("loading configuration")
}

async fn serve(config: MoneyflowConfig) -> anyhow::Result<()> {
    init_telemetry(&config.telemetry.to_telemetry_config())?;

    match config.db.url() {
        Some(url) => {
            let transactor = bootstrap::postgres(&config.db, url).await?;
            run(&config, transactor).await
        }
        None => {
            tracing::warn!("no db.url configured, records are kept in memory");
            run(&config, MemoryDb::new()).await
        }
    }
}

async fn run<T: Transactor>(config: &MoneyflowConfig, transactor: T) -> anyhow::Result<()> {
    let authenticator = Arc::new(bootstrap::authenticator(&config.auth)?);
    let app = build_app(ApiState {
        transactor: Arc::new(transactor),
        authenticator,
        metrics: MetricsMiddleware::new(),
        shutdown: ShutdownSignal::new(),
        token_ttl: bootstrap::token_ttl(&config.auth)?,
    })?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        routes = app.route_count(),
        "starting moneyflow-api"
    );

    Server::new(bootstrap::server_config(config), app)
        .run()
        .await?;

    tracing::info!("moneyflow-api stopped");
    Ok(())
}
