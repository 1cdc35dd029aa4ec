//! cmon-server - Court Monitor case tracking service
//!
//! Zero-config startup: every setting has a compiled default, and a missing
//! config file only produces a warning.

use anyhow::{Context, Result};
use clap::Parser;
use cmon_common::config::{
    config_file_path, load_toml_config, CompiledDefaults, RootFolderInitializer,
    RootFolderResolver, TomlConfig,
};
use cmon_common::events::EventBus;
use cmon_common::{db, time};
use cmon_server::relay::RelayClient;
use cmon_server::{build_router, AppState, EVENT_BUS_CAPACITY};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

const MODULE_NAME: &str = "cmon-server";

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "cmon-server", version, about = "Court case and order tracking service")]
struct Args {
    /// Folder holding cmon.db
    #[arg(short, long, env = "CMON_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CMON_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "CMON_BIND")]
    bind: Option<String>,

    /// Automation webhook receiving uploaded documents
    #[arg(long, env = "CMON_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Replace this user's cases with the demo data set before serving
    #[arg(long)]
    seed_demo_user: Option<Uuid>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let defaults = CompiledDefaults::for_current_platform();

    // Config is read before tracing exists so the file can set the level;
    // problems are reported right after init.
    let config_path = config_file_path(MODULE_NAME);
    let (toml_config, config_error) = match &config_path {
        Some(path) => match load_toml_config(path) {
            Ok(config) => (config, None),
            Err(e) => (TomlConfig::default(), Some(e)),
        },
        None => (TomlConfig::default(), None),
    };

    let log_level = toml_config
        .logging
        .level
        .clone()
        .unwrap_or_else(|| defaults.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    info!(
        "Starting Court Monitor server (cmon-server) v{}",
        env!("CARGO_PKG_VERSION")
    );

    match (&config_path, config_error) {
        (Some(path), Some(e)) => warn!("Ignoring config file {}: {}", path.display(), e),
        (Some(path), None) => info!("Loaded config from {}", path.display()),
        (None, _) => info!("No config file found; using compiled defaults"),
    }

    // Root folder: CLI/env (via clap) → env → TOML → OS default
    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .with_toml_config(toml_config.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;
    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match db::init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    if let Some(user_id) = args.seed_demo_user {
        let seeded = db::seed_demo_data(&pool, user_id, time::now()).await?;
        info!("Seeded {} demo cases for {}", seeded, user_id);
    }

    let webhook_url = args.webhook_url.clone().or(toml_config.webhook_url.clone());
    let relay = match webhook_url {
        Some(url) => {
            let timeout = Duration::from_secs(
                toml_config
                    .webhook_timeout_secs
                    .unwrap_or(defaults.webhook_timeout_secs),
            );
            let client = RelayClient::new(url, timeout).context("build relay client")?;
            info!("✓ Upload relay: {}", client.webhook_url());
            Some(client)
        }
        None => {
            warn!("No webhook_url configured; uploads will be refused");
            None
        }
    };

    let state = AppState::new(pool, EventBus::new(EVENT_BUS_CAPACITY)).with_relay(relay);
    let app = build_router(state);

    let bind = args
        .bind
        .or(toml_config.bind)
        .unwrap_or(defaults.bind);
    let port = args.port.or(toml_config.port).unwrap_or(defaults.port);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    info!("cmon-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
