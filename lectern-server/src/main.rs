//! # Lectern Server
//!
//! Backend for the Lectern learning platform.
//!
//! ## Overview
//!
//! Lectern lets teachers author block-based lesson materials, publish them
//! with shareable URLs, and lets students track completions and favorites:
//!
//! - **Materials**: Block-based documents with draft/published/archived states
//! - **Publishing**: Open catalog URLs or rotating link-only share tokens
//! - **Progress**: Completion records, grades, and a per-student summary
//!
//! ## Architecture
//!
//! The server is built on Axum and uses:
//! - PostgreSQL for persistent storage (embedded sqlx migrations)
//! - HS256 bearer tokens from an external identity provider

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern_core::database::PostgresDatabase;
use lectern_core::database::ports::{MaterialsRepository, ProgressRepository};
use lectern_core::services::{MaterialService, ProgressService};
use lectern_server::{
    AppState,
    auth::TokenVerifier,
    infra::config::Config,
    routes,
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "lectern-server")]
#[command(about = "Backend for the Lectern learning platform")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Check database connectivity and migration state, then exit
    Preflight,
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.serve)?;

    if let Some(command) = cli.command {
        match command {
            Command::Db(DbCommand::Preflight) => {
                run_db_preflight(&config).await?;
                return Ok(());
            }
            Command::Db(DbCommand::Migrate) => {
                run_db_migrate(&config).await?;
                return Ok(());
            }
        }
    }

    run_server(config).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    // .env first so RUST_LOG from it reaches the filter below
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.server_port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server_host = host;
    }

    Ok(config)
}

async fn run_db_preflight(config: &Config) -> anyhow::Result<()> {
    let database = PostgresDatabase::new(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL for preflight")?;
    database
        .preflight()
        .await
        .context("database preflight failed")?;
    info!("Database preflight passed");
    Ok(())
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    let database = PostgresDatabase::new(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL for migration")?;
    database
        .initialize_schema()
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);

    let database = Arc::new(
        PostgresDatabase::new(&config.database_url)
            .await
            .context("failed to connect to PostgreSQL")?,
    );
    database
        .initialize_schema()
        .await
        .context("failed to apply database migrations")?;

    let materials_repo: Arc<dyn MaterialsRepository> =
        Arc::new(database.materials_repository().clone());
    let progress_repo: Arc<dyn ProgressRepository> =
        Arc::new(database.progress_repository().clone());

    let state = AppState {
        materials: Arc::new(MaterialService::new(materials_repo.clone())),
        progress: Arc::new(ProgressService::new(progress_repo, materials_repo)),
        verifier: Arc::new(TokenVerifier::new(
            &config.jwt_secret,
            config.jwt_issuer.as_deref(),
        )),
        config: Arc::clone(&config),
        database,
        started_at: Utc::now(),
    };

    let app = routes::create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server host/port")?;

    info!(
        "Starting Lectern server on {}:{}",
        config.server_host, config.server_port
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received, draining connections");
}
