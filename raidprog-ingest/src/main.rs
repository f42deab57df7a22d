//! raidprog - FFLogs raid progression tracker
//!
//! `serve` runs the HTTP API and the import worker; the other subcommands
//! operate on the database directly and print JSON.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use raidprog_common::config::TomlConfig;
use raidprog_common::public_id;
use serde_json::json;
use sqlx::SqlitePool;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use raidprog_ingest::db;
use raidprog_ingest::services::{
    import_request, ClientRateLimiter, FFLogsClient, ImportError, ImportQueue, ImportWorker,
    SyncEngine,
};
use raidprog_ingest::AppState;

/// Command-line arguments for raidprog
#[derive(Parser, Debug)]
#[command(name = "raidprog")]
#[command(about = "Raid progression tracker fed by FFLogs reports")]
#[command(version)]
struct Args {
    /// Configuration file (overrides RAIDPROG_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API and import worker (default)
    Serve,
    /// Fetch and import one report immediately
    Import {
        /// Report URL or id
        report: String,
    },
    /// Search characters by name
    Search {
        /// Name fragment
        name: String,
    },
    /// Show a character's best progression
    Character {
        /// Public id
        public_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing, RUST_LOG overrides the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("raidprog {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path.display());

    let pool = db::init_database_pool(&config.database_path)
        .await
        .context("Failed to open database")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, pool).await,
        Command::Import { report } => import(&config, pool, &report).await,
        Command::Search { name } => search(&pool, &name).await,
        Command::Character { public_id } => character(&pool, &public_id).await,
    }
}

fn build_client(config: &TomlConfig) -> Result<FFLogsClient> {
    let api_key = config.resolve_api_key().context("FFLogs API key not configured")?;
    let client = FFLogsClient::new(
        config.fflogs_base_url.as_str(),
        api_key,
        Duration::from_secs(config.fetch_timeout_secs),
    )?;
    Ok(client)
}

async fn serve(config: TomlConfig, pool: SqlitePool) -> Result<()> {
    let client = build_client(&config)?;

    let queue = Arc::new(ImportQueue::new());
    let limiter = ClientRateLimiter::new(Duration::from_secs(config.import_rate_limit_secs));
    let state = AppState::new(
        pool,
        Arc::clone(&queue),
        limiter,
        config.displayed_encounters.clone(),
    );

    let cancel = CancellationToken::new();
    let worker = ImportWorker::new(
        queue,
        Arc::new(client),
        state.engine.clone(),
        Duration::from_millis(config.queue_tick_ms),
    );
    let worker_handle = tokio::spawn(worker.run(cancel.clone()));

    let app = raidprog_ingest::build_router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .context("Server error")?;

    // Worker finishes the report in progress before stopping
    cancel.cancel();
    worker_handle.await.context("Import worker panicked")?;

    info!("Shutdown complete");
    Ok(())
}

async fn import(config: &TomlConfig, pool: SqlitePool, report: &str) -> Result<()> {
    let client = build_client(config)?;
    let engine = SyncEngine::new(pool);

    let (report_id, summary) = match import_request::import_now(&client, &engine, report).await {
        Ok(imported) => imported,
        Err(ImportError::AlreadyImported(report_id)) => {
            if let Some(record) = db::imports::find(engine.pool(), &report_id).await? {
                info!("Report {} was imported at {}", record.report_id, record.imported_at);
            }
            anyhow::bail!("Report {} has already been processed", report_id);
        }
        Err(e) => return Err(e.into()),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "report_id": report_id, "summary": summary }))?
    );
    Ok(())
}

async fn search(pool: &SqlitePool, name: &str) -> Result<()> {
    let characters = db::characters::search_by_name(pool, name.trim(), 50).await?;
    println!("{}", serde_json::to_string_pretty(&characters)?);
    Ok(())
}

async fn character(pool: &SqlitePool, raw_id: &str) -> Result<()> {
    let id = public_id::normalize(raw_id);
    let character = db::characters::find_by_public_id(pool, &id)
        .await?
        .with_context(|| format!("No character with public id {}", id))?;
    let progression = db::progressions::best_for_character(pool, character.id).await?;

    let output = json!({ "character": character, "progression": progression });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM and stops the import worker
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }

    cancel.cancel();
}
