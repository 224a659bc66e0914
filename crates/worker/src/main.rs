//! `covdb-worker` -- covenant database refresh worker.
//!
//! Seeds character collections, keeps them fresh against the Battle.net
//! profile API and exports the addon data files.
//!
//! # Environment variables
//!
//! See [`WorkerConfig::from_env`] for the full table. `DATABASE_URL` is
//! required; everything else has a default. `RUST_LOG` overrides the
//! default log filter.

use anyhow::Context;
use clap::{Parser, Subcommand};
use covdb_battlenet::{OAuthSession, ProfileClient, RequestLimiter};
use covdb_core::retry::RetryPolicy;
use covdb_core::{Collection, Faction, RealmTable, Region};
use covdb_worker::config::{CredentialsFile, WorkerConfig};
use covdb_worker::insert::{insert_character, InsertOutcome};
use covdb_worker::{export, seed, PgCharacterStore, RefreshEngine, RunContext, RunOutcome};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "covdb-worker", version, about = "Covenant database refresh worker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed every collection from the character lists
    Init { worker_id: String },
    /// Refresh due characters in every collection until none is left
    Update { worker_id: String },
    /// Insert a single character
    ///
    /// The realm must be in the realm table. Unknown realms are rejected here
    /// instead of being stored and purged when a refresh pass claims them.
    Insert {
        worker_id: String,
        region: Region,
        faction: Faction,
        realm: String,
        name: String,
    },
    /// Write the addon data files
    Export,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "covdb_worker=info,covdb_battlenet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = WorkerConfig::from_env().context("Invalid configuration")?;

    let pool = covdb_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    covdb_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    covdb_db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database ready");

    let store = PgCharacterStore::new(pool);

    match cli.command {
        Command::Init { worker_id } => {
            let realms = load_realms(&config)?;
            tracing::info!(%worker_id, dir = %config.characters_dir.display(), "Seeding collections");
            let report = seed::seed_all(&store, &realms, &config.characters_dir).await?;
            tracing::info!(
                inserted = report.inserted,
                skipped = report.skipped,
                unknown_realm = report.unknown_realm,
                "Seeding complete",
            );
        }
        Command::Update { worker_id } => {
            let realms = load_realms(&config)?;
            update(&config, &store, &realms, &worker_id).await?;
        }
        Command::Insert {
            worker_id,
            region,
            faction,
            realm,
            name,
        } => {
            let realms = load_realms(&config)?;
            let collection = Collection::new(region, faction);
            tracing::debug!(%worker_id, %collection, "Single insertion");
            match insert_character(&store, &realms, collection, &realm, &name).await? {
                InsertOutcome::Inserted(c) => println!("inserted {collection} {realm}/{name} (id {})", c.id),
                InsertOutcome::AlreadyPresent => println!("already present {collection} {realm}/{name}"),
            }
        }
        Command::Export => {
            let date = chrono::Utc::now().date_naive();
            let reports = export::export_all(&store, &config.export_dir, date).await?;
            let characters: usize = reports.iter().map(|r| r.characters).sum();
            tracing::info!(
                characters,
                dir = %config.export_dir.display(),
                "Export complete",
            );
        }
    }

    Ok(())
}

fn load_realms(config: &WorkerConfig) -> anyhow::Result<RealmTable> {
    let realms = RealmTable::load(&config.realms_file).context("Failed to load realm table")?;
    tracing::info!(realms = realms.len(), path = %config.realms_file.display(), "Realm table loaded");
    Ok(realms)
}

async fn update(
    config: &WorkerConfig,
    store: &PgCharacterStore,
    realms: &RealmTable,
    worker_id: &str,
) -> anyhow::Result<()> {
    let credentials = CredentialsFile::load(&config.credentials_file)
        .and_then(|file| file.credentials_for(worker_id))
        .context("Failed to load credentials")?;

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let session = OAuthSession::new(
        http,
        config.token_url.clone(),
        credentials,
        RetryPolicy::default(),
    );
    session
        .authenticate()
        .await
        .context("Failed to authenticate against the token endpoint")?;
    let client = ProfileClient::with_api_base(session, config.api_base_url.clone());

    tracing::info!(
        worker_id,
        min_interval_ms = config.min_interval.as_millis() as u64,
        timeout_secs = config.request_timeout.as_secs(),
        "Starting refresh",
    );

    let cancel = CancellationToken::new();
    let signal_handle = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let mut ctx = RunContext::new(cancel);
    let mut engine = RefreshEngine::new(
        store,
        &client,
        realms,
        RequestLimiter::new(config.min_interval),
    );
    let outcome = engine.run_all(&mut ctx).await;
    signal_handle.abort();

    match outcome? {
        RunOutcome::Exhausted => tracing::info!("All collections refreshed"),
        RunOutcome::Cancelled => tracing::info!("Refresh interrupted"),
    }
    Ok(())
}

/// Resolve on SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), finishing current record");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, finishing current record");
        }
    }
}
