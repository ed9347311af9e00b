use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cachewarmer_core::{
    build_work_list, load_config, validate_config, CacheWarmer, DebridClient, DedupStore,
    RealDebridClient, Scheduler, SqliteDedupStore, StreamSource, StremioCatalogClient,
    TorrentioSource,
};

use cachewarmer_server::api::create_router;
use cachewarmer_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    let json = std::env::var("CACHEWARMER_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run() -> Result<()> {
    init_logging();
    info!("cachewarmer {} starting", VERSION);

    // Determine config path
    let config_path = std::env::var("CACHEWARMER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!(
        "Run mode: {} (every {} min)",
        config.schedule.run_mode, config.schedule.repeat_minutes
    );

    // Open dedup store
    let store: Arc<dyn DedupStore> = Arc::new(
        SqliteDedupStore::new(&config.database.path).context("Failed to open dedup store")?,
    );
    match store.stats() {
        Ok(stats) => info!(
            attempted = stats.attempted_hashes,
            cached = stats.cached_qualities,
            "Dedup store opened"
        ),
        Err(e) => warn!(error = %e, "Failed to read dedup stats"),
    }

    // Debrid client; the key must work before any item is processed
    let debrid: Arc<dyn DebridClient> = Arc::new(
        RealDebridClient::new(config.debrid.clone()).context("Failed to create debrid client")?,
    );
    debrid
        .verify_connection()
        .await
        .with_context(|| format!("Failed to verify {} API key", debrid.name()))?;
    info!("Connected to {}", debrid.name());

    // Stream discovery
    let source: Arc<dyn StreamSource> = Arc::new(
        TorrentioSource::new(config.discovery.clone())
            .context("Failed to create stream source")?,
    );
    info!("Using stream source: {}", source.name());

    // Stop on SIGINT/SIGTERM or via the control API
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, finishing current item");
            shutdown.cancel();
        });
    }

    // Build the work list
    let catalogs = StremioCatalogClient::new(config.discovery.timeout_secs)
        .context("Failed to create catalog client")?;
    let work = build_work_list(&config.targets, &catalogs, &shutdown).await;
    if work.is_empty() {
        bail!("No movies or episodes to warm; check [targets]");
    }
    info!(
        movies = work.movie_count(),
        episodes = work.episode_count(),
        "Work list ready"
    );

    let warmer = Arc::new(CacheWarmer::new(
        config.warmer.clone(),
        source,
        debrid,
        Arc::clone(&store),
    ));

    // Optional control API
    let server = if config.server.enabled {
        let state = Arc::new(AppState::new(
            config.clone(),
            warmer.status_handle(),
            Arc::clone(&store),
            shutdown.clone(),
        ));
        let app = create_router(state);

        let addr = SocketAddr::new(config.server.host, config.server.port);
        info!("Starting control API on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        let stopped = shutdown.clone();
        Some(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(stopped.cancelled_owned())
                .await
        }))
    } else {
        info!("Control API disabled");
        None
    };

    // Run passes until done or stopped
    let summary = Scheduler::new(warmer, work, config.schedule.clone())
        .run(&shutdown)
        .await;
    info!(
        passes = summary.passes,
        processed = summary.items_processed,
        failed = summary.items_failed,
        submissions = summary.submissions,
        cancelled = summary.cancelled,
        "Warmer finished"
    );

    // Bring the server down with the scheduler
    shutdown.cancel();
    if let Some(handle) = server {
        handle
            .await
            .context("Server task panicked")?
            .context("Server error")?;
        info!("Control API stopped");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
