//! panchang-sync - Almanac synchronization service
//!
//! Serves computed and enriched monthly almanacs over HTTP, and exposes the
//! same cache from the command line (`fetch`, `export`, `reset`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use panchang_common::config::{
    default_config_path, load_or_default, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use panchang_common::events::EventBus;
use panchang_common::{AlmanacMonth, GeoCoordinate, MonthRequest, Region};
use panchang_sync::config::{build_provider, resolve_enrichment_api_key, resolve_port};
use panchang_sync::store::{AlmanacStore, MemoryStore, SqliteStore};
use panchang_sync::sync::{SyncCache, SyncOutcome, SyncSettings};
use panchang_sync::{db, export, AppState};
use sqlx::SqlitePool;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for panchang-sync
#[derive(Parser, Debug)]
#[command(name = "panchang-sync")]
#[command(about = "Almanac computation and synchronization service")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Keep the cache in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PANCHANG_PORT")]
        port: Option<u16>,
    },
    /// Load one month and print it as JSON
    Fetch {
        #[command(flatten)]
        month: MonthArgs,

        /// Bypass the cache and refetch
        #[arg(long)]
        force: bool,

        /// Wait for the neighbouring-month prefetch sweep before exiting
        #[arg(long)]
        prefetch: bool,
    },
    /// Write a cached month as CSV
    Export {
        #[command(flatten)]
        month: MonthArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove every cached month
    Reset,
}

#[derive(ClapArgs, Debug)]
struct MonthArgs {
    #[arg(long)]
    year: i32,

    #[arg(long)]
    month: u32,

    /// Region name, e.g. "Tamil" or "North Indian (Hindi)"
    #[arg(long, default_value = "Malayalam")]
    region: Region,

    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
}

impl MonthArgs {
    fn to_request(&self, force: bool) -> Result<MonthRequest> {
        let location = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoCoordinate::new(lat, lon)?),
            _ => None,
        };
        Ok(MonthRequest::new(self.year, self.month, self.region)?
            .with_location(location)
            .forced(force))
    }
}

struct Runtime {
    pool: SqlitePool,
    cache: SyncCache,
    toml_config: TomlConfig,
    config_path: Option<PathBuf>,
}

async fn build_runtime(args: &Args, toml_config: TomlConfig, prefetch: bool) -> Result<Runtime> {
    let config_path = args.config.clone().or_else(default_config_path);

    let pool = if args.ephemeral {
        info!("Ephemeral mode: cache and settings kept in memory");
        db::init_memory_pool(0).await?
    } else {
        // Resolve root folder (CLI → ENV → TOML → default)
        let root_folder = RootFolderResolver::new()
            .with_cli(args.root_folder.clone())
            .with_toml(&toml_config)
            .resolve();

        let initializer = RootFolderInitializer::new(root_folder);
        initializer
            .ensure_directory_exists()
            .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;

        let db_path = initializer.database_path();
        info!("Database: {}", db_path.display());
        db::init_database_pool(&db_path, toml_config.cache.max_page_count).await?
    };

    let store: Arc<dyn AlmanacStore> = if args.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::new(pool.clone()))
    };

    let api_key = resolve_enrichment_api_key(Some(&pool), &toml_config).await?;
    let provider = build_provider(&toml_config, api_key);
    info!("Enrichment provider: {}", provider.name());

    let mut settings = SyncSettings::from_config(&toml_config.sync)?;
    if !prefetch {
        settings.prefetch_radius_months = 0;
    }

    // 100 event capacity
    let cache = SyncCache::new(store, provider, EventBus::new(100), settings);

    Ok(Runtime {
        pool,
        cache,
        toml_config,
        config_path,
    })
}

async fn load_month(cache: &SyncCache, request: MonthRequest) -> Result<Arc<AlmanacMonth>> {
    match cache.load(request).await? {
        SyncOutcome::Loaded { month, source } => {
            info!(source = ?source, days = month.days.len(), "Month loaded");
            Ok(month)
        }
        SyncOutcome::Superseded => bail!("Request superseded"),
    }
}

async fn serve(runtime: Runtime, port: u16) -> Result<()> {
    let state = AppState::new(runtime.pool, runtime.cache, runtime.toml_config)
        .with_config_path(runtime.config_path);
    let app = panchang_sync::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_or_default(args.config.as_deref());

    // Initialize tracing
    let default_filter = format!(
        "panchang_sync={level},panchang_common={level},tower_http=info",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("panchang-sync {}", env!("CARGO_PKG_VERSION"));

    match &args.command {
        Command::Serve { port } => {
            let port = resolve_port(*port, &toml_config);
            let runtime = build_runtime(&args, toml_config, true).await?;
            serve(runtime, port).await
        }
        Command::Fetch {
            month,
            force,
            prefetch,
        } => {
            let runtime = build_runtime(&args, toml_config, *prefetch).await?;
            let loaded = load_month(&runtime.cache, month.to_request(*force)?).await?;
            println!("{}", serde_json::to_string_pretty(loaded.as_ref())?);
            if *prefetch {
                runtime.cache.wait_for_prefetch().await;
                let status = runtime.cache.prefetch_status();
                info!(
                    fetched = status.fetched,
                    failed = status.failed,
                    total = status.total,
                    "Prefetch complete"
                );
            }
            Ok(())
        }
        Command::Export { month, output } => {
            let runtime = build_runtime(&args, toml_config, false).await?;
            let request = month.to_request(false)?;
            let Some(cached) = runtime.cache.cached(&request).await? else {
                bail!(
                    "{} {}-{:02} is not cached; run `fetch` first",
                    request.region,
                    request.year,
                    request.month
                );
            };
            let csv = export::to_csv(&cached);
            match output {
                Some(path) => {
                    std::fs::write(path, csv)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {}", path.display());
                }
                None => println!("{}", csv),
            }
            Ok(())
        }
        Command::Reset => {
            let runtime = build_runtime(&args, toml_config, false).await?;
            let removed = runtime.cache.reset().await?;
            println!("Removed {} cached months", removed);
            Ok(())
        }
    }
}
