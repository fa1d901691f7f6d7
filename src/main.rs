//! surveyd - Questionnaire collection and statistics service
//!
//! Runs two HTTP listeners in one process: a public intake endpoint that
//! validates and persists submissions, and an authenticated dashboard that
//! serves aggregated statistics and CSV/JSON export.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use surveyd::cache::StatsCache;
use surveyd::config::{Config, ConfigOverrides};
use surveyd::schema::Schema;
use surveyd::stats::aggregate;
use surveyd::store::RecordStore;
use surveyd::{build_stats_router, build_survey_router, AppState};

/// Command-line arguments for surveyd
#[derive(Parser, Debug)]
#[command(name = "surveyd")]
#[command(about = "Questionnaire collection and statistics service")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "SURVEYD_CONFIG")]
    config: Option<PathBuf>,

    /// Port of the public survey intake listener
    #[arg(long, env = "SURVEYD_SURVEY_PORT")]
    survey_port: Option<u16>,

    /// Port of the authenticated statistics listener
    #[arg(long, env = "SURVEYD_STATS_PORT")]
    stats_port: Option<u16>,

    /// Path of the response store file
    #[arg(long, env = "SURVEYD_DATA_FILE")]
    data_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surveyd=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting surveyd v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(
        args.config.as_deref(),
        ConfigOverrides {
            survey_port: args.survey_port,
            stats_port: args.stats_port,
            data_file: args.data_file,
        },
    )
    .context("Failed to load configuration")?;

    let schema = match &config.schema_file {
        Some(path) => Schema::load(path).context("Failed to load questionnaire schema")?,
        None => Schema::default(),
    };
    info!(
        "Questionnaire schema: gate {}, {} required, {} scale, {} demographic fields",
        schema.gate_field,
        schema.required_fields.len(),
        schema.scale_fields.len(),
        schema.demographics.len()
    );

    if !config.dashboard.auth_enabled() {
        warn!("Dashboard password not set - statistics listener is unauthenticated");
    }

    let store = Arc::new(RecordStore::new(&config.data_file));
    info!("Response store: {}", store.path().display());

    // Warm the stats cache so the first dashboard query is served without a
    // full recompute. Failure degrades to lazy computation.
    let cache = Arc::new(StatsCache::new());
    match store.read_all().await {
        Ok(records) => {
            cache.replace(aggregate(&records, &schema));
            info!("Warmed stats cache from {} stored responses", records.len());
        }
        Err(e) => warn!("Initial stats warm-up failed: {}", e),
    }

    let state = AppState::new(
        schema,
        store,
        cache,
        config.dashboard.clone(),
        config.trust_proxy,
    );

    let survey_app = build_survey_router(state.clone());
    let stats_app = build_stats_router(state);

    let survey_addr = SocketAddr::from(([0, 0, 0, 0], config.survey_port));
    let stats_addr = SocketAddr::from(([0, 0, 0, 0], config.stats_port));

    let survey_listener = tokio::net::TcpListener::bind(survey_addr)
        .await
        .with_context(|| format!("Failed to bind survey listener to {}", survey_addr))?;
    let stats_listener = tokio::net::TcpListener::bind(stats_addr)
        .await
        .with_context(|| format!("Failed to bind stats listener to {}", stats_addr))?;

    info!("Survey intake listening on http://{}", survey_addr);
    info!("Stats dashboard listening on http://{}", stats_addr);

    tokio::try_join!(
        async {
            axum::serve(
                survey_listener,
                survey_app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
        },
        async { axum::serve(stats_listener, stats_app.into_make_service()).await },
    )
    .context("Server error")?;

    Ok(())
}
