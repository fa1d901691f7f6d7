//! # surveyd library
//!
//! Questionnaire collection and statistics service:
//! - Declarative survey schema (validation rules and reporting roles)
//! - Flat-file append-only response store
//! - Statistics aggregation with a last-good cache
//! - CSV/JSON export
//! - Two HTTP routers: public intake, authenticated dashboard

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod record;
pub mod schema;
pub mod stats;
pub mod store;
pub mod validate;

pub use error::{Error, Result};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use cache::StatsCache;
use config::DashboardConfig;
use schema::Schema;
use store::RecordStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active questionnaire schema.
    pub schema: Arc<Schema>,
    /// Durable response store.
    pub store: Arc<RecordStore>,
    /// Last-good statistics snapshot.
    pub cache: Arc<StatsCache>,
    /// Dashboard credentials for the auth gate.
    pub dashboard: Arc<DashboardConfig>,
    /// Honor forwarded-for headers when resolving client origins.
    pub trust_proxy: bool,
}

impl AppState {
    pub fn new(
        schema: Schema,
        store: Arc<RecordStore>,
        cache: Arc<StatsCache>,
        dashboard: DashboardConfig,
        trust_proxy: bool,
    ) -> Self {
        Self {
            schema: Arc::new(schema),
            store,
            cache,
            dashboard: Arc::new(dashboard),
            trust_proxy,
        }
    }
}

/// Build the public intake router (survey listener).
///
/// CORS is permissive: the questionnaire form is served elsewhere and posts
/// here cross-origin.
pub fn build_survey_router(state: AppState) -> Router {
    Router::new()
        .route("/api/surveys", post(api::submit_survey))
        .route("/health", get(api::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Build the dashboard router (statistics listener).
///
/// Every route except the health probe sits behind the Basic auth gate.
pub fn build_stats_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/stats", get(api::get_stats))
        .route("/api/download", get(api::download_records))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new().route("/health", get(api::health));

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
