//! Preview server for prepared data and chart fragments.
//!
//! Provides four GET endpoints:
//! - `/scenarios`: case codes and descriptions
//! - `/variables`: variable names with their metadata
//! - `/national/{case}`: national time series of one case
//! - `/viz/air_pollution`: the chart fragment, `?nh3=true` for the variant

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

pub use types::{ErrorResponse, NationalResponse, VariableRecord, VizQuery};

use crate::config::SiteConfig;
use crate::data::pipeline::{Prepared, Scenario};
use crate::viz::{NationalTable, TemplateEnv};

/// Immutable application state shared across all request handlers.
///
/// Built once after the pipeline run; handlers only read it.
pub struct AppState {
    pub scenarios: Vec<Scenario>,
    pub variables: Vec<VariableRecord>,
    pub national: NationalTable,
    pub site: SiteConfig,
    pub templates: TemplateEnv,
}

impl AppState {
    pub fn new(prepared: &Prepared, site: SiteConfig, templates: TemplateEnv) -> Self {
        let variables = prepared
            .variable_names()
            .into_iter()
            .map(|name| VariableRecord::new(name, prepared.catalog.get(name)))
            .collect();
        Self {
            scenarios: prepared.scenarios.clone(),
            variables,
            national: NationalTable::from_dataset(&prepared.national),
            site,
            templates,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scenarios", get(handlers::get_scenarios))
        .route("/variables", get(handlers::get_variables))
        .route("/national/{case}", get(handlers::get_national))
        .route("/viz/air_pollution", get(handlers::get_air_pollution))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process is stopped.
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "preview server listening");
    axum::serve(listener, app).await
}
