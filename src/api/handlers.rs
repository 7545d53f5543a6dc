//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tracing::warn;

use super::AppState;
use super::types::{ErrorResponse, NationalResponse, VariableRecord, VizQuery};
use crate::data::pipeline::Scenario;
use crate::error::PipelineError;
use crate::viz::air_pollution;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: String) -> ApiError {
    (status, Json(ErrorResponse { error: message }))
}

/// `GET /scenarios` → 200 + `Vec<Scenario>` JSON
pub async fn get_scenarios(State(state): State<Arc<AppState>>) -> Json<Vec<Scenario>> {
    Json(state.scenarios.clone())
}

/// `GET /variables` → 200 + `Vec<VariableRecord>` JSON
pub async fn get_variables(State(state): State<Arc<AppState>>) -> Json<Vec<VariableRecord>> {
    Json(state.variables.clone())
}

/// Returns the national series of one case.
///
/// `GET /national/{case}` → 200 + `NationalResponse` JSON
/// `GET /national/unknown` → 404 + `ErrorResponse`
pub async fn get_national(
    State(state): State<Arc<AppState>>,
    Path(case): Path<String>,
) -> Result<Json<NationalResponse>, ApiError> {
    NationalResponse::from_table(&state.national, &case)
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("unknown case `{case}`")))
}

/// Renders the air-pollution fragment.
///
/// `GET /viz/air_pollution` → 200 + HTML
/// `GET /viz/air_pollution?nh3=true` → 200 + HTML with the low-NH₃ lines,
/// or 404 if the run produced no variants
pub async fn get_air_pollution(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VizQuery>,
) -> impl IntoResponse {
    let render = if query.nh3 {
        air_pollution::render_2
    } else {
        air_pollution::render_1
    };
    match render(&state.national, &state.site, &state.templates) {
        Ok(html) => Ok(Html(html)),
        Err(err @ PipelineError::MissingSymbol { .. }) => Err(error(StatusCode::NOT_FOUND, err.to_string())),
        Err(err) => {
            warn!(error = %err, "chart rendering failed");
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}
