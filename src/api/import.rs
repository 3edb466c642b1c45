//! Import trigger endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    models::{ImportResult, ImportStatus, SessionRange},
    services::ImportOrchestrator,
    AppState,
};

/// Query parameters for the import trigger. The upstream scheduler
/// passes them as strings, so defaults are strings too.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuery {
    #[serde(default = "default_start_congress")]
    pub start_congress: String,
    #[serde(default = "default_end_congress")]
    pub end_congress: String,
}

fn default_start_congress() -> String {
    "119".to_string()
}

fn default_end_congress() -> String {
    "100".to_string()
}

/// GET|POST /import/legislators
///
/// Runs the import synchronously and answers 200 with the final
/// `ImportResult` for every outcome reached through the normal control
/// path (`locked` included). 500 is reserved for errors that escape
/// the pipeline entirely.
pub async fn import_legislators(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
) -> ApiResult<Json<ImportResult>> {
    let start_congress: u16 = query.start_congress.parse().map_err(|_| {
        ApiError::BadRequest(format!("invalid startCongress: {}", query.start_congress))
    })?;
    let end_congress: u16 = query.end_congress.parse().map_err(|_| {
        ApiError::BadRequest(format!("invalid endCongress: {}", query.end_congress))
    })?;

    let range = SessionRange::new(start_congress, end_congress)?;

    tracing::info!(start_congress, end_congress, "Import triggered");

    let orchestrator = ImportOrchestrator::new(state.db.clone(), &state.config)?;
    let result = orchestrator.run(range).await?;

    if result.status == ImportStatus::Error {
        let detail = result
            .errors
            .as_ref()
            .and_then(|errors| errors.last())
            .cloned()
            .unwrap_or_else(|| "import failed".to_string());
        *state.last_error.write().await = Some(detail);
    }

    Ok(Json(result))
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new().route(
        "/import/legislators",
        get(import_legislators).post(import_legislators),
    )
}
