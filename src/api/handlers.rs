use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::ledger::types::Transaction;
use crate::view::types::{FilterOptions, ViewResult};

use super::types::*;
use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
        }),
    )
}

/// Resolve params and run the view. Unusable filters give an empty view, not an error.
async fn compute_view(state: &AppState, params: &DashboardParams) -> ViewResult {
    match params.resolve(state.engine.default_threshold()) {
        Some(query) => state.engine.query(&query).await,
        None => {
            tracing::debug!(?params, "Unparseable filters, returning empty view");
            ViewResult::default()
        }
    }
}

// ============================================================
// Health & Filters
// ============================================================

pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let store = state.engine.store();
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        ledger_size: store.len().await,
        last_transaction_id: store.last_id().await.map(|id| id.to_string()),
    }))
}

pub async fn filters(State(state): State<Arc<AppState>>) -> ApiResult<FilterOptions> {
    Ok(Json(state.engine.filter_options().await))
}

// ============================================================
// Dashboard
// ============================================================

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> ApiResult<ViewResult> {
    Ok(Json(compute_view(&state, &params).await))
}

// ============================================================
// Transactions
// ============================================================

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> ApiResult<TransactionsResponse> {
    let view = compute_view(&state, &params).await;
    Ok(Json(TransactionsResponse {
        count: view.recent.len(),
        transactions: view.recent,
    }))
}

pub async fn export_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let view = compute_view(&state, &params).await;
    let body = transactions_csv(&view.recent)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body))
}

/// Render rows as CSV with a header line.
pub fn transactions_csv(rows: &[Transaction]) -> eyre::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| eyre::eyre!("Failed to flush CSV export: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}
