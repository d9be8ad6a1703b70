//! Duplicate detection and resolution handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::Deserialize;

use crate::{get_operator, AppError, AppState};
use innkeep_core::duplicates::{DetectionReport, DuplicateDetector, GroupComparison};
use innkeep_core::resolution::{DuplicateSelection, ResolutionExecutor, ResolutionOutcome};

/// Query parameters for duplicate detection
#[derive(Debug, Deserialize)]
pub struct DuplicatesQuery {
    /// Restrict the scan to one guest (exact match)
    pub guest: Option<String>,
}

/// GET /api/duplicates - Scan for duplicate bookings
pub async fn detect_duplicates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DuplicatesQuery>,
    request: Request,
) -> Result<Json<DetectionReport>, AppError> {
    let operator = get_operator(request.headers());

    let detector = DuplicateDetector::new(&state.db);
    let report = detector.detect(params.guest.as_deref())?;

    state.db.log_audit(
        &operator,
        "detect",
        Some("duplicates"),
        None,
        Some(&format!(
            "guest={:?}, groups={}, elapsed_ms={}",
            params.guest, report.total_groups, report.processing_info.processing_time_ms
        )),
    )?;

    Ok(Json(report))
}

/// GET /api/duplicates/comparison - Field-level comparison of each group
pub async fn compare_duplicates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DuplicatesQuery>,
    request: Request,
) -> Result<Json<Vec<GroupComparison>>, AppError> {
    let operator = get_operator(request.headers());

    let detector = DuplicateDetector::new(&state.db);
    let (report, comparisons) = detector.detect_with_comparisons(params.guest.as_deref())?;

    state.db.log_audit(
        &operator,
        "compare",
        Some("duplicates"),
        None,
        Some(&format!(
            "guest={:?}, groups={}",
            params.guest, report.total_groups
        )),
    )?;

    Ok(Json(comparisons))
}

/// Request body for resolving duplicates
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub booking_ids: Vec<String>,
}

/// POST /api/duplicates/resolve - Delete the selected duplicate bookings
///
/// Deletions run sequentially and independently; a failed id is tallied and
/// the rest of the batch proceeds. An empty selection is a successful no-op.
pub async fn resolve_duplicates(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ResolutionOutcome>, AppError> {
    let operator = get_operator(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 100)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: ResolveRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let selection = DuplicateSelection::new(req.booking_ids);
    let outcome = ResolutionExecutor::new(&state.db).resolve(&selection);

    state.db.log_audit(
        &operator,
        "resolve",
        Some("duplicates"),
        None,
        Some(&format!(
            "selected={}, deleted={}, failed={}",
            selection.len(),
            outcome.success_count,
            outcome.fail_count
        )),
    )?;

    Ok(Json(outcome))
}
