//! Dashboard, calendar, and export handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header, Response, StatusCode},
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::bookings::parse_booking_filter;
use crate::{get_operator, AppError, AppState};
use innkeep_core::models::{CalendarDay, DashboardStats};

/// GET /api/dashboard - Aggregate stats for the dashboard view
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<DashboardStats>, AppError> {
    let operator = get_operator(request.headers());

    let stats = state.db.get_dashboard_stats()?;

    state
        .db
        .log_audit(&operator, "view", Some("dashboard"), None, None)?;

    Ok(Json(stats))
}

/// Query parameters for the calendar view
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

/// GET /api/calendar?year=&month= - Per-day occupancy for one month
pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CalendarQuery>,
    request: Request,
) -> Result<Json<Vec<CalendarDay>>, AppError> {
    let operator = get_operator(request.headers());

    if !(1..=12).contains(&params.month) {
        return Err(AppError::bad_request("Month must be between 1 and 12"));
    }

    let days = state.db.get_calendar_month(params.year, params.month)?;

    state.db.log_audit(
        &operator,
        "view",
        Some("calendar"),
        None,
        Some(&format!("year={}, month={}", params.year, params.month)),
    )?;

    Ok(Json(days))
}

/// Query parameters for booking export (same filters as the listing)
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub guest: Option<String>,
    pub status: Option<String>,
    pub platform: Option<String>,
    /// Check-in range start (YYYY-MM-DD)
    pub from: Option<String>,
    /// Check-in range end (YYYY-MM-DD)
    pub to: Option<String>,
}

/// GET /api/export/bookings - Export bookings as a CSV download
pub async fn export_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportQuery>,
    request: Request,
) -> Result<Response<Body>, AppError> {
    let operator = get_operator(request.headers());

    let filter = parse_booking_filter(
        params.guest.as_deref(),
        params.status.as_deref(),
        params.platform.as_deref(),
        params.from.as_deref(),
        params.to.as_deref(),
    )?;

    let csv = state.db.export_bookings_csv(&filter)?;
    let rows = csv.lines().count().saturating_sub(1);
    info!("Exported {} bookings to CSV", rows);

    state.db.log_audit(
        &operator,
        "export",
        Some("booking"),
        None,
        Some(&format!(
            "rows={}, guest={:?}, status={:?}, platform={:?}",
            rows, params.guest, params.status, params.platform
        )),
    )?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"bookings.csv\"",
        )
        .body(Body::from(csv))
        .map_err(|e| AppError::internal(&e.to_string()))
}
