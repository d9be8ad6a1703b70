//! Booking handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{get_operator, AppError, AppState, MAX_PAGE_LIMIT};
use innkeep_core::import::generate_hash;
use innkeep_core::models::{
    Booking, BookingFilter, BookingInsertResult, BookingStatus, NewBooking, Platform,
};

/// Query parameters for listing bookings
#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    /// Substring match against guest names (case-insensitive)
    pub guest: Option<String>,
    /// Filter by booking status (confirmed or pending)
    pub status: Option<String>,
    /// Filter by source platform
    pub platform: Option<String>,
    /// Check-in range start (YYYY-MM-DD)
    pub from: Option<String>,
    /// Check-in range end (YYYY-MM-DD)
    pub to: Option<String>,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
    pub total_count: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Build a `BookingFilter` from raw query values, rejecting malformed input
pub(crate) fn parse_booking_filter(
    guest: Option<&str>,
    status: Option<&str>,
    platform: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<BookingFilter, AppError> {
    let status = status
        .map(|s| s.parse::<BookingStatus>())
        .transpose()
        .map_err(|e| AppError::bad_request(&e))?;

    let platform = platform
        .map(|s| s.parse::<Platform>())
        .transpose()
        .map_err(|e| AppError::bad_request(&e))?;

    let from = from
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::bad_request("Invalid 'from' date format (use YYYY-MM-DD)"))?;

    let to = to
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::bad_request("Invalid 'to' date format (use YYYY-MM-DD)"))?;

    Ok(BookingFilter {
        guest: guest.map(String::from),
        status,
        platform,
        from,
        to,
    })
}

/// GET /api/bookings - List bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BookingQuery>,
    request: Request,
) -> Result<Json<BookingListResponse>, AppError> {
    let operator = get_operator(request.headers());

    // Input validation: clamp pagination parameters
    let limit = params.limit.max(1).min(MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let filter = parse_booking_filter(
        params.guest.as_deref(),
        params.status.as_deref(),
        params.platform.as_deref(),
        params.from.as_deref(),
        params.to.as_deref(),
    )?;

    let bookings = state.db.list_bookings(&filter, limit, offset)?;
    let total_count = state.db.count_bookings_filtered(&filter)?;

    // Audit log - read access
    state.db.log_audit(
        &operator,
        "list",
        Some("booking"),
        None,
        Some(&format!(
            "limit={}, offset={}, guest={:?}, status={:?}, platform={:?}, returned={}",
            limit,
            offset,
            params.guest,
            params.status,
            params.platform,
            bookings.len()
        )),
    )?;

    Ok(Json(BookingListResponse {
        bookings,
        total_count,
        limit,
        offset,
    }))
}

/// Request body for manually creating a booking
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// Reservation number; derived from the entry hash when absent
    pub booking_id: Option<String>,
    pub guest_name: String,
    pub checkin_date: Option<NaiveDate>,
    pub checkout_date: Option<NaiveDate>,
    #[serde(default)]
    pub room_amount: f64,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub collected_amount: f64,
    pub collector: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/bookings - Manually create a booking
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Booking>, AppError> {
    let operator = get_operator(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 16)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: CreateBookingRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let guest_name = req.guest_name.trim();
    if guest_name.is_empty() {
        return Err(AppError::bad_request("Guest name cannot be empty"));
    }

    let status = match req.status.as_deref() {
        Some(s) => s
            .parse::<BookingStatus>()
            .map_err(|e| AppError::bad_request(&e))?,
        None => BookingStatus::default(),
    };

    // Manual entries share the import identity hash so double-entering the
    // same reservation is caught like a re-imported row
    let provided_id = req.booking_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let import_hash = generate_hash(provided_id.unwrap_or(""), guest_name, req.checkin_date);
    let booking_id = match provided_id {
        Some(id) => id.to_string(),
        None => format!("MAN-{}", &import_hash[..10]),
    };

    if state.db.get_booking(&booking_id)?.is_some() {
        return Err(AppError::conflict(&format!(
            "Booking {} already exists",
            booking_id
        )));
    }

    let new_booking = NewBooking {
        booking_id: booking_id.clone(),
        guest_name: guest_name.to_string(),
        checkin_date: req.checkin_date,
        checkout_date: req.checkout_date,
        room_amount: req.room_amount,
        commission: req.commission,
        collected_amount: req.collected_amount,
        collector: req.collector,
        booking_status: status,
        booking_notes: req.notes,
        platform: None,
        import_hash,
        original_data: None,
    };

    match state.db.insert_booking(&new_booking)? {
        BookingInsertResult::Inserted(_) => {}
        BookingInsertResult::Duplicate(_) => {
            return Err(AppError::conflict(
                "A booking with these details already exists",
            ));
        }
    }

    state.db.log_audit(
        &operator,
        "create",
        Some("booking"),
        Some(&booking_id),
        Some(&format!("guest={}, checkin={:?}", guest_name, req.checkin_date)),
    )?;

    let booking = state
        .db
        .get_booking(&booking_id)?
        .ok_or_else(|| AppError::internal("Booking not found after creation"))?;

    Ok(Json(booking))
}

/// GET /api/bookings/:booking_id - Get a single booking
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    request: Request,
) -> Result<Json<Booking>, AppError> {
    let operator = get_operator(request.headers());

    let booking = state
        .db
        .get_booking(&booking_id)?
        .ok_or_else(|| AppError::not_found(&format!("Booking {} not found", booking_id)))?;

    state
        .db
        .log_audit(&operator, "get", Some("booking"), Some(&booking_id), None)?;

    Ok(Json(booking))
}

/// Request body for updating booking notes
#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    /// New note text; null clears the notes
    pub notes: Option<String>,
}

/// PATCH /api/bookings/:booking_id/notes - Update customer care notes
pub async fn update_booking_notes(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    request: Request,
) -> Result<Json<crate::SuccessResponse>, AppError> {
    let operator = get_operator(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 16)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: UpdateNotesRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let updated = state
        .db
        .update_booking_notes(&booking_id, req.notes.as_deref())?;
    if !updated {
        return Err(AppError::not_found(&format!(
            "Booking {} not found",
            booking_id
        )));
    }

    state.db.log_audit(
        &operator,
        "update_notes",
        Some("booking"),
        Some(&booking_id),
        None,
    )?;

    Ok(Json(crate::SuccessResponse { success: true }))
}

/// Request body for updating booking status
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PATCH /api/bookings/:booking_id/status - Update the lifecycle status
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    request: Request,
) -> Result<Json<crate::SuccessResponse>, AppError> {
    let operator = get_operator(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: UpdateStatusRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let status = req
        .status
        .parse::<BookingStatus>()
        .map_err(|e| AppError::bad_request(&e))?;

    let updated = state.db.update_booking_status(&booking_id, status)?;
    if !updated {
        return Err(AppError::not_found(&format!(
            "Booking {} not found",
            booking_id
        )));
    }

    state.db.log_audit(
        &operator,
        "update_status",
        Some("booking"),
        Some(&booking_id),
        Some(&format!("status={}", status)),
    )?;

    Ok(Json(crate::SuccessResponse { success: true }))
}

/// Response for deleting a booking
#[derive(Serialize)]
pub struct DeleteBookingResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// DELETE /api/bookings/:booking_id - Permanently delete a booking
///
/// A missing booking reports `success: false` with an error instead of a
/// bare 404 body, so bulk callers can fold the result into per-item tallies.
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    request: Request,
) -> Result<(StatusCode, Json<DeleteBookingResponse>), AppError> {
    let operator = get_operator(request.headers());

    let deleted = state.db.delete_booking(&booking_id)?;

    state.db.log_audit(
        &operator,
        "delete",
        Some("booking"),
        Some(&booking_id),
        Some(&format!("deleted={}", deleted)),
    )?;

    if deleted {
        Ok((
            StatusCode::OK,
            Json(DeleteBookingResponse {
                success: true,
                error: None,
            }),
        ))
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(DeleteBookingResponse {
                success: false,
                error: Some(format!("Booking {} not found", booking_id)),
            }),
        ))
    }
}
