//! CSV import handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{get_operator, AppError, AppState, MAX_PAGE_LIMIT, MAX_UPLOAD_SIZE};
use innkeep_core::import::{detect_platform_format, import_bookings, ImportOutcome};
use innkeep_core::models::{ImportSession, NewImportSession, Platform};

/// POST /api/import - Import bookings from a platform CSV export
///
/// Expects multipart form with:
/// - file: CSV file (required, max 10MB)
/// - platform: booking_com | agoda | airbnb (optional; sniffed from the
///   header row when absent)
pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ImportOutcome>, AppError> {
    let operator = get_operator(&headers);

    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut platform: Option<Platform> = None;
    let mut total_size: usize = 0;

    // Extract fields from multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read file data"))?;
                total_size += bytes.len();

                // Check file size limit
                if total_size > MAX_UPLOAD_SIZE {
                    return Err(AppError::bad_request(&format!(
                        "File too large. Maximum size is {} MB",
                        MAX_UPLOAD_SIZE / 1024 / 1024
                    )));
                }

                file_data = Some(bytes.to_vec());
            }
            "platform" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read platform"))?;
                if !value.is_empty() {
                    platform = Some(
                        value
                            .parse()
                            .map_err(|e: String| AppError::bad_request(&e))?,
                    );
                }
            }
            _ => {}
        }
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("Missing file field"))?;

    // Sniff the platform from the header row when not given explicitly
    let platform = match platform {
        Some(p) => p,
        None => {
            let file_str = String::from_utf8_lossy(&file_data);
            let header_line = file_str
                .lines()
                .next()
                .ok_or_else(|| AppError::bad_request("Empty CSV file"))?;
            detect_platform_format(header_line).ok_or_else(|| {
                AppError::bad_request(
                    "Unrecognized CSV format; pass an explicit platform field",
                )
            })?
        }
    };

    let session = NewImportSession {
        filename,
        file_size_bytes: Some(file_data.len() as i64),
        platform,
        operator: Some(operator.clone()),
    };

    let outcome = import_bookings(&state.db, file_data.as_slice(), session)?;

    state.db.log_audit(
        &operator,
        "import",
        Some("import_session"),
        Some(&outcome.session_id.to_string()),
        Some(&format!(
            "platform={}, file_size={}, imported={}, duplicates={}, skipped={}",
            platform.as_str(),
            file_data.len(),
            outcome.imported,
            outcome.duplicates,
            outcome.skipped
        )),
    )?;

    Ok(Json(outcome))
}

/// Query parameters for listing import sessions
#[derive(Debug, Deserialize)]
pub struct ImportHistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Response for listing import sessions
#[derive(Debug, Serialize)]
pub struct ImportHistoryResponse {
    pub sessions: Vec<ImportSession>,
    pub total: i64,
}

/// GET /api/import/history - List import sessions, newest first
pub async fn list_import_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ImportHistoryQuery>,
    request: Request,
) -> Result<Json<ImportHistoryResponse>, AppError> {
    let operator = get_operator(request.headers());
    let limit = params.limit.max(1).min(MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let sessions = state.db.list_import_sessions(limit, offset)?;
    let total = state.db.count_import_sessions()?;

    state.db.log_audit(
        &operator,
        "list",
        Some("import_sessions"),
        None,
        Some(&format!("limit={}, offset={}", limit, offset)),
    )?;

    Ok(Json(ImportHistoryResponse { sessions, total }))
}

/// GET /api/import/history/:id - Get a single import session
pub async fn get_import_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<ImportSession>, AppError> {
    let operator = get_operator(request.headers());

    let session = state
        .db
        .get_import_session(id)?
        .ok_or_else(|| AppError::not_found("Import session not found"))?;

    state.db.log_audit(
        &operator,
        "view",
        Some("import_session"),
        Some(&id.to_string()),
        None,
    )?;

    Ok(Json(session))
}
