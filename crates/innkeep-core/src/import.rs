//! CSV import parsers for platform reservation exports
//!
//! Booking.com, Agoda, and Airbnb each export reservations with their own
//! column names, date formats, and status vocabulary. The parsers map all
//! three onto `NewBooking` and the import runner stores the rows while
//! keeping per-row tallies in an import session.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::io::Read;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{BookingInsertResult, BookingStatus, NewBooking, NewImportSession, Platform};

/// Column names for one platform's reservation export
struct PlatformColumns {
    booking_id: &'static str,
    guest_name: &'static str,
    checkin: &'static str,
    checkout: &'static str,
    amount: &'static str,
    commission: &'static str,
    status: &'static str,
}

fn platform_columns(platform: Platform) -> PlatformColumns {
    match platform {
        Platform::BookingCom => PlatformColumns {
            booking_id: "Book number",
            guest_name: "Guest name(s)",
            checkin: "Check-in",
            checkout: "Check-out",
            amount: "Price",
            commission: "Commission amount",
            status: "Status",
        },
        Platform::Agoda => PlatformColumns {
            booking_id: "Booking ID",
            guest_name: "Guest Name",
            checkin: "Check-In",
            checkout: "Check-Out",
            amount: "Reference Sell Rate",
            commission: "Commission",
            status: "Status",
        },
        Platform::Airbnb => PlatformColumns {
            booking_id: "Confirmation code",
            guest_name: "Guest name",
            checkin: "Start date",
            checkout: "End date",
            amount: "Earnings",
            commission: "Service fee",
            status: "Status",
        },
    }
}

/// Rows produced by parsing one CSV export
#[derive(Debug)]
pub struct ParsedImport {
    pub bookings: Vec<NewBooking>,
    /// Rows dropped during parsing: cancellations and rows missing an id or guest
    pub skipped_rows: usize,
}

/// Counts from one completed import run
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportOutcome {
    pub session_id: i64,
    pub imported: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

impl ImportOutcome {
    pub fn total_rows(&self) -> usize {
        self.imported + self.duplicates + self.skipped
    }
}

/// Detect the source platform from a CSV header line
///
/// Returns None if the format is not recognized.
pub fn detect_platform_format(header: &str) -> Option<Platform> {
    let header = header.trim();

    // Booking.com: "Book number,Booked by,Guest name(s),Check-in,Check-out,..."
    if header.contains("Book number") && header.contains("Guest name(s)") {
        return Some(Platform::BookingCom);
    }

    // Agoda: "Booking ID,Guest Name,Check-In,Check-Out,Reference Sell Rate,Commission,..."
    if header.contains("Booking ID") && header.contains("Reference Sell Rate") {
        return Some(Platform::Agoda);
    }

    // Airbnb: "Confirmation code,Status,Guest name,Start date,End date,..."
    if header.contains("Confirmation code") {
        return Some(Platform::Airbnb);
    }

    None
}

/// Parse a platform CSV export into bookings
///
/// Cancelled reservations and rows without a booking id or guest name are
/// skipped and counted, never errors. A missing required column means the
/// file is not that platform's export and fails the whole parse.
pub fn parse_csv<R: Read>(reader: R, platform: Platform) -> Result<ParsedImport> {
    let cols = platform_columns(platform);

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();

    let require = |name: &'static str| -> Result<usize> {
        column_index(&headers, name).ok_or_else(|| {
            Error::Import(format!(
                "Missing '{}' column for a {} export",
                name,
                platform.display_name()
            ))
        })
    };

    let id_col = require(cols.booking_id)?;
    let guest_col = require(cols.guest_name)?;
    let checkin_col = require(cols.checkin)?;
    let checkout_col = require(cols.checkout)?;
    let amount_col = require(cols.amount)?;
    let commission_col = require(cols.commission)?;
    let status_col = require(cols.status)?;

    let mut bookings = Vec::new();
    let mut skipped_rows = 0;

    for result in rdr.records() {
        let record = result?;

        let status_raw = record.get(status_col).unwrap_or("").trim();
        if is_cancelled(status_raw) {
            skipped_rows += 1;
            continue;
        }

        let booking_id = record.get(id_col).unwrap_or("").trim().to_string();
        let guest_name = record.get(guest_col).unwrap_or("").trim().to_string();
        if booking_id.is_empty() || guest_name.is_empty() {
            warn!("Skipping row without booking id or guest name");
            skipped_rows += 1;
            continue;
        }

        // Malformed dates leave the field absent rather than dropping the row
        let checkin_date = record.get(checkin_col).and_then(parse_date);
        let checkout_date = record.get(checkout_col).and_then(parse_date);

        let room_amount = parse_amount(record.get(amount_col).unwrap_or(""));
        let commission = parse_amount(record.get(commission_col).unwrap_or(""));

        // Unknown statuses land on pending for an operator to review
        let booking_status: BookingStatus = status_raw.parse().unwrap_or_default();

        let import_hash = generate_hash(&booking_id, &guest_name, checkin_date);
        let original_data = Some(record_to_json(&headers, &record));

        bookings.push(NewBooking {
            booking_id,
            guest_name,
            checkin_date,
            checkout_date,
            room_amount,
            commission,
            collected_amount: 0.0,
            collector: None,
            booking_status,
            booking_notes: None,
            platform: Some(platform),
            import_hash,
            original_data,
        });
    }

    debug!(
        "Parsed {} {} bookings, skipped {}",
        bookings.len(),
        platform.display_name(),
        skipped_rows
    );
    Ok(ParsedImport {
        bookings,
        skipped_rows,
    })
}

/// Parse a CSV export and store its bookings under a new import session
///
/// One bad row never aborts the run: parser skips, known-hash duplicates,
/// and insert failures are all counted, and the session row keeps the
/// tallies. Only an unreadable file fails the run, and the session is
/// marked failed with the reason.
pub fn import_bookings<R: Read>(
    db: &Database,
    reader: R,
    session: NewImportSession,
) -> Result<ImportOutcome> {
    let platform = session.platform;
    let session_id = db.create_import_session(&session)?;

    let parsed = match parse_csv(reader, platform) {
        Ok(parsed) => parsed,
        Err(e) => {
            db.mark_import_failed(session_id, &e.to_string())?;
            return Err(e);
        }
    };

    let mut imported = 0;
    let mut duplicates = 0;
    let mut skipped = parsed.skipped_rows;

    for booking in &parsed.bookings {
        match db.insert_booking(booking) {
            Ok(BookingInsertResult::Inserted(_)) => imported += 1,
            Ok(BookingInsertResult::Duplicate(_)) => duplicates += 1,
            Err(e) => {
                warn!("Skipping booking {}: {}", booking.booking_id, e);
                skipped += 1;
            }
        }
    }

    db.update_import_session_results(
        session_id,
        imported as i64,
        duplicates as i64,
        skipped as i64,
    )?;
    db.mark_import_completed(session_id)?;

    info!(
        "Import session {} complete: {} imported, {} duplicates, {} skipped",
        session_id, imported, duplicates, skipped
    );

    Ok(ImportOutcome {
        session_id,
        imported,
        duplicates,
        skipped,
    })
}

/// Locate a column by exact header name
fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// True when a status marks a cancelled reservation
///
/// Booking.com uses "cancelled_by_guest", Agoda "Cancelled", Airbnb
/// "Canceled".
fn is_cancelled(status: &str) -> bool {
    let status = status.trim().to_lowercase();
    status == "cancelled_by_guest" || status == "cancelled" || status == "canceled"
}

/// Hash identifying a reservation row across re-imports
///
/// Manual entries use the same hash so double-entering a booking is caught
/// the same way a re-imported CSV row is.
pub fn generate_hash(booking_id: &str, guest_name: &str, checkin: Option<NaiveDate>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(booking_id.as_bytes());
    hasher.update(guest_name.as_bytes());
    hasher.update(
        checkin
            .map(|d| d.to_string())
            .unwrap_or_default()
            .as_bytes(),
    );
    hex::encode(hasher.finalize())
}

/// Parse a date in the formats platform exports are known to use
///
/// Day-first wins for ambiguous slash dates, matching how the platforms
/// format their exports in this region.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2025-03-10
        "%d/%m/%Y", // 10/03/2025
        "%m/%d/%Y", // 03/10/2025
        "%d-%m-%Y", // 10-03-2025
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    None
}

/// Parse an amount, stripping currency symbols, separators, and spaces
///
/// Exports write "US$1,200.00", "₫ 2,500,000", or plain numbers. Anything
/// unparseable coerces to zero rather than dropping the row.
fn parse_amount(s: &str) -> f64 {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Convert a CSV record to a JSON object using headers as keys
fn record_to_json(headers: &StringRecord, record: &StringRecord) -> String {
    let mut map = serde_json::Map::new();
    for (i, header) in headers.iter().enumerate() {
        if let Some(value) = record.get(i) {
            map.insert(header.to_string(), Value::String(value.to_string()));
        }
    }
    json!(map).to_string()
}
