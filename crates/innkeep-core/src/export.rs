//! CSV export of bookings
//!
//! Produces a spreadsheet-friendly dump of the booking table with a fixed
//! header row, reusing the same filters the listing endpoints accept.

use crate::error::Result;
use crate::models::{Booking, BookingFilter};

/// Header row for booking CSV exports
const EXPORT_HEADER: &str = "booking_id,guest_name,checkin_date,checkout_date,room_amount,\
commission,collected_amount,collector,booking_status,booking_notes,platform,created_at";

impl crate::db::Database {
    /// Fetch bookings for export, oldest check-in first
    pub fn export_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let conn = self.conn()?;

        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(guest) = filter.guest.as_deref() {
            let guest = guest.trim();
            if !guest.is_empty() {
                conditions.push("guest_name LIKE ? COLLATE NOCASE".to_string());
                params.push(Box::new(format!("%{}%", guest)));
            }
        }
        if let Some(status) = filter.status {
            conditions.push("booking_status = ?".to_string());
            params.push(Box::new(status.as_str()));
        }
        if let Some(platform) = filter.platform {
            conditions.push("platform = ?".to_string());
            params.push(Box::new(platform.as_str()));
        }
        if let Some(from) = filter.from {
            conditions.push("checkin_date >= ?".to_string());
            params.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            conditions.push("checkin_date <= ?".to_string());
            params.push(Box::new(to.to_string()));
        }

        let mut sql = String::from(
            "SELECT id, booking_id, guest_name, checkin_date, checkout_date, room_amount, \
             commission, collected_amount, collector, booking_status, booking_notes, platform, \
             import_hash, original_data, created_at FROM bookings",
        );
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY checkin_date ASC, id ASC");

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let bookings = stmt
            .query_map(params_refs.as_slice(), |row| Self::row_to_booking(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Export bookings to CSV with a fixed header row
    pub fn export_bookings_csv(&self, filter: &BookingFilter) -> Result<String> {
        let bookings = self.export_bookings(filter)?;

        let mut csv = String::from(EXPORT_HEADER);
        csv.push('\n');

        for b in bookings {
            let checkin = b.checkin_date.map(|d| d.to_string()).unwrap_or_default();
            let checkout = b.checkout_date.map(|d| d.to_string()).unwrap_or_default();
            let collector = b.collector.as_deref().unwrap_or("");
            let notes = b.booking_notes.as_deref().unwrap_or("");
            let platform = b.platform.map(|p| p.as_str()).unwrap_or("");

            csv.push_str(&format!(
                "{},{},{},{},{:.2},{:.2},{:.2},{},{},{},{},{}\n",
                escape_csv_field(&b.booking_id),
                escape_csv_field(&b.guest_name),
                checkin,
                checkout,
                b.room_amount,
                b.commission,
                b.collected_amount,
                escape_csv_field(collector),
                b.booking_status.as_str(),
                escape_csv_field(notes),
                platform,
                b.created_at.format("%Y-%m-%d %H:%M:%S"),
            ));
        }

        Ok(csv)
    }
}

/// Escape a field for CSV output
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
