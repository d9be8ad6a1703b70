//! Booking operations

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::Result;
use crate::models::{Booking, BookingFilter, BookingInsertResult, BookingStatus, NewBooking};

impl Database {
    /// Insert a booking, skipping rows whose import hash already exists
    ///
    /// Returns `Duplicate` with the existing row id when the same source row
    /// was imported before, `Inserted` with the new row id otherwise.
    pub fn insert_booking(&self, booking: &NewBooking) -> Result<BookingInsertResult> {
        let conn = self.conn()?;

        // Check for a previously imported copy of this row
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM bookings WHERE import_hash = ?",
                params![booking.import_hash],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing_id) = existing {
            return Ok(BookingInsertResult::Duplicate(existing_id));
        }

        conn.execute(
            r#"
            INSERT INTO bookings (booking_id, guest_name, checkin_date, checkout_date, room_amount, commission, collected_amount, collector, booking_status, booking_notes, platform, import_hash, original_data)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                booking.booking_id,
                booking.guest_name,
                booking.checkin_date.map(|d| d.to_string()),
                booking.checkout_date.map(|d| d.to_string()),
                booking.room_amount,
                booking.commission,
                booking.collected_amount,
                booking.collector,
                booking.booking_status.as_str(),
                booking.booking_notes,
                booking.platform.map(|p| p.as_str()),
                booking.import_hash,
                booking.original_data,
            ],
        )?;

        Ok(BookingInsertResult::Inserted(conn.last_insert_rowid()))
    }

    /// Get a single booking by its business identifier
    pub fn get_booking(&self, booking_id: &str) -> Result<Option<Booking>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, booking_id, guest_name, checkin_date, checkout_date, room_amount,
                    commission, collected_amount, collector, booking_status, booking_notes,
                    platform, import_hash, original_data, created_at
             FROM bookings WHERE booking_id = ?",
        )?;

        let booking = stmt
            .query_row(params![booking_id], |row| Self::row_to_booking(row))
            .optional()?;

        Ok(booking)
    }

    /// List bookings with optional filters
    pub fn list_bookings(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>> {
        let conn = self.conn()?;

        // Build dynamic WHERE clause
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref q) = filter.guest {
            if !q.trim().is_empty() {
                conditions.push("guest_name LIKE ? COLLATE NOCASE".to_string());
                params.push(Box::new(format!("%{}%", q.trim())));
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

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT id, booking_id, guest_name, checkin_date, checkout_date, room_amount,
                   commission, collected_amount, collector, booking_status, booking_notes,
                   platform, import_hash, original_data, created_at
            FROM bookings
            {}
            ORDER BY checkin_date DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );

        params.push(Box::new(limit));
        params.push(Box::new(offset));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let bookings = stmt
            .query_map(params_refs.as_slice(), |row| Self::row_to_booking(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Count bookings matching the same filters as `list_bookings`
    pub fn count_bookings_filtered(&self, filter: &BookingFilter) -> Result<i64> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref q) = filter.guest {
            if !q.trim().is_empty() {
                conditions.push("guest_name LIKE ? COLLATE NOCASE".to_string());
                params.push(Box::new(format!("%{}%", q.trim())));
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

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!("SELECT COUNT(*) FROM bookings {}", where_clause);

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = stmt.query_row(params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    /// List every booking, optionally restricted to one guest (exact name match)
    ///
    /// Rows come back oldest-first by creation time so duplicate grouping can
    /// rely on member order without re-sorting.
    pub fn all_bookings(&self, guest_name: Option<&str>) -> Result<Vec<Booking>> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(guest) = guest_name {
            conditions.push("guest_name = ?".to_string());
            params.push(Box::new(guest.to_string()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT id, booking_id, guest_name, checkin_date, checkout_date, room_amount,
                   commission, collected_amount, collector, booking_status, booking_notes,
                   platform, import_hash, original_data, created_at
            FROM bookings
            {}
            ORDER BY created_at ASC, id ASC
            "#,
            where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let bookings = stmt
            .query_map(params_refs.as_slice(), |row| Self::row_to_booking(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Count total bookings
    pub fn count_bookings(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Update the care notes on a booking
    ///
    /// Returns false when no booking with that identifier exists.
    pub fn update_booking_notes(&self, booking_id: &str, notes: Option<&str>) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE bookings SET booking_notes = ? WHERE booking_id = ?",
            params![notes, booking_id],
        )?;
        Ok(updated > 0)
    }

    /// Update the lifecycle status of a booking
    ///
    /// Returns false when no booking with that identifier exists.
    pub fn update_booking_status(&self, booking_id: &str, status: BookingStatus) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE bookings SET booking_status = ? WHERE booking_id = ?",
            params![status.as_str(), booking_id],
        )?;
        Ok(updated > 0)
    }

    /// Permanently delete a booking by its business identifier
    ///
    /// Returns false when no booking with that identifier exists. There is
    /// no soft-delete or undo; resolution flows confirm before calling this.
    pub fn delete_booking(&self, booking_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM bookings WHERE booking_id = ?",
            params![booking_id],
        )?;
        Ok(deleted > 0)
    }

    /// Helper to convert a row to Booking
    /// Column order: id, booking_id, guest_name, checkin_date, checkout_date, room_amount,
    ///               commission, collected_amount, collector, booking_status, booking_notes,
    ///               platform, import_hash, original_data, created_at
    pub(crate) fn row_to_booking(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
        let checkin_str: Option<String> = row.get(3)?;
        let checkout_str: Option<String> = row.get(4)?;
        let status_str: String = row.get(9)?;
        let platform_str: Option<String> = row.get(11)?;
        let import_hash: Option<String> = row.get(12)?;
        let created_at_str: String = row.get(14)?;
        Ok(Booking {
            id: row.get(0)?,
            booking_id: row.get(1)?,
            guest_name: row.get(2)?,
            checkin_date: checkin_str
                .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            checkout_date: checkout_str
                .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            room_amount: row.get(5)?,
            commission: row.get(6)?,
            collected_amount: row.get(7)?,
            collector: row.get(8)?,
            // Unknown stored statuses coerce to pending rather than failing the read
            booking_status: status_str.parse().unwrap_or_default(),
            booking_notes: row.get(10)?,
            platform: platform_str.and_then(|s| s.parse().ok()),
            import_hash: import_hash.unwrap_or_default(),
            original_data: row.get(13)?,
            created_at: super::parse_datetime(&created_at_str),
        })
    }
}
