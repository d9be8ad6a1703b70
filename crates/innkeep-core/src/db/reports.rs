//! Dashboard and calendar aggregates

use chrono::{Duration, NaiveDate, Utc};
use rusqlite::params;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{CalendarDay, DashboardStats, PlatformCount};

impl Database {
    /// Get summary statistics for the dashboard
    pub fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        let conn = self.conn()?;

        let total_bookings: i64 =
            conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;

        let confirmed_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE booking_status = 'confirmed'",
            [],
            |row| row.get(0),
        )?;

        let pending_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE booking_status = 'pending'",
            [],
            |row| row.get(0),
        )?;

        let total_room_amount: f64 = conn.query_row(
            "SELECT COALESCE(SUM(room_amount), 0) FROM bookings",
            [],
            |row| row.get(0),
        )?;

        let total_commission: f64 = conn.query_row(
            "SELECT COALESCE(SUM(commission), 0) FROM bookings",
            [],
            |row| row.get(0),
        )?;

        let total_collected: f64 = conn.query_row(
            "SELECT COALESCE(SUM(collected_amount), 0) FROM bookings",
            [],
            |row| row.get(0),
        )?;

        let outstanding_amount: f64 = conn.query_row(
            "SELECT COALESCE(SUM(room_amount - collected_amount), 0) FROM bookings",
            [],
            |row| row.get(0),
        )?;

        // Check-ins from today through seven days out
        let today = Utc::now().date_naive();
        let week_out = today + Duration::days(7);
        let upcoming_checkins: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE checkin_date BETWEEN ? AND ?",
            params![today.to_string(), week_out.to_string()],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            r#"
            SELECT platform, COUNT(*) as count
            FROM bookings
            WHERE platform IS NOT NULL
            GROUP BY platform
            ORDER BY count DESC
            "#,
        )?;

        let platform_counts = stmt
            .query_map([], |row| {
                Ok(PlatformCount {
                    platform: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(DashboardStats {
            total_bookings,
            confirmed_count,
            pending_count,
            total_room_amount,
            total_commission,
            total_collected,
            outstanding_amount,
            upcoming_checkins,
            platform_counts,
        })
    }

    /// Get per-day occupancy numbers for one calendar month
    ///
    /// A booking counts as staying on a day when checkin_date <= day < checkout_date,
    /// so the arrival night is included and the departure day is not.
    pub fn get_calendar_month(&self, year: i32, month: u32) -> Result<Vec<CalendarDay>> {
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidData(format!("Invalid month: {}-{}", year, month)))?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| Error::InvalidData(format!("Invalid month: {}-{}", year, month)))?;
        let last_day = next_month - Duration::days(1);

        let conn = self.conn()?;

        // Fetch the date spans of bookings touching this month, then
        // accumulate per-day counts in memory
        let mut stmt = conn.prepare(
            r#"
            SELECT checkin_date, checkout_date
            FROM bookings
            WHERE checkin_date IS NOT NULL
              AND checkin_date <= ?
              AND (checkout_date IS NULL OR checkout_date >= ?)
            "#,
        )?;

        let spans: Vec<(Option<NaiveDate>, Option<NaiveDate>)> = stmt
            .query_map(
                params![last_day.to_string(), first_day.to_string()],
                |row| {
                    let checkin: Option<String> = row.get(0)?;
                    let checkout: Option<String> = row.get(1)?;
                    Ok((
                        checkin.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                        checkout.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut days = Vec::new();
        let mut day = first_day;
        while day <= last_day {
            let mut arrivals = 0;
            let mut departures = 0;
            let mut staying = 0;

            for (checkin, checkout) in &spans {
                if *checkin == Some(day) {
                    arrivals += 1;
                }
                if *checkout == Some(day) {
                    departures += 1;
                }
                if let Some(ci) = checkin {
                    let still_in = match checkout {
                        Some(co) => day < *co,
                        // Open-ended stays count until a checkout date is recorded
                        None => true,
                    };
                    if *ci <= day && still_in {
                        staying += 1;
                    }
                }
            }

            days.push(CalendarDay {
                date: day,
                arrivals,
                departures,
                staying,
            });
            day += Duration::days(1);
        }

        Ok(days)
    }
}
