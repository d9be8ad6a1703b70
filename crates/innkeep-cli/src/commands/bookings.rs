//! Booking listing and CSV export commands

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use innkeep_core::db::Database;
use innkeep_core::models::BookingFilter;

use super::truncate;

pub fn cmd_list(db: &Database, filter: &BookingFilter, limit: i64) -> Result<()> {
    let bookings = db.list_bookings(filter, limit, 0)?;
    let total = db.count_bookings_filtered(filter)?;

    if bookings.is_empty() {
        println!("No bookings found. Import some with:");
        println!("  innkeep import --file bookings.csv");
        return Ok(());
    }

    println!();
    println!("📒 Bookings ({} of {})", bookings.len(), total);
    println!("   ─────────────────────────────────────────────────────────────");

    for booking in &bookings {
        let checkin = booking
            .checkin_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "(no date)".to_string());
        let platform = booking.platform.map(|p| p.as_str()).unwrap_or("manual");
        println!(
            "   {:<14} │ {:>10} │ {:>10.2} │ {:<11} │ {} │ {}",
            truncate(&booking.booking_id, 14),
            checkin,
            booking.room_amount,
            platform,
            booking.booking_status,
            truncate(&booking.guest_name, 30)
        );
    }

    let shown = bookings.len() as i64;
    if total > shown {
        println!();
        println!("   ({} more; raise --limit to see them)", total - shown);
    }

    Ok(())
}

/// Export bookings to CSV
pub fn cmd_export(db: &Database, filter: &BookingFilter, output: Option<PathBuf>) -> Result<()> {
    let csv = db.export_bookings_csv(filter)?;

    match output {
        Some(path) => {
            let mut file = File::create(&path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            file.write_all(csv.as_bytes())?;

            let rows = csv.lines().count().saturating_sub(1); // Subtract header
            println!("✅ Exported {} bookings to {}", rows, path.display());
        }
        None => {
            // Write to stdout
            print!("{}", csv);
        }
    }

    Ok(())
}
