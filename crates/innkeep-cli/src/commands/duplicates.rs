//! Duplicate detection and resolution commands

use std::io::{self, Write};

use anyhow::Result;
use innkeep_core::db::Database;
use innkeep_core::duplicates::{build_comparison, DuplicateDetector};
use innkeep_core::resolution::{select_all_but_oldest, DuplicateSelection, ResolutionExecutor};

use super::truncate;

pub fn cmd_detect(db: &Database, guest: Option<&str>, compare: bool) -> Result<()> {
    println!("🔍 Scanning for duplicate bookings...");

    let detector = DuplicateDetector::new(db);
    let report = detector.detect(guest)?;

    println!(
        "   Examined {} guest(s) in {} ms",
        report.processing_info.processed_guests, report.processing_info.processing_time_ms
    );

    if report.duplicates.is_empty() {
        println!();
        println!("✅ No duplicate bookings found.");
        return Ok(());
    }

    println!();
    println!("📊 {} duplicate group(s)", report.total_groups);

    for group in &report.duplicates {
        println!();
        println!(
            "   {} — {} bookings, check-ins up to {} day(s) apart",
            group.guest_name,
            group.bookings.len(),
            group.date_difference_days
        );
        println!("   ─────────────────────────────────────────────");

        for (i, booking) in group.bookings.iter().enumerate() {
            let checkin = booking
                .checkin_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "(no date)".to_string());
            let marker = if i == 0 { "  ← oldest" } else { "" };
            println!(
                "   {:<14} │ {:>10} │ {:>10.2}{}",
                truncate(&booking.booking_id, 14),
                checkin,
                booking.room_amount,
                marker
            );
        }

        if compare {
            let comparison = build_comparison(group);
            println!();
            for field in &comparison.fields {
                let mark = if field.divergent { "≠" } else { " " };
                println!(
                    "   {} {:<17} {}",
                    mark,
                    field.field,
                    field.values.join(" │ ")
                );
            }
        }
    }

    println!();
    println!("💡 Remove extras with: innkeep resolve <BOOKING_ID>...");
    println!("   or keep only the oldest per group: innkeep resolve --all-but-oldest");

    Ok(())
}

pub fn cmd_resolve(
    db: &Database,
    booking_ids: Vec<String>,
    all_but_oldest: bool,
    yes: bool,
) -> Result<()> {
    let selection = if all_but_oldest {
        if !booking_ids.is_empty() {
            anyhow::bail!("Pass either booking IDs or --all-but-oldest, not both");
        }

        let detector = DuplicateDetector::new(db);
        let report = detector.detect(None)?;
        if report.duplicates.is_empty() {
            println!("✅ No duplicate bookings found. Nothing to resolve.");
            return Ok(());
        }
        select_all_but_oldest(&report.duplicates)
    } else {
        if booking_ids.is_empty() {
            anyhow::bail!("No booking IDs given. Pass IDs or use --all-but-oldest");
        }
        DuplicateSelection::new(booking_ids)
    };

    println!("🗑️  {} booking(s) selected for deletion:", selection.len());
    for id in selection.ids() {
        println!("   - {}", id);
    }

    if !yes {
        print!("\nAre you sure? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let executor = ResolutionExecutor::new(db);
    let outcome = executor.resolve(&selection);

    db.log_audit(
        "cli",
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

    println!();
    println!("✅ Resolution complete!");
    println!("   Deleted: {}", outcome.success_count);
    if outcome.fail_count > 0 {
        println!("   ⚠️  Failed: {}", outcome.fail_count);
        for failure in &outcome.failed {
            println!("      {} — {}", failure.booking_id, failure.error);
        }
    }

    Ok(())
}
