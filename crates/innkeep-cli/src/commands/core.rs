//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `parse_filter` - Shared parsing of booking filter flags
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use innkeep_core::db::Database;
use innkeep_core::models::BookingFilter;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Parse the list/export filter flags into a `BookingFilter`
pub fn parse_filter(
    guest: Option<String>,
    status: Option<String>,
    platform: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> Result<BookingFilter> {
    let status = status
        .as_deref()
        .map(|s| s.parse().map_err(|e: String| anyhow::anyhow!(e)))
        .transpose()?;

    let platform = platform
        .as_deref()
        .map(|s| s.parse().map_err(|e: String| anyhow::anyhow!(e)))
        .transpose()?;

    let from = from
        .as_deref()
        .map(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --from date format (use YYYY-MM-DD)")?;

    let to = to
        .as_deref()
        .map(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --to date format (use YYYY-MM-DD)")?;

    Ok(BookingFilter {
        guest,
        status,
        platform,
        from,
        to,
    })
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    // Opening runs the schema migrations
    let _db = open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import bookings: innkeep import --file bookings.csv");
    println!("  2. Check for duplicates: innkeep detect");
    println!("  3. Start web UI: innkeep serve");

    Ok(())
}
