//! CSV import command implementation

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use innkeep_core::import::{detect_platform_format, import_bookings};
use innkeep_core::models::{NewImportSession, Platform};

use super::open_db;

pub fn cmd_import(
    db_path: &Path,
    file: &Path,
    platform_str: Option<&str>,
    no_encrypt: bool,
) -> Result<()> {
    // Open file and read first line for auto-detection
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let mut buf_reader = BufReader::new(csv_file);

    let mut header_line = String::new();
    buf_reader
        .read_line(&mut header_line)
        .with_context(|| "Failed to read CSV header")?;

    // Determine platform format
    let platform: Platform = if let Some(platform_str) = platform_str {
        platform_str
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown platform: {}", platform_str))?
    } else {
        detect_platform_format(&header_line).ok_or_else(|| {
            anyhow::anyhow!(
                "Could not auto-detect platform from CSV header.\n\
                 Specify --platform with one of: booking_com, agoda, airbnb"
            )
        })?
    };

    println!(
        "📥 Importing {} bookings from {}...",
        platform.display_name(),
        file.display()
    );

    let db = open_db(db_path, no_encrypt)?;

    let file_size_bytes = match std::fs::metadata(file) {
        Ok(m) => Some(m.len() as i64),
        Err(e) => {
            tracing::debug!("Could not stat {}: {}", file.display(), e);
            None
        }
    };

    let session = NewImportSession {
        filename: file.file_name().map(|n| n.to_string_lossy().into_owned()),
        file_size_bytes,
        platform,
        operator: Some("cli".to_string()),
    };

    // Re-open file to parse from beginning (including header)
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let outcome = import_bookings(&db, csv_file, session)?;

    db.log_audit(
        "cli",
        "import",
        Some("import_session"),
        Some(&outcome.session_id.to_string()),
        Some(&format!(
            "platform={}, imported={}, duplicates={}, skipped={}",
            platform.as_str(),
            outcome.imported,
            outcome.duplicates,
            outcome.skipped
        )),
    )?;

    println!("✅ Import complete! (session #{})", outcome.session_id);
    println!("   Imported: {}", outcome.imported);
    println!("   Skipped (already imported): {}", outcome.duplicates);
    println!("   Skipped (cancelled or malformed): {}", outcome.skipped);

    if outcome.imported > 0 {
        println!();
        println!("💡 Run 'innkeep detect' to check for duplicate bookings.");
    }

    Ok(())
}
