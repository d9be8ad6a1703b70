//! Database status command

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    use innkeep_core::db::DB_KEY_ENV;
    use std::fs;

    println!();
    println!("📊 Innkeep Status");
    println!("   ─────────────────────────────────────────────────────────────");

    // Database path
    println!("   Database: {}", db_path.display());

    // Check if database file exists and get size
    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    // Check encryption status
    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    // Try to open the database and show booking stats
    if db_path.exists() {
        match open_db(db_path, no_encrypt) {
            Ok(db) => {
                if let Ok(stats) = db.get_dashboard_stats() {
                    println!();
                    println!("   Bookings: {}", stats.total_bookings);
                    println!("   Confirmed: {}", stats.confirmed_count);
                    println!("   Pending: {}", stats.pending_count);
                    println!("   Check-ins next 7 days: {}", stats.upcoming_checkins);
                    println!();
                    println!("   Room total: {:.2}", stats.total_room_amount);
                    println!("   Commission: {:.2}", stats.total_commission);
                    println!("   Collected: {:.2}", stats.total_collected);
                    println!("   Outstanding: {:.2}", stats.outstanding_amount);

                    if !stats.platform_counts.is_empty() {
                        println!();
                        println!("   By platform:");
                        for pc in &stats.platform_counts {
                            println!("   - {}: {}", pc.platform, pc.count);
                        }
                    }
                }
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
                if !no_encrypt && !has_key {
                    println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
                } else if has_key {
                    println!("      (Check if {} is correct)", DB_KEY_ENV);
                }
            }
        }
    }

    println!();
    Ok(())
}
