//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `bookings` - Booking listing and CSV export commands
//! - `core` - Core commands (init) and shared utilities (open_db, parse_filter)
//! - `duplicates` - Duplicate detection and resolution commands
//! - `import` - CSV import command
//! - `serve` - Web server command
//! - `status` - Database status command

pub mod bookings;
pub mod core;
pub mod duplicates;
pub mod import;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use bookings::*;
pub use core::*;
pub use duplicates::*;
pub use import::*;
pub use serve::*;
pub use status::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
///
/// Counts characters rather than bytes so multi-byte guest names never
/// split mid-character.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
