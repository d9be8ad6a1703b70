//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Innkeep - Hotel booking records and duplicate cleanup
#[derive(Parser)]
#[command(name = "innkeep")]
#[command(about = "Self-hosted hotel booking manager with duplicate detection", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "innkeep.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set INNKEEP_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import bookings from a platform CSV export
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Platform format: booking_com, agoda, airbnb (auto-detected if not specified)
        #[arg(short, long)]
        platform: Option<String>,
    },

    /// Find bookings that share a guest name
    Detect {
        /// Only examine this exact guest name
        #[arg(short, long)]
        guest: Option<String>,

        /// Show a field-by-field comparison for each group
        #[arg(long)]
        compare: bool,
    },

    /// Delete duplicate bookings by ID
    Resolve {
        /// Booking IDs to delete
        booking_ids: Vec<String>,

        /// Delete everything except the oldest booking in each duplicate group
        #[arg(long)]
        all_but_oldest: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List bookings
    List {
        /// Number of bookings to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Filter by guest name (substring, case-insensitive)
        #[arg(long)]
        guest: Option<String>,

        /// Filter by status: confirmed, pending
        #[arg(long)]
        status: Option<String>,

        /// Filter by platform: booking_com, agoda, airbnb
        #[arg(long)]
        platform: Option<String>,

        /// Earliest check-in date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest check-in date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Show database status and booking summary
    Status,

    /// Export bookings to CSV
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Filter by guest name (substring, case-insensitive)
        #[arg(long)]
        guest: Option<String>,

        /// Filter by status: confirmed, pending
        #[arg(long)]
        status: Option<String>,

        /// Filter by platform: booking_com, agoda, airbnb
        #[arg(long)]
        platform: Option<String>,

        /// Earliest check-in date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest check-in date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}
