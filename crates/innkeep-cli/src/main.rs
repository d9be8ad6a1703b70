//! Innkeep CLI - Hotel booking manager
//!
//! Usage:
//!   innkeep init                   Initialize database
//!   innkeep import --file CSV      Import bookings (auto-detects platform)
//!   innkeep detect                 Find duplicate bookings
//!   innkeep resolve ID...          Delete duplicate bookings
//!   innkeep serve --port 3000      Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import { file, platform } => {
            commands::cmd_import(&cli.db, &file, platform.as_deref(), cli.no_encrypt)
        }
        Commands::Detect { guest, compare } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_detect(&db, guest.as_deref(), compare)
        }
        Commands::Resolve {
            booking_ids,
            all_but_oldest,
            yes,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_resolve(&db, booking_ids, all_but_oldest, yes)
        }
        Commands::List {
            limit,
            guest,
            status,
            platform,
            from,
            to,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let filter = commands::parse_filter(guest, status, platform, from, to)?;
            commands::cmd_list(&db, &filter, limit)
        }
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt),
        Commands::Export {
            output,
            guest,
            status,
            platform,
            from,
            to,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let filter = commands::parse_filter(guest, status, platform, from, to)?;
            commands::cmd_export(&db, &filter, output)
        }
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt, static_dir.as_deref()).await,
    }
}
