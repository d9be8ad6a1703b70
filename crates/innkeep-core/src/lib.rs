//! Innkeep Core Library
//!
//! Shared functionality for the Innkeep booking management tool:
//! - Database access and migrations
//! - CSV import parsers for platform reservation exports
//! - Duplicate booking detection and field-level comparison
//! - Resolution of duplicate groups by independent deletes
//! - Dashboard, calendar, and CSV export reporting

pub mod db;
pub mod duplicates;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod resolution;

pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
