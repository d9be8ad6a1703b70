//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod audit;
pub mod bookings;
pub mod duplicates;
pub mod import;
pub mod reports;

// Re-export all handlers for use in router
pub use audit::*;
pub use bookings::*;
pub use duplicates::*;
pub use import::*;
pub use reports::*;
