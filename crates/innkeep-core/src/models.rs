//! Domain models for innkeep

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Travel platforms whose CSV exports we can import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    BookingCom,
    Agoda,
    Airbnb,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookingCom => "booking_com",
            Self::Agoda => "agoda",
            Self::Airbnb => "airbnb",
        }
    }

    /// Name as shown to operators
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::BookingCom => "Booking.com",
            Self::Agoda => "Agoda",
            Self::Airbnb => "Airbnb",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "booking_com" | "booking.com" | "bookingcom" => Ok(Self::BookingCom),
            "agoda" => Ok(Self::Agoda),
            "airbnb" => Ok(Self::Airbnb),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    #[default]
    Pending,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" | "ok" => Ok(Self::Confirmed),
            "pending" => Ok(Self::Pending),
            _ => Err(format!("Unknown booking status: {}", s)),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A hotel reservation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Internal row id
    pub id: i64,
    /// Stable business identifier: the platform's reservation number for
    /// imports, derived from the import hash for manual entries
    pub booking_id: String,
    /// Guest name exactly as the source provided it; the duplicate
    /// detector groups on this value byte-for-byte
    pub guest_name: String,
    /// Dates may be absent when the source row was malformed
    pub checkin_date: Option<NaiveDate>,
    pub checkout_date: Option<NaiveDate>,
    pub room_amount: f64,
    /// Fee owed to the platform, distinct from the room amount
    pub commission: f64,
    /// Amount collected from the guest so far
    pub collected_amount: f64,
    /// Staff member who collected payment
    pub collector: Option<String>,
    pub booking_status: BookingStatus,
    /// Free-text customer care notes
    pub booking_notes: Option<String>,
    /// Source platform; manual entries carry none
    pub platform: Option<Platform>,
    /// Content hash used to skip re-imports of the same row
    pub import_hash: String,
    /// Original CSV row as JSON, kept for troubleshooting imports
    pub original_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A booking parsed from an import file or manual entry, not yet stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub booking_id: String,
    pub guest_name: String,
    pub checkin_date: Option<NaiveDate>,
    pub checkout_date: Option<NaiveDate>,
    pub room_amount: f64,
    pub commission: f64,
    pub collected_amount: f64,
    pub collector: Option<String>,
    pub booking_status: BookingStatus,
    pub booking_notes: Option<String>,
    pub platform: Option<Platform>,
    pub import_hash: String,
    pub original_data: Option<String>,
}

/// Result of inserting a booking with duplicate detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingInsertResult {
    /// New row inserted with this id
    Inserted(i64),
    /// A booking with the same import hash already exists with this id
    Duplicate(i64),
}

/// Filters for listing bookings
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    /// Substring match against guest_name
    pub guest: Option<String>,
    pub status: Option<BookingStatus>,
    pub platform: Option<Platform>,
    /// Check-in date range (inclusive)
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// ========== Import Models ==========

/// Import session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown import status: {}", s)),
        }
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One import run of a platform CSV export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSession {
    pub id: i64,
    pub filename: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub platform: Platform,
    /// Rows inserted as new bookings
    pub imported_count: i64,
    /// Rows skipped because their import hash already existed
    pub duplicate_count: i64,
    /// Rows skipped as cancelled or unparseable
    pub skipped_count: i64,
    pub operator: Option<String>,
    pub status: ImportStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating an import session
#[derive(Debug, Clone)]
pub struct NewImportSession {
    pub filename: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub platform: Platform,
    pub operator: Option<String>,
}

// ========== Reporting Models ==========

/// Aggregates for the dashboard view
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_bookings: i64,
    pub confirmed_count: i64,
    pub pending_count: i64,
    pub total_room_amount: f64,
    pub total_commission: f64,
    pub total_collected: f64,
    /// Room amounts not yet collected
    pub outstanding_amount: f64,
    /// Check-ins within the next 7 days
    pub upcoming_checkins: i64,
    pub platform_counts: Vec<PlatformCount>,
}

/// Booking count for one platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformCount {
    pub platform: String,
    pub count: i64,
}

/// Per-day occupancy numbers for the calendar view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Bookings checking in on this day
    pub arrivals: i64,
    /// Bookings checking out on this day
    pub departures: i64,
    /// Bookings spanning this day (checked in, not yet out)
    pub staying: i64,
}
