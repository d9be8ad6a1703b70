//! Duplicate booking detection
//!
//! Platform exports overlap: the same reservation shows up in multiple CSV
//! files, or a guest books twice under the same name. This module finds
//! bookings sharing a guest name and builds field-by-field comparisons so
//! an operator can decide which copies to remove.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Database;
use crate::error::Result;
use crate::models::Booking;

/// Fields compared across duplicate group members, in display order
const COMPARISON_FIELDS: [&str; 8] = [
    "checkin_date",
    "checkout_date",
    "room_amount",
    "commission",
    "collected_amount",
    "collector",
    "booking_status",
    "created_at",
];

/// A set of bookings sharing the same guest name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub guest_name: String,
    /// Members ordered oldest-first by creation time
    pub bookings: Vec<Booking>,
    /// Largest gap in days between any two check-in dates in the group
    pub date_difference_days: i64,
}

/// Timing and volume numbers for one detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub processing_time_ms: u64,
    /// Distinct guest names examined, including guests with a single booking
    pub processed_guests: usize,
}

/// Result of one detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub duplicates: Vec<DuplicateGroup>,
    pub total_groups: usize,
    pub processing_info: ProcessingInfo,
}

/// One field across every member of a duplicate group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field: String,
    /// Rendered values in group member order
    pub values: Vec<String>,
    /// True when members disagree on this field
    pub divergent: bool,
}

/// Field-by-field comparison of one duplicate group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupComparison {
    pub guest_name: String,
    pub booking_ids: Vec<String>,
    pub fields: Vec<FieldComparison>,
}

/// Detector that finds bookings sharing a guest name
pub struct DuplicateDetector<'a> {
    db: &'a Database,
}

impl<'a> DuplicateDetector<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Find groups of bookings sharing a guest name
    ///
    /// Names are compared byte-for-byte: no trimming, case folding, or
    /// similarity scoring. "Tran B" and "tran b" are different guests.
    /// The optional guest filter is an exact name match applied before
    /// grouping, so a filtered run examines only that one guest.
    pub fn detect(&self, guest_filter: Option<&str>) -> Result<DetectionReport> {
        let started = Instant::now();

        let bookings = self.db.all_bookings(guest_filter)?;

        // Group by exact guest name
        let mut by_guest: HashMap<String, Vec<Booking>> = HashMap::new();
        for booking in bookings {
            by_guest
                .entry(booking.guest_name.clone())
                .or_default()
                .push(booking);
        }

        let processed_guests = by_guest.len();

        let mut duplicates = Vec::new();
        for (guest_name, mut group) in by_guest {
            if group.len() < 2 {
                continue; // A single booking is not a duplicate
            }

            // Oldest first; rows arrive in this order but the contract is ours to keep
            group.sort_by_key(|b| (b.created_at, b.id));

            let date_difference_days = max_checkin_gap_days(&group);
            duplicates.push(DuplicateGroup {
                guest_name,
                bookings: group,
                date_difference_days,
            });
        }

        // Stable output order for operators
        duplicates.sort_by(|a, b| a.guest_name.cmp(&b.guest_name));

        let total_groups = duplicates.len();
        let processing_time_ms = started.elapsed().as_millis() as u64;

        info!(
            "Duplicate detection found {} groups across {} guests in {}ms",
            total_groups, processed_guests, processing_time_ms
        );

        Ok(DetectionReport {
            duplicates,
            total_groups,
            processing_info: ProcessingInfo {
                processing_time_ms,
                processed_guests,
            },
        })
    }

    /// Find duplicate groups and build a comparison for each
    pub fn detect_with_comparisons(
        &self,
        guest_filter: Option<&str>,
    ) -> Result<(DetectionReport, Vec<GroupComparison>)> {
        let report = self.detect(guest_filter)?;
        let comparisons = report.duplicates.iter().map(build_comparison).collect();
        Ok((report, comparisons))
    }
}

/// Build a field-by-field comparison for one duplicate group
///
/// Every field in `COMPARISON_FIELDS` appears exactly once, in that order,
/// with one rendered value per group member. A field is divergent when the
/// members hold more than one distinct value; equality is exact, so 100.0
/// and 100.5 diverge and so do "Cash" and "cash".
pub fn build_comparison(group: &DuplicateGroup) -> GroupComparison {
    let booking_ids = group
        .bookings
        .iter()
        .map(|b| b.booking_id.clone())
        .collect();

    let fields = COMPARISON_FIELDS
        .iter()
        .map(|&field| {
            let values: Vec<String> = group
                .bookings
                .iter()
                .map(|b| render_field(b, field))
                .collect();
            let distinct: HashSet<&String> = values.iter().collect();
            FieldComparison {
                field: field.to_string(),
                divergent: distinct.len() > 1,
                values,
            }
        })
        .collect();

    GroupComparison {
        guest_name: group.guest_name.clone(),
        booking_ids,
        fields,
    }
}

/// Render one comparison field of a booking as a string
///
/// Absent optional values render as the empty string, so two bookings
/// that both lack a value agree rather than diverge.
fn render_field(booking: &Booking, field: &str) -> String {
    match field {
        "checkin_date" => booking
            .checkin_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        "checkout_date" => booking
            .checkout_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        "room_amount" => booking.room_amount.to_string(),
        "commission" => booking.commission.to_string(),
        "collected_amount" => booking.collected_amount.to_string(),
        "collector" => booking.collector.clone().unwrap_or_default(),
        "booking_status" => booking.booking_status.as_str().to_string(),
        "created_at" => booking.created_at.to_rfc3339(),
        _ => String::new(),
    }
}

/// Largest gap in days between any two check-in dates in a group
///
/// Bookings without a parseable check-in date are left out; a group with
/// fewer than two dated members has a gap of zero.
fn max_checkin_gap_days(bookings: &[Booking]) -> i64 {
    let dates: Vec<_> = bookings.iter().filter_map(|b| b.checkin_date).collect();
    match (dates.iter().min(), dates.iter().max()) {
        (Some(min), Some(max)) => (*max - *min).num_days(),
        _ => 0,
    }
}
