//! Duplicate resolution
//!
//! Removes the booking copies an operator selected. Deletes run one at a
//! time and independently, so a missing or failing id is recorded and the
//! rest of the selection still goes through. Removals are permanent.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::Database;
use crate::duplicates::DuplicateGroup;

/// Booking ids chosen for removal, deduplicated in first-seen order
#[derive(Debug, Clone, Default)]
pub struct DuplicateSelection {
    booking_ids: Vec<String>,
}

impl DuplicateSelection {
    /// Build a selection, dropping repeated ids but keeping their order
    pub fn new(ids: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let booking_ids = ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self { booking_ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.booking_ids
    }

    pub fn len(&self) -> usize {
        self.booking_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.booking_ids.is_empty()
    }
}

/// Select every booking in every group except the oldest
///
/// Group members are ordered oldest-first, so skipping the first member of
/// each group keeps exactly one booking per guest. The result always holds
/// `sum(group size - 1)` ids.
pub fn select_all_but_oldest(groups: &[DuplicateGroup]) -> DuplicateSelection {
    let ids = groups
        .iter()
        .flat_map(|g| g.bookings.iter().skip(1).map(|b| b.booking_id.clone()))
        .collect();
    DuplicateSelection::new(ids)
}

/// One booking that could not be removed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedResolution {
    pub booking_id: String,
    pub error: String,
}

/// Tally of one resolution run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub success_count: usize,
    pub fail_count: usize,
    pub failed: Vec<FailedResolution>,
}

/// Executes a selection against the store
pub struct ResolutionExecutor<'a> {
    db: &'a Database,
}

impl<'a> ResolutionExecutor<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Delete every selected booking, one at a time
    ///
    /// There is no surrounding transaction and no rollback: bookings deleted
    /// before a failure stay deleted, and ids after it are still attempted.
    /// An empty selection is a successful no-op. Every failure is captured
    /// in the outcome, so this never returns early.
    pub fn resolve(&self, selection: &DuplicateSelection) -> ResolutionOutcome {
        let mut outcome = ResolutionOutcome::default();

        for booking_id in selection.ids() {
            match self.db.delete_booking(booking_id) {
                Ok(true) => outcome.success_count += 1,
                Ok(false) => {
                    warn!("Resolution skipped {}: booking not found", booking_id);
                    outcome.fail_count += 1;
                    outcome.failed.push(FailedResolution {
                        booking_id: booking_id.clone(),
                        error: "booking not found".to_string(),
                    });
                }
                Err(e) => {
                    warn!("Resolution failed for {}: {}", booking_id, e);
                    outcome.fail_count += 1;
                    outcome.failed.push(FailedResolution {
                        booking_id: booking_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Resolution removed {} bookings, {} failed",
            outcome.success_count, outcome.fail_count
        );

        outcome
    }
}
