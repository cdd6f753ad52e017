//! Ordered, capped release history for one release name.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::release::{Release, ReleaseStatus};

/// Default number of history entries retained after cleanup.
pub const DEFAULT_RETENTION: usize = 15;

/// All known deployment attempts for one release name, ordered by
/// release number ascending.
///
/// Invariant: a release number is never reused for this release name
/// while any entry referencing it remains — `next_release_number` is
/// always `max + 1` over the surviving entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseHistory {
    releases: Vec<Release>,
}

impl ReleaseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_releases(mut releases: Vec<Release>) -> Self {
        releases.sort_by_key(|r| r.number);
        Self { releases }
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// The most recent attempt, if any.
    pub fn latest(&self) -> Option<&Release> {
        self.releases.last()
    }

    pub fn latest_mut(&mut self) -> Option<&mut Release> {
        self.releases.last_mut()
    }

    /// The release number a fresh attempt should use.
    pub fn next_release_number(&self) -> u64 {
        self.releases.iter().map(|r| r.number).max().unwrap_or(0) + 1
    }

    /// Append an attempt. Numbers must arrive in increasing order; the
    /// caller computes them via [`Self::next_release_number`].
    pub fn push(&mut self, release: Release) {
        debug_assert!(
            self.releases.last().is_none_or(|last| last.number < release.number),
            "release numbers must be strictly increasing"
        );
        self.releases.push(release);
    }

    /// Resolve the latest attempt's status. No-op on an empty history.
    pub fn resolve_latest(&mut self, status: ReleaseStatus) {
        if let Some(latest) = self.releases.last_mut() {
            latest.status = status;
        }
    }

    /// The newest `Succeeded` release with a number strictly below the
    /// given one — the pruning baseline and rollback target.
    pub fn last_successful_before(&self, number: u64) -> Option<&Release> {
        self.releases
            .iter()
            .rev()
            .find(|r| r.number < number && r.status == ReleaseStatus::Succeeded)
    }

    /// Evict entries that are neither the current release nor reachable
    /// as a rollback target, then cap the length (oldest first). Runs as
    /// part of the load step, not a background job.
    pub fn cleanup(&mut self, current_number: u64, retention: usize) {
        let baseline = self
            .last_successful_before(current_number)
            .map(|r| r.number);

        let before = self.releases.len();

        // Failed attempts older than the rollback baseline can never be
        // rolled back to; drop them outright.
        if let Some(baseline) = baseline {
            self.releases.retain(|r| {
                r.number >= baseline || r.status == ReleaseStatus::Succeeded
            });
        }

        // Cap the remainder, never evicting the current release or the
        // baseline itself.
        while self.releases.len() > retention {
            let Some(idx) = self
                .releases
                .iter()
                .position(|r| r.number != current_number && Some(r.number) != baseline)
            else {
                break;
            };
            self.releases.remove(idx);
        }

        let evicted = before - self.releases.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.releases.len(), "history cleaned up");
        }
    }
}
