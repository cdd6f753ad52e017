//! Per-attempt deployment configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use rolldock_manifest::PlanOptions;
use rolldock_release::{DEFAULT_RETENTION, HistoryFormat};
use rolldock_model::Track;

/// Steady-state wait cadence. The wait is a fixed-interval poll loop —
/// the orchestrator cannot assume a watch connection survives the whole
/// window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteadyStateConfig {
    /// Interval between rollout-status polls.
    pub poll_interval: Duration,
    /// Caller-supplied ceiling on the whole wait.
    pub timeout: Duration,
}

impl Default for SteadyStateConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Configuration for one deployment attempt.
///
/// Concurrent attempts against the same `release_name` must be
/// serialized by the caller; the history store provides no lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    pub release_name: String,
    /// Wire format for new history writes; reads auto-detect.
    pub history_format: HistoryFormat,
    /// When false, revision stamping is skipped.
    pub versioning_enabled: bool,
    /// Explicit opt-out of dry-run validation.
    pub skip_dry_run: bool,
    /// Retain specs and prune resources dropped since the last
    /// successful release.
    pub prune: bool,
    /// Canary/blue-green track for this phase. A `Canary` phase leaves
    /// the release open (`Running`) for the stable phase to resolve.
    pub track: Option<Track>,
    /// Canary workflow: reuse the latest still-open release number.
    pub reuse_open_release: bool,
    pub steady_state: SteadyStateConfig,
    /// History entries retained after cleanup.
    pub retention: usize,
}

impl DeployConfig {
    pub fn new(release_name: &str) -> Self {
        Self {
            release_name: release_name.to_string(),
            history_format: HistoryFormat::default(),
            versioning_enabled: true,
            skip_dry_run: false,
            prune: false,
            track: None,
            reuse_open_release: false,
            steady_state: SteadyStateConfig::default(),
            retention: DEFAULT_RETENTION,
        }
    }

    /// The manifest-preparation view of this configuration.
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            release_name: self.release_name.clone(),
            versioning_enabled: self.versioning_enabled,
            history_format: self.history_format,
            track: self.track,
            reuse_open_release: self.reuse_open_release,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = DeployConfig::new("pay");
        assert!(config.versioning_enabled);
        assert!(!config.skip_dry_run);
        assert!(!config.prune);
        assert!(config.track.is_none());
        assert_eq!(config.retention, DEFAULT_RETENTION);
    }

    #[test]
    fn plan_options_mirror_the_config() {
        let mut config = DeployConfig::new("pay");
        config.track = Some(Track::Canary);
        config.reuse_open_release = true;

        let options = config.plan_options();
        assert_eq!(options.release_name, "pay");
        assert_eq!(options.track, Some(Track::Canary));
        assert!(options.reuse_open_release);
    }
}
