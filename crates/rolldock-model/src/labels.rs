//! Orchestrator-owned label and annotation keys.

use serde::{Deserialize, Serialize};

/// Pod-template label carrying the release name. Used as the label
/// selector when snapshotting pod inventory before/after an apply.
pub const RELEASE_LABEL: &str = "rolldock.io/release-name";

/// Pod-template and selector label distinguishing traffic tracks
/// during canary and blue-green rollouts.
pub const TRACK_LABEL: &str = "rolldock.io/track";

/// Annotation stamping the release number a resource was deployed by.
pub const REVISION_ANNOTATION: &str = "rolldock.io/revision";

/// Traffic track for progressive delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// The population serving live traffic.
    Stable,
    /// The population under observation.
    Canary,
}

impl Track {
    /// The label value written under [`TRACK_LABEL`].
    pub fn label_value(self) -> &'static str {
        match self {
            Track::Stable => "stable",
            Track::Canary => "canary",
        }
    }
}
