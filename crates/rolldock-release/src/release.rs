//! One versioned deployment attempt.

use serde::{Deserialize, Serialize};

use rolldock_model::{Resource, ResourceId};

/// Lifecycle status of a release. Created `Running`, resolved to
/// `Succeeded` or `Failed` exactly once, immutable afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseStatus {
    Running,
    Succeeded,
    Failed,
}

/// A managed workload whose observed revision string was read back from
/// the cluster after apply (kinds with only a legacy rollout-trigger
/// signal and no queryable status).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedWorkload {
    pub id: ResourceId,
    pub revision: Option<String>,
}

/// One deployment attempt: number, status, and the resource specs it
/// deployed. The spec list is this release's own copy — it is the
/// pruning baseline for later deployments and is never shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub number: u64,
    pub status: ReleaseStatus,
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub tracked_workloads: Vec<TrackedWorkload>,
    /// Whether specs were retained for use as a pruning baseline. A
    /// release written with pruning disabled cannot seed a diff.
    #[serde(default = "default_true")]
    pub prune_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Release {
    /// Open a new attempt in `Running` state.
    pub fn new(number: u64, resources: Vec<Resource>, prune_enabled: bool) -> Self {
        Self {
            number,
            status: ReleaseStatus::Running,
            resources,
            tracked_workloads: Vec::new(),
            prune_enabled,
        }
    }

    /// Replace the resource list on a still-open release. Used when a
    /// canary workflow reuses the latest release instead of opening a
    /// new number.
    pub fn replace_resources(&mut self, resources: Vec<Resource>) {
        self.resources = resources;
        self.tracked_workloads.clear();
    }

    /// Record an observed revision for a tracked workload.
    pub fn track_workload(&mut self, id: ResourceId, revision: Option<String>) {
        self.tracked_workloads.push(TrackedWorkload { id, revision });
    }

    /// The identities of everything this release deployed.
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        self.resources.iter().map(|r| r.id.clone()).collect()
    }
}
