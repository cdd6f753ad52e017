//! rolldock-cluster — the seam between the orchestrator and a live cluster.
//!
//! The orchestrator never talks to an API server directly; every
//! component receives a [`ClusterApi`] implementation scoped to one
//! deployment attempt. Implementations are expected to be namespace
//! aware and to treat "not found" on delete as a non-fatal outcome.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rolldock_model::{Resource, ResourceId};

/// Result type alias for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors surfaced by a cluster client.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("api server rejected request: {0}")]
    Rejected(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("api call failed: {0}")]
    Api(String),
}

/// A pod observed in the cluster. Identity only — enough to diff
/// pre-apply and post-apply inventories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
}

impl Pod {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

/// Rollout state of a managed workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutStatus {
    /// Whether the workload reports its desired state fully rolled out.
    pub ready: bool,
    /// The workload's current revision string, when the kind exposes one.
    pub revision: Option<String>,
    /// Human-readable progress message for narration.
    pub message: String,
}

/// Outcome of a delete call. "Not found" is expected when pruning a
/// resource something else already removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Narrow client interface over the cluster API server.
///
/// One implementation per deployment attempt; injected into the
/// executor and the pruning engine rather than threaded through global
/// state.
#[allow(async_fn_in_trait)]
pub trait ClusterApi {
    /// Validate a resource set against the live API server without
    /// persisting changes.
    async fn dry_run(&self, resources: &[Resource]) -> ClusterResult<()>;

    /// Submit a batch of resources in the given order.
    async fn apply(&self, resources: &[Resource]) -> ClusterResult<()>;

    /// Query the rollout status of a managed workload.
    async fn rollout_status(&self, id: &ResourceId) -> ClusterResult<RolloutStatus>;

    /// List pods in a namespace matching a label selector.
    async fn list_pods(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> ClusterResult<Vec<Pod>>;

    /// Delete one resource. Must map a missing resource to
    /// [`DeleteOutcome::NotFound`] rather than an error.
    async fn delete(&self, id: &ResourceId) -> ClusterResult<DeleteOutcome>;
}
