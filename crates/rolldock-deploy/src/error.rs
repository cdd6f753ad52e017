//! Deployment error taxonomy.

use std::time::Duration;

use thiserror::Error;

use rolldock_cluster::ClusterError;
use rolldock_release::HistoryError;

/// Result type alias for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors terminating a deployment attempt.
///
/// Everything after `Apply` persists a `Failed` release before
/// propagating, so the next attempt's release numbering and pruning
/// baseline stay correct. Prune failures are deliberately absent —
/// they are logged, never raised.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Dry-run rejected a manifest. Nothing was applied and no release
    /// record exists yet.
    #[error("dry-run validation failed: {0}")]
    Validation(String),

    /// Apply failed partially or fully; already-applied resources
    /// remain on the cluster.
    #[error("apply failed: {0}")]
    Apply(String),

    /// Workloads never converged before the caller's timeout. Cluster
    /// state is left as applied.
    #[error("timed out after {timeout:?} waiting for steady state, still pending: {}", pending.join(", "))]
    SteadyStateTimeout {
        timeout: Duration,
        pending: Vec<String>,
    },

    /// Release history could not be persisted (already retried with
    /// backoff inside the store).
    #[error(transparent)]
    Persistence(#[from] HistoryError),

    /// Cluster API failure outside the dry-run/apply steps.
    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),
}
