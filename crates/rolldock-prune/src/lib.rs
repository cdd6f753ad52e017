//! rolldock-prune — deletes resources that disappeared between releases.
//!
//! The diff baseline is the last *successful* release with retained
//! specs; without a reliable baseline it is unsafe to infer deletions,
//! so pruning degrades to a no-op. Deletions run as a best-effort
//! batch: one stuck resource never blocks the deployment from
//! reporting success.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use rolldock_cluster::{ClusterApi, DeleteOutcome};
use rolldock_model::ResourceId;
use rolldock_release::Release;

/// Compute the identities to delete, in dependency-safe order:
/// workload-owning kinds first, CRDs and custom workloads last.
///
/// Returns an empty list when no baseline exists or the baseline was
/// recorded with pruning disabled (no specs retained).
pub fn resources_to_prune(
    previous: Option<&Release>,
    current: &[ResourceId],
) -> Vec<ResourceId> {
    let Some(previous) = previous else {
        debug!("no previous successful release, nothing to prune");
        return Vec::new();
    };
    if !previous.prune_enabled || previous.resources.is_empty() {
        debug!(
            baseline = previous.number,
            "baseline retained no specs, skipping prune"
        );
        return Vec::new();
    }

    let current: HashSet<&ResourceId> = current.iter().collect();
    let mut stale: Vec<ResourceId> = previous
        .resources
        .iter()
        .map(|r| r.id.clone())
        .filter(|id| !current.contains(id))
        .collect();

    // Stable sort: submission order is preserved within a weight class.
    stale.sort_by_key(|id| id.kind.deletion_weight());
    stale
}

/// Delete each identity independently; a failure on one resource does
/// not abort the rest. Returns only the identities actually deleted.
pub async fn prune<C: ClusterApi>(client: &C, ids: &[ResourceId]) -> Vec<ResourceId> {
    let mut deleted = Vec::new();
    for id in ids {
        match client.delete(id).await {
            Ok(DeleteOutcome::Deleted) => {
                info!(resource = %id, "pruned");
                deleted.push(id.clone());
            }
            Ok(DeleteOutcome::NotFound) => {
                debug!(resource = %id, "already gone, skipping");
            }
            Err(e) => {
                warn!(resource = %id, error = %e, "failed to prune resource");
            }
        }
    }
    deleted
}
