//! Deployment executor — drives one attempt through the state machine.
//!
//! `Init → DryRun → Apply → WaitSteadyState → WrapUp`, with every step
//! narrated through the progress sink. Steps are strictly sequential;
//! resource interdependencies are assumed encoded in the caller's
//! submission order, so there is no parallel apply. The steady-state
//! wait is the only step with an internal retry loop — it polls until
//! the timeout, it does not retry the apply.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::warn;

use rolldock_cluster::{ClusterApi, Pod};
use rolldock_manifest::{ManifestPlan, rewrite_traffic_routes};
use rolldock_model::{RELEASE_LABEL, Resource, ResourceId, Track};
use rolldock_release::{HistoryBackend, HistoryStore, Release, ReleaseHistory, ReleaseStatus};

use crate::config::DeployConfig;
use crate::endpoint::resolve_endpoint;
use crate::error::{DeployError, DeployResult};
use crate::progress::{ProgressSink, Step};

/// What the caller gets back from a successful attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployOutcome {
    /// The release number this attempt deployed under.
    pub release_number: u64,
    /// Pods present post-apply that were absent pre-apply.
    pub new_pods: Vec<Pod>,
    /// Load-balancer/ingress endpoint, when resolvable from the
    /// applied resources.
    pub endpoint: Option<String>,
    /// Resource identities actually deleted by pruning (empty when
    /// pruning is disabled or had nothing to do).
    pub pruned: Vec<ResourceId>,
}

/// Executes deployment attempts against an injected cluster client and
/// history store, both scoped to this attempt.
pub struct Deployer<'a, C, B> {
    client: &'a C,
    store: &'a HistoryStore<B>,
    sink: &'a dyn ProgressSink,
    config: DeployConfig,
}

impl<'a, C: ClusterApi, B: HistoryBackend> Deployer<'a, C, B> {
    pub fn new(
        client: &'a C,
        store: &'a HistoryStore<B>,
        sink: &'a dyn ProgressSink,
        config: DeployConfig,
    ) -> Self {
        Self {
            client,
            store,
            sink,
            config,
        }
    }

    /// Run one deployment attempt to completion.
    ///
    /// Any failure after apply persists a `Failed` release before the
    /// error propagates, so the next attempt's release numbering and
    /// pruning baseline stay correct. There is no automatic retry of
    /// the apply — that is the caller's responsibility.
    pub async fn deploy(&self, resources: Vec<Resource>) -> DeployResult<DeployOutcome> {
        let name = self.config.release_name.clone();

        // ── Init ───────────────────────────────────────────────────
        self.sink.step_started(Step::Init);
        let mut history = self.store.load(&name).await?;
        let mut plan = rolldock_manifest::plan(resources, &history, &self.config.plan_options());
        history.cleanup(plan.release_number, self.config.retention);
        self.sink.note(
            Step::Init,
            &format!(
                "release {name} number {} ({} managed, {} custom workloads)",
                plan.release_number,
                plan.managed_workloads.len(),
                plan.custom_workloads.len()
            ),
        );
        self.sink.step_done(Step::Init);

        // ── DryRun ─────────────────────────────────────────────────
        self.sink.step_started(Step::DryRun);
        if self.config.skip_dry_run {
            self.sink.note(Step::DryRun, "skipped by configuration");
        } else {
            // Nothing has been mutated and no release record exists
            // yet, so a rejection aborts without a history write.
            self.client
                .dry_run(&plan.resources)
                .await
                .map_err(|e| DeployError::Validation(e.to_string()))?;
        }
        self.sink.step_done(Step::DryRun);

        // ── Apply ──────────────────────────────────────────────────
        self.sink.step_started(Step::Apply);
        if self.config.track.is_some() {
            let rewritten = rewrite_traffic_routes(
                &mut plan.resources,
                &[Track::Stable, Track::Canary],
            );
            if rewritten > 0 {
                self.sink.note(
                    Step::Apply,
                    &format!("rewrote {rewritten} traffic route(s) for both tracks"),
                );
            }
        }

        let pre_pods = self.pod_inventory(&plan).await?;

        self.open_release(&mut history, &plan);
        self.store.save(&name, &history).await?;

        if let Err(e) = self.client.apply(&plan.resources).await {
            self.fail(&mut history).await;
            return Err(DeployError::Apply(e.to_string()));
        }
        self.sink
            .note(Step::Apply, &format!("applied {} resources", plan.resources.len()));
        self.sink.step_done(Step::Apply);

        // ── WaitSteadyState ────────────────────────────────────────
        self.sink.step_started(Step::WaitSteadyState);
        if plan.has_managed_workloads() {
            self.read_back_legacy_revisions(&mut history, &plan).await;
            if let Err(e) = self.wait_for_steady_state(&plan).await {
                self.fail(&mut history).await;
                return Err(e);
            }
        } else {
            self.sink.note(
                Step::WaitSteadyState,
                "no managed workloads, skipping steady-state check",
            );
        }
        self.sink.step_done(Step::WaitSteadyState);

        // ── WrapUp ─────────────────────────────────────────────────
        self.sink.step_started(Step::WrapUp);
        let post_pods = match self.pod_inventory(&plan).await {
            Ok(pods) => pods,
            Err(e) => {
                self.fail(&mut history).await;
                return Err(e);
            }
        };
        let new_pods = diff_new_pods(&pre_pods, &post_pods);
        let endpoint = resolve_endpoint(&plan.resources);
        self.sink.note(
            Step::WrapUp,
            &format!(
                "{} pod(s) running, {} new in this release",
                post_pods.len(),
                new_pods.len()
            ),
        );

        // A canary phase leaves the release open for the stable phase;
        // everything else resolves it now.
        let promoted = self.config.track != Some(Track::Canary);
        if promoted {
            history.resolve_latest(ReleaseStatus::Succeeded);
        }
        self.store.save(&name, &history).await?;
        self.sink.step_done(Step::WrapUp);

        // ── Prune ──────────────────────────────────────────────────
        let mut pruned = Vec::new();
        if self.config.prune && promoted {
            self.sink.step_started(Step::Prune);
            let current_ids: Vec<ResourceId> =
                plan.resources.iter().map(|r| r.id.clone()).collect();
            let baseline = history.last_successful_before(plan.release_number);
            let stale = rolldock_prune::resources_to_prune(baseline, &current_ids);
            pruned = rolldock_prune::prune(self.client, &stale).await;
            self.sink.note(
                Step::Prune,
                &format!("{} stale resource(s), {} deleted", stale.len(), pruned.len()),
            );
            self.sink.step_done(Step::Prune);
        }

        Ok(DeployOutcome {
            release_number: plan.release_number,
            new_pods,
            endpoint,
            pruned,
        })
    }

    /// Append a fresh `Running` release, or — in a canary workflow —
    /// reuse the open one and replace its resource list.
    fn open_release(&self, history: &mut ReleaseHistory, plan: &ManifestPlan) {
        if plan.reused_release {
            if let Some(latest) = history.latest_mut() {
                latest.replace_resources(plan.resources.clone());
                return;
            }
        }
        history.push(Release::new(
            plan.release_number,
            plan.resources.clone(),
            self.config.prune,
        ));
    }

    /// Mark the open release `Failed` and persist best-effort, keeping
    /// the original error as the one that propagates.
    async fn fail(&self, history: &mut ReleaseHistory) {
        history.resolve_latest(ReleaseStatus::Failed);
        self.store
            .save_best_effort(&self.config.release_name, history)
            .await;
    }

    /// Kinds with only a legacy rollout-trigger signal get their
    /// revision string read back once after apply and recorded on the
    /// release.
    async fn read_back_legacy_revisions(
        &self,
        history: &mut ReleaseHistory,
        plan: &ManifestPlan,
    ) {
        for workload in plan
            .managed_workloads
            .iter()
            .filter(|w| w.kind.legacy_rollout_signal())
        {
            match self.client.rollout_status(&workload.id).await {
                Ok(status) => {
                    if let Some(latest) = history.latest_mut() {
                        latest.track_workload(workload.id.clone(), status.revision);
                    }
                }
                Err(e) => {
                    warn!(workload = %workload.id, error = %e, "revision read-back failed");
                }
            }
        }
    }

    /// Poll every queryable managed workload on a fixed interval until
    /// all report ready or the timeout elapses. An already-converged
    /// set returns on the first poll without sleeping.
    async fn wait_for_steady_state(&self, plan: &ManifestPlan) -> DeployResult<()> {
        let cadence = &self.config.steady_state;
        let started = tokio::time::Instant::now();

        loop {
            let mut pending = Vec::new();
            for workload in &plan.managed_workloads {
                if workload.kind.legacy_rollout_signal() {
                    continue;
                }
                match self.client.rollout_status(&workload.id).await {
                    Ok(status) if status.ready => {}
                    Ok(status) => {
                        pending.push(format!("{} ({})", workload.id, status.message));
                    }
                    // Transient API failures count as not-ready; the
                    // timeout bounds them.
                    Err(e) => pending.push(format!("{} ({e})", workload.id)),
                }
            }

            if pending.is_empty() {
                self.sink
                    .note(Step::WaitSteadyState, "all managed workloads ready");
                return Ok(());
            }

            self.sink.note(
                Step::WaitSteadyState,
                &format!("{} workload(s) not ready yet", pending.len()),
            );

            if started.elapsed() + cadence.poll_interval > cadence.timeout {
                return Err(DeployError::SteadyStateTimeout {
                    timeout: cadence.timeout,
                    pending,
                });
            }
            tokio::time::sleep(cadence.poll_interval).await;
        }
    }

    /// Pod inventory across the namespaces of the managed workloads,
    /// filtered to this release's label selector.
    async fn pod_inventory(&self, plan: &ManifestPlan) -> DeployResult<Vec<Pod>> {
        let mut selector = BTreeMap::new();
        selector.insert(
            RELEASE_LABEL.to_string(),
            self.config.release_name.clone(),
        );

        let mut namespaces: Vec<&str> = plan
            .managed_workloads
            .iter()
            .map(|w| w.id.namespace.as_str())
            .collect();
        namespaces.sort_unstable();
        namespaces.dedup();

        let mut pods = Vec::new();
        for namespace in namespaces {
            pods.extend(self.client.list_pods(namespace, &selector).await?);
        }
        Ok(pods)
    }
}

/// Pods present post-apply and absent pre-apply.
fn diff_new_pods(pre: &[Pod], post: &[Pod]) -> Vec<Pod> {
    let pre: HashSet<&Pod> = pre.iter().collect();
    post.iter()
        .filter(|pod| !pre.contains(pod))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pod_diff_ignores_preexisting() {
        let pre = vec![Pod::new("api-1", "prod"), Pod::new("api-2", "prod")];
        let post = vec![
            Pod::new("api-2", "prod"),
            Pod::new("api-3", "prod"),
            Pod::new("web-1", "prod"),
        ];

        let new = diff_new_pods(&pre, &post);
        assert_eq!(new, vec![Pod::new("api-3", "prod"), Pod::new("web-1", "prod")]);
    }

    #[test]
    fn new_pod_diff_with_empty_pre_is_everything() {
        let post = vec![Pod::new("api-1", "prod")];
        assert_eq!(diff_new_pods(&[], &post), post);
    }

    #[test]
    fn pods_in_other_namespaces_are_distinct() {
        let pre = vec![Pod::new("api-1", "staging")];
        let post = vec![Pod::new("api-1", "prod")];
        assert_eq!(diff_new_pods(&pre, &post).len(), 1);
    }
}
