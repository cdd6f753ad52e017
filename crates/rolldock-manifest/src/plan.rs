//! Manifest preparation and versioning.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rolldock_model::{ManagedKind, Resource, ResourceId, Track, WorkloadClass};
use rolldock_release::{HistoryFormat, ReleaseHistory, ReleaseStatus};

/// Caller-supplied knobs for manifest preparation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOptions {
    /// Release name the history is keyed by and pods are labeled with.
    pub release_name: String,
    /// When false, revision stamping is skipped entirely.
    pub versioning_enabled: bool,
    /// The declarative format tracks revisions itself, so stamping is
    /// skipped there too.
    pub history_format: HistoryFormat,
    /// Set in canary/blue-green mode; injects track-selector labels.
    pub track: Option<Track>,
    /// Canary workflow: reuse the latest still-open release number so
    /// both phases of one logical deployment share a release identity.
    pub reuse_open_release: bool,
}

impl PlanOptions {
    pub fn new(release_name: &str) -> Self {
        Self {
            release_name: release_name.to_string(),
            versioning_enabled: true,
            history_format: HistoryFormat::default(),
            track: None,
            reuse_open_release: false,
        }
    }
}

/// A managed workload selected for steady-state checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedWorkload {
    pub id: ResourceId,
    pub kind: ManagedKind,
}

/// The prepared deployment: mutated resources plus classification.
#[derive(Debug, Clone)]
pub struct ManifestPlan {
    /// The release number this attempt deploys under.
    pub release_number: u64,
    /// True when the number was taken over from an open release
    /// (canary workflow) rather than incremented.
    pub reused_release: bool,
    /// Resources with revision annotations and labels injected, in the
    /// caller's submission order.
    pub resources: Vec<Resource>,
    /// Deployment-family workloads, steady-state checked after apply.
    pub managed_workloads: Vec<ManagedWorkload>,
    /// CRD-defined workloads, checked separately.
    pub custom_workloads: Vec<ResourceId>,
}

impl ManifestPlan {
    pub fn has_managed_workloads(&self) -> bool {
        !self.managed_workloads.is_empty()
    }
}

/// Prepare the rendered resource list for deployment.
pub fn plan(
    mut resources: Vec<Resource>,
    history: &ReleaseHistory,
    options: &PlanOptions,
) -> ManifestPlan {
    let (release_number, reused_release) = pick_release_number(history, options);

    let stamp_revisions =
        options.versioning_enabled && options.history_format != HistoryFormat::Declarative;

    let mut managed_workloads = Vec::new();
    let mut custom_workloads = Vec::new();

    for resource in &mut resources {
        match resource.id.kind.workload_class() {
            WorkloadClass::Managed(kind) => {
                managed_workloads.push(ManagedWorkload {
                    id: resource.id.clone(),
                    kind,
                });
            }
            WorkloadClass::Custom => custom_workloads.push(resource.id.clone()),
            WorkloadClass::Plain => {}
        }

        if stamp_revisions {
            resource.stamp_revision(release_number);
        }
        resource.inject_release_label(&options.release_name);
        if let Some(track) = options.track {
            resource.inject_track(track);
        }
    }

    if managed_workloads.is_empty() {
        info!(
            release = %options.release_name,
            "no managed workloads in manifest, steady-state check will be skipped"
        );
    }
    debug!(
        release = %options.release_name,
        number = release_number,
        reused = reused_release,
        managed = managed_workloads.len(),
        custom = custom_workloads.len(),
        "manifest plan prepared"
    );

    ManifestPlan {
        release_number,
        reused_release,
        resources,
        managed_workloads,
        custom_workloads,
    }
}

/// `max + 1`, unless a canary workflow is reusing the latest open
/// release.
fn pick_release_number(history: &ReleaseHistory, options: &PlanOptions) -> (u64, bool) {
    if options.reuse_open_release {
        if let Some(latest) = history.latest() {
            if latest.status == ReleaseStatus::Running {
                return (latest.number, true);
            }
        }
    }
    (history.next_release_number(), false)
}
