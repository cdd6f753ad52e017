//! Resource kinds — classification and ordering.
//!
//! The orchestrator treats kinds as a closed enum rather than free
//! strings: workload classification (which resources get steady-state
//! checked, and how) and deletion ordering are both dispatched off
//! [`ResourceKind`], so kind-specific behavior lives here and nowhere
//! else.

use serde::{Deserialize, Serialize};

/// Kind of a cluster object.
///
/// Unrecognized kinds land in `Other` and are treated as custom
/// resources (CRD-defined workloads checked outside the built-in
/// rollout-status mechanism).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Namespace,
    Secret,
    ConfigMap,
    Service,
    Deployment,
    StatefulSet,
    DaemonSet,
    DeploymentConfig,
    Job,
    Ingress,
    CustomResourceDefinition,
    Other(String),
}

/// How a resource participates in the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadClass {
    /// Deployment-family kind whose rollout is steady-state checked.
    Managed(ManagedKind),
    /// CRD-defined workload, readiness checked by other means.
    Custom,
    /// Applied as-is, no readiness tracking.
    Plain,
}

/// The managed (Deployment-family) workload kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    /// Template-controller style kind that only exposes a "trigger a
    /// new rollout" signal. Its revision must be read back from the
    /// cluster after apply instead of queried as rollout status.
    DeploymentConfig,
}

impl ManagedKind {
    /// True when the kind has no queryable rollout status and the
    /// latest revision string must be read back post-apply.
    pub fn legacy_rollout_signal(self) -> bool {
        matches!(self, ManagedKind::DeploymentConfig)
    }
}

impl ResourceKind {
    /// Classify this kind for deployment handling.
    pub fn workload_class(&self) -> WorkloadClass {
        match self {
            ResourceKind::Deployment => WorkloadClass::Managed(ManagedKind::Deployment),
            ResourceKind::StatefulSet => WorkloadClass::Managed(ManagedKind::StatefulSet),
            ResourceKind::DaemonSet => WorkloadClass::Managed(ManagedKind::DaemonSet),
            ResourceKind::DeploymentConfig => {
                WorkloadClass::Managed(ManagedKind::DeploymentConfig)
            }
            ResourceKind::CustomResourceDefinition | ResourceKind::Other(_) => {
                WorkloadClass::Custom
            }
            _ => WorkloadClass::Plain,
        }
    }

    /// True for kinds that own a pod template and a selector map, the
    /// only kinds eligible for track-label injection.
    pub fn has_pod_template(&self) -> bool {
        matches!(
            self,
            ResourceKind::Deployment
                | ResourceKind::StatefulSet
                | ResourceKind::DaemonSet
                | ResourceKind::DeploymentConfig
        )
    }

    /// Deletion-ordering weight: workload-owning kinds go first, plain
    /// resources they may reference after, CRDs and their custom
    /// workloads last (some controllers need the owner object present
    /// during teardown).
    pub fn deletion_weight(&self) -> u8 {
        match self {
            ResourceKind::Deployment
            | ResourceKind::StatefulSet
            | ResourceKind::DaemonSet
            | ResourceKind::DeploymentConfig
            | ResourceKind::Job => 0,
            ResourceKind::Ingress => 1,
            ResourceKind::Service => 2,
            ResourceKind::ConfigMap | ResourceKind::Secret => 3,
            ResourceKind::Namespace => 4,
            ResourceKind::Other(_) => 5,
            ResourceKind::CustomResourceDefinition => 6,
        }
    }

    /// Canonical kind string as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Secret => "Secret",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Service => "Service",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::StatefulSet => "StatefulSet",
            ResourceKind::DaemonSet => "DaemonSet",
            ResourceKind::DeploymentConfig => "DeploymentConfig",
            ResourceKind::Job => "Job",
            ResourceKind::Ingress => "Ingress",
            ResourceKind::CustomResourceDefinition => "CustomResourceDefinition",
            ResourceKind::Other(s) => s,
        }
    }
}

impl From<String> for ResourceKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Namespace" => ResourceKind::Namespace,
            "Secret" => ResourceKind::Secret,
            "ConfigMap" => ResourceKind::ConfigMap,
            "Service" => ResourceKind::Service,
            "Deployment" => ResourceKind::Deployment,
            "StatefulSet" => ResourceKind::StatefulSet,
            "DaemonSet" => ResourceKind::DaemonSet,
            "DeploymentConfig" => ResourceKind::DeploymentConfig,
            "Job" => ResourceKind::Job,
            "Ingress" => ResourceKind::Ingress,
            "CustomResourceDefinition" => ResourceKind::CustomResourceDefinition,
            _ => ResourceKind::Other(s),
        }
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
