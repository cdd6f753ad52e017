//! Resource identity and spec payload.
//!
//! A [`ResourceId`] is the structural identity (kind, name, namespace)
//! used as a map/set key throughout the orchestrator. A [`Resource`]
//! couples an identity with its rendered spec payload and the mutable
//! label/annotation sets the orchestrator stamps during manifest
//! preparation. Each release owns its own copies; resources are never
//! shared across releases.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::ResourceKind;
use crate::labels::{RELEASE_LABEL, REVISION_ANNOTATION, TRACK_LABEL, Track};

/// Immutable identity of a cluster object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: String,
}

impl ResourceId {
    pub fn new(kind: ResourceKind, name: &str, namespace: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    /// `Kind/name` reference as used in diagnostics and delete calls.
    pub fn kind_name(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// A rendered cluster object: identity, metadata sets, and spec payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// The `spec` payload as rendered by the manifest layer.
    #[serde(default)]
    pub spec: Value,
}

impl Resource {
    /// Create a resource with an empty spec payload.
    pub fn new(kind: ResourceKind, name: &str, namespace: &str) -> Self {
        Self {
            id: ResourceId::new(kind, name, namespace),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            spec: Value::Object(Map::new()),
        }
    }

    /// Attach a spec payload (builder style).
    pub fn with_spec(mut self, spec: Value) -> Self {
        self.spec = spec;
        self
    }

    pub fn add_label(&mut self, key: &str, value: &str) {
        self.labels.insert(key.to_string(), value.to_string());
    }

    pub fn add_annotation(&mut self, key: &str, value: &str) {
        self.annotations.insert(key.to_string(), value.to_string());
    }

    /// Stamp the release number this resource is deployed by.
    pub fn stamp_revision(&mut self, release_number: u64) {
        self.annotations
            .insert(REVISION_ANNOTATION.to_string(), release_number.to_string());
    }

    /// The stamped release number, if any.
    pub fn revision(&self) -> Option<u64> {
        self.annotations
            .get(REVISION_ANNOTATION)
            .and_then(|v| v.parse().ok())
    }

    /// Inject the track label into the pod-template labels and the
    /// selector map. Only touches Deployment-family kinds — returns
    /// false (and mutates nothing) for anything else.
    pub fn inject_track(&mut self, track: Track) -> bool {
        if !self.id.kind.has_pod_template() {
            return false;
        }
        let value = Value::String(track.label_value().to_string());
        ensure_object(&mut self.spec, &["template", "metadata", "labels"])
            .insert(TRACK_LABEL.to_string(), value.clone());
        ensure_object(&mut self.spec, &["selector", "matchLabels"])
            .insert(TRACK_LABEL.to_string(), value);
        true
    }

    /// Label the pod template with the release name so pods can be
    /// inventoried by selector. Pod-template kinds only.
    pub fn inject_release_label(&mut self, release_name: &str) -> bool {
        if !self.id.kind.has_pod_template() {
            return false;
        }
        ensure_object(&mut self.spec, &["template", "metadata", "labels"]).insert(
            RELEASE_LABEL.to_string(),
            Value::String(release_name.to_string()),
        );
        true
    }

    /// The track label currently set on the pod template, if any.
    pub fn pod_template_track(&self) -> Option<&str> {
        self.spec
            .get("template")?
            .get("metadata")?
            .get("labels")?
            .get(TRACK_LABEL)?
            .as_str()
    }
}

/// Walk (creating as needed) a nested object path inside a spec payload.
fn ensure_object<'a>(value: &'a mut Value, path: &[&str]) -> &'a mut Map<String, Value> {
    let mut current = value;
    for segment in path {
        current = as_object(current)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_object(current)
}

/// Coerce a value to an object map, replacing non-object values.
fn as_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployment(name: &str) -> Resource {
        Resource::new(ResourceKind::Deployment, name, "default").with_spec(json!({
            "replicas": 3,
            "selector": { "matchLabels": { "app": name } },
            "template": { "metadata": { "labels": { "app": name } } },
        }))
    }

    #[test]
    fn id_equality_is_structural() {
        let a = ResourceId::new(ResourceKind::Deployment, "api", "prod");
        let b = ResourceId::new(ResourceKind::Deployment, "api", "prod");
        let c = ResourceId::new(ResourceKind::Deployment, "api", "staging");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_display_includes_namespace() {
        let id = ResourceId::new(ResourceKind::Service, "api", "prod");
        assert_eq!(id.to_string(), "Service/prod/api");
        assert_eq!(id.kind_name(), "Service/api");
    }

    #[test]
    fn revision_stamp_roundtrips() {
        let mut resource = deployment("api");
        assert_eq!(resource.revision(), None);
        resource.stamp_revision(7);
        assert_eq!(resource.revision(), Some(7));
    }

    #[test]
    fn track_injection_touches_template_and_selector() {
        let mut resource = deployment("api");
        assert!(resource.inject_track(Track::Canary));

        assert_eq!(resource.pod_template_track(), Some("canary"));
        assert_eq!(
            resource.spec["selector"]["matchLabels"][TRACK_LABEL],
            json!("canary")
        );
        // Pre-existing labels survive.
        assert_eq!(resource.spec["selector"]["matchLabels"]["app"], json!("api"));
        assert_eq!(
            resource.spec["template"]["metadata"]["labels"]["app"],
            json!("api")
        );
    }

    #[test]
    fn track_injection_skips_non_workload_kinds() {
        let mut cm = Resource::new(ResourceKind::ConfigMap, "settings", "default")
            .with_spec(json!({ "data": { "k": "v" } }));
        let before = cm.spec.clone();
        assert!(!cm.inject_track(Track::Stable));
        assert_eq!(cm.spec, before);
    }

    #[test]
    fn track_injection_creates_missing_paths() {
        let mut resource =
            Resource::new(ResourceKind::StatefulSet, "db", "default").with_spec(json!({}));
        assert!(resource.inject_track(Track::Stable));
        assert_eq!(resource.pod_template_track(), Some("stable"));
    }

    #[test]
    fn release_label_lands_on_pod_template() {
        let mut resource = deployment("api");
        assert!(resource.inject_release_label("payments"));
        assert_eq!(
            resource.spec["template"]["metadata"]["labels"][RELEASE_LABEL],
            json!("payments")
        );
    }

    #[test]
    fn resource_serde_roundtrip() {
        let mut resource = deployment("api");
        resource.stamp_revision(2);
        let json = serde_json::to_string(&resource).unwrap();
        let back: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resource);
    }
}
