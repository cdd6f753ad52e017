//! Wire formats for the persisted release history.
//!
//! Two formats must interoperate so histories written by older
//! orchestrator versions stay readable without a migration step:
//!
//! - **Legacy** — every release embeds its full resource specs plus an
//!   explicit tracked-workload revision list.
//! - **Declarative** — lighter records carrying resource identities,
//!   with specs optional. Marked by a required `schema` field, which is
//!   also how decode detects the format.
//!
//! Decode always lands on the canonical [`ReleaseHistory`]; encode uses
//! whichever format the caller's configuration selects.

use serde::{Deserialize, Serialize};

use rolldock_model::{Resource, ResourceId};

use crate::error::{HistoryError, HistoryResult};
use crate::history::ReleaseHistory;
use crate::release::{Release, ReleaseStatus, TrackedWorkload};

/// Schema marker written into declarative blobs.
const DECLARATIVE_SCHEMA: &str = "rolldock/v2";

/// Which wire format new writes use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFormat {
    #[default]
    Legacy,
    Declarative,
}

// ── Legacy format ──────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct LegacyDoc {
    releases: Vec<LegacyEntry>,
}

#[derive(Serialize, Deserialize)]
struct LegacyEntry {
    number: u64,
    status: ReleaseStatus,
    resources: Vec<Resource>,
    #[serde(default)]
    managed_workloads: Vec<TrackedWorkload>,
    #[serde(default = "default_true")]
    prune_enabled: bool,
}

// ── Declarative format ─────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct DeclarativeDoc {
    schema: String,
    releases: Vec<DeclarativeEntry>,
}

#[derive(Serialize, Deserialize)]
struct DeclarativeEntry {
    number: u64,
    status: ReleaseStatus,
    resource_ids: Vec<ResourceId>,
    /// Full specs, retained only when the release can serve as a
    /// pruning baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    specs: Option<Vec<Resource>>,
    #[serde(default)]
    tracked_workloads: Vec<TrackedWorkload>,
}

fn default_true() -> bool {
    true
}

// ── Encode / decode ────────────────────────────────────────────────

/// Serialize a history in the selected format.
pub fn encode(history: &ReleaseHistory, format: HistoryFormat) -> HistoryResult<Vec<u8>> {
    let encoded = match format {
        HistoryFormat::Legacy => {
            let doc = LegacyDoc {
                releases: history.releases().iter().map(legacy_entry).collect(),
            };
            serde_json::to_vec(&doc)
        }
        HistoryFormat::Declarative => {
            let doc = DeclarativeDoc {
                schema: DECLARATIVE_SCHEMA.to_string(),
                releases: history.releases().iter().map(declarative_entry).collect(),
            };
            serde_json::to_vec(&doc)
        }
    };
    encoded.map_err(|e| HistoryError::Encode(e.to_string()))
}

/// Deserialize a history blob, detecting its format from the envelope.
pub fn decode(blob: &[u8]) -> HistoryResult<ReleaseHistory> {
    let value: serde_json::Value =
        serde_json::from_slice(blob).map_err(|e| HistoryError::Decode(e.to_string()))?;

    let releases = if value.get("schema").is_some() {
        let doc: DeclarativeDoc = serde_json::from_value(value)
            .map_err(|e| HistoryError::Decode(format!("declarative: {e}")))?;
        doc.releases.into_iter().map(release_from_declarative).collect()
    } else {
        let doc: LegacyDoc = serde_json::from_value(value)
            .map_err(|e| HistoryError::Decode(format!("legacy: {e}")))?;
        doc.releases.into_iter().map(release_from_legacy).collect()
    };

    Ok(ReleaseHistory::from_releases(releases))
}

fn legacy_entry(release: &Release) -> LegacyEntry {
    LegacyEntry {
        number: release.number,
        status: release.status,
        resources: release.resources.clone(),
        managed_workloads: release.tracked_workloads.clone(),
        prune_enabled: release.prune_enabled,
    }
}

fn declarative_entry(release: &Release) -> DeclarativeEntry {
    DeclarativeEntry {
        number: release.number,
        status: release.status,
        resource_ids: release.resource_ids(),
        specs: release.prune_enabled.then(|| release.resources.clone()),
        tracked_workloads: release.tracked_workloads.clone(),
    }
}

fn release_from_legacy(entry: LegacyEntry) -> Release {
    Release {
        number: entry.number,
        status: entry.status,
        resources: entry.resources,
        tracked_workloads: entry.managed_workloads,
        prune_enabled: entry.prune_enabled,
    }
}

fn release_from_declarative(entry: DeclarativeEntry) -> Release {
    let prune_enabled = entry.specs.is_some();
    Release {
        number: entry.number,
        status: entry.status,
        resources: entry.specs.unwrap_or_default(),
        tracked_workloads: entry.tracked_workloads,
        prune_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolldock_model::ResourceKind;

    fn sample_history() -> ReleaseHistory {
        let mut first = Release::new(
            1,
            vec![
                Resource::new(ResourceKind::Deployment, "api", "prod"),
                Resource::new(ResourceKind::ConfigMap, "settings", "prod"),
            ],
            true,
        );
        first.status = ReleaseStatus::Succeeded;
        first.track_workload(
            ResourceId::new(ResourceKind::DeploymentConfig, "legacy-api", "prod"),
            Some("12".to_string()),
        );

        let second = Release::new(
            2,
            vec![Resource::new(ResourceKind::Deployment, "api", "prod")],
            true,
        );

        ReleaseHistory::from_releases(vec![first, second])
    }

    #[test]
    fn legacy_roundtrip_preserves_latest() {
        let history = sample_history();
        let blob = encode(&history, HistoryFormat::Legacy).unwrap();
        let decoded = decode(&blob).unwrap();

        assert_eq!(decoded.latest().unwrap().number, 2);
        assert_eq!(decoded.latest().unwrap().status, ReleaseStatus::Running);
        assert_eq!(decoded, history);
    }

    #[test]
    fn declarative_roundtrip_preserves_latest() {
        let history = sample_history();
        let blob = encode(&history, HistoryFormat::Declarative).unwrap();
        let decoded = decode(&blob).unwrap();

        assert_eq!(decoded.latest().unwrap().number, 2);
        assert_eq!(decoded.latest().unwrap().status, ReleaseStatus::Running);
        assert_eq!(decoded, history);
    }

    #[test]
    fn decode_detects_format_from_schema_marker() {
        let history = sample_history();

        let legacy = encode(&history, HistoryFormat::Legacy).unwrap();
        let legacy_value: serde_json::Value = serde_json::from_slice(&legacy).unwrap();
        assert!(legacy_value.get("schema").is_none());

        let declarative = encode(&history, HistoryFormat::Declarative).unwrap();
        let declarative_value: serde_json::Value =
            serde_json::from_slice(&declarative).unwrap();
        assert_eq!(declarative_value["schema"], "rolldock/v2");

        // Both land on the same canonical form.
        assert_eq!(decode(&legacy).unwrap(), decode(&declarative).unwrap());
    }

    #[test]
    fn declarative_omits_specs_when_prune_disabled() {
        let release = Release::new(
            1,
            vec![Resource::new(ResourceKind::Deployment, "api", "prod")],
            false,
        );
        let history = ReleaseHistory::from_releases(vec![release]);

        let blob = encode(&history, HistoryFormat::Declarative).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&blob).unwrap();
        assert!(value["releases"][0].get("specs").is_none());
        // Identities still present for number bookkeeping.
        assert_eq!(value["releases"][0]["resource_ids"][0]["name"], "api");

        let decoded = decode(&blob).unwrap();
        assert!(!decoded.latest().unwrap().prune_enabled);
        assert!(decoded.latest().unwrap().resources.is_empty());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode(b"not json"),
            Err(HistoryError::Decode(_))
        ));
        assert!(matches!(
            decode(br#"{"schema": "rolldock/v2", "releases": 7}"#),
            Err(HistoryError::Decode(_))
        ));
    }
}
