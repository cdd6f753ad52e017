//! Traffic-split resource rewriting for canary and blue-green rollouts.
//!
//! Before the steady-state wait begins, route/weighted-destination
//! custom resources must reference every traffic track in play so the
//! mesh can split traffic between the stable and canary pod
//! populations.

use serde_json::{Map, Value, json};
use tracing::debug;

use rolldock_model::{Resource, ResourceKind, TRACK_LABEL, Track};

/// Custom-resource kinds treated as traffic routes.
const TRAFFIC_ROUTE_KINDS: &[&str] = &["TrafficSplit", "VirtualService", "DestinationRule"];

fn is_traffic_route(kind: &ResourceKind) -> bool {
    match kind {
        ResourceKind::Other(name) => TRAFFIC_ROUTE_KINDS.contains(&name.as_str()),
        _ => false,
    }
}

/// Rewrite every traffic-route resource to carry one weighted subset
/// per track. Weights split evenly, remainder to the first track.
/// Returns the number of resources rewritten.
pub fn rewrite_traffic_routes(resources: &mut [Resource], tracks: &[Track]) -> usize {
    if tracks.is_empty() {
        return 0;
    }

    let subsets: Vec<Value> = tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            json!({
                "name": track.label_value(),
                "labels": { TRACK_LABEL: track.label_value() },
                "weight": weight_for(i, tracks.len()),
            })
        })
        .collect();

    let mut rewritten = 0;
    for resource in resources.iter_mut() {
        if !is_traffic_route(&resource.id.kind) {
            continue;
        }
        if !resource.spec.is_object() {
            resource.spec = Value::Object(Map::new());
        }
        if let Some(spec) = resource.spec.as_object_mut() {
            spec.insert("subsets".to_string(), Value::Array(subsets.clone()));
            rewritten += 1;
            debug!(resource = %resource.id, "traffic route rewritten for tracks");
        }
    }
    rewritten
}

fn weight_for(index: usize, track_count: usize) -> u64 {
    let base = 100 / track_count as u64;
    if index == 0 {
        100 - base * (track_count as u64 - 1)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn virtual_service() -> Resource {
        Resource::new(
            ResourceKind::Other("VirtualService".to_string()),
            "api-routes",
            "prod",
        )
        .with_spec(json!({ "hosts": ["api.example.com"] }))
    }

    #[test]
    fn rewrites_routes_with_both_tracks() {
        let mut resources = vec![virtual_service()];
        let count =
            rewrite_traffic_routes(&mut resources, &[Track::Stable, Track::Canary]);
        assert_eq!(count, 1);

        let subsets = resources[0].spec["subsets"].as_array().unwrap();
        assert_eq!(subsets.len(), 2);
        assert_eq!(subsets[0]["name"], "stable");
        assert_eq!(subsets[0]["labels"][TRACK_LABEL], "stable");
        assert_eq!(subsets[1]["name"], "canary");
        assert_eq!(subsets[1]["labels"][TRACK_LABEL], "canary");
        // Untouched fields survive.
        assert_eq!(resources[0].spec["hosts"][0], "api.example.com");
    }

    #[test]
    fn weights_sum_to_one_hundred() {
        let mut resources = vec![virtual_service()];
        rewrite_traffic_routes(&mut resources, &[Track::Stable, Track::Canary]);

        let subsets = resources[0].spec["subsets"].as_array().unwrap();
        let total: u64 = subsets.iter().map(|s| s["weight"].as_u64().unwrap()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn non_route_resources_are_untouched() {
        let mut resources = vec![
            Resource::new(ResourceKind::Deployment, "api", "prod"),
            Resource::new(ResourceKind::Other("CronTab".to_string()), "tab", "prod"),
        ];
        let before = resources.clone();
        assert_eq!(
            rewrite_traffic_routes(&mut resources, &[Track::Stable, Track::Canary]),
            0
        );
        assert_eq!(resources, before);
    }

    #[test]
    fn single_track_takes_full_weight() {
        let mut resources = vec![virtual_service()];
        rewrite_traffic_routes(&mut resources, &[Track::Stable]);
        let subsets = resources[0].spec["subsets"].as_array().unwrap();
        assert_eq!(subsets.len(), 1);
        assert_eq!(subsets[0]["weight"], 100);
    }
}
