//! Endpoint resolution from applied resources.

use rolldock_model::{Resource, ResourceKind};

/// Resolve the externally reachable endpoint from the applied resource
/// set, when one is declared: a `LoadBalancer` service's address first,
/// an ingress rule host as fallback. Returns `None` when the manifests
/// declare neither.
pub fn resolve_endpoint(resources: &[Resource]) -> Option<String> {
    resources
        .iter()
        .find_map(load_balancer_address)
        .or_else(|| resources.iter().find_map(ingress_host))
}

fn load_balancer_address(resource: &Resource) -> Option<String> {
    if resource.id.kind != ResourceKind::Service {
        return None;
    }
    if resource.spec.get("type")?.as_str()? != "LoadBalancer" {
        return None;
    }
    resource
        .spec
        .get("loadBalancerIP")
        .and_then(|v| v.as_str())
        .map(String::from)
}

fn ingress_host(resource: &Resource) -> Option<String> {
    if resource.id.kind != ResourceKind::Ingress {
        return None;
    }
    resource
        .spec
        .get("rules")?
        .as_array()?
        .first()?
        .get("host")?
        .as_str()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_load_balancer_service() {
        let resources = vec![
            Resource::new(ResourceKind::Ingress, "ing", "prod")
                .with_spec(json!({ "rules": [{ "host": "fallback.example.com" }] })),
            Resource::new(ResourceKind::Service, "svc", "prod").with_spec(json!({
                "type": "LoadBalancer",
                "loadBalancerIP": "203.0.113.7",
            })),
        ];
        assert_eq!(resolve_endpoint(&resources).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn falls_back_to_ingress_host() {
        let resources = vec![
            Resource::new(ResourceKind::Service, "svc", "prod")
                .with_spec(json!({ "type": "ClusterIP" })),
            Resource::new(ResourceKind::Ingress, "ing", "prod")
                .with_spec(json!({ "rules": [{ "host": "api.example.com" }] })),
        ];
        assert_eq!(
            resolve_endpoint(&resources).as_deref(),
            Some("api.example.com")
        );
    }

    #[test]
    fn none_when_nothing_is_declared() {
        let resources = vec![Resource::new(ResourceKind::Deployment, "api", "prod")];
        assert_eq!(resolve_endpoint(&resources), None);
    }
}
