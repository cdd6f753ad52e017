//! rolldock-manifest — turns rendered resources into a deployable plan.
//!
//! Given the rendered resource list and the release history, this crate
//! decides the release number, classifies workloads, stamps revision
//! annotations, and injects track/release labels. It also rewrites
//! traffic-split custom resources for canary and blue-green rollouts.

pub mod plan;
pub mod traffic;

pub use plan::{ManagedWorkload, ManifestPlan, PlanOptions, plan};
pub use traffic::rewrite_traffic_routes;
