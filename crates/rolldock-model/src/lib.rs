//! rolldock-model — typed representation of cluster objects.
//!
//! Leaf crate for the deployment orchestrator. Provides the resource
//! identity and spec types that every other crate operates on, plus the
//! mutation helpers (revision stamping, track/release label injection)
//! applied during manifest preparation.
//!
//! # Components
//!
//! - **`kind`** — closed resource-kind enum with workload classification
//!   and deletion ordering
//! - **`resource`** — `ResourceId` / `Resource` and their mutations
//! - **`labels`** — orchestrator-owned label and annotation keys

pub mod kind;
pub mod labels;
pub mod resource;

pub use kind::{ManagedKind, ResourceKind, WorkloadClass};
pub use labels::{RELEASE_LABEL, REVISION_ANNOTATION, TRACK_LABEL, Track};
pub use resource::{Resource, ResourceId};
