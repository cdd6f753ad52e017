//! rolldock-release — the versioned record of what was deployed.
//!
//! A [`Release`] is one deployment attempt; a [`ReleaseHistory`] is the
//! ordered, capped collection of attempts for one release name. The
//! history is the only state persisted between orchestrator
//! invocations, stored through an injected [`HistoryBackend`] as an
//! opaque blob (the reference deployment keeps it in a config object
//! inside the target cluster).
//!
//! # Wire formats
//!
//! Two formats interoperate for reads: the legacy format embedding full
//! resource specs per release, and the lighter declarative format that
//! can omit specs. Detection happens at decode; all orchestration logic
//! operates on the canonical in-memory [`ReleaseHistory`] only.

pub mod error;
pub mod format;
pub mod history;
pub mod release;
pub mod store;

pub use error::{HistoryError, HistoryResult};
pub use format::HistoryFormat;
pub use history::{DEFAULT_RETENTION, ReleaseHistory};
pub use release::{Release, ReleaseStatus, TrackedWorkload};
pub use store::{FileBackend, HistoryBackend, HistoryStore, InMemoryBackend, SaveRetry};
