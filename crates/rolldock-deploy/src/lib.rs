//! rolldock-deploy — the deployment executor.
//!
//! Drives one deployment attempt through the state machine
//! `Init → DryRun → Apply → WaitSteadyState → WrapUp`, persisting the
//! release history around the attempt and handing off to the pruning
//! engine when enabled.
//!
//! # Components
//!
//! - **`config`** — per-attempt knobs (mode, steady-state cadence,
//!   history format, prune toggle)
//! - **`progress`** — append-only narration sink for the state machine
//! - **`executor`** — the state machine itself
//! - **`endpoint`** — load-balancer/ingress endpoint resolution

pub mod config;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod progress;

pub use config::{DeployConfig, SteadyStateConfig};
pub use error::{DeployError, DeployResult};
pub use executor::{DeployOutcome, Deployer};
pub use progress::{ProgressSink, Step, TracingSink};
