//! Progress narration for the executor state machine.
//!
//! The sink is an append-only callback consumed by the surrounding
//! platform (log streaming lives there, not here). The default
//! implementation forwards to `tracing`.

/// A step of the deployment state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Init,
    DryRun,
    Apply,
    WaitSteadyState,
    WrapUp,
    Prune,
}

impl Step {
    pub fn title(self) -> &'static str {
        match self {
            Step::Init => "Initialize",
            Step::DryRun => "Dry Run",
            Step::Apply => "Apply",
            Step::WaitSteadyState => "Wait For Steady State",
            Step::WrapUp => "Wrap Up",
            Step::Prune => "Prune",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Structured append-only narration of a deployment attempt.
pub trait ProgressSink {
    fn step_started(&self, step: Step);
    fn note(&self, step: Step, message: &str);
    fn step_done(&self, step: Step);
}

/// Default sink: forwards narration to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn step_started(&self, step: Step) {
        tracing::info!(step = %step, "step started");
    }

    fn note(&self, step: Step, message: &str) {
        tracing::info!(step = %step, "{message}");
    }

    fn step_done(&self, step: Step) {
        tracing::info!(step = %step, "step done");
    }
}
