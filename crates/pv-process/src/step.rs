//! The step contract and its lifecycle states

use async_trait::async_trait;

use pv_core::{PvError, PvResult};

/// Lifecycle of a single step.
///
/// Forward: `Ready → Executing → {Succeeded, Failed}`. A succeeded step
/// additionally supports `Succeeded → RollingBack → RolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Ready,
    Executing,
    Succeeded,
    Failed,
    RollingBack,
    RolledBack,
}

impl StepState {
    pub fn name(&self) -> &'static str {
        match self {
            StepState::Ready => "ready",
            StepState::Executing => "executing",
            StepState::Succeeded => "succeeded",
            StepState::Failed => "failed",
            StepState::RollingBack => "rolling-back",
            StepState::RolledBack => "rolled-back",
        }
    }

    pub(crate) fn can_execute(&self) -> bool {
        matches!(self, StepState::Ready)
    }

    pub(crate) fn can_roll_back(&self) -> bool {
        matches!(self, StepState::Succeeded)
    }
}

impl std::fmt::Display for StepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a step hands back on success: the next step of the chain, decided
/// only now, or the end of the process.
pub enum StepOutcome<C: Send> {
    Continue(Box<dyn ProcessStep<C>>),
    Done,
}

impl<C: Send> StepOutcome<C> {
    /// Convenience constructor for `Continue`.
    pub fn then(step: impl ProcessStep<C> + 'static) -> Self {
        StepOutcome::Continue(Box::new(step))
    }
}

/// One unit of forward work plus its compensation.
///
/// Steps communicate through the shared typed context `C` — explicit data
/// passing, not ambient globals. Failure is a typed [`PvError`], never a
/// panic used for control flow.
#[async_trait]
pub trait ProcessStep<C: Send>: Send {
    fn name(&self) -> &'static str;

    /// Run the forward action. Returning `Ok` advances the process to the
    /// outcome's next step; returning `Err` halts it and starts rollback.
    async fn execute(&mut self, ctx: &mut C) -> PvResult<StepOutcome<C>>;

    /// Compensate a previously succeeded execution. Must be safe to call
    /// even if the forward effect was only partially established; the
    /// framework logs and swallows rollback failures so they never mask
    /// the original failure reason.
    async fn rollback(&mut self, _ctx: &mut C, _reason: &PvError) -> PvResult<()> {
        Ok(())
    }
}
