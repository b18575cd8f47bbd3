//! The process executor: forward cursor, reverse rollback

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pv_core::{PvError, PvResult};

use crate::step::{ProcessStep, StepOutcome, StepState};

/// Identity of one running operation; steps hand it to collaborators
/// (e.g. the profile manager's writer slot) so exclusivity can be tracked
/// per process rather than per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(Uuid);

impl ProcessId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcessId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Overall process lifecycle: `Ready → Running → {Completed, Failed,
/// RolledBack}`. `Failed` means the first step failed before anything
/// needed compensation; `RolledBack` means at least one succeeded step was
/// compensated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Completed,
    Failed,
    RolledBack,
}

impl ProcessState {
    pub fn name(&self) -> &'static str {
        match self {
            ProcessState::Ready => "ready",
            ProcessState::Running => "running",
            ProcessState::Completed => "completed",
            ProcessState::Failed => "failed",
            ProcessState::RolledBack => "rolled-back",
        }
    }
}

struct StepSlot<C: Send> {
    step: Box<dyn ProcessStep<C>>,
    state: StepState,
}

impl<C: Send> StepSlot<C> {
    fn new(step: Box<dyn ProcessStep<C>>) -> Self {
        Self {
            step,
            state: StepState::Ready,
        }
    }
}

/// An ordered, append-only chain of steps with a forward cursor.
///
/// Steps may be seeded up front or appended dynamically by an executing
/// step returning [`StepOutcome::Continue`]. Forward execution order is
/// exactly append order; rollback order is the exact reverse of the steps
/// that reached `Succeeded`.
pub struct Process<C: Send> {
    id: ProcessId,
    name: &'static str,
    steps: Vec<StepSlot<C>>,
    cursor: usize,
    state: ProcessState,
}

impl<C: Send> Process<C> {
    pub fn new(name: &'static str, first_step: impl ProcessStep<C> + 'static) -> Self {
        Self {
            id: ProcessId::new(),
            name,
            steps: vec![StepSlot::new(Box::new(first_step))],
            cursor: 0,
            state: ProcessState::Ready,
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Append a step to the end of the chain.
    pub fn push_step(&mut self, step: impl ProcessStep<C> + 'static) {
        self.steps.push(StepSlot::new(Box::new(step)));
    }

    /// Drive the process to a terminal state.
    ///
    /// Returns `Ok(())` on completion. On any step failure the already
    /// succeeded steps are rolled back in reverse order and the original
    /// failure is returned — rollback failures are logged and swallowed.
    /// A pending cancellation is observed before each step and handled as
    /// if the upcoming step had failed with [`PvError::Stopped`].
    pub async fn run(&mut self, ctx: &mut C, cancel: &CancellationToken) -> PvResult<()> {
        if self.state != ProcessState::Ready {
            return Err(PvError::InvalidStateTransition {
                from: self.state.name(),
                attempted: "run",
            });
        }
        self.state = ProcessState::Running;
        debug!(process = self.name, id = %self.id, "process started");

        while self.cursor < self.steps.len() {
            if cancel.is_cancelled() {
                let reason = PvError::Stopped(format!("process '{}' cancelled", self.name));
                warn!(process = self.name, id = %self.id, "stop requested");
                return Err(self.fail(ctx, reason).await);
            }

            let slot_state = self.steps[self.cursor].state;
            if !slot_state.can_execute() {
                let reason = PvError::InvalidStateTransition {
                    from: slot_state.name(),
                    attempted: "execute",
                };
                return Err(self.fail(ctx, reason).await);
            }

            let step_name = self.steps[self.cursor].step.name();
            self.steps[self.cursor].state = StepState::Executing;
            debug!(process = self.name, step = step_name, "executing step");

            match self.steps[self.cursor].step.execute(ctx).await {
                Ok(outcome) => {
                    self.steps[self.cursor].state = StepState::Succeeded;
                    self.cursor += 1;
                    if let StepOutcome::Continue(next) = outcome {
                        self.steps.push(StepSlot::new(next));
                    }
                }
                Err(reason) => {
                    self.steps[self.cursor].state = StepState::Failed;
                    warn!(
                        process = self.name,
                        step = step_name,
                        error = %reason,
                        "step failed — rolling back"
                    );
                    return Err(self.fail(ctx, reason).await);
                }
            }
        }

        self.state = ProcessState::Completed;
        info!(process = self.name, id = %self.id, steps = self.cursor, "process completed");
        Ok(())
    }

    /// Roll back succeeded steps and settle the terminal state; hands the
    /// original failure reason back for the caller to return.
    async fn fail(&mut self, ctx: &mut C, reason: PvError) -> PvError {
        let rolled = self.roll_back(ctx, &reason).await;
        self.state = if rolled > 0 {
            ProcessState::RolledBack
        } else {
            ProcessState::Failed
        };
        reason
    }

    /// Compensate every succeeded step, newest first. Steps that never
    /// succeeded (the failed step itself, and anything after it) are never
    /// touched. Returns how many steps were rolled back.
    async fn roll_back(&mut self, ctx: &mut C, reason: &PvError) -> usize {
        let mut rolled = 0;
        for idx in (0..self.steps.len()).rev() {
            if !self.steps[idx].state.can_roll_back() {
                continue;
            }
            let step_name = self.steps[idx].step.name();
            self.steps[idx].state = StepState::RollingBack;
            debug!(process = self.name, step = step_name, "rolling back step");

            if let Err(e) = self.steps[idx].step.rollback(ctx, reason).await {
                // Never mask the original failure; keep unwinding.
                warn!(
                    process = self.name,
                    step = step_name,
                    error = %e,
                    "rollback failed — continuing with earlier steps"
                );
            }
            self.steps[idx].state = StepState::RolledBack;
            rolled += 1;
        }
        rolled
    }
}
