//! pv-process: ordered execution steps with compensating rollback
//!
//! Every multi-step distributed operation (login, upload, profile update)
//! runs as a [`Process`]: a chain of [`ProcessStep`]s executed strictly in
//! order. When any step fails, the framework rolls back exactly the steps
//! that already succeeded, in reverse order, before surfacing the original
//! failure — transaction-looking semantics over a store that only offers
//! independent get/put.

mod process;
mod step;

pub use process::{Process, ProcessId, ProcessState};
pub use step::{ProcessStep, StepOutcome, StepState};
