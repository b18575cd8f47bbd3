//! Login step: install the session

use async_trait::async_trait;

use pv_core::{PvError, PvResult};
use pv_process::{ProcessStep, StepOutcome};

use crate::contexts::LoginContext;
use crate::session::Session;

/// Consumes the pending protection keys from the context and installs the
/// session, making it visible to all subsequent operations on this
/// client. Rollback invalidates the session again.
pub struct SessionCreationStep;

#[async_trait]
impl ProcessStep<LoginContext> for SessionCreationStep {
    fn name(&self) -> &'static str {
        "session-creation"
    }

    async fn execute(&mut self, ctx: &mut LoginContext) -> PvResult<StepOutcome<LoginContext>> {
        let protection_keys = ctx
            .pending_protection_keys
            .take()
            .ok_or(PvError::ContextMissing("pending protection keys"))?;

        let session = Session::new(
            ctx.manager.user_id().to_string(),
            ctx.manager.clone(),
            protection_keys,
        );
        ctx.sessions.set(session).await;
        Ok(StepOutcome::Done)
    }

    async fn rollback(&mut self, ctx: &mut LoginContext, _reason: &PvError) -> PvResult<()> {
        ctx.sessions.clear().await;
        Ok(())
    }
}
