//! Login step: fetch and decrypt the user profile

use async_trait::async_trait;
use tracing::debug;

use pv_core::{PvError, PvResult};
use pv_process::{ProcessStep, StepOutcome};

use crate::contexts::LoginContext;
use crate::steps::SessionCreationStep;

/// Fetches the profile and stashes it — plus its protection keys — in the
/// login context for the session-creation step.
#[derive(Default)]
pub struct GetProfileStep;

#[async_trait]
impl ProcessStep<LoginContext> for GetProfileStep {
    fn name(&self) -> &'static str {
        "get-profile"
    }

    async fn execute(&mut self, ctx: &mut LoginContext) -> PvResult<StepOutcome<LoginContext>> {
        let profile = ctx.manager.get_profile(ctx.process_id).await?;
        debug!(user = profile.user_id(), "profile fetched for login");

        ctx.pending_protection_keys = Some(profile.protection_keys().clone());
        ctx.profile = Some(profile);
        Ok(StepOutcome::then(SessionCreationStep))
    }

    async fn rollback(&mut self, ctx: &mut LoginContext, _reason: &PvError) -> PvResult<()> {
        ctx.profile = None;
        ctx.pending_protection_keys = None;
        Ok(())
    }
}
