//! Registration step: encrypt the fresh profile and put it into the DHT

use async_trait::async_trait;
use tracing::debug;

use pv_core::{PvError, PvResult};
use pv_process::{ProcessStep, StepOutcome};

use crate::contexts::RegisterContext;

/// Puts the context's profile as a brand-new entry (the put requires the
/// entry to be absent — a conflict here means the user id is taken).
/// Rollback removes the entry it wrote.
#[derive(Default)]
pub struct PutProfileStep {
    committed: bool,
}

#[async_trait]
impl ProcessStep<RegisterContext> for PutProfileStep {
    fn name(&self) -> &'static str {
        "put-profile"
    }

    async fn execute(&mut self, ctx: &mut RegisterContext) -> PvResult<StepOutcome<RegisterContext>> {
        debug!(user = ctx.profile.user_id(), "registering new user profile");

        ctx.manager.start_modification(ctx.process_id).await?;
        match ctx.manager.put_profile(ctx.process_id, &mut ctx.profile).await {
            Ok(_) => {
                self.committed = true;
                Ok(StepOutcome::Done)
            }
            Err(e) => Err(e),
        }
    }

    async fn rollback(&mut self, ctx: &mut RegisterContext, _reason: &PvError) -> PvResult<()> {
        if !self.committed {
            return Ok(());
        }
        ctx.manager.remove_profile(ctx.process_id).await
    }
}
