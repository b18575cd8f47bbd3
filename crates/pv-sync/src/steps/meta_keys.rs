//! Upload step: generate the new node's identity keys

use async_trait::async_trait;
use tracing::debug;

use pv_core::{PvError, PvResult};
use pv_crypto::NodeKeyPair;
use pv_process::{ProcessStep, StepOutcome};

use crate::contexts::UploadContext;
use crate::steps::UpdateProfileStep;

/// Generates the Ed25519 key pair identifying the node the upload will
/// add, and hands it to later steps through the context.
#[derive(Default)]
pub struct GenerateMetaKeysStep;

#[async_trait]
impl ProcessStep<UploadContext> for GenerateMetaKeysStep {
    fn name(&self) -> &'static str {
        "generate-meta-keys"
    }

    async fn execute(&mut self, ctx: &mut UploadContext) -> PvResult<StepOutcome<UploadContext>> {
        let keys = NodeKeyPair::generate();
        debug!(public = %keys.public_hex(), "generated meta keys for new file node");
        ctx.meta_keys = Some(keys);
        Ok(StepOutcome::then(UpdateProfileStep::default()))
    }

    async fn rollback(&mut self, ctx: &mut UploadContext, _reason: &PvError) -> PvResult<()> {
        ctx.meta_keys = None;
        Ok(())
    }
}
