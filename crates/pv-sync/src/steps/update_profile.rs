//! Upload step: add the new file node to the user profile

use async_trait::async_trait;
use ed25519_dalek::VerifyingKey;
use tracing::{debug, info};

use pv_core::{PvError, PvResult};
use pv_process::{ProcessStep, StepOutcome};

use crate::contexts::UploadContext;
use crate::fs;

/// Runs the full get→mutate→put cycle against the profile manager,
/// inserting a tree node for the uploaded file under its parent
/// directory.
///
/// The parent is remembered by its public key: at rollback time the path
/// context may already be gone, but the key still resolves the node. The
/// compensation removes the added child and re-commits; it is written
/// remove-if-present, so rolling back twice (or rolling back an add that
/// lost the race) cannot double-compensate.
#[derive(Default)]
pub struct UpdateProfileStep {
    parent_key: Option<VerifyingKey>,
    added_name: Option<String>,
}

#[async_trait]
impl ProcessStep<UploadContext> for UpdateProfileStep {
    fn name(&self) -> &'static str {
        "update-profile"
    }

    async fn execute(&mut self, ctx: &mut UploadContext) -> PvResult<StepOutcome<UploadContext>> {
        let name = fs::node_name(&ctx.file_path)?;
        let parent_path = fs::relative_parent_path(&ctx.sync_root, &ctx.file_path)?;
        let keys = ctx
            .meta_keys
            .clone()
            .ok_or(PvError::ContextMissing("meta key pair"))?;

        // Directories carry no content hash; files are hashed now so peers
        // can tell content changes from metadata-only changes.
        let content_hash = if std::fs::metadata(&ctx.file_path)?.is_file() {
            Some(pv_crypto::hash_file(&ctx.file_path)?)
        } else {
            None
        };

        // Last safe point before the irreversible side effect.
        if ctx.cancel.is_cancelled() {
            return Err(PvError::Stopped("upload cancelled before profile commit".into()));
        }

        debug!(
            file = %ctx.file_path.display(),
            parent = %parent_path,
            "adding node to user profile"
        );

        let parent_key = &mut self.parent_key;
        let version = ctx
            .manager
            .commit_with_retry(ctx.process_id, |profile| {
                let parent = profile.find_by_path(&parent_path)?;
                let parent_node = profile
                    .node(parent)
                    .ok_or_else(|| PvError::NotFound(format!("node {parent}")))?;
                *parent_key = Some(parent_node.public_key());
                profile.add_child(parent, &name, keys.clone(), content_hash)?;
                Ok(())
            })
            .await?;

        info!(file = %name, version, "user profile updated with new node");
        self.added_name = Some(name);
        Ok(StepOutcome::Done)
    }

    async fn rollback(&mut self, ctx: &mut UploadContext, _reason: &PvError) -> PvResult<()> {
        let (parent_key, name) = match (&self.parent_key, &self.added_name) {
            (Some(key), Some(name)) => (*key, name.clone()),
            // The add never reached the tree — nothing to undo.
            _ => return Ok(()),
        };

        ctx.manager
            .commit_with_retry(ctx.process_id, |profile| {
                let Some(parent) = profile.find_by_key(&parent_key) else {
                    return Ok(());
                };
                match profile.child_by_name(parent, &name) {
                    Some(child) => profile.remove_subtree(child),
                    None => Ok(()),
                }
            })
            .await?;

        debug!(file = %name, "removed node from user profile during rollback");
        Ok(())
    }
}
