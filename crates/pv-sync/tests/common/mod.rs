//! Shared helpers for the integration scenarios
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;

use pv_core::{PvError, PvResult, UserCredentials};
use pv_crypto::KdfParams;
use pv_dht::{Dht, MemoryDht};
use pv_process::{ProcessStep, StepOutcome};
use pv_sync::UserProfileManager;

/// Install a test subscriber; no-op when one is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fast Argon2id parameters so the scenarios stay quick.
pub fn fast_kdf() -> KdfParams {
    KdfParams {
        mem_cost_kib: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

pub fn alice() -> UserCredentials {
    UserCredentials::new("alice", "correct-pass", "1234")
}

/// A manager bound to `creds` over the given store. Built directly (not
/// through the registry) so tests can simulate a second peer's client for
/// the same profile.
pub fn manager_on(dht: &Arc<MemoryDht>, creds: &UserCredentials) -> Arc<UserProfileManager> {
    Arc::new(
        UserProfileManager::new(dht.clone() as Arc<dyn Dht>, creds, fast_kdf(), 3)
            .expect("manager construction"),
    )
}

/// Step that always fails, for driving rollback from tests.
pub struct FailingStep;

#[async_trait]
impl<C: Send> ProcessStep<C> for FailingStep {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn execute(&mut self, _ctx: &mut C) -> PvResult<StepOutcome<C>> {
        Err(PvError::Dht("injected failure".into()))
    }
}
