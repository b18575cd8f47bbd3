//! Profile synchronization engine
//!
//! Provides linearizable-looking read-modify-write access to one user's
//! profile entry. Two guards stack up:
//!   - a local exclusive-writer slot (`start_modification`) serializing
//!     commit attempts within this client — advisory only;
//!   - the version-conditional put at the DHT, which is what actually
//!     catches concurrent writes, including remote peers'.
//!
//! The plaintext tree never leaves this module unencrypted; every get/put
//! passes through the credential-derived envelope.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use pv_core::{PvError, PvResult, UserCredentials};
use pv_crypto::{
    derive_location_key, derive_profile_key, KdfParams, LocationKey, ProfileKey,
};
use pv_dht::Dht;
use pv_process::ProcessId;
use pv_profile::UserProfile;

/// Content kind of the profile entry under a user's location key.
pub const USER_PROFILE_KIND: &str = "user-profile";

#[derive(Default)]
struct WriterState {
    /// Version observed at the last successful `get_profile`.
    observed_version: Option<u64>,
    /// The single in-flight local writer, if any.
    active_writer: Option<ProcessId>,
}

/// Engine for one logical profile document.
///
/// At most one live manager exists per profile (enforced by
/// [`crate::ProfileManagerRegistry`]); all local operations on that
/// profile share it.
pub struct UserProfileManager {
    dht: Arc<dyn Dht>,
    user_id: String,
    location: LocationKey,
    profile_key: ProfileKey,
    kdf: KdfParams,
    max_commit_retries: u32,
    state: Mutex<WriterState>,
}

impl UserProfileManager {
    /// Derive keys from the credentials and bind the manager to the
    /// profile's DHT location. The credentials themselves are not kept.
    pub fn new(
        dht: Arc<dyn Dht>,
        credentials: &UserCredentials,
        kdf: KdfParams,
        max_commit_retries: u32,
    ) -> PvResult<Self> {
        let profile_key = derive_profile_key(credentials, &kdf)?;
        let location = derive_location_key(credentials);
        Ok(Self {
            dht,
            user_id: credentials.user_id().to_string(),
            location,
            profile_key,
            kdf,
            max_commit_retries: max_commit_retries.max(1),
            state: Mutex::new(WriterState::default()),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Fetch, decrypt and deserialize the profile; records the observed
    /// version for the next conditional put.
    pub async fn get_profile(&self, process_id: ProcessId) -> PvResult<UserProfile> {
        let envelope = self
            .dht
            .get(&self.location, USER_PROFILE_KIND)
            .await?
            .ok_or_else(|| PvError::NotFound(format!("user profile for '{}'", self.user_id)))?;

        let profile: UserProfile = pv_crypto::open(&envelope, &self.profile_key)?;
        if profile.version() != envelope.version {
            // The envelope counter is AEAD-bound; a mismatch here means the
            // plaintext itself is corrupt.
            return Err(PvError::DecryptionFailed);
        }

        let mut state = self.state.lock().await;
        state.observed_version = Some(envelope.version);
        debug!(
            user = %self.user_id,
            process = %process_id,
            version = envelope.version,
            "fetched user profile"
        );
        Ok(profile)
    }

    /// Claim the exclusive local writer slot for `process_id`.
    ///
    /// Advisory protection against racing local processes; a remote
    /// peer's concurrent write is only caught by the version check at put
    /// time.
    pub async fn start_modification(&self, process_id: ProcessId) -> PvResult<()> {
        let mut state = self.state.lock().await;
        match state.active_writer {
            Some(active) if active != process_id => Err(PvError::LocalWriterConflict),
            _ => {
                state.active_writer = Some(process_id);
                Ok(())
            }
        }
    }

    /// Release the writer slot without committing (mutation failed before
    /// the put). No-op if `process_id` does not hold the slot.
    pub async fn abort_modification(&self, process_id: ProcessId) {
        let mut state = self.state.lock().await;
        if state.active_writer == Some(process_id) {
            state.active_writer = None;
        }
    }

    /// Encrypt the mutated tree, stamp the next version and conditionally
    /// replace the DHT entry.
    ///
    /// The entry is only replaced if its stored version still equals the
    /// one observed at `get_profile` time; a profile never fetched through
    /// this manager commits as version 0 and requires the entry absent
    /// (registration). Either way the writer slot is released. On success
    /// the cached version advances and the new version is returned.
    pub async fn put_profile(
        &self,
        process_id: ProcessId,
        profile: &mut UserProfile,
    ) -> PvResult<u64> {
        let expected = {
            let state = self.state.lock().await;
            if state.active_writer != Some(process_id) {
                return Err(PvError::InvalidStateTransition {
                    from: "no active modification",
                    attempted: "put_profile",
                });
            }
            state.observed_version
        };

        let next_version = expected.map_or(0, |v| v + 1);
        profile.set_version(next_version);

        debug!(
            user = %self.user_id,
            process = %process_id,
            version = next_version,
            "encrypting user profile and putting it into the DHT"
        );
        let envelope = pv_crypto::seal(profile, &self.profile_key, next_version, &self.kdf)?;
        let result = self
            .dht
            .put(&self.location, USER_PROFILE_KIND, envelope, expected)
            .await;

        let mut state = self.state.lock().await;
        if state.active_writer == Some(process_id) {
            state.active_writer = None;
        }
        match result {
            Ok(()) => {
                state.observed_version = Some(next_version);
                info!(user = %self.user_id, version = next_version, "committed user profile");
                Ok(next_version)
            }
            Err(e) => {
                debug!(user = %self.user_id, error = %e, "profile put rejected");
                Err(e)
            }
        }
    }

    /// Run the full get→mutate→put cycle, retrying lost optimistic races
    /// up to the configured bound.
    ///
    /// `mutate` is re-applied to a freshly fetched copy on every attempt.
    /// Only retryable conflicts re-run the cycle; anything else surfaces
    /// immediately. Returns the committed version.
    pub async fn commit_with_retry<F>(&self, process_id: ProcessId, mut mutate: F) -> PvResult<u64>
    where
        F: FnMut(&mut UserProfile) -> PvResult<()> + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_commit(process_id, &mut mutate).await {
                Ok(version) => return Ok(version),
                Err(e) if e.is_retryable() && attempt < self.max_commit_retries => {
                    warn!(
                        user = %self.user_id,
                        process = %process_id,
                        attempt,
                        error = %e,
                        "commit lost the race — retrying full cycle"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_commit<F>(&self, process_id: ProcessId, mutate: &mut F) -> PvResult<u64>
    where
        F: FnMut(&mut UserProfile) -> PvResult<()> + Send,
    {
        let mut profile = self.get_profile(process_id).await?;
        self.start_modification(process_id).await?;
        if let Err(e) = mutate(&mut profile) {
            self.abort_modification(process_id).await;
            return Err(e);
        }
        self.put_profile(process_id, &mut profile).await
    }

    /// Remove the profile entry outright. Compensation for a registration
    /// put; idempotent.
    pub async fn remove_profile(&self, process_id: ProcessId) -> PvResult<()> {
        self.dht.remove(&self.location, USER_PROFILE_KIND).await?;
        let mut state = self.state.lock().await;
        state.observed_version = None;
        if state.active_writer == Some(process_id) {
            state.active_writer = None;
        }
        Ok(())
    }
}

impl std::fmt::Debug for UserProfileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserProfileManager")
            .field("user_id", &self.user_id)
            .field("location", &self.location.to_hex())
            .finish()
    }
}
