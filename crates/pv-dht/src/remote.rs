//! OpenDAL-backed DHT adapter for S3-compatible stores
//!
//! Profile entries map to objects at `profiles/{location-hex}/{kind}`.
//! The conditional put here is read-check-write: object stores offer no
//! compare-and-swap, so the check is best-effort — the same trust model
//! the underlying DHT gives any peer. Tests and anything needing a true
//! atomic check use [`crate::MemoryDht`].

use async_trait::async_trait;
use opendal::Operator;

use pv_core::config::DhtConfig;
use pv_core::{PvError, PvResult};
use pv_crypto::{EncryptedEnvelope, LocationKey};

use crate::store::Dht;

pub struct OpendalDht {
    op: Operator,
}

impl OpendalDht {
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    fn entry_path(location: &LocationKey, kind: &str) -> String {
        format!("profiles/{}/{kind}", location.to_hex())
    }
}

#[async_trait]
impl Dht for OpendalDht {
    async fn get(&self, location: &LocationKey, kind: &str) -> PvResult<Option<EncryptedEnvelope>> {
        let path = Self::entry_path(location, kind);
        match self.op.read(&path).await {
            Ok(buf) => Ok(Some(EncryptedEnvelope::from_bytes(&buf.to_bytes())?)),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PvError::Dht(format!("reading {path}: {e}"))),
        }
    }

    async fn put(
        &self,
        location: &LocationKey,
        kind: &str,
        envelope: EncryptedEnvelope,
        expected_version: Option<u64>,
    ) -> PvResult<()> {
        let stored = self.get(location, kind).await?.map(|e| e.version);
        let matches = match (expected_version, stored) {
            (None, None) => true,
            (Some(expected), Some(stored)) => expected == stored,
            _ => false,
        };
        if !matches {
            return Err(PvError::VersionConflict {
                expected: expected_version,
                stored,
            });
        }

        let path = Self::entry_path(location, kind);
        self.op
            .write(&path, envelope.to_bytes()?)
            .await
            .map_err(|e| PvError::Dht(format!("writing {path}: {e}")))?;
        Ok(())
    }

    async fn remove(&self, location: &LocationKey, kind: &str) -> PvResult<()> {
        let path = Self::entry_path(location, kind);
        self.op
            .delete(&path)
            .await
            .map_err(|e| PvError::Dht(format!("removing {path}: {e}")))?;
        Ok(())
    }
}

/// Build an OpenDAL operator for an S3-compatible DHT store.
///
/// Uses path-style addressing (default in opendal 0.55), required by
/// SeaweedFS and MinIO. If `enforce_tls` is set and the endpoint uses
/// HTTP, construction fails; otherwise a warning is logged for non-HTTPS
/// endpoints.
pub fn build_operator(
    cfg: &DhtConfig,
    access_key_id: &str,
    secret_access_key: &str,
) -> anyhow::Result<Operator> {
    use anyhow::Context;

    if cfg.endpoint.starts_with("http://") {
        if cfg.enforce_tls {
            anyhow::bail!(
                "DHT endpoint uses plaintext HTTP ({}), but enforce_tls is enabled. \
                 Use an HTTPS endpoint or set dht.enforce_tls = false for local development.",
                cfg.endpoint
            );
        }
        tracing::warn!(
            endpoint = %cfg.endpoint,
            "DHT endpoint uses plaintext HTTP — set dht.enforce_tls = true and use HTTPS in production"
        );
    }

    let builder = opendal::services::S3::default()
        .endpoint(&cfg.endpoint)
        .region(&cfg.region)
        .bucket(&cfg.bucket)
        .access_key_id(access_key_id)
        .secret_access_key(secret_access_key);

    let op = Operator::new(builder)
        .context("creating OpenDAL S3 operator")?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
        .finish();

    Ok(op)
}
