use thiserror::Error;

pub type PvResult<T> = Result<T, PvError>;

/// Failure taxonomy for profile synchronization and process execution.
///
/// `VersionConflict` and `LocalWriterConflict` are expected, retryable
/// conditions (the caller may re-run the whole get→mutate→put cycle);
/// everything else surfaces immediately.
#[derive(Debug, Error)]
pub enum PvError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("decryption failed: wrong credentials or corrupted ciphertext")]
    DecryptionFailed,

    #[error("version conflict: expected stored version {expected:?}, found {stored:?}")]
    VersionConflict {
        /// Version the writer observed at get time (`None` = entry expected absent)
        expected: Option<u64>,
        /// Version actually stored at put time (`None` = entry absent)
        stored: Option<u64>,
    },

    #[error("another local process is already modifying this profile")]
    LocalWriterConflict,

    #[error("invalid state transition: {from} -> {attempted}")]
    InvalidStateTransition {
        from: &'static str,
        attempted: &'static str,
    },

    #[error("structural violation: {0}")]
    StructuralViolation(String),

    #[error("process stopped: {0}")]
    Stopped(String),

    #[error("process context missing {0}")]
    ContextMissing(&'static str),

    #[error("DHT error: {0}")]
    Dht(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PvError {
    /// Whether re-running the full get→mutate→put cycle may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PvError::VersionConflict { .. } | PvError::LocalWriterConflict
        )
    }
}
