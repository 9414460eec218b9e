/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error at `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored document could not be encoded or decoded as JSON.
    #[error("serialization error at `{key}`: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// Documents cannot be written at the root of the tree.
    #[error("cannot store a document at the root key")]
    RootKey,
}

impl StoreError {
    pub(crate) fn io(key: impl ToString, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn serialization(key: impl ToString, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.to_string(),
            source,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
