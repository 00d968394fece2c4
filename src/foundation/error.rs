/// Convenience result type used across carscope.
pub type CarResult<T> = Result<T, CarError>;

/// Top-level error taxonomy used by container, decoder and renderer APIs.
#[derive(thiserror::Error, Debug)]
pub enum CarError {
    /// The container resource could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural signature mismatch, bad magic, or a length that does not fit its buffer.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The rendition index was interrupted partway through a walk.
    #[error("enumeration error after {visited} renditions: {message}")]
    Enumeration {
        /// Entries successfully handed to the visitor before the failure.
        visited: usize,
        /// What went wrong in the index.
        message: String,
    },

    /// Recognized structure carrying an unknown kind tag, sub-codec or version.
    #[error("unsupported payload: {0}")]
    UnsupportedPayload(String),

    /// A declared allocation exceeded the configured limit or could not be reserved.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CarError {
    /// Build a [`CarError::InvalidFormat`] value.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Build a [`CarError::Enumeration`] value.
    pub fn enumeration(visited: usize, msg: impl Into<String>) -> Self {
        Self::Enumeration {
            visited,
            message: msg.into(),
        }
    }

    /// Build a [`CarError::UnsupportedPayload`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedPayload(msg.into())
    }

    /// Build a [`CarError::OutOfMemory`] value.
    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        Self::OutOfMemory(msg.into())
    }

    /// `true` for errors that only affect a single rendition's payload.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedPayload(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
