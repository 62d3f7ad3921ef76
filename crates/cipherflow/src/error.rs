//! Error types for cipherflow.
//!
//! All errors are strongly typed and returned as values; nothing panics
//! across the API boundary. Key material is never included in messages.

/// Error type covering digest, cipher and scheduling operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Cipher {cipher} does not support {key} keys")]
    UnsupportedKey { cipher: String, key: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Digest already finished")]
    AlreadyFinished,

    #[error("Digest algorithms do not match")]
    AlgorithmMismatch,

    #[error("Invalid block size: expected {expected}, got {actual}")]
    BlockSize { expected: usize, actual: usize },

    #[error("Output buffer too small: need {needed}, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("Custom padding is not supported by {0}")]
    PaddingUnsupported(String),

    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("No output sink")]
    MissingOutput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CryptoError>;
