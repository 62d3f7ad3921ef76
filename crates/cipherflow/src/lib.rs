//! cipherflow: a backend-agnostic digest and cipher framework.
//!
//! Gives hash digests (MD5, SHA-1, SHA-256, SHA-512) and ciphers (AES in
//! CBC, CFB128, CTR and ECB modes, RSA with OAEP or PKCS#1 v1.5) one object
//! model. Ciphers take input as scattered buffers of any length and feed
//! their backends whole blocks. Every block operation also exists as a
//! cancellable deferred operation driven by a single-threaded event loop.
//!
//! ```no_run
//! use std::sync::Arc;
//! use cipherflow::{Cipher, CipherAlgorithm, Key, KeyKind};
//!
//! let key = Arc::new(Key::generate_aes(KeyKind::Aes256)?);
//! let mut enc = Cipher::new(CipherAlgorithm::AesCbcEncrypt, key.clone())?;
//! let ciphertext = enc.process(b"attack at dawn")?;
//! let mut dec = Cipher::new(CipherAlgorithm::AesCbcDecrypt, key)?;
//! let plaintext = dec.process(&ciphertext)?;
//! assert!(plaintext.starts_with(b"attack at dawn"));
//! # Ok::<(), cipherflow::CryptoError>(())
//! ```

pub mod cipher;
pub mod digest;
pub mod error;
pub mod key;
pub mod random;
pub mod schedule;

// Re-export primary types
pub use error::{CryptoError, Result};
pub use key::{AesKey, Key, KeyKind, AES_IV_SIZE, DEFAULT_RSA_BITS};

// Re-export digest types
pub use digest::{digest_data, digest_data_into, Digest, DigestAlgorithm};

// Re-export cipher types
pub use cipher::{
    cipher_bytes, AesMode, Cipher, CipherAlgorithm, CipherInfo, CipherRun, Direction,
    PaddingFunc, AES_BLOCK_SIZE, RSA_OAEP_PADDING_SIZE, RSA_PKCS1_PADDING_SIZE,
};

// Re-export scheduling types
pub use schedule::{
    ManualScheduler, OperationHandle, OperationId, OperationQueue, Scheduler, SharedBlock,
    SharedDigest, SharedOutput,
};
