//! Incremental hash digests.
//!
//! A [`Digest`] accumulates bytes through [`Digest::update`] and yields its
//! result exactly once: [`Digest::finish`] computes and caches the value,
//! and repeated calls hand back the cached bytes. Once finished, further
//! updates are rejected until [`Digest::reset`] starts a fresh run.

pub mod algorithm;
mod backend;

use crate::error::{CryptoError, Result};

pub use self::algorithm::DigestAlgorithm;
use self::backend::DigestBackend;

/// Hash the whole of `data` in one call.
pub fn digest_data(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    backend::digest_once(algorithm, data)
}

/// Hash `data` into a caller-supplied buffer. Returns the digest size.
pub fn digest_data_into(algorithm: DigestAlgorithm, data: &[u8], out: &mut [u8]) -> Result<usize> {
    let size = algorithm.size();
    if out.len() < size {
        return Err(CryptoError::BufferTooSmall {
            needed: size,
            actual: out.len(),
        });
    }
    out[..size].copy_from_slice(&backend::digest_once(algorithm, data));
    Ok(size)
}

/// An incremental hash computation.
///
/// `Clone` duplicates the running state and any cached result; the copy is
/// independent of the source from then on.
#[derive(Clone)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    backend: DigestBackend,
    result: Option<Vec<u8>>,
}

impl Digest {
    /// Create a digest in its initial state.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        log::trace!("new {algorithm} digest");
        Self {
            algorithm,
            backend: DigestBackend::new(algorithm),
            result: None,
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn name(&self) -> &'static str {
        self.algorithm.name()
    }

    pub fn size(&self) -> usize {
        self.algorithm.size()
    }

    pub fn block_size(&self) -> usize {
        self.algorithm.block_size()
    }

    /// Whether [`Digest::finish`] has been called since the last reset.
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Feed more bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::AlreadyFinished` if the digest has been
    /// finished; the state is left untouched.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        if self.result.is_some() {
            return Err(CryptoError::AlreadyFinished);
        }
        self.backend.update(data);
        Ok(())
    }

    /// Feed several buffers in order, as if they were one.
    pub fn update_scattered(&mut self, buffers: &[&[u8]]) -> Result<()> {
        if self.result.is_some() {
            return Err(CryptoError::AlreadyFinished);
        }
        for buf in buffers {
            self.backend.update(buf);
        }
        Ok(())
    }

    /// Drop the cached result and all accumulated state.
    pub fn reset(&mut self) {
        self.backend.reset();
        self.result = None;
    }

    /// Compute the digest, or return the cached one.
    pub fn finish(&mut self) -> &[u8] {
        let backend = &mut self.backend;
        self.result.get_or_insert_with(|| backend.finish())
    }

    /// Finish and return the digest as lowercase hex.
    pub fn finish_hex(&mut self) -> String {
        hex::encode(self.finish())
    }

    /// Finish and consume the digest, keeping only the result bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.finish();
        self.result.take().unwrap_or_default()
    }

    /// Overwrite this digest with the state and result of `source`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::AlgorithmMismatch` unless both digests use the
    /// same algorithm.
    pub fn copy_from(&mut self, source: &Digest) -> Result<()> {
        if self.algorithm != source.algorithm {
            return Err(CryptoError::AlgorithmMismatch);
        }
        // The replaced backend scrubs itself as it drops.
        self.backend = source.backend.clone();
        self.result = source.result.clone();
        Ok(())
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Digest")
            .field("algorithm", &self.algorithm)
            .field("finished", &self.is_finished())
            .finish()
    }
}
