//! Hash backends.
//!
//! The arithmetic comes from the RustCrypto hash crates. This module only
//! selects the right one for a [`DigestAlgorithm`] and exposes the
//! incremental update/finish/reset functions the framework drives.
//!
//! A RustCrypto `reset` restores the chaining values but only rewinds the
//! block buffer, so partial-block input would stay in memory. Every reset
//! here also overwrites the buffer, and a backend scrubs itself on drop.

use md5::Md5;
use sha1::Sha1;
use sha2::digest::core_api::BlockSizeUser;
use sha2::digest::Reset;
use sha2::Digest as _;
use sha2::{Sha256, Sha512};

use super::DigestAlgorithm;

/// Per-algorithm hashing context.
#[derive(Clone)]
pub(crate) enum DigestBackend {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl DigestBackend {
    /// Fresh context in the initial state.
    pub(crate) fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => Self::Md5(Md5::new()),
            DigestAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Produce the digest and leave the context scrubbed and in its initial
    /// state.
    pub(crate) fn finish(&mut self) -> Vec<u8> {
        let out = match self {
            Self::Md5(h) => h.finalize_reset().to_vec(),
            Self::Sha1(h) => h.finalize_reset().to_vec(),
            Self::Sha256(h) => h.finalize_reset().to_vec(),
            Self::Sha512(h) => h.finalize_reset().to_vec(),
        };
        self.reset();
        out
    }

    /// Discard accumulated state. Buffered input is overwritten.
    pub(crate) fn reset(&mut self) {
        match self {
            Self::Md5(h) => scrub(h),
            Self::Sha1(h) => scrub(h),
            Self::Sha256(h) => scrub(h),
            Self::Sha512(h) => scrub(h),
        }
    }
}

impl Drop for DigestBackend {
    fn drop(&mut self) {
        self.reset();
    }
}

/// Reset `h` and overwrite every byte of its block buffer.
///
/// From buffer position zero, one byte followed by `block_size - 1` bytes
/// lands in every buffer slot before the block is compressed. The final
/// reset restores the initial chaining values.
fn scrub<H>(h: &mut H)
where
    H: sha2::Digest + Reset + BlockSizeUser,
{
    const ZEROS: [u8; 128] = [0; 128];
    let block_size = <H as BlockSizeUser>::block_size().min(ZEROS.len());

    sha2::Digest::reset(h);
    sha2::Digest::update(h, &ZEROS[..1]);
    sha2::Digest::update(h, &ZEROS[1..block_size]);
    sha2::Digest::reset(h);
}

/// One-shot digest of a contiguous buffer.
pub(crate) fn digest_once(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    let mut backend = DigestBackend::new(algorithm);
    backend.update(data);
    backend.finish()
}
