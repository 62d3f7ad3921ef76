//! Cipher objects.
//!
//! A [`Cipher`] binds one [`CipherAlgorithm`] to a shared [`Key`] and fixes
//! its input and output block sizes at that moment. Data goes through in
//! three ways:
//!
//! - [`Cipher::step`] and [`Cipher::finish`], one block at a time;
//! - the bulk helpers ([`Cipher::process`], [`Cipher::write_data`] and
//!   their scattered forms), which slice arbitrary input into blocks;
//! - the `*_async` variants, which queue the same work on a [`Scheduler`]
//!   and report through a callback.

pub mod aes;
pub mod algorithm;
pub mod padding;
pub mod rsa;
pub mod run;

use std::cell::RefCell;
use std::io::Write;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::digest::Digest;
use crate::error::{CryptoError, Result};
use crate::key::Key;
use crate::schedule::{
    OperationHandle, OperationId, OperationQueue, Scheduler, SharedBlock, SharedDigest,
    SharedOutput,
};

use self::aes::AesCore;
pub use self::algorithm::{AesMode, CipherAlgorithm, CipherInfo, Direction};
pub use self::padding::PaddingFunc;
use self::rsa::RsaCore;
pub use self::rsa::{RSA_OAEP_PADDING_SIZE, RSA_PKCS1_PADDING_SIZE};
pub use self::run::CipherRun;

/// AES block size in bytes, for every key length.
pub const AES_BLOCK_SIZE: usize = 16;

// ---------------------------------------------------------------------------
// Core state
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum CipherBackend {
    Aes(AesCore),
    Rsa(RsaCore),
}

/// Everything a deferred operation needs to touch.
#[derive(Clone)]
struct CipherCore {
    algorithm: CipherAlgorithm,
    key: Arc<Key>,
    input_block_size: usize,
    output_block_size: usize,
    padding: Option<Rc<dyn Fn(&mut [u8], usize)>>,
    backend: CipherBackend,
}

impl CipherCore {
    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        if input.len() != self.input_block_size {
            return Err(CryptoError::BlockSize {
                expected: self.input_block_size,
                actual: input.len(),
            });
        }
        if output.len() < self.output_block_size {
            return Err(CryptoError::BlockSize {
                expected: self.output_block_size,
                actual: output.len(),
            });
        }
        log::trace!("{} step of {} bytes", self.algorithm, input.len());
        self.transform(input, output)
    }

    fn finish(&mut self, tail: &[u8], output: &mut [u8]) -> Result<usize> {
        let n = tail.len();
        if n > self.input_block_size {
            return Err(CryptoError::BlockSize {
                expected: self.input_block_size,
                actual: n,
            });
        }
        if n == 0 {
            return Ok(0);
        }
        if n == self.input_block_size {
            return self.step(tail, output);
        }

        match self.backend {
            CipherBackend::Aes(_) => {
                let mut block = Zeroizing::new([0u8; AES_BLOCK_SIZE]);
                block[..n].copy_from_slice(tail);
                match &self.padding {
                    Some(pad) => pad(&mut block[..], n),
                    None => {
                        if let Some(pad) = self.algorithm.info().default_padding {
                            pad(&mut block[..], n);
                        }
                    }
                }
                self.step(&block[..], output)
            }
            CipherBackend::Rsa(_) if self.algorithm.is_encrypt() => {
                if output.len() < self.output_block_size {
                    return Err(CryptoError::BlockSize {
                        expected: self.output_block_size,
                        actual: output.len(),
                    });
                }
                self.transform(tail, output)
            }
            CipherBackend::Rsa(_) => Err(CryptoError::BlockSize {
                expected: self.input_block_size,
                actual: n,
            }),
        }
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let result = match &mut self.backend {
            CipherBackend::Aes(core) => {
                core.process_block(input, output);
                Ok(AES_BLOCK_SIZE)
            }
            CipherBackend::Rsa(core) => core.process(&self.key, input, output),
        };
        if let Err(e) = &result {
            log::warn!("{} rejected input: {e}", self.algorithm);
        }
        result
    }

    fn write_scattered(
        &mut self,
        buffers: &[&[u8]],
        out: &mut dyn Write,
        mut digest: Option<&mut Digest>,
    ) -> Result<usize> {
        let mut block_out = Zeroizing::new(vec![0u8; self.output_block_size]);
        let mut run = CipherRun::new(buffers, self.input_block_size);
        let mut written = 0;

        // Input reaches the digest only once the cipher has accepted it.
        while let Some(block) = run.next_block() {
            let n = self.step(block, &mut block_out)?;
            if let Some(d) = digest.as_deref_mut() {
                d.update(block)?;
            }
            out.write_all(&block_out[..n])?;
            written += n;
        }

        let tail = run.tail();
        let n = self.finish(tail, &mut block_out)?;
        if let Some(d) = digest.as_deref_mut() {
            d.update(tail)?;
        }
        out.write_all(&block_out[..n])?;
        written += n;

        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// Cipher
// ---------------------------------------------------------------------------

/// A keyed cipher instance.
///
/// Not `Send`: deferred operations share its state through `Rc`.
pub struct Cipher {
    core: Rc<RefCell<CipherCore>>,
    operations: OperationQueue,
}

impl Cipher {
    /// Bind `algorithm` to `key`.
    ///
    /// # Errors
    ///
    /// `CryptoError::UnsupportedKey` if the algorithm cannot use this kind
    /// of key.
    pub fn new(algorithm: CipherAlgorithm, key: Arc<Key>) -> Result<Self> {
        let kind = key.kind();
        if !algorithm.supports_key(kind) {
            return Err(CryptoError::UnsupportedKey {
                cipher: algorithm.name().to_string(),
                key: kind.to_string(),
            });
        }

        let (backend, input_block_size, output_block_size) = match algorithm.aes_mode() {
            Some(mode) => {
                let aes_key = key.as_aes().ok_or_else(|| CryptoError::UnsupportedKey {
                    cipher: algorithm.name().to_string(),
                    key: kind.to_string(),
                })?;
                let core = AesCore::new(aes_key, mode, algorithm.direction())?;
                (CipherBackend::Aes(core), AES_BLOCK_SIZE, AES_BLOCK_SIZE)
            }
            None => {
                let core = RsaCore::new(algorithm.direction(), &key)?;
                let sizes = (core.input_block_size(), core.output_block_size());
                (CipherBackend::Rsa(core), sizes.0, sizes.1)
            }
        };

        log::debug!(
            "new {algorithm} cipher with {kind} key ({input_block_size} -> {output_block_size})"
        );

        Ok(Self {
            core: Rc::new(RefCell::new(CipherCore {
                algorithm,
                key,
                input_block_size,
                output_block_size,
                padding: None,
                backend,
            })),
            operations: OperationQueue::new(),
        })
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.core.borrow().algorithm
    }

    pub fn name(&self) -> &'static str {
        self.algorithm().name()
    }

    pub fn direction(&self) -> Direction {
        self.algorithm().direction()
    }

    pub fn is_symmetric(&self) -> bool {
        self.algorithm().is_symmetric()
    }

    /// The bound key, shared with every clone of this cipher.
    pub fn key(&self) -> Arc<Key> {
        self.core.borrow().key.clone()
    }

    pub fn input_block_size(&self) -> usize {
        self.core.borrow().input_block_size
    }

    pub fn output_block_size(&self) -> usize {
        self.core.borrow().output_block_size
    }

    /// Override the padding `finish` applies to a short final block.
    /// `None` goes back to the default.
    ///
    /// # Errors
    ///
    /// `CryptoError::PaddingUnsupported` for ciphers whose scheme pads
    /// internally (RSA).
    pub fn set_padding_func(&mut self, padding: Option<PaddingFunc>) -> Result<()> {
        self.replace_padding(padding.map(|f| Rc::new(f) as Rc<dyn Fn(&mut [u8], usize)>))
    }

    /// Like [`Cipher::set_padding_func`] with a closure, for padding that
    /// needs captured state (a foreign callback, a fixed fill pattern).
    pub fn set_padding_with<F>(&mut self, padding: F) -> Result<()>
    where
        F: Fn(&mut [u8], usize) + 'static,
    {
        self.replace_padding(Some(Rc::new(padding)))
    }

    fn replace_padding(&mut self, padding: Option<Rc<dyn Fn(&mut [u8], usize)>>) -> Result<()> {
        let mut core = self.core.borrow_mut();
        if core.algorithm.info().default_padding.is_none() {
            return Err(CryptoError::PaddingUnsupported(core.algorithm.name().to_string()));
        }
        core.padding = padding;
        Ok(())
    }

    // -- Block operations ---------------------------------------------------

    /// Transform exactly one input block. Returns the bytes written.
    pub fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.core.borrow_mut().step(input, output)
    }

    /// Transform the final, possibly short, block. An empty tail writes
    /// nothing.
    pub fn finish(&mut self, tail: &[u8], output: &mut [u8]) -> Result<usize> {
        self.core.borrow_mut().finish(tail, output)
    }

    // -- Bulk helpers -------------------------------------------------------

    /// Run `data` through the cipher and return the output.
    pub fn process(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.process_scattered(&[data])
    }

    /// Like [`Cipher::process`] over several buffers taken as one stream.
    pub fn process_scattered(&mut self, buffers: &[&[u8]]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_data_scattered(buffers, &mut out, None)?;
        Ok(out)
    }

    /// Run `data` through the cipher into `out`, optionally hashing the
    /// input along the way. Returns the number of bytes written.
    pub fn write_data(
        &mut self,
        data: &[u8],
        out: &mut dyn Write,
        digest: Option<&mut Digest>,
    ) -> Result<usize> {
        self.write_data_scattered(&[data], out, digest)
    }

    pub fn write_data_scattered(
        &mut self,
        buffers: &[&[u8]],
        out: &mut dyn Write,
        digest: Option<&mut Digest>,
    ) -> Result<usize> {
        self.core.borrow_mut().write_scattered(buffers, out, digest)
    }

    // -- Deferred operations ------------------------------------------------

    /// Queue a [`Cipher::step`]. `out` is grown to the output block size if
    /// needed when the operation runs.
    ///
    /// # Errors
    ///
    /// `CryptoError::BlockSize` if `input` is not exactly one input block;
    /// nothing is queued in that case.
    pub fn step_async<F>(
        &self,
        scheduler: &dyn Scheduler,
        input: &[u8],
        out: SharedBlock,
        callback: F,
    ) -> Result<OperationHandle>
    where
        F: FnOnce(Result<usize>) + 'static,
    {
        let expected = self.input_block_size();
        if input.len() != expected {
            return Err(CryptoError::BlockSize {
                expected,
                actual: input.len(),
            });
        }
        let input = Zeroizing::new(input.to_vec());
        let core = Rc::downgrade(&self.core);

        let handle = self.operations.schedule(
            scheduler,
            Box::new(move || {
                let Some(result) = with_block(&core, &out, |c, block| c.step(&input, block)) else {
                    return;
                };
                callback(result);
            }),
        );
        log::debug!("scheduled step {}", handle.id());
        Ok(handle)
    }

    /// Queue a [`Cipher::finish`]. With `out` set to `None` the output is
    /// computed and discarded.
    ///
    /// # Errors
    ///
    /// `CryptoError::BlockSize` if `tail` is longer than one input block.
    pub fn finish_async<F>(
        &self,
        scheduler: &dyn Scheduler,
        tail: &[u8],
        out: Option<SharedBlock>,
        callback: F,
    ) -> Result<OperationHandle>
    where
        F: FnOnce(Result<usize>) + 'static,
    {
        let limit = self.input_block_size();
        if tail.len() > limit {
            return Err(CryptoError::BlockSize {
                expected: limit,
                actual: tail.len(),
            });
        }
        let tail = Zeroizing::new(tail.to_vec());
        let core = Rc::downgrade(&self.core);
        let out = out.unwrap_or_default();

        let handle = self.operations.schedule(
            scheduler,
            Box::new(move || {
                let Some(result) = with_block(&core, &out, |c, block| c.finish(&tail, block)) else {
                    return;
                };
                callback(result);
            }),
        );
        log::debug!("scheduled finish {}", handle.id());
        Ok(handle)
    }

    /// Queue a [`Cipher::write_data`]. The digest, if any, is updated with
    /// the input bytes when the operation runs.
    ///
    /// # Errors
    ///
    /// `CryptoError::MissingOutput` when `out` is `None`; nothing is queued.
    pub fn write_data_async<F>(
        &self,
        scheduler: &dyn Scheduler,
        data: &[u8],
        out: Option<SharedOutput>,
        digest: Option<SharedDigest>,
        callback: F,
    ) -> Result<OperationHandle>
    where
        F: FnOnce(Result<usize>) + 'static,
    {
        let out = out.ok_or(CryptoError::MissingOutput)?;
        let len = data.len();
        let data = Zeroizing::new(data.to_vec());
        let core = Rc::downgrade(&self.core);

        let handle = self.operations.schedule(
            scheduler,
            Box::new(move || {
                let Some(core) = core.upgrade() else {
                    return;
                };
                let result = {
                    let mut sink = out.borrow_mut();
                    let mut digest = digest.as_ref().map(|d| d.borrow_mut());
                    let mut core = core.borrow_mut();
                    core.write_scattered(&[&data[..]], &mut *sink, digest.as_deref_mut())
                };
                callback(result);
            }),
        );
        log::debug!("scheduled write of {len} bytes {}", handle.id());
        Ok(handle)
    }

    /// Cancel one queued operation. False if it already ran or was cancelled.
    pub fn cancel(&self, id: OperationId) -> bool {
        self.operations.cancel(id)
    }

    /// Cancel every queued operation. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        self.operations.cancel_all()
    }

    pub fn pending_operations(&self) -> usize {
        self.operations.len()
    }
}

/// Run `op` against the live core with `out` sized for one output block.
/// `None` if the cipher has been dropped.
fn with_block<T>(
    core: &Weak<RefCell<CipherCore>>,
    out: &SharedBlock,
    op: impl FnOnce(&mut CipherCore, &mut [u8]) -> T,
) -> Option<T> {
    let core = core.upgrade()?;
    let mut core = core.borrow_mut();
    let mut block = out.borrow_mut();
    if block.len() < core.output_block_size {
        block.resize(core.output_block_size, 0);
    }
    Some(op(&mut *core, &mut block[..]))
}

impl Clone for Cipher {
    /// Copies the chaining state and padding, shares the key, and starts
    /// with no queued operations.
    fn clone(&self) -> Self {
        Self {
            core: Rc::new(RefCell::new(self.core.borrow().clone())),
            operations: OperationQueue::new(),
        }
    }
}

impl Drop for Cipher {
    fn drop(&mut self) {
        let cancelled = self.operations.cancel_all();
        if cancelled > 0 {
            log::warn!(
                "{} dropped with {cancelled} pending operation(s); cancelled",
                self.core.borrow().algorithm
            );
        }
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Cipher")
            .field("algorithm", &core.algorithm)
            .field("key", &core.key.kind())
            .field("input_block_size", &core.input_block_size)
            .field("output_block_size", &core.output_block_size)
            .field("pending", &self.operations.len())
            .finish()
    }
}

/// One-shot: build a cipher, run `data` through it, return the output.
pub fn cipher_bytes(algorithm: CipherAlgorithm, key: Arc<Key>, data: &[u8]) -> Result<Vec<u8>> {
    Cipher::new(algorithm, key)?.process(data)
}
