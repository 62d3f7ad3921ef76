//! AES key material.
//!
//! An AES key carries the raw key bytes plus the initialization vector the
//! chaining modes start from. Both are zeroized on drop.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{KeyKind, AES_IV_SIZE};
use crate::error::{CryptoError, Result};
use crate::random::{fill_random, random_iv};

/// Symmetric AES key plus IV.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesKey {
    #[zeroize(skip)]
    kind: KeyKind,
    key: Vec<u8>,
    iv: [u8; AES_IV_SIZE],
}

impl AesKey {
    /// Build a key from raw key bytes and an explicit IV.
    pub fn new(kind: KeyKind, key: &[u8], iv: [u8; AES_IV_SIZE]) -> Result<Self> {
        let expected = kind
            .aes_key_size()
            .ok_or_else(|| CryptoError::InvalidKey(format!("{kind} is not an AES key kind")))?;
        if key.len() != expected {
            return Err(CryptoError::InvalidKey(format!(
                "{kind} key must be {expected} bytes, got {}",
                key.len()
            )));
        }
        Ok(Self {
            kind,
            key: key.to_vec(),
            iv,
        })
    }

    /// Parse `key || iv` bytes. The IV may be omitted, in which case it is
    /// all zeros (ECB and test fixtures use this form).
    pub fn from_bytes(kind: KeyKind, bytes: &[u8]) -> Result<Self> {
        let key_size = kind
            .aes_key_size()
            .ok_or_else(|| CryptoError::InvalidKey(format!("{kind} is not an AES key kind")))?;
        let mut iv = [0u8; AES_IV_SIZE];
        if bytes.len() == key_size + AES_IV_SIZE {
            iv.copy_from_slice(&bytes[key_size..]);
        } else if bytes.len() != key_size {
            return Err(CryptoError::InvalidKey(format!(
                "{kind} key material must be {key_size} or {} bytes, got {}",
                key_size + AES_IV_SIZE,
                bytes.len()
            )));
        }
        let key = Self::new(kind, &bytes[..key_size], iv);
        iv.zeroize();
        key
    }

    /// Generate a random key and IV.
    pub fn generate(kind: KeyKind) -> Result<Self> {
        let key_size = kind
            .aes_key_size()
            .ok_or_else(|| CryptoError::InvalidKey(format!("{kind} is not an AES key kind")))?;
        let mut key = vec![0u8; key_size];
        fill_random(&mut key);
        let result = Self::new(kind, &key, random_iv());
        key.zeroize();
        result
    }

    /// Return the key kind (selects the AES round count).
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Return the raw key bytes.
    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Return the initialization vector.
    pub fn iv(&self) -> &[u8; AES_IV_SIZE] {
        &self.iv
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesKey")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
