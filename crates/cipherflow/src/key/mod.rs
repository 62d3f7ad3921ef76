//! Keys consumed by the cipher framework.
//!
//! Parsing and serialization are out of scope. A key only needs to say
//! what kind it is (which cipher variants it can drive) and what primitive
//! size it implies (AES block size, RSA modulus size).
//!
//! Keys are immutable once built and are shared between ciphers as
//! `Arc<Key>`.

pub mod aes;

use std::str::FromStr;

use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};

pub use self::aes::AesKey;

/// Size of the AES initialization vector carried by an [`AesKey`].
pub const AES_IV_SIZE: usize = 16;

/// Modulus size used when callers do not pick one.
pub const DEFAULT_RSA_BITS: usize = 2048;

// ---------------------------------------------------------------------------
// Key kind
// ---------------------------------------------------------------------------

/// The capability-relevant type of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyKind {
    Aes128,
    Aes192,
    Aes256,
    RsaPublic,
    RsaPrivate,
}

impl KeyKind {
    pub const ALL: [KeyKind; 5] = [
        Self::Aes128,
        Self::Aes192,
        Self::Aes256,
        Self::RsaPublic,
        Self::RsaPrivate,
    ];

    /// Return a stable string tag.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Aes128 => "aes128",
            Self::Aes192 => "aes192",
            Self::Aes256 => "aes256",
            Self::RsaPublic => "rsa-public",
            Self::RsaPrivate => "rsa-private",
        }
    }

    /// Whether keys of this kind drive symmetric ciphers.
    pub fn is_symmetric(&self) -> bool {
        self.aes_key_size().is_some()
    }

    /// Raw key length in bytes for AES kinds.
    pub fn aes_key_size(&self) -> Option<usize> {
        match self {
            Self::Aes128 => Some(16),
            Self::Aes192 => Some(24),
            Self::Aes256 => Some(32),
            Self::RsaPublic | Self::RsaPrivate => None,
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for KeyKind {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| CryptoError::UnknownAlgorithm(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// A typed key.
pub enum Key {
    Aes(AesKey),
    RsaPublic(RsaPublicKey),
    RsaPrivate(RsaPrivateKey),
}

impl Key {
    /// Build an AES key from `key || iv` bytes (IV optional).
    pub fn aes_from_bytes(kind: KeyKind, bytes: &[u8]) -> Result<Self> {
        AesKey::from_bytes(kind, bytes).map(Self::Aes)
    }

    /// Generate a random AES key of the given kind.
    pub fn generate_aes(kind: KeyKind) -> Result<Self> {
        AesKey::generate(kind).map(Self::Aes)
    }

    /// Generate an RSA private key with a modulus of `bits` bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map(Self::RsaPrivate)
            .map_err(|e| CryptoError::InvalidKey(format!("RSA key generation: {e}")))
    }

    /// Return the key kind.
    pub fn kind(&self) -> KeyKind {
        match self {
            Self::Aes(key) => key.kind(),
            Self::RsaPublic(_) => KeyKind::RsaPublic,
            Self::RsaPrivate(_) => KeyKind::RsaPrivate,
        }
    }

    /// Return the public half of an RSA key. AES keys have none.
    pub fn public_key(&self) -> Option<Key> {
        match self {
            Self::Aes(_) => None,
            Self::RsaPublic(key) => Some(Self::RsaPublic(key.clone())),
            Self::RsaPrivate(key) => Some(Self::RsaPublic(key.to_public_key())),
        }
    }

    /// Raw primitive size implied by the key: the AES block size or the RSA
    /// modulus size in bytes.
    pub fn primitive_size(&self) -> usize {
        match self {
            Self::Aes(_) => crate::cipher::AES_BLOCK_SIZE,
            Self::RsaPublic(key) => key.size(),
            Self::RsaPrivate(key) => key.size(),
        }
    }

    pub fn as_aes(&self) -> Option<&AesKey> {
        match self {
            Self::Aes(key) => Some(key),
            _ => None,
        }
    }
}

impl From<AesKey> for Key {
    fn from(key: AesKey) -> Self {
        Self::Aes(key)
    }
}

impl From<RsaPublicKey> for Key {
    fn from(key: RsaPublicKey) -> Self {
        Self::RsaPublic(key)
    }
}

impl From<RsaPrivateKey> for Key {
    fn from(key: RsaPrivateKey) -> Self {
        Self::RsaPrivate(key)
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("kind", &self.kind())
            .field("primitive_size", &self.primitive_size())
            .finish_non_exhaustive()
    }
}
