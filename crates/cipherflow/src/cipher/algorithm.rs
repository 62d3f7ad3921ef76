//! Cipher algorithm identities and their static descriptors.
//!
//! Every supported (algorithm, mode, direction) triple is one variant of
//! [`CipherAlgorithm`]. The per-variant metadata lives in a compile-time
//! table, so looking up a cipher never touches shared mutable state.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::padding::{random_padding, PaddingFunc};
use crate::error::{CryptoError, Result};
use crate::key::KeyKind;

/// Whether a cipher transforms plaintext into ciphertext or back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// AES chaining mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AesMode {
    Cbc,
    Cfb,
    Ctr,
    Ecb,
}

/// Static metadata for one cipher variant.
#[derive(Debug)]
pub struct CipherInfo {
    pub name: &'static str,
    pub direction: Direction,
    pub symmetric: bool,
    /// Tail padding applied by `finish` when the caller sets none.
    /// `None` means the cipher does not accept custom padding at all.
    pub default_padding: Option<PaddingFunc>,
}

/// The closed set of cipher variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherAlgorithm {
    AesCbcEncrypt,
    AesCbcDecrypt,
    AesCfbEncrypt,
    AesCfbDecrypt,
    AesCtrEncrypt,
    AesCtrDecrypt,
    AesEcbEncrypt,
    AesEcbDecrypt,
    RsaEncrypt,
    RsaDecrypt,
}

const fn aes(name: &'static str, direction: Direction) -> CipherInfo {
    CipherInfo {
        name,
        direction,
        symmetric: true,
        default_padding: Some(random_padding),
    }
}

const fn rsa(name: &'static str, direction: Direction) -> CipherInfo {
    CipherInfo {
        name,
        direction,
        symmetric: false,
        default_padding: None,
    }
}

static AES_CBC_ENCRYPT: CipherInfo = aes("AES-CBC encrypt", Direction::Encrypt);
static AES_CBC_DECRYPT: CipherInfo = aes("AES-CBC decrypt", Direction::Decrypt);
static AES_CFB_ENCRYPT: CipherInfo = aes("AES-CFB encrypt", Direction::Encrypt);
static AES_CFB_DECRYPT: CipherInfo = aes("AES-CFB decrypt", Direction::Decrypt);
static AES_CTR_ENCRYPT: CipherInfo = aes("AES-CTR encrypt", Direction::Encrypt);
static AES_CTR_DECRYPT: CipherInfo = aes("AES-CTR decrypt", Direction::Decrypt);
static AES_ECB_ENCRYPT: CipherInfo = aes("AES-ECB encrypt", Direction::Encrypt);
static AES_ECB_DECRYPT: CipherInfo = aes("AES-ECB decrypt", Direction::Decrypt);
static RSA_ENCRYPT: CipherInfo = rsa("RSA encrypt", Direction::Encrypt);
static RSA_DECRYPT: CipherInfo = rsa("RSA decrypt", Direction::Decrypt);

impl CipherAlgorithm {
    pub const ALL: [CipherAlgorithm; 10] = [
        Self::AesCbcEncrypt,
        Self::AesCbcDecrypt,
        Self::AesCfbEncrypt,
        Self::AesCfbDecrypt,
        Self::AesCtrEncrypt,
        Self::AesCtrDecrypt,
        Self::AesEcbEncrypt,
        Self::AesEcbDecrypt,
        Self::RsaEncrypt,
        Self::RsaDecrypt,
    ];

    /// Static descriptor for this variant.
    pub fn info(&self) -> &'static CipherInfo {
        match self {
            Self::AesCbcEncrypt => &AES_CBC_ENCRYPT,
            Self::AesCbcDecrypt => &AES_CBC_DECRYPT,
            Self::AesCfbEncrypt => &AES_CFB_ENCRYPT,
            Self::AesCfbDecrypt => &AES_CFB_DECRYPT,
            Self::AesCtrEncrypt => &AES_CTR_ENCRYPT,
            Self::AesCtrDecrypt => &AES_CTR_DECRYPT,
            Self::AesEcbEncrypt => &AES_ECB_ENCRYPT,
            Self::AesEcbDecrypt => &AES_ECB_DECRYPT,
            Self::RsaEncrypt => &RSA_ENCRYPT,
            Self::RsaDecrypt => &RSA_DECRYPT,
        }
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn direction(&self) -> Direction {
        self.info().direction
    }

    pub fn is_symmetric(&self) -> bool {
        self.info().symmetric
    }

    pub fn is_encrypt(&self) -> bool {
        self.direction() == Direction::Encrypt
    }

    /// Chaining mode for AES variants, `None` for RSA.
    pub fn aes_mode(&self) -> Option<AesMode> {
        match self {
            Self::AesCbcEncrypt | Self::AesCbcDecrypt => Some(AesMode::Cbc),
            Self::AesCfbEncrypt | Self::AesCfbDecrypt => Some(AesMode::Cfb),
            Self::AesCtrEncrypt | Self::AesCtrDecrypt => Some(AesMode::Ctr),
            Self::AesEcbEncrypt | Self::AesEcbDecrypt => Some(AesMode::Ecb),
            Self::RsaEncrypt | Self::RsaDecrypt => None,
        }
    }

    /// Whether a key of `kind` can be bound to this cipher.
    pub fn supports_key(&self, kind: KeyKind) -> bool {
        if self.is_symmetric() {
            kind.is_symmetric()
        } else {
            matches!(kind, KeyKind::RsaPublic | KeyKind::RsaPrivate)
        }
    }

    /// Return a stable string tag.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::AesCbcEncrypt => "aes-cbc-encrypt",
            Self::AesCbcDecrypt => "aes-cbc-decrypt",
            Self::AesCfbEncrypt => "aes-cfb-encrypt",
            Self::AesCfbDecrypt => "aes-cfb-decrypt",
            Self::AesCtrEncrypt => "aes-ctr-encrypt",
            Self::AesCtrDecrypt => "aes-ctr-decrypt",
            Self::AesEcbEncrypt => "aes-ecb-encrypt",
            Self::AesEcbDecrypt => "aes-ecb-decrypt",
            Self::RsaEncrypt => "rsa-encrypt",
            Self::RsaDecrypt => "rsa-decrypt",
        }
    }

    /// The variant that undoes this one.
    pub fn inverse(&self) -> CipherAlgorithm {
        match self {
            Self::AesCbcEncrypt => Self::AesCbcDecrypt,
            Self::AesCbcDecrypt => Self::AesCbcEncrypt,
            Self::AesCfbEncrypt => Self::AesCfbDecrypt,
            Self::AesCfbDecrypt => Self::AesCfbEncrypt,
            Self::AesCtrEncrypt => Self::AesCtrDecrypt,
            Self::AesCtrDecrypt => Self::AesCtrEncrypt,
            Self::AesEcbEncrypt => Self::AesEcbDecrypt,
            Self::AesEcbDecrypt => Self::AesEcbEncrypt,
            Self::RsaEncrypt => Self::RsaDecrypt,
            Self::RsaDecrypt => Self::RsaEncrypt,
        }
    }
}

impl std::fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_tag().eq_ignore_ascii_case(s) || alg.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CryptoError::UnknownAlgorithm(s.to_string()))
    }
}
