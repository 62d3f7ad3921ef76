//! RSA backend.
//!
//! The scheme follows from the cipher direction and the key half:
//!
//! | direction | key     | scheme                        |
//! |-----------|---------|-------------------------------|
//! | encrypt   | public  | OAEP with SHA-1               |
//! | encrypt   | private | PKCS#1 v1.5 type 1            |
//! | decrypt   | private | OAEP with SHA-1               |
//! | decrypt   | public  | PKCS#1 v1.5 type 1 (recover)  |
//!
//! Private-key encryption is an unprefixed PKCS#1 v1.5 signature. Recovering
//! the message with the public key is a raw modular exponentiation followed
//! by type-1 unpadding, which the `rsa` crate does not expose directly.

use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Oaep, Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;

use super::algorithm::Direction;
use crate::error::{CryptoError, Result};
use crate::key::Key;

/// OAEP overhead with SHA-1: two hash lengths plus two bytes.
pub const RSA_OAEP_PADDING_SIZE: usize = 2 * 20 + 2;

/// Minimum PKCS#1 v1.5 padding. One more byte is reserved on top of this.
pub const RSA_PKCS1_PADDING_SIZE: usize = 11;

const MIN_PKCS1_FILL: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RsaScheme {
    OaepEncrypt,
    Pkcs1Encrypt,
    OaepDecrypt,
    Pkcs1Decrypt,
}

impl RsaScheme {
    fn overhead(&self) -> usize {
        match self {
            Self::OaepEncrypt | Self::OaepDecrypt => RSA_OAEP_PADDING_SIZE,
            Self::Pkcs1Encrypt | Self::Pkcs1Decrypt => RSA_PKCS1_PADDING_SIZE + 1,
        }
    }
}

/// Scheme plus derived block sizes. Key material stays with the cipher.
#[derive(Debug, Clone)]
pub(crate) struct RsaCore {
    scheme: RsaScheme,
    modulus_size: usize,
}

impl RsaCore {
    pub(crate) fn new(direction: Direction, key: &Key) -> Result<Self> {
        let (scheme, modulus_size) = match (direction, key) {
            (Direction::Encrypt, Key::RsaPublic(k)) => (RsaScheme::OaepEncrypt, k.size()),
            (Direction::Encrypt, Key::RsaPrivate(k)) => (RsaScheme::Pkcs1Encrypt, k.size()),
            (Direction::Decrypt, Key::RsaPrivate(k)) => (RsaScheme::OaepDecrypt, k.size()),
            (Direction::Decrypt, Key::RsaPublic(k)) => (RsaScheme::Pkcs1Decrypt, k.size()),
            (_, other) => {
                return Err(CryptoError::InvalidKey(format!(
                    "{} key cannot drive RSA",
                    other.kind()
                )))
            }
        };
        if modulus_size <= scheme.overhead() {
            return Err(CryptoError::InvalidKey(format!(
                "RSA modulus of {modulus_size} bytes is too small"
            )));
        }
        Ok(Self {
            scheme,
            modulus_size,
        })
    }

    fn is_encrypt(&self) -> bool {
        matches!(self.scheme, RsaScheme::OaepEncrypt | RsaScheme::Pkcs1Encrypt)
    }

    pub(crate) fn input_block_size(&self) -> usize {
        if self.is_encrypt() {
            self.modulus_size - self.scheme.overhead()
        } else {
            self.modulus_size
        }
    }

    pub(crate) fn output_block_size(&self) -> usize {
        if self.is_encrypt() {
            self.modulus_size
        } else {
            self.modulus_size - self.scheme.overhead()
        }
    }

    /// Run one RSA operation and write the result to the front of `output`.
    ///
    /// Encryption accepts any message up to the input block size. Decryption
    /// expects a whole modulus-sized block.
    pub(crate) fn process(&self, key: &Key, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let result = match (self.scheme, key) {
            (RsaScheme::OaepEncrypt, Key::RsaPublic(k)) => {
                k.encrypt(&mut rand::thread_rng(), Oaep::new::<Sha1>(), input)
            }
            (RsaScheme::Pkcs1Encrypt, Key::RsaPrivate(k)) => {
                k.sign(Pkcs1v15Sign::new_unprefixed(), input)
            }
            (RsaScheme::OaepDecrypt, Key::RsaPrivate(k)) => k.decrypt(Oaep::new::<Sha1>(), input),
            (RsaScheme::Pkcs1Decrypt, Key::RsaPublic(k)) => {
                return recover_pkcs1(k, input).and_then(|m| copy_out(&m, output));
            }
            _ => {
                return Err(CryptoError::InvalidKey(format!(
                    "{} key does not match {:?}",
                    key.kind(),
                    self.scheme
                )))
            }
        };
        let bytes = result.map_err(|e| CryptoError::Backend(format!("RSA: {e}")))?;
        copy_out(&bytes, output)
    }
}

fn copy_out(bytes: &[u8], output: &mut [u8]) -> Result<usize> {
    if output.len() < bytes.len() {
        return Err(CryptoError::BufferTooSmall {
            needed: bytes.len(),
            actual: output.len(),
        });
    }
    output[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}

/// Public-key recovery of a message signed with an unprefixed PKCS#1 v1.5
/// scheme.
fn recover_pkcs1(key: &RsaPublicKey, block: &[u8]) -> Result<Vec<u8>> {
    let k = key.size();
    if block.len() != k {
        return Err(CryptoError::BlockSize {
            expected: k,
            actual: block.len(),
        });
    }
    let c = BigUint::from_bytes_be(block);
    if &c >= key.n() {
        return Err(CryptoError::Backend("RSA: ciphertext out of range".into()));
    }
    let m = c.modpow(key.e(), key.n()).to_bytes_be();

    let mut em = vec![0u8; k];
    em[k - m.len()..].copy_from_slice(&m);
    unpad_type1(&em)
}

/// Strip `00 01 FF..FF 00` from an encoded message.
fn unpad_type1(em: &[u8]) -> Result<Vec<u8>> {
    let malformed = || CryptoError::Backend("RSA: malformed PKCS#1 type 1 block".into());
    if em.len() < RSA_PKCS1_PADDING_SIZE || em[0] != 0x00 || em[1] != 0x01 {
        return Err(malformed());
    }
    let fill = em[2..].iter().take_while(|&&b| b == 0xff).count();
    let sep = 2 + fill;
    if fill < MIN_PKCS1_FILL || sep >= em.len() || em[sep] != 0x00 {
        return Err(malformed());
    }
    Ok(em[sep + 1..].to_vec())
}
