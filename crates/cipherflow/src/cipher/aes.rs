//! AES backend: the block primitive plus ECB, CBC, CFB128 and CTR chaining.
//!
//! The `aes` crate supplies the key schedule and single-block transform
//! (its schedules are wiped on drop). Chaining is done here over a 16-byte
//! register seeded from the key's IV: the previous ciphertext block for
//! CBC and CFB, the big-endian counter for CTR.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256, Block};
use zeroize::Zeroize;

use super::algorithm::{AesMode, Direction};
use super::AES_BLOCK_SIZE;
use crate::error::{CryptoError, Result};
use crate::key::{AesKey, KeyKind};

#[derive(Clone)]
enum AesPrimitive {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl AesPrimitive {
    fn new(key: &AesKey) -> Result<Self> {
        let bytes = key.key_bytes();
        let invalid = |_| CryptoError::InvalidKey(format!("{} key schedule", key.kind()));
        match key.kind() {
            KeyKind::Aes128 => Aes128::new_from_slice(bytes).map(Self::Aes128).map_err(invalid),
            KeyKind::Aes192 => Aes192::new_from_slice(bytes).map(Self::Aes192).map_err(invalid),
            KeyKind::Aes256 => Aes256::new_from_slice(bytes).map(Self::Aes256).map_err(invalid),
            other => Err(CryptoError::InvalidKey(format!("{other} is not an AES key kind"))),
        }
    }

    fn encrypt(&self, block: &mut [u8; AES_BLOCK_SIZE]) {
        let block = Block::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt(&self, block: &mut [u8; AES_BLOCK_SIZE]) {
        let block = Block::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.decrypt_block(block),
            Self::Aes192(c) => c.decrypt_block(block),
            Self::Aes256(c) => c.decrypt_block(block),
        }
    }
}

/// Keyed AES state for one cipher object.
#[derive(Clone)]
pub(crate) struct AesCore {
    primitive: AesPrimitive,
    mode: AesMode,
    direction: Direction,
    register: [u8; AES_BLOCK_SIZE],
}

impl AesCore {
    pub(crate) fn new(key: &AesKey, mode: AesMode, direction: Direction) -> Result<Self> {
        Ok(Self {
            primitive: AesPrimitive::new(key)?,
            mode,
            direction,
            register: *key.iv(),
        })
    }

    /// Transform exactly one block. `input` and `output` must both be
    /// `AES_BLOCK_SIZE` bytes.
    pub(crate) fn process_block(&mut self, input: &[u8], output: &mut [u8]) {
        let mut block = [0u8; AES_BLOCK_SIZE];
        block.copy_from_slice(input);

        match (self.mode, self.direction) {
            (AesMode::Ecb, Direction::Encrypt) => self.primitive.encrypt(&mut block),
            (AesMode::Ecb, Direction::Decrypt) => self.primitive.decrypt(&mut block),
            (AesMode::Cbc, Direction::Encrypt) => {
                xor_in_place(&mut block, &self.register);
                self.primitive.encrypt(&mut block);
                self.register = block;
            }
            (AesMode::Cbc, Direction::Decrypt) => {
                let chained = block;
                self.primitive.decrypt(&mut block);
                xor_in_place(&mut block, &self.register);
                self.register = chained;
            }
            (AesMode::Cfb, direction) => {
                let mut stream = self.register;
                self.primitive.encrypt(&mut stream);
                let chained = block;
                xor_in_place(&mut block, &stream);
                self.register = match direction {
                    Direction::Encrypt => block,
                    Direction::Decrypt => chained,
                };
                stream.zeroize();
            }
            (AesMode::Ctr, _) => {
                let mut stream = self.register;
                self.primitive.encrypt(&mut stream);
                xor_in_place(&mut block, &stream);
                increment_counter(&mut self.register);
                stream.zeroize();
            }
        }

        output[..AES_BLOCK_SIZE].copy_from_slice(&block);
        block.zeroize();
    }
}

impl Drop for AesCore {
    fn drop(&mut self) {
        self.register.zeroize();
    }
}

fn xor_in_place(block: &mut [u8; AES_BLOCK_SIZE], other: &[u8; AES_BLOCK_SIZE]) {
    for (b, o) in block.iter_mut().zip(other) {
        *b ^= o;
    }
}

/// 128-bit big-endian increment, wrapping at the top.
fn increment_counter(counter: &mut [u8; AES_BLOCK_SIZE]) {
    for byte in counter.iter_mut().rev() {
        let (next, carry) = byte.overflowing_add(1);
        *byte = next;
        if !carry {
            break;
        }
    }
}
