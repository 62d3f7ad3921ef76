//! Tail padding for block ciphers.

use crate::random::fill_random;

/// Fills the unused part of a final block.
///
/// Called with the whole block and the number of leading bytes that hold
/// real data. The function must only touch `block[filled..]`.
pub type PaddingFunc = fn(block: &mut [u8], filled: usize);

/// Default padding: random bytes after the data.
pub fn random_padding(block: &mut [u8], filled: usize) {
    if filled < block.len() {
        fill_random(&mut block[filled..]);
    }
}

/// Zero bytes after the data.
pub fn zero_padding(block: &mut [u8], filled: usize) {
    if filled < block.len() {
        block[filled..].fill(0);
    }
}
