//! Fixed-size block iteration over scattered input.
//!
//! A [`CipherRun`] walks a list of byte slices as if they were one
//! contiguous buffer and hands out `block_size` chunks. A chunk that lies
//! inside a single slice is borrowed as is; a chunk that straddles slice
//! boundaries is gathered into a staging buffer that is wiped on drop.

use zeroize::Zeroizing;

/// Block sequence over a set of input buffers, valid for one bulk call.
pub struct CipherRun<'a> {
    buffers: &'a [&'a [u8]],
    current: usize,
    offset: usize,
    bytes_left: usize,
    block_size: usize,
    staging: Zeroizing<Vec<u8>>,
}

impl<'a> CipherRun<'a> {
    pub fn new(buffers: &'a [&'a [u8]], block_size: usize) -> Self {
        let bytes_left = buffers.iter().map(|b| b.len()).sum();
        let mut run = Self {
            buffers,
            current: 0,
            offset: 0,
            bytes_left,
            block_size,
            staging: Zeroizing::new(vec![0u8; block_size]),
        };
        run.skip_exhausted();
        run
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Bytes not yet handed out.
    pub fn bytes_left(&self) -> usize {
        self.bytes_left
    }

    /// Next full block, or `None` once fewer than `block_size` bytes remain.
    pub fn next_block(&mut self) -> Option<&[u8]> {
        let size = self.block_size;
        if size == 0 || self.bytes_left < size {
            return None;
        }

        let buf = self.buffers[self.current];
        let start = self.offset;
        if buf.len() - start >= size {
            self.advance(size);
            return Some(&buf[start..start + size]);
        }

        let mut filled = 0;
        while filled < size {
            let buf = self.buffers[self.current];
            let n = (size - filled).min(buf.len() - self.offset);
            self.staging[filled..filled + n].copy_from_slice(&buf[self.offset..self.offset + n]);
            filled += n;
            self.advance(n);
        }
        Some(&self.staging[..size])
    }

    /// Everything that is left, consumed in one go.
    ///
    /// Meant to be called after [`CipherRun::next_block`] returned `None`,
    /// at which point the result is shorter than a block (possibly empty).
    pub fn tail(&mut self) -> &[u8] {
        let len = self.bytes_left;
        if len == 0 {
            return &[];
        }

        let buf = self.buffers[self.current];
        let start = self.offset;
        if buf.len() - start == len {
            self.advance(len);
            return &buf[start..];
        }

        if self.staging.len() < len {
            self.staging.resize(len, 0);
        }
        let mut filled = 0;
        while filled < len {
            let buf = self.buffers[self.current];
            let n = buf.len() - self.offset;
            self.staging[filled..filled + n].copy_from_slice(&buf[self.offset..]);
            filled += n;
            self.advance(n);
        }
        &self.staging[..len]
    }

    fn advance(&mut self, n: usize) {
        self.offset += n;
        self.bytes_left -= n;
        self.skip_exhausted();
    }

    fn skip_exhausted(&mut self) {
        while self.current < self.buffers.len() && self.offset >= self.buffers[self.current].len() {
            self.current += 1;
            self.offset = 0;
        }
    }
}
