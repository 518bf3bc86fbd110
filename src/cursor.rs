//! Position-tracking reader and writer for little-endian account layouts.
//!
//! Every read is bounds-checked against the remaining bytes; a failed read
//! leaves the position where it was.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("needed {needed} bytes at offset {offset}, only {remaining} left")]
pub struct OutOfBounds {
    pub offset: usize,
    pub needed: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    pub fn read_fixed(&mut self, n: usize) -> Result<&'a [u8], OutOfBounds> {
        if n > self.remaining() {
            return Err(OutOfBounds {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), OutOfBounds> {
        self.read_fixed(n).map(|_| ())
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OutOfBounds> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_fixed(N)?);
        Ok(out)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, OutOfBounds> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_i64_le(&mut self) -> Result<i64, OutOfBounds> {
        self.read_array().map(i64::from_le_bytes)
    }

    /// `[len: u32 LE][len bytes]`. The position is restored when the
    /// payload does not fit.
    pub fn read_len_prefixed(&mut self) -> Result<&'a [u8], OutOfBounds> {
        let start = self.pos;
        let len = self.read_u32_le()? as usize;
        self.read_fixed(len).map_err(|e| {
            self.pos = start;
            e
        })
    }
}

#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64_le(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn zero_fill(&mut self, len: usize) {
        if self.buf.len() < len {
            self.buf.resize(len, 0);
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
