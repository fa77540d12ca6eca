//! Growable big-endian output buffer with back-patching.

use crate::error::BufferError;
use bytes::{BufMut, Bytes, BytesMut};

/// A write cursor that appends big-endian values to a growable buffer
/// and can overwrite a previously written 16-bit field in place.
///
/// Back-patching is how length fields get their final value: the caller
/// writes a placeholder, encodes the dependent bytes, then patches the
/// placeholder once the true size is known. Patching never disturbs the
/// current write position.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Bytes written so far. Also the position the next write lands at.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.put_u16(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64(v);
    }

    pub fn put_slice(&mut self, v: &[u8]) {
        self.buf.put_slice(v);
    }

    /// Writes `n` zero bytes.
    pub fn put_zeros(&mut self, n: usize) {
        self.buf.put_bytes(0, n);
    }

    /// Overwrites the two bytes at `pos` with `v` in big-endian order.
    ///
    /// The patched range must already have been written.
    pub fn patch_u16(&mut self, pos: usize, v: u16) -> Result<(), BufferError> {
        if pos + 2 > self.buf.len() {
            return Err(BufferError::PatchOutOfRange {
                pos,
                written: self.buf.len(),
            });
        }
        self.buf[pos..pos + 2].copy_from_slice(&v.to_be_bytes());
        Ok(())
    }

    /// View of everything written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the underlying buffer.
    pub fn into_inner(self) -> BytesMut {
        self.buf
    }

    /// Consumes the writer, returning the written bytes frozen.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}
