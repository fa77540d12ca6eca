//! Padding to alignment boundaries.
//!
//! Every padded structure in the protocol goes through these routines,
//! for pre-flight length accounting and for byte emission alike. The
//! two uses must never diverge, so there is exactly one place that
//! computes a pad width.

use ofwire_buffer::{BufferError, WireReader, WireWriter};

/// Alignment of TLV properties and padded structures.
pub const ALIGNMENT: usize = 8;

/// Zero bytes needed after `len` bytes to reach the next 8-byte
/// boundary. Zero when already aligned.
pub fn padding_for(len: usize) -> usize {
    (ALIGNMENT - (len % ALIGNMENT)) % ALIGNMENT
}

/// `len` rounded up to the next 8-byte boundary.
pub fn padded_len(len: usize) -> usize {
    len + padding_for(len)
}

/// Emits the pad bytes a structure of `len` bytes needs.
pub fn write_padding(w: &mut WireWriter, len: usize) {
    w.put_zeros(padding_for(len));
}

/// Skips the pad bytes a structure of `len` bytes was followed by.
pub fn skip_padding(r: &mut WireReader<'_>, len: usize) -> Result<(), BufferError> {
    r.skip(padding_for(len))
}
