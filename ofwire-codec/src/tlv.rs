//! TLV property primitives.
//!
//! Extensible bodies carry self-describing properties:
//!
//! ```text
//! +-----------+---------+------------------+-------------------+
//! | type code | length  | payload          | zero pad          |
//! | 2 bytes   | 2 bytes | length - 4 bytes | to 8-byte boundary|
//! +-----------+---------+------------------+-------------------+
//! ```
//!
//! `length` covers the 4-byte property header plus the payload and
//! excludes the trailing pad. A parent structure declares its own total
//! length; its property list must consume exactly that range.

use crate::align;
use crate::error::CodecError;
use ofwire_buffer::{WireReader, WireWriter};

/// Size of the property type/length header.
pub const PROPERTY_HEADER_SIZE: usize = 4;

/// One property as found on the wire: its type code and a reader
/// bounded to exactly its payload.
#[derive(Debug)]
pub struct RawProperty<'a> {
    pub type_code: u16,
    pub payload: WireReader<'a>,
}

/// Iterates the properties of one parent structure.
///
/// Construction carves the parent-declared byte range off the caller's
/// reader; iteration ends cleanly only when that range is consumed
/// exactly. Stopping short or running past it is
/// [`CodecError::TruncatedOrOverrunProperty`].
#[derive(Debug)]
pub struct PropertyReader<'a> {
    inner: WireReader<'a>,
    context: &'static str,
    declared: usize,
}

impl<'a> PropertyReader<'a> {
    /// Bounds a property list to `declared` bytes of `parent`.
    pub fn new(
        parent: &mut WireReader<'a>,
        declared: usize,
        context: &'static str,
    ) -> Result<Self, CodecError> {
        let available = parent.remaining();
        let inner = parent
            .sub_reader(declared)
            .map_err(|_| CodecError::TruncatedOrOverrunProperty {
                context,
                expected: declared,
                actual: available,
            })?;
        Ok(Self {
            inner,
            context,
            declared,
        })
    }

    fn truncated(&self) -> CodecError {
        CodecError::TruncatedOrOverrunProperty {
            context: self.context,
            expected: self.declared,
            actual: self.inner.position(),
        }
    }

    /// Reads the next property header and carves out its payload,
    /// skipping the trailing pad up to the next boundary or the end of
    /// the parent range.
    ///
    /// Returns `None` exactly when the parent range is fully consumed.
    pub fn next(&mut self) -> Result<Option<RawProperty<'a>>, CodecError> {
        if self.inner.is_empty() {
            return Ok(None);
        }
        if self.inner.remaining() < PROPERTY_HEADER_SIZE {
            return Err(self.truncated());
        }

        let type_code = self.inner.read_u16()?;
        let length = self.inner.read_u16()? as usize;
        if length < PROPERTY_HEADER_SIZE {
            return Err(self.truncated());
        }

        let payload = self
            .inner
            .sub_reader(length - PROPERTY_HEADER_SIZE)
            .map_err(|_| self.truncated())?;

        let pad = align::padding_for(length).min(self.inner.remaining());
        self.inner.skip(pad)?;

        Ok(Some(RawProperty { type_code, payload }))
    }
}

/// Writes one property: header with a length placeholder, payload via
/// the closure, back-patched length (header + payload, pad excluded),
/// then zero pad to the 8-byte boundary.
pub fn write_property<P>(w: &mut WireWriter, type_code: u16, payload: P) -> Result<(), CodecError>
where
    P: FnOnce(&mut WireWriter) -> Result<(), CodecError>,
{
    let start = w.position();
    w.put_u16(type_code);
    let len_pos = w.position();
    w.put_u16(0);
    payload(w)?;

    let length = w.position() - start;
    if length > u16::MAX as usize {
        return Err(CodecError::bad_record(format!(
            "property {type_code:#06x} payload of {length} bytes exceeds the 16-bit length field"
        )));
    }
    w.patch_u16(len_pos, length as u16)?;
    align::write_padding(w, length);
    Ok(())
}

/// Bytes a property with `payload_len` payload bytes occupies on the
/// wire, pad included. The pre-flight counterpart of [`write_property`].
pub fn property_len(payload_len: usize) -> usize {
    align::padded_len(PROPERTY_HEADER_SIZE + payload_len)
}
