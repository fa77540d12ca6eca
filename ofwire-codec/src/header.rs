//! Fixed message header.
//!
//! Every message leads with the same 8 bytes:
//!
//! ```text
//! +---------+-----------+---------+------------------+
//! | version | type code | length  | transaction id   |
//! | 1 byte  | 1 byte    | 2 bytes | 4 bytes          |
//! +---------+-----------+---------+------------------+
//! | body ... length - 8 bytes                        |
//! +--------------------------------------------------+
//! ```
//!
//! `length` counts the whole message including the header. On encode it
//! is written as a placeholder and back-patched once the body is done.

use crate::error::CodecError;
use ofwire_buffer::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};

/// Size of the fixed message header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Wire versions this codec speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProtocolVersion {
    /// Early fixed-layout revision.
    V1 = 0x01,
    /// First extensible revision: multipart bodies, hello elements,
    /// experimenter messages.
    V4 = 0x04,
    /// Adds TLV-property-based port descriptions.
    V5 = 0x05,
}

impl ProtocolVersion {
    /// The byte this version puts on the wire.
    pub fn wire_byte(self) -> u8 {
        self as u8
    }

    /// Whether this revision carries extensible bodies (hello elements,
    /// multipart, experimenter messages with a subtype field).
    pub fn is_extensible(self) -> bool {
        !matches!(self, ProtocolVersion::V1)
    }

    /// All versions the codec registers built-ins for.
    pub fn all() -> [ProtocolVersion; 3] {
        [
            ProtocolVersion::V1,
            ProtocolVersion::V4,
            ProtocolVersion::V5,
        ]
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(ProtocolVersion::V1),
            0x04 => Ok(ProtocolVersion::V4),
            0x05 => Ok(ProtocolVersion::V5),
            other => Err(CodecError::UnsupportedVersion(other)),
        }
    }
}

/// A decoded fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: ProtocolVersion,
    pub type_code: u8,
    pub length: u16,
    pub xid: u32,
}

impl MessageHeader {
    /// Reads and validates the fixed header.
    ///
    /// A declared length shorter than the header itself is rejected
    /// here, before any type-specific factory runs.
    pub fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let available = r.remaining();
        if available < HEADER_SIZE {
            return Err(CodecError::MalformedHeader {
                declared: HEADER_SIZE as u16,
                available,
            });
        }

        let version = ProtocolVersion::try_from(r.read_u8()?)?;
        let type_code = r.read_u8()?;
        let length = r.read_u16()?;
        let xid = r.read_u32()?;

        if (length as usize) < HEADER_SIZE {
            return Err(CodecError::MalformedHeader {
                declared: length,
                available,
            });
        }

        Ok(Self {
            version,
            type_code,
            length,
            xid,
        })
    }

    /// Body bytes the declared length leaves after the header.
    pub fn body_len(&self) -> usize {
        self.length as usize - HEADER_SIZE
    }
}

/// Handle to a header whose length field is still a placeholder.
///
/// Returned by [`write_header`]; [`LengthPatch::finish`] overwrites the
/// placeholder with the real total once the body has been written.
#[derive(Debug)]
#[must_use = "the header length stays zero until finish() patches it"]
pub struct LengthPatch {
    start: usize,
    len_pos: usize,
}

/// Writes the fixed header with a zero length placeholder.
pub fn write_header(
    w: &mut WireWriter,
    version: ProtocolVersion,
    type_code: u8,
    xid: u32,
) -> LengthPatch {
    let start = w.position();
    w.put_u8(version.wire_byte());
    w.put_u8(type_code);
    let len_pos = w.position();
    w.put_u16(0);
    w.put_u32(xid);
    LengthPatch { start, len_pos }
}

impl LengthPatch {
    /// Computes the final message length from the current write
    /// position and patches it over the placeholder. Returns the
    /// patched value.
    pub fn finish(self, w: &mut WireWriter) -> Result<u16, CodecError> {
        let total = w.position() - self.start;
        if total > u16::MAX as usize {
            return Err(CodecError::MessageTooLarge { size: total });
        }
        w.patch_u16(self.len_pos, total as u16)?;
        Ok(total as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let mut w = WireWriter::new();
        let patch = write_header(&mut w, ProtocolVersion::V4, 2, 0xDEAD_BEEF);
        w.put_slice(b"payload!");
        patch.finish(&mut w).unwrap();

        let written = w.into_inner();
        let mut r = WireReader::new(&written);
        let header = MessageHeader::decode(&mut r).unwrap();

        assert_eq!(header.version, ProtocolVersion::V4);
        assert_eq!(header.type_code, 2);
        assert_eq!(header.length, 16);
        assert_eq!(header.xid, 0xDEAD_BEEF);
        assert_eq!(header.body_len(), 8);
    }

    #[test]
    fn test_empty_body_length() {
        let mut w = WireWriter::new();
        let patch = write_header(&mut w, ProtocolVersion::V1, 5, 9);
        let total = patch.finish(&mut w).unwrap();
        assert_eq!(total, HEADER_SIZE as u16);
    }

    #[test]
    fn test_length_shorter_than_header_rejected() {
        // length field claims 4 bytes
        let raw = [0x04, 0x00, 0x00, 0x04, 0, 0, 0, 1];
        let mut r = WireReader::new(&raw);
        let result = MessageHeader::decode(&mut r);
        assert!(matches!(
            result,
            Err(CodecError::MalformedHeader { declared: 4, .. })
        ));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let raw = [0x04, 0x00, 0x00];
        let mut r = WireReader::new(&raw);
        assert!(matches!(
            MessageHeader::decode(&mut r),
            Err(CodecError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let raw = [0x7F, 0x00, 0x00, 0x08, 0, 0, 0, 1];
        let mut r = WireReader::new(&raw);
        assert!(matches!(
            MessageHeader::decode(&mut r),
            Err(CodecError::UnsupportedVersion(0x7F))
        ));
    }

    #[test]
    fn test_version_conversion() {
        assert_eq!(
            ProtocolVersion::try_from(0x01).unwrap(),
            ProtocolVersion::V1
        );
        assert_eq!(
            ProtocolVersion::try_from(0x04).unwrap(),
            ProtocolVersion::V4
        );
        assert_eq!(
            ProtocolVersion::try_from(0x05).unwrap(),
            ProtocolVersion::V5
        );
        assert!(ProtocolVersion::try_from(0x02).is_err());
        assert!(!ProtocolVersion::V1.is_extensible());
        assert!(ProtocolVersion::V4.is_extensible());
    }
}
