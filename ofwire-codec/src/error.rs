//! Codec error types.

use crate::registry::ExperimenterSpace;
use ofwire_buffer::BufferError;
use thiserror::Error;

/// Errors raised while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Version byte at the head of a message is not one we speak.
    #[error("unsupported wire version {0:#04x}")]
    UnsupportedVersion(u8),

    /// Declared length shorter than the fixed header, or fewer bytes
    /// available than the header declares. Caught before dispatch.
    #[error("malformed header: declared length {declared}, {available} bytes available")]
    MalformedHeader { declared: u16, available: usize },

    /// No decoder registered for this (version, type code) pair.
    ///
    /// The read position of the caller's buffer is untouched, so the
    /// caller can still skip the declared length and resynchronize.
    #[error("no decoder for type code {type_code} at version {version:#04x}")]
    UnknownTypeCode { version: u8, type_code: u8 },

    /// Experimenter envelope resolved, but no factory is registered for
    /// the embedded experimenter id.
    #[error("no {space:?} factory for experimenter id {experimenter:#010x} at version {version:#04x}")]
    UnknownExperimenterId {
        version: u8,
        space: ExperimenterSpace,
        experimenter: u32,
    },

    /// A TLV property list did not land exactly on its parent's
    /// declared end.
    #[error("property list in {context} consumed {actual} of {expected} declared bytes")]
    TruncatedOrOverrunProperty {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A factory stopped short of the declared body end.
    #[error("type code {type_code} left {remaining} undecoded body bytes")]
    TrailingBodyBytes { type_code: u8, remaining: usize },

    /// `encoded_len` and the bytes actually written disagree. This is a
    /// programming defect in a codec, not a recoverable condition.
    #[error("encode of {context} computed {computed} bytes but wrote {written}")]
    EncodeLengthMismatch {
        context: &'static str,
        computed: usize,
        written: usize,
    },

    /// Encoded message would not fit the 16-bit header length field.
    #[error("message of {size} bytes exceeds the 16-bit length field")]
    MessageTooLarge { size: usize },

    /// A wire field holds a value outside its defined enumeration.
    #[error("invalid value {value} for {field}")]
    InvalidFieldValue { field: &'static str, value: u32 },

    /// Multipart body type not defined (or not spoken) at this version.
    #[error("unsupported multipart type {mp_type} at version {version:#04x}")]
    UnsupportedMultipartType { version: u8, mp_type: u16 },

    /// The input record cannot be represented at the requested version.
    #[error("record not encodable: {reason}")]
    BadRecord { reason: String },

    /// Two entries of one flag table claim the same bit position.
    #[error("duplicate bit position {bit} in flag table")]
    DuplicateFlagBit { bit: u8 },

    /// Ran out of bytes inside a structure (truncated message body).
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl CodecError {
    /// Builds a `BadRecord` from anything displayable.
    pub fn bad_record(reason: impl Into<String>) -> Self {
        CodecError::BadRecord {
            reason: reason.into(),
        }
    }
}
