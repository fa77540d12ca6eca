//! # ofwire-codec
//!
//! Bidirectional wire-format codec for the OpenFlow switch-control
//! protocol, covering wire versions 0x01, 0x04 and 0x05.
//!
//! This crate provides:
//! - The fixed-header codec with length back-patching
//! - Bitmask flag tables, padding, and TLV property primitives
//! - A sealed codec registry dispatching on (version, type code) for
//!   decode and (version, semantic kind) for encode
//! - Experimenter/vendor extension points at the message, multipart,
//!   and property level
//! - Factories for a representative message set at every version
//!
//! ```
//! use bytes::Bytes;
//! use ofwire_codec::{CodecRegistry, Message, MsgBody, ProtocolVersion};
//!
//! let registry = CodecRegistry::with_defaults().unwrap();
//! let keepalive = Message::new(ProtocolVersion::V4, 1, MsgBody::EchoRequest(Bytes::new()));
//!
//! let wire = registry.encode_message(&keepalive).unwrap();
//! assert_eq!(&wire[..], &[0x04, 0x02, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01]);
//!
//! let (decoded, consumed) = registry.decode_message(&wire).unwrap();
//! assert_eq!(consumed, 8);
//! assert_eq!(decoded, keepalive);
//! ```
//!
//! The codec is synchronous and carries no internal state between
//! calls; a sealed registry can be shared freely across threads.

pub mod align;
pub mod codecs;
pub mod error;
pub mod flags;
pub mod header;
pub mod registry;
pub mod tlv;
pub mod types;

pub use error::CodecError;
pub use flags::{BitTable, FlagSet};
pub use header::{MessageHeader, ProtocolVersion, HEADER_SIZE};
pub use registry::{
    CodecRegistry, CodecRegistryBuilder, DecodeContext, EncodeContext, ExperimenterDecoder,
    ExperimenterEncoder, ExperimenterSpace, MessageDecoder, MessageEncoder,
};
pub use types::{ExperimenterBody, Message, MsgBody, MsgKind};

/// Pass-through experimenter factory for opaque vendor payloads.
pub use codecs::OpaqueExperimenter;
