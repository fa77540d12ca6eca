//! Codec registries and the message dispatch algorithm.
//!
//! Two lookup families resolve to the same logical codec for a message
//! kind: `(version, wire type code)` on the decode path and
//! `(version, semantic kind)` on the encode path. Experimenter
//! extensions resolve through a secondary `(version, space, vendor id)`
//! table.
//!
//! Registration happens once, through [`CodecRegistryBuilder`];
//! [`CodecRegistryBuilder::build`] seals the tables into a
//! [`CodecRegistry`] that is read-only by construction, so concurrent
//! lookups from any number of threads need no locking. Factories are
//! stateless values shared behind `Arc` for the process lifetime.

use crate::codecs;
use crate::error::CodecError;
use crate::header::{self, MessageHeader, ProtocolVersion, HEADER_SIZE};
use crate::types::{ExperimenterBody, Message, MsgBody, MsgKind};
use bytes::BytesMut;
use ofwire_buffer::{WireReader, WireWriter};
use std::collections::HashMap;
use std::sync::Arc;

/// Decode-side contract: turn exactly one message body into a record.
///
/// The reader handed in is bounded to the bytes the header's length
/// field declares, so an implementation cannot stray into a following
/// message even when several are packed in one buffer.
pub trait MessageDecoder: Send + Sync {
    fn decode_body(
        &self,
        r: &mut WireReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError>;
}

/// Encode-side contract.
///
/// `body_len` is the pure pre-flight size of the body (header
/// excluded); it must agree exactly with what `encode_body` writes.
/// Callers rely on that equality to size parent length fields before
/// any payload bytes exist.
pub trait MessageEncoder: Send + Sync {
    fn body_len(&self, body: &MsgBody, ctx: &EncodeContext<'_>) -> Result<usize, CodecError>;

    fn encode_body(
        &self,
        body: &MsgBody,
        w: &mut WireWriter,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError>;
}

/// Decode contract for one experimenter id within one space. Receives
/// the already-peeled id and subtype plus a reader bounded to the
/// vendor payload.
pub trait ExperimenterDecoder: Send + Sync {
    fn decode(
        &self,
        experimenter: u32,
        exp_type: u32,
        payload: &mut WireReader<'_>,
    ) -> Result<ExperimenterBody, CodecError>;
}

/// Encode contract for one experimenter id within one space. Writes
/// only the vendor payload; the enclosing envelope (id, subtype,
/// lengths, pads) belongs to the caller.
pub trait ExperimenterEncoder: Send + Sync {
    fn payload_len(&self, body: &ExperimenterBody) -> Result<usize, CodecError>;

    fn encode_payload(&self, body: &ExperimenterBody, w: &mut WireWriter)
        -> Result<(), CodecError>;
}

/// Where an experimenter id appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExperimenterSpace {
    /// Top-level experimenter message.
    Message,
    /// Experimenter multipart body.
    Multipart,
    /// Experimenter table-features property.
    TableFeatureProperty,
    /// Experimenter port-description property.
    PortDescProperty,
}

/// Shared state threaded through a decode call. Carries no mutable
/// scratch; everything per-call lives on the stack.
pub struct DecodeContext<'a> {
    pub registry: &'a CodecRegistry,
    pub version: ProtocolVersion,
}

/// Shared state threaded through an encode call.
pub struct EncodeContext<'a> {
    pub registry: &'a CodecRegistry,
    pub version: ProtocolVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct WireKey {
    version: ProtocolVersion,
    type_code: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RecordKey {
    version: ProtocolVersion,
    kind: MsgKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ExperimenterKey {
    version: ProtocolVersion,
    space: ExperimenterSpace,
    experimenter: u32,
}

struct EncoderEntry {
    type_code: u8,
    encoder: Arc<dyn MessageEncoder>,
}

/// Accumulates registrations before the registry is sealed.
#[derive(Default)]
pub struct CodecRegistryBuilder {
    decoders: HashMap<WireKey, Arc<dyn MessageDecoder>>,
    encoders: HashMap<RecordKey, EncoderEntry>,
    exp_decoders: HashMap<ExperimenterKey, Arc<dyn ExperimenterDecoder>>,
    exp_encoders: HashMap<ExperimenterKey, Arc<dyn ExperimenterEncoder>>,
}

impl CodecRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one codec under both lookup families, keeping the wire
    /// and record keys resolving to the same logical implementation.
    pub fn register_message<C>(
        &mut self,
        version: ProtocolVersion,
        type_code: u8,
        kind: MsgKind,
        codec: Arc<C>,
    ) -> &mut Self
    where
        C: MessageDecoder + MessageEncoder + 'static,
    {
        self.register_decoder(version, type_code, codec.clone());
        self.register_encoder(version, kind, type_code, codec)
    }

    /// Later registrations for the same key replace earlier ones, which
    /// lets a caller override a built-in before sealing.
    pub fn register_decoder(
        &mut self,
        version: ProtocolVersion,
        type_code: u8,
        decoder: Arc<dyn MessageDecoder>,
    ) -> &mut Self {
        self.decoders
            .insert(WireKey { version, type_code }, decoder);
        self
    }

    pub fn register_encoder(
        &mut self,
        version: ProtocolVersion,
        kind: MsgKind,
        type_code: u8,
        encoder: Arc<dyn MessageEncoder>,
    ) -> &mut Self {
        self.encoders
            .insert(RecordKey { version, kind }, EncoderEntry { type_code, encoder });
        self
    }

    pub fn register_experimenter_decoder(
        &mut self,
        version: ProtocolVersion,
        space: ExperimenterSpace,
        experimenter: u32,
        decoder: Arc<dyn ExperimenterDecoder>,
    ) -> &mut Self {
        self.exp_decoders.insert(
            ExperimenterKey {
                version,
                space,
                experimenter,
            },
            decoder,
        );
        self
    }

    pub fn register_experimenter_encoder(
        &mut self,
        version: ProtocolVersion,
        space: ExperimenterSpace,
        experimenter: u32,
        encoder: Arc<dyn ExperimenterEncoder>,
    ) -> &mut Self {
        self.exp_encoders.insert(
            ExperimenterKey {
                version,
                space,
                experimenter,
            },
            encoder,
        );
        self
    }

    /// Seals the tables. After this point the registry is immutable;
    /// lookups are plain hash reads with no locking.
    pub fn build(self) -> CodecRegistry {
        CodecRegistry {
            decoders: self.decoders,
            encoders: self.encoders,
            exp_decoders: self.exp_decoders,
            exp_encoders: self.exp_encoders,
        }
    }
}

/// The sealed lookup tables plus the top-level dispatch algorithm.
pub struct CodecRegistry {
    decoders: HashMap<WireKey, Arc<dyn MessageDecoder>>,
    encoders: HashMap<RecordKey, EncoderEntry>,
    exp_decoders: HashMap<ExperimenterKey, Arc<dyn ExperimenterDecoder>>,
    exp_encoders: HashMap<ExperimenterKey, Arc<dyn ExperimenterEncoder>>,
}

impl CodecRegistry {
    /// An empty builder, for callers assembling a registry from
    /// scratch.
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::new()
    }

    /// A builder preloaded with every built-in codec across the
    /// supported versions. Extend it with experimenter registrations,
    /// then seal.
    pub fn builder_with_defaults() -> Result<CodecRegistryBuilder, CodecError> {
        let mut builder = CodecRegistryBuilder::new();
        codecs::register_builtins(&mut builder)?;
        Ok(builder)
    }

    /// The built-in codecs, sealed.
    pub fn with_defaults() -> Result<CodecRegistry, CodecError> {
        Ok(Self::builder_with_defaults()?.build())
    }

    fn decoder(
        &self,
        version: ProtocolVersion,
        type_code: u8,
    ) -> Result<&dyn MessageDecoder, CodecError> {
        self.decoders
            .get(&WireKey { version, type_code })
            .map(|d| d.as_ref())
            .ok_or(CodecError::UnknownTypeCode {
                version: version.wire_byte(),
                type_code,
            })
    }

    fn encoder(
        &self,
        version: ProtocolVersion,
        kind: MsgKind,
    ) -> Result<&EncoderEntry, CodecError> {
        self.encoders
            .get(&RecordKey { version, kind })
            .ok_or_else(|| {
                CodecError::bad_record(format!(
                    "no encoder for {kind:?} at version {:#04x}",
                    version.wire_byte()
                ))
            })
    }

    /// Experimenter lookup that fails with a reportable error. Used
    /// where the surrounding bytes cannot be decoded without the vendor
    /// factory (whole experimenter messages and multipart bodies).
    pub fn experimenter_decoder(
        &self,
        version: ProtocolVersion,
        space: ExperimenterSpace,
        experimenter: u32,
    ) -> Result<&dyn ExperimenterDecoder, CodecError> {
        self.find_experimenter_decoder(version, space, experimenter)
            .ok_or(CodecError::UnknownExperimenterId {
                version: version.wire_byte(),
                space,
                experimenter,
            })
    }

    /// Experimenter lookup for the lenient call sites (properties),
    /// where an unregistered id degrades to an opaque payload carry.
    pub fn find_experimenter_decoder(
        &self,
        version: ProtocolVersion,
        space: ExperimenterSpace,
        experimenter: u32,
    ) -> Option<&dyn ExperimenterDecoder> {
        self.exp_decoders
            .get(&ExperimenterKey {
                version,
                space,
                experimenter,
            })
            .map(|d| d.as_ref())
    }

    pub fn find_experimenter_encoder(
        &self,
        version: ProtocolVersion,
        space: ExperimenterSpace,
        experimenter: u32,
    ) -> Option<&dyn ExperimenterEncoder> {
        self.exp_encoders
            .get(&ExperimenterKey {
                version,
                space,
                experimenter,
            })
            .map(|e| e.as_ref())
    }

    /// Decodes one message from the front of `buf`.
    ///
    /// Returns the record and the exact byte count consumed (the
    /// header's declared length), leaving any packed follow-on messages
    /// untouched. Header validation runs before any factory dispatch.
    pub fn decode_message(&self, buf: &[u8]) -> Result<(Message, usize), CodecError> {
        let mut r = WireReader::new(buf);
        let hdr = MessageHeader::decode(&mut r)?;

        let total = hdr.length as usize;
        if buf.len() < total {
            return Err(CodecError::MalformedHeader {
                declared: hdr.length,
                available: buf.len(),
            });
        }

        let mut body = r.sub_reader(hdr.body_len())?;
        let decoder = self.decoder(hdr.version, hdr.type_code)?;
        let ctx = DecodeContext {
            registry: self,
            version: hdr.version,
        };
        let decoded = decoder.decode_body(&mut body, &ctx)?;

        if !body.is_empty() {
            return Err(CodecError::TrailingBodyBytes {
                type_code: hdr.type_code,
                remaining: body.remaining(),
            });
        }

        Ok((
            Message {
                version: hdr.version,
                xid: hdr.xid,
                body: decoded,
            },
            total,
        ))
    }

    /// Encodes a message to its exact wire bytes.
    ///
    /// The body length is computed up front to size the buffer, the
    /// header length is back-patched after the body, and the two must
    /// agree; a disagreement is a codec defect surfaced as
    /// [`CodecError::EncodeLengthMismatch`].
    pub fn encode_message(&self, msg: &Message) -> Result<BytesMut, CodecError> {
        let entry = self.encoder(msg.version, msg.kind())?;
        let ctx = EncodeContext {
            registry: self,
            version: msg.version,
        };

        let body_len = entry.encoder.body_len(&msg.body, &ctx)?;
        let total = HEADER_SIZE + body_len;
        if total > u16::MAX as usize {
            return Err(CodecError::MessageTooLarge { size: total });
        }

        let mut w = WireWriter::with_capacity(total);
        let patch = header::write_header(&mut w, msg.version, entry.type_code, msg.xid);
        entry.encoder.encode_body(&msg.body, &mut w, &ctx)?;
        let written = patch.finish(&mut w)? as usize;

        if written != total {
            debug_assert_eq!(written, total, "body_len and encode_body disagree");
            return Err(CodecError::EncodeLengthMismatch {
                context: "message",
                computed: total,
                written,
            });
        }

        Ok(w.into_inner())
    }
}
