//! Experimenter (vendor) message envelope.
//!
//! The envelope factory peels the experimenter id off the undecoded
//! body, then re-resolves through the registry's experimenter table and
//! delegates the vendor payload to whatever factory is registered for
//! that id. An unregistered id fails that one message; nothing else.
//!
//! V1 calls these "vendor" messages and carries no subtype field.

use crate::error::CodecError;
use crate::registry::{
    DecodeContext, EncodeContext, ExperimenterSpace, MessageDecoder, MessageEncoder,
};
use crate::types::{ExperimenterBody, MsgBody};
use crate::ProtocolVersion;
use bytes::Bytes;
use ofwire_buffer::{WireReader, WireWriter};

pub(crate) struct ExperimenterMsgCodec;

fn record(body: &MsgBody) -> Result<&ExperimenterBody, CodecError> {
    match body {
        MsgBody::Experimenter(exp) => Ok(exp),
        _ => Err(CodecError::bad_record(format!(
            "experimenter codec got {:?} body",
            body.kind()
        ))),
    }
}

/// Envelope prefix bytes: id plus, from V4 on, the subtype.
fn envelope_len(version: ProtocolVersion) -> usize {
    if version.is_extensible() {
        8
    } else {
        4
    }
}

impl MessageDecoder for ExperimenterMsgCodec {
    fn decode_body(
        &self,
        r: &mut WireReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError> {
        let experimenter = r.read_u32()?;
        let exp_type = if ctx.version.is_extensible() {
            r.read_u32()?
        } else {
            0
        };

        let decoder =
            ctx.registry
                .experimenter_decoder(ctx.version, ExperimenterSpace::Message, experimenter)?;
        let mut payload = r.sub_reader(r.remaining())?;
        let decoded = decoder.decode(experimenter, exp_type, &mut payload)?;
        Ok(MsgBody::Experimenter(decoded))
    }
}

impl MessageEncoder for ExperimenterMsgCodec {
    fn body_len(&self, body: &MsgBody, ctx: &EncodeContext<'_>) -> Result<usize, CodecError> {
        let exp = record(body)?;
        check_version(exp, ctx.version)?;
        let payload_len = match ctx.registry.find_experimenter_encoder(
            ctx.version,
            ExperimenterSpace::Message,
            exp.experimenter,
        ) {
            Some(encoder) => encoder.payload_len(exp)?,
            None => exp.data.len(),
        };
        Ok(envelope_len(ctx.version) + payload_len)
    }

    fn encode_body(
        &self,
        body: &MsgBody,
        w: &mut WireWriter,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError> {
        let exp = record(body)?;
        check_version(exp, ctx.version)?;
        w.put_u32(exp.experimenter);
        if ctx.version.is_extensible() {
            w.put_u32(exp.exp_type);
        }
        match ctx.registry.find_experimenter_encoder(
            ctx.version,
            ExperimenterSpace::Message,
            exp.experimenter,
        ) {
            Some(encoder) => encoder.encode_payload(exp, w),
            None => {
                w.put_slice(&exp.data);
                Ok(())
            }
        }
    }
}

fn check_version(exp: &ExperimenterBody, version: ProtocolVersion) -> Result<(), CodecError> {
    if !version.is_extensible() && exp.exp_type != 0 {
        return Err(CodecError::bad_record(
            "vendor subtype is not expressible at version 0x01",
        ));
    }
    Ok(())
}

/// Pass-through experimenter factory: carries the vendor payload as
/// opaque bytes. Useful as a registration for ids whose payload needs
/// no further structure.
pub struct OpaqueExperimenter;

impl crate::registry::ExperimenterDecoder for OpaqueExperimenter {
    fn decode(
        &self,
        experimenter: u32,
        exp_type: u32,
        payload: &mut WireReader<'_>,
    ) -> Result<ExperimenterBody, CodecError> {
        Ok(ExperimenterBody {
            experimenter,
            exp_type,
            data: Bytes::copy_from_slice(payload.read_rest()),
        })
    }
}

impl crate::registry::ExperimenterEncoder for OpaqueExperimenter {
    fn payload_len(&self, body: &ExperimenterBody) -> Result<usize, CodecError> {
        Ok(body.data.len())
    }

    fn encode_payload(
        &self,
        body: &ExperimenterBody,
        w: &mut WireWriter,
    ) -> Result<(), CodecError> {
        w.put_slice(&body.data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CodecRegistry;
    use crate::types::Message;
    use std::sync::Arc;

    fn registry_with_vendor(version: ProtocolVersion, id: u32) -> CodecRegistry {
        let mut b = CodecRegistry::builder_with_defaults().unwrap();
        b.register_experimenter_decoder(
            version,
            ExperimenterSpace::Message,
            id,
            Arc::new(OpaqueExperimenter),
        );
        b.register_experimenter_encoder(
            version,
            ExperimenterSpace::Message,
            id,
            Arc::new(OpaqueExperimenter),
        );
        b.build()
    }

    #[test]
    fn test_registered_vendor_roundtrip() {
        let registry = registry_with_vendor(ProtocolVersion::V4, 0xCAFE);
        let msg = Message::new(
            ProtocolVersion::V4,
            3,
            MsgBody::Experimenter(ExperimenterBody {
                experimenter: 0xCAFE,
                exp_type: 11,
                data: Bytes::from_static(b"vendor-bytes"),
            }),
        );

        let wire = registry.encode_message(&msg).unwrap();
        assert_eq!(wire.len(), 8 + 8 + 12);
        // experimenter id sits first in the body
        assert_eq!(&wire[8..12], &[0x00, 0x00, 0xCA, 0xFE]);

        let (decoded, _) = registry.decode_message(&wire).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_unregistered_vendor_fails_decode() {
        let registry = registry_with_vendor(ProtocolVersion::V4, 0xCAFE);
        let msg = Message::new(
            ProtocolVersion::V4,
            3,
            MsgBody::Experimenter(ExperimenterBody {
                experimenter: 0xBEEF,
                exp_type: 0,
                data: Bytes::new(),
            }),
        );
        // Encode falls back to the opaque byte carry...
        let wire = registry.encode_message(&msg).unwrap();
        // ...but decode requires a registered factory.
        assert!(matches!(
            registry.decode_message(&wire),
            Err(CodecError::UnknownExperimenterId {
                experimenter: 0xBEEF,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_vendor_leaves_stream_decodable() {
        // A failed experimenter decode must not poison the caller's
        // ability to decode the next packed message.
        let registry = registry_with_vendor(ProtocolVersion::V4, 0xCAFE);
        let unknown = Message::new(
            ProtocolVersion::V4,
            1,
            MsgBody::Experimenter(ExperimenterBody {
                experimenter: 0xBEEF,
                exp_type: 0,
                data: Bytes::new(),
            }),
        );
        let echo = Message::new(ProtocolVersion::V4, 2, MsgBody::EchoRequest(Bytes::new()));

        let mut stream = registry.encode_message(&unknown).unwrap();
        let first_len = stream.len();
        stream.extend_from_slice(&registry.encode_message(&echo).unwrap());

        assert!(registry.decode_message(&stream).is_err());
        // Skip the declared length and resynchronize
        let declared = u16::from_be_bytes([stream[2], stream[3]]) as usize;
        assert_eq!(declared, first_len);
        let (decoded, _) = registry.decode_message(&stream[declared..]).unwrap();
        assert_eq!(decoded, echo);
    }

    #[test]
    fn test_v1_vendor_has_no_subtype() {
        let registry = registry_with_vendor(ProtocolVersion::V1, 0x2320);
        let msg = Message::new(
            ProtocolVersion::V1,
            1,
            MsgBody::Experimenter(ExperimenterBody {
                experimenter: 0x2320,
                exp_type: 0,
                data: Bytes::from_static(b"\x01\x02"),
            }),
        );

        let wire = registry.encode_message(&msg).unwrap();
        // header + vendor id + 2 payload bytes, no subtype word
        assert_eq!(wire.len(), 14);

        let (decoded, _) = registry.decode_message(&wire).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_v1_subtype_rejected() {
        let registry = registry_with_vendor(ProtocolVersion::V1, 0x2320);
        let msg = Message::new(
            ProtocolVersion::V1,
            1,
            MsgBody::Experimenter(ExperimenterBody {
                experimenter: 0x2320,
                exp_type: 5,
                data: Bytes::new(),
            }),
        );
        assert!(matches!(
            registry.encode_message(&msg),
            Err(CodecError::BadRecord { .. })
        ));
    }
}
