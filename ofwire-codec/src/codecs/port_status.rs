//! Port status: a reason byte and the affected port description.

use super::config::VersionConfig;
use super::port;
use crate::error::CodecError;
use crate::registry::{DecodeContext, EncodeContext, MessageDecoder, MessageEncoder};
use crate::types::port::{PortReason, PortStatus};
use crate::types::MsgBody;
use ofwire_buffer::{WireReader, WireWriter};

pub(crate) struct PortStatusCodec {
    pub cfg: VersionConfig,
}

fn record(body: &MsgBody) -> Result<&PortStatus, CodecError> {
    match body {
        MsgBody::PortStatus(status) => Ok(status),
        _ => Err(CodecError::bad_record(format!(
            "port-status codec got {:?} body",
            body.kind()
        ))),
    }
}

impl MessageDecoder for PortStatusCodec {
    fn decode_body(
        &self,
        r: &mut WireReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError> {
        let raw = r.read_u8()?;
        let reason = PortReason::from_wire(raw).ok_or(CodecError::InvalidFieldValue {
            field: "port status reason",
            value: raw as u32,
        })?;
        r.skip(7)?;
        let port = port::decode_port(&self.cfg, ctx, r)?;
        Ok(MsgBody::PortStatus(PortStatus { reason, port }))
    }
}

impl MessageEncoder for PortStatusCodec {
    fn body_len(&self, body: &MsgBody, ctx: &EncodeContext<'_>) -> Result<usize, CodecError> {
        let status = record(body)?;
        Ok(8 + port::port_len(&self.cfg, ctx, &status.port)?)
    }

    fn encode_body(
        &self,
        body: &MsgBody,
        w: &mut WireWriter,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError> {
        let status = record(body)?;
        w.put_u8(status.reason as u8);
        w.put_zeros(7);
        port::encode_port(&self.cfg, ctx, &status.port, w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CodecRegistry;
    use crate::types::port::Port;
    use crate::types::Message;
    use crate::ProtocolVersion;

    fn sample_status() -> PortStatus {
        PortStatus {
            reason: PortReason::Modify,
            port: Port {
                port_no: 4,
                hw_addr: [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF],
                name: "wan0".to_string(),
                ..Port::default()
            },
        }
    }

    #[test]
    fn test_port_status_roundtrip_all_versions() {
        let registry = CodecRegistry::with_defaults().unwrap();
        for version in ProtocolVersion::all() {
            let msg = Message::new(version, 6, MsgBody::PortStatus(sample_status()));
            let wire = registry.encode_message(&msg).unwrap();
            let (decoded, _) = registry.decode_message(&wire).unwrap();
            assert_eq!(decoded, msg, "version {version:?}");
        }
    }

    #[test]
    fn test_v4_wire_size() {
        let registry = CodecRegistry::with_defaults().unwrap();
        let msg = Message::new(ProtocolVersion::V4, 6, MsgBody::PortStatus(sample_status()));
        let wire = registry.encode_message(&msg).unwrap();
        // header + reason/pad + 64-byte port
        assert_eq!(wire.len(), 8 + 8 + 64);
    }

    #[test]
    fn test_bad_reason_rejected() {
        let registry = CodecRegistry::with_defaults().unwrap();
        let msg = Message::new(ProtocolVersion::V4, 6, MsgBody::PortStatus(sample_status()));
        let mut wire = registry.encode_message(&msg).unwrap();
        wire[8] = 9; // out-of-range reason
        assert!(matches!(
            registry.decode_message(&wire),
            Err(CodecError::InvalidFieldValue {
                field: "port status reason",
                value: 9
            })
        ));
    }
}
