//! Multipart request/reply: a typed, possibly segmented statistics
//! exchange. The 8-byte multipart prefix selects the body layout.

use super::config::VersionConfig;
use super::{port, table_features};
use crate::error::CodecError;
use crate::registry::{
    DecodeContext, EncodeContext, ExperimenterSpace, MessageDecoder, MessageEncoder,
};
use crate::flags::FlagSet;
use crate::types::multipart::{
    MultipartFlag, MultipartReply, MultipartReplyBody, MultipartRequest, MultipartRequestBody,
    PortStats, SwitchDesc,
};
use crate::types::{ExperimenterBody, MsgBody};
use crate::ProtocolVersion;
use ofwire_buffer::{WireReader, WireWriter};

const MP_DESC: u16 = 0;
const MP_PORT_STATS: u16 = 4;
const MP_TABLE_FEATURES: u16 = 12;
const MP_PORT_DESC: u16 = 13;
const MP_EXPERIMENTER: u16 = 0xFFFF;

/// Multipart prefix: type, flags, 4 pad bytes.
const MP_PREFIX_LEN: usize = 8;

/// One V4 port-stats reply entry.
const PORT_STATS_ENTRY_LEN: usize = 112;

const DESC_STR_LEN: usize = 256;
const SERIAL_NUM_LEN: usize = 32;

fn unsupported(version: ProtocolVersion, mp_type: u16) -> CodecError {
    CodecError::UnsupportedMultipartType {
        version: version.wire_byte(),
        mp_type,
    }
}

fn decode_prefix(
    cfg: &VersionConfig,
    r: &mut WireReader<'_>,
) -> Result<(u16, FlagSet<MultipartFlag>), CodecError> {
    let mp_type = r.read_u16()?;
    let flags = cfg.multipart_flags.unpack(r.read_u16()? as u32);
    r.skip(4)?;
    Ok((mp_type, flags))
}

fn write_prefix(
    cfg: &VersionConfig,
    mp_type: u16,
    flags: &FlagSet<MultipartFlag>,
    w: &mut WireWriter,
) {
    w.put_u16(mp_type);
    w.put_u16(cfg.multipart_flags.pack(flags) as u16);
    w.put_zeros(4);
}

fn experimenter_payload_len(
    ctx: &EncodeContext<'_>,
    body: &ExperimenterBody,
) -> Result<usize, CodecError> {
    let payload = match ctx.registry.find_experimenter_encoder(
        ctx.version,
        ExperimenterSpace::Multipart,
        body.experimenter,
    ) {
        Some(encoder) => encoder.payload_len(body)?,
        None => body.data.len(),
    };
    Ok(8 + payload)
}

fn encode_experimenter(
    ctx: &EncodeContext<'_>,
    body: &ExperimenterBody,
    w: &mut WireWriter,
) -> Result<(), CodecError> {
    w.put_u32(body.experimenter);
    w.put_u32(body.exp_type);
    match ctx.registry.find_experimenter_encoder(
        ctx.version,
        ExperimenterSpace::Multipart,
        body.experimenter,
    ) {
        Some(encoder) => encoder.encode_payload(body, w),
        None => {
            w.put_slice(&body.data);
            Ok(())
        }
    }
}

fn decode_experimenter(
    ctx: &DecodeContext<'_>,
    r: &mut WireReader<'_>,
) -> Result<ExperimenterBody, CodecError> {
    let experimenter = r.read_u32()?;
    let exp_type = r.read_u32()?;
    let decoder =
        ctx.registry
            .experimenter_decoder(ctx.version, ExperimenterSpace::Multipart, experimenter)?;
    let mut payload = r.sub_reader(r.remaining())?;
    decoder.decode(experimenter, exp_type, &mut payload)
}

pub(crate) struct MultipartRequestCodec {
    pub cfg: VersionConfig,
}

fn request_record(body: &MsgBody) -> Result<&MultipartRequest, CodecError> {
    match body {
        MsgBody::MultipartRequest(req) => Ok(req),
        _ => Err(CodecError::bad_record(format!(
            "multipart-request codec got {:?} body",
            body.kind()
        ))),
    }
}

fn request_type_code(body: &MultipartRequestBody) -> u16 {
    match body {
        MultipartRequestBody::Desc => MP_DESC,
        MultipartRequestBody::PortStats { .. } => MP_PORT_STATS,
        MultipartRequestBody::TableFeatures(_) => MP_TABLE_FEATURES,
        MultipartRequestBody::PortDesc => MP_PORT_DESC,
        MultipartRequestBody::Experimenter(_) => MP_EXPERIMENTER,
    }
}

impl MessageDecoder for MultipartRequestCodec {
    fn decode_body(
        &self,
        r: &mut WireReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError> {
        let (mp_type, flags) = decode_prefix(&self.cfg, r)?;
        let body = match mp_type {
            MP_DESC => MultipartRequestBody::Desc,
            MP_PORT_STATS => {
                let port_no = r.read_u32()?;
                r.skip(4)?;
                MultipartRequestBody::PortStats { port_no }
            }
            MP_TABLE_FEATURES => {
                let mut entries = Vec::new();
                while !r.is_empty() {
                    entries.push(table_features::decode_entry(ctx, r)?);
                }
                MultipartRequestBody::TableFeatures(entries)
            }
            MP_PORT_DESC => MultipartRequestBody::PortDesc,
            MP_EXPERIMENTER => {
                MultipartRequestBody::Experimenter(decode_experimenter(ctx, r)?)
            }
            other => return Err(unsupported(ctx.version, other)),
        };
        Ok(MsgBody::MultipartRequest(MultipartRequest { flags, body }))
    }
}

impl MessageEncoder for MultipartRequestCodec {
    fn body_len(&self, body: &MsgBody, ctx: &EncodeContext<'_>) -> Result<usize, CodecError> {
        let req = request_record(body)?;
        let body_len = match &req.body {
            MultipartRequestBody::Desc | MultipartRequestBody::PortDesc => 0,
            MultipartRequestBody::PortStats { .. } => 8,
            MultipartRequestBody::TableFeatures(entries) => {
                let mut len = 0;
                for entry in entries {
                    len += table_features::entry_len(ctx, entry)?;
                }
                len
            }
            MultipartRequestBody::Experimenter(exp) => experimenter_payload_len(ctx, exp)?,
        };
        Ok(MP_PREFIX_LEN + body_len)
    }

    fn encode_body(
        &self,
        body: &MsgBody,
        w: &mut WireWriter,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError> {
        let req = request_record(body)?;
        write_prefix(&self.cfg, request_type_code(&req.body), &req.flags, w);
        match &req.body {
            MultipartRequestBody::Desc | MultipartRequestBody::PortDesc => {}
            MultipartRequestBody::PortStats { port_no } => {
                w.put_u32(*port_no);
                w.put_zeros(4);
            }
            MultipartRequestBody::TableFeatures(entries) => {
                for entry in entries {
                    table_features::encode_entry(ctx, entry, w)?;
                }
            }
            MultipartRequestBody::Experimenter(exp) => encode_experimenter(ctx, exp, w)?,
        }
        Ok(())
    }
}

pub(crate) struct MultipartReplyCodec {
    pub cfg: VersionConfig,
}

fn reply_record(body: &MsgBody) -> Result<&MultipartReply, CodecError> {
    match body {
        MsgBody::MultipartReply(reply) => Ok(reply),
        _ => Err(CodecError::bad_record(format!(
            "multipart-reply codec got {:?} body",
            body.kind()
        ))),
    }
}

fn reply_type_code(body: &MultipartReplyBody) -> u16 {
    match body {
        MultipartReplyBody::Desc(_) => MP_DESC,
        MultipartReplyBody::PortStats(_) => MP_PORT_STATS,
        MultipartReplyBody::TableFeatures(_) => MP_TABLE_FEATURES,
        MultipartReplyBody::PortDesc(_) => MP_PORT_DESC,
        MultipartReplyBody::Experimenter(_) => MP_EXPERIMENTER,
    }
}

impl MessageDecoder for MultipartReplyCodec {
    fn decode_body(
        &self,
        r: &mut WireReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError> {
        let (mp_type, flags) = decode_prefix(&self.cfg, r)?;
        let body = match mp_type {
            MP_DESC => MultipartReplyBody::Desc(SwitchDesc {
                mfr_desc: super::read_fixed_str(r, DESC_STR_LEN)?,
                hw_desc: super::read_fixed_str(r, DESC_STR_LEN)?,
                sw_desc: super::read_fixed_str(r, DESC_STR_LEN)?,
                serial_num: super::read_fixed_str(r, SERIAL_NUM_LEN)?,
                dp_desc: super::read_fixed_str(r, DESC_STR_LEN)?,
            }),
            MP_PORT_STATS => {
                // V5 moved port stats to a property layout this codec
                // does not speak.
                if self.cfg.version == ProtocolVersion::V5 {
                    return Err(unsupported(ctx.version, mp_type));
                }
                let mut stats = Vec::new();
                while !r.is_empty() {
                    stats.push(decode_port_stats(r)?);
                }
                MultipartReplyBody::PortStats(stats)
            }
            MP_TABLE_FEATURES => {
                let mut entries = Vec::new();
                while !r.is_empty() {
                    entries.push(table_features::decode_entry(ctx, r)?);
                }
                MultipartReplyBody::TableFeatures(entries)
            }
            MP_PORT_DESC => {
                let mut ports = Vec::new();
                while !r.is_empty() {
                    ports.push(port::decode_port(&self.cfg, ctx, r)?);
                }
                MultipartReplyBody::PortDesc(ports)
            }
            MP_EXPERIMENTER => MultipartReplyBody::Experimenter(decode_experimenter(ctx, r)?),
            other => return Err(unsupported(ctx.version, other)),
        };
        Ok(MsgBody::MultipartReply(MultipartReply { flags, body }))
    }
}

impl MessageEncoder for MultipartReplyCodec {
    fn body_len(&self, body: &MsgBody, ctx: &EncodeContext<'_>) -> Result<usize, CodecError> {
        let reply = reply_record(body)?;
        let body_len = match &reply.body {
            MultipartReplyBody::Desc(_) => 4 * DESC_STR_LEN + SERIAL_NUM_LEN,
            MultipartReplyBody::PortStats(stats) => {
                if self.cfg.version == ProtocolVersion::V5 {
                    return Err(unsupported(ctx.version, MP_PORT_STATS));
                }
                PORT_STATS_ENTRY_LEN * stats.len()
            }
            MultipartReplyBody::TableFeatures(entries) => {
                let mut len = 0;
                for entry in entries {
                    len += table_features::entry_len(ctx, entry)?;
                }
                len
            }
            MultipartReplyBody::PortDesc(ports) => {
                let mut len = 0;
                for p in ports {
                    len += port::port_len(&self.cfg, ctx, p)?;
                }
                len
            }
            MultipartReplyBody::Experimenter(exp) => experimenter_payload_len(ctx, exp)?,
        };
        Ok(MP_PREFIX_LEN + body_len)
    }

    fn encode_body(
        &self,
        body: &MsgBody,
        w: &mut WireWriter,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError> {
        let reply = reply_record(body)?;
        write_prefix(&self.cfg, reply_type_code(&reply.body), &reply.flags, w);
        match &reply.body {
            MultipartReplyBody::Desc(desc) => {
                super::write_fixed_str(w, &desc.mfr_desc, DESC_STR_LEN, "manufacturer desc")?;
                super::write_fixed_str(w, &desc.hw_desc, DESC_STR_LEN, "hardware desc")?;
                super::write_fixed_str(w, &desc.sw_desc, DESC_STR_LEN, "software desc")?;
                super::write_fixed_str(w, &desc.serial_num, SERIAL_NUM_LEN, "serial number")?;
                super::write_fixed_str(w, &desc.dp_desc, DESC_STR_LEN, "datapath desc")?;
            }
            MultipartReplyBody::PortStats(stats) => {
                if self.cfg.version == ProtocolVersion::V5 {
                    return Err(unsupported(ctx.version, MP_PORT_STATS));
                }
                for entry in stats {
                    encode_port_stats(entry, w);
                }
            }
            MultipartReplyBody::TableFeatures(entries) => {
                for entry in entries {
                    table_features::encode_entry(ctx, entry, w)?;
                }
            }
            MultipartReplyBody::PortDesc(ports) => {
                for p in ports {
                    port::encode_port(&self.cfg, ctx, p, w)?;
                }
            }
            MultipartReplyBody::Experimenter(exp) => encode_experimenter(ctx, exp, w)?,
        }
        Ok(())
    }
}

fn decode_port_stats(r: &mut WireReader<'_>) -> Result<PortStats, CodecError> {
    let port_no = r.read_u32()?;
    r.skip(4)?;
    Ok(PortStats {
        port_no,
        rx_packets: r.read_u64()?,
        tx_packets: r.read_u64()?,
        rx_bytes: r.read_u64()?,
        tx_bytes: r.read_u64()?,
        rx_dropped: r.read_u64()?,
        tx_dropped: r.read_u64()?,
        rx_errors: r.read_u64()?,
        tx_errors: r.read_u64()?,
        rx_frame_err: r.read_u64()?,
        rx_over_err: r.read_u64()?,
        rx_crc_err: r.read_u64()?,
        collisions: r.read_u64()?,
        duration_sec: r.read_u32()?,
        duration_nsec: r.read_u32()?,
    })
}

fn encode_port_stats(entry: &PortStats, w: &mut WireWriter) {
    w.put_u32(entry.port_no);
    w.put_zeros(4);
    w.put_u64(entry.rx_packets);
    w.put_u64(entry.tx_packets);
    w.put_u64(entry.rx_bytes);
    w.put_u64(entry.tx_bytes);
    w.put_u64(entry.rx_dropped);
    w.put_u64(entry.tx_dropped);
    w.put_u64(entry.rx_errors);
    w.put_u64(entry.tx_errors);
    w.put_u64(entry.rx_frame_err);
    w.put_u64(entry.rx_over_err);
    w.put_u64(entry.rx_crc_err);
    w.put_u64(entry.collisions);
    w.put_u32(entry.duration_sec);
    w.put_u32(entry.duration_nsec);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagSet;
    use crate::registry::CodecRegistry;
    use crate::types::multipart::MultipartFlag;
    use crate::types::Message;

    #[test]
    fn test_desc_reply_roundtrip() {
        let registry = CodecRegistry::with_defaults().unwrap();
        let msg = Message::new(
            ProtocolVersion::V4,
            8,
            MsgBody::MultipartReply(MultipartReply {
                flags: FlagSet::new(),
                body: MultipartReplyBody::Desc(SwitchDesc {
                    mfr_desc: "Example Networks".to_string(),
                    hw_desc: "EX-9000".to_string(),
                    sw_desc: "1.2.3".to_string(),
                    serial_num: "SN0001".to_string(),
                    dp_desc: "lab switch".to_string(),
                }),
            }),
        );

        let wire = registry.encode_message(&msg).unwrap();
        assert_eq!(wire.len(), 8 + 8 + 1056);

        let (decoded, _) = registry.decode_message(&wire).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_port_stats_reply_appends_every_entry() {
        let registry = CodecRegistry::with_defaults().unwrap();
        let entries: Vec<PortStats> = (1..=3)
            .map(|n| PortStats {
                port_no: n,
                rx_packets: u64::from(n) * 1000,
                tx_packets: u64::MAX,
                ..PortStats::default()
            })
            .collect();
        let msg = Message::new(
            ProtocolVersion::V4,
            4,
            MsgBody::MultipartReply(MultipartReply {
                flags: FlagSet::new().with(MultipartFlag::More),
                body: MultipartReplyBody::PortStats(entries.clone()),
            }),
        );

        let wire = registry.encode_message(&msg).unwrap();
        assert_eq!(wire.len(), 8 + 8 + 3 * 112);

        let (decoded, _) = registry.decode_message(&wire).unwrap();
        match decoded.body {
            MsgBody::MultipartReply(reply) => match reply.body {
                MultipartReplyBody::PortStats(decoded_entries) => {
                    assert_eq!(decoded_entries, entries);
                }
                other => panic!("expected port stats, got {other:?}"),
            },
            other => panic!("expected multipart reply, got {other:?}"),
        }
    }

    #[test]
    fn test_port_stats_request_roundtrip() {
        let registry = CodecRegistry::with_defaults().unwrap();
        let msg = Message::new(
            ProtocolVersion::V4,
            4,
            MsgBody::MultipartRequest(MultipartRequest {
                flags: FlagSet::new(),
                body: MultipartRequestBody::PortStats {
                    port_no: 0xFFFF_FF00,
                },
            }),
        );
        let wire = registry.encode_message(&msg).unwrap();
        assert_eq!(wire.len(), 8 + 8 + 8);
        let (decoded, _) = registry.decode_message(&wire).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_table_features_reply_roundtrip() {
        use crate::types::table_features::{TableFeatureProp, TableFeatures};

        let registry = CodecRegistry::with_defaults().unwrap();
        let entries = vec![
            TableFeatures {
                table_id: 0,
                name: "acl".to_string(),
                max_entries: 512,
                properties: vec![TableFeatureProp::NextTables {
                    miss: false,
                    table_ids: vec![1],
                }],
                ..TableFeatures::default()
            },
            TableFeatures {
                table_id: 1,
                name: "forward".to_string(),
                max_entries: 4096,
                ..TableFeatures::default()
            },
        ];
        let msg = Message::new(
            ProtocolVersion::V4,
            12,
            MsgBody::MultipartReply(MultipartReply {
                flags: FlagSet::new(),
                body: MultipartReplyBody::TableFeatures(entries),
            }),
        );

        let wire = registry.encode_message(&msg).unwrap();
        let (decoded, _) = registry.decode_message(&wire).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_port_desc_reply_v5_roundtrip() {
        use crate::types::port::Port;

        let registry = CodecRegistry::with_defaults().unwrap();
        let ports = vec![
            Port {
                port_no: 1,
                name: "ge-0/0/1".to_string(),
                curr_speed: 1_000_000,
                ..Port::default()
            },
            Port {
                port_no: 2,
                name: "ge-0/0/2".to_string(),
                max_speed: 10_000_000,
                ..Port::default()
            },
        ];
        let msg = Message::new(
            ProtocolVersion::V5,
            13,
            MsgBody::MultipartReply(MultipartReply {
                flags: FlagSet::new(),
                body: MultipartReplyBody::PortDesc(ports),
            }),
        );

        let wire = registry.encode_message(&msg).unwrap();
        let (decoded, _) = registry.decode_message(&wire).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_v5_port_stats_reply_unsupported() {
        let registry = CodecRegistry::with_defaults().unwrap();
        let msg = Message::new(
            ProtocolVersion::V5,
            4,
            MsgBody::MultipartReply(MultipartReply {
                flags: FlagSet::new(),
                body: MultipartReplyBody::PortStats(vec![]),
            }),
        );
        assert!(matches!(
            registry.encode_message(&msg),
            Err(CodecError::UnsupportedMultipartType {
                version: 5,
                mp_type: 4
            })
        ));
    }

    #[test]
    fn test_unknown_multipart_type_rejected() {
        let registry = CodecRegistry::with_defaults().unwrap();
        // mp_type 99 in an otherwise valid multipart request
        let wire = [
            0x04, 18, 0x00, 0x10, 0, 0, 0, 1, // header
            0, 99, 0, 0, 0, 0, 0, 0, // multipart prefix
        ];
        assert!(matches!(
            registry.decode_message(&wire),
            Err(CodecError::UnsupportedMultipartType { mp_type: 99, .. })
        ));
    }
}
