//! Port description structure, shared by features replies (V1),
//! port-status messages, and port-desc multipart replies.
//!
//! Three wire shapes for one record:
//! - V1: 48-byte fixed entry with a 16-bit port number and no speeds
//! - V4: 64-byte fixed entry
//! - V5: length-prefixed entry carrying its ethernet block as a TLV
//!   property, plus optional experimenter properties

use super::config::VersionConfig;
use crate::error::CodecError;
use crate::registry::{DecodeContext, EncodeContext, ExperimenterSpace};
use crate::types::port::Port;
use crate::types::ExperimenterBody;
use crate::{tlv, ProtocolVersion};
use bytes::Bytes;
use ofwire_buffer::{WireReader, WireWriter};
use tracing::debug;

const PORT_V1_LEN: usize = 48;
const PORT_V4_LEN: usize = 64;
/// V5 fixed prefix before the property list.
const PORT_V5_PREFIX: usize = 40;

const PROP_ETHERNET: u16 = 0;
const PROP_EXPERIMENTER: u16 = 0xFFFF;
/// Ethernet property: 4-byte header, 4 pad bytes, six 32-bit words.
const ETHERNET_PROP_LEN: usize = 32;

/// Pure wire size of one port at the context's version.
pub(crate) fn port_len(
    cfg: &VersionConfig,
    ctx: &EncodeContext<'_>,
    port: &Port,
) -> Result<usize, CodecError> {
    match cfg.version {
        ProtocolVersion::V1 => Ok(PORT_V1_LEN),
        ProtocolVersion::V4 => Ok(PORT_V4_LEN),
        ProtocolVersion::V5 => {
            let mut len = PORT_V5_PREFIX + ETHERNET_PROP_LEN;
            for prop in &port.experimenter_props {
                len += tlv::property_len(8 + experimenter_payload_len(ctx, prop)?);
            }
            Ok(len)
        }
    }
}

fn experimenter_payload_len(
    ctx: &EncodeContext<'_>,
    prop: &ExperimenterBody,
) -> Result<usize, CodecError> {
    match ctx.registry.find_experimenter_encoder(
        ctx.version,
        ExperimenterSpace::PortDescProperty,
        prop.experimenter,
    ) {
        Some(encoder) => encoder.payload_len(prop),
        None => Ok(prop.data.len()),
    }
}

pub(crate) fn encode_port(
    cfg: &VersionConfig,
    ctx: &EncodeContext<'_>,
    port: &Port,
    w: &mut WireWriter,
) -> Result<(), CodecError> {
    if cfg.version != ProtocolVersion::V5 && !port.experimenter_props.is_empty() {
        return Err(CodecError::bad_record(format!(
            "port properties are not expressible at version {:#04x}",
            cfg.version.wire_byte()
        )));
    }

    match cfg.version {
        ProtocolVersion::V1 => {
            if port.port_no > u16::MAX as u32 {
                return Err(CodecError::bad_record(format!(
                    "port number {} does not fit the 16-bit V1 field",
                    port.port_no
                )));
            }
            if port.curr_speed != 0 || port.max_speed != 0 {
                return Err(CodecError::bad_record(
                    "port speeds are not expressible at version 0x01",
                ));
            }
            w.put_u16(port.port_no as u16);
            w.put_slice(&port.hw_addr);
            super::write_fixed_str(w, &port.name, 16, "port name")?;
            w.put_u32(cfg.port_config.pack(&port.config));
            w.put_u32(cfg.port_state.pack(&port.state));
            w.put_u32(cfg.port_features.pack(&port.curr));
            w.put_u32(cfg.port_features.pack(&port.advertised));
            w.put_u32(cfg.port_features.pack(&port.supported));
            w.put_u32(cfg.port_features.pack(&port.peer));
        }
        ProtocolVersion::V4 => {
            w.put_u32(port.port_no);
            w.put_zeros(4);
            w.put_slice(&port.hw_addr);
            w.put_zeros(2);
            super::write_fixed_str(w, &port.name, 16, "port name")?;
            w.put_u32(cfg.port_config.pack(&port.config));
            w.put_u32(cfg.port_state.pack(&port.state));
            w.put_u32(cfg.port_features.pack(&port.curr));
            w.put_u32(cfg.port_features.pack(&port.advertised));
            w.put_u32(cfg.port_features.pack(&port.supported));
            w.put_u32(cfg.port_features.pack(&port.peer));
            w.put_u32(port.curr_speed);
            w.put_u32(port.max_speed);
        }
        ProtocolVersion::V5 => {
            let total = port_len(cfg, ctx, port)?;
            if total > u16::MAX as usize {
                return Err(CodecError::bad_record(format!(
                    "port entry of {total} bytes exceeds its 16-bit length field"
                )));
            }
            let start = w.position();
            w.put_u32(port.port_no);
            w.put_u16(total as u16);
            w.put_zeros(2);
            w.put_slice(&port.hw_addr);
            w.put_zeros(2);
            super::write_fixed_str(w, &port.name, 16, "port name")?;
            w.put_u32(cfg.port_config.pack(&port.config));
            w.put_u32(cfg.port_state.pack(&port.state));

            tlv::write_property(w, PROP_ETHERNET, |w| {
                w.put_zeros(4);
                w.put_u32(cfg.port_features.pack(&port.curr));
                w.put_u32(cfg.port_features.pack(&port.advertised));
                w.put_u32(cfg.port_features.pack(&port.supported));
                w.put_u32(cfg.port_features.pack(&port.peer));
                w.put_u32(port.curr_speed);
                w.put_u32(port.max_speed);
                Ok(())
            })?;
            for prop in &port.experimenter_props {
                tlv::write_property(w, PROP_EXPERIMENTER, |w| {
                    w.put_u32(prop.experimenter);
                    w.put_u32(prop.exp_type);
                    match ctx.registry.find_experimenter_encoder(
                        ctx.version,
                        ExperimenterSpace::PortDescProperty,
                        prop.experimenter,
                    ) {
                        Some(encoder) => encoder.encode_payload(prop, w),
                        None => {
                            w.put_slice(&prop.data);
                            Ok(())
                        }
                    }
                })?;
            }

            let written = w.position() - start;
            if written != total {
                debug_assert_eq!(written, total, "port_len and encode_port disagree");
                return Err(CodecError::EncodeLengthMismatch {
                    context: "port",
                    computed: total,
                    written,
                });
            }
        }
    }
    Ok(())
}

pub(crate) fn decode_port(
    cfg: &VersionConfig,
    ctx: &DecodeContext<'_>,
    r: &mut WireReader<'_>,
) -> Result<Port, CodecError> {
    let mut port = Port::default();

    match cfg.version {
        ProtocolVersion::V1 => {
            port.port_no = r.read_u16()? as u32;
            port.hw_addr = r.read_array()?;
            port.name = super::read_fixed_str(r, 16)?;
            port.config = cfg.port_config.unpack(r.read_u32()?);
            port.state = cfg.port_state.unpack(r.read_u32()?);
            port.curr = cfg.port_features.unpack(r.read_u32()?);
            port.advertised = cfg.port_features.unpack(r.read_u32()?);
            port.supported = cfg.port_features.unpack(r.read_u32()?);
            port.peer = cfg.port_features.unpack(r.read_u32()?);
        }
        ProtocolVersion::V4 => {
            port.port_no = r.read_u32()?;
            r.skip(4)?;
            port.hw_addr = r.read_array()?;
            r.skip(2)?;
            port.name = super::read_fixed_str(r, 16)?;
            port.config = cfg.port_config.unpack(r.read_u32()?);
            port.state = cfg.port_state.unpack(r.read_u32()?);
            port.curr = cfg.port_features.unpack(r.read_u32()?);
            port.advertised = cfg.port_features.unpack(r.read_u32()?);
            port.supported = cfg.port_features.unpack(r.read_u32()?);
            port.peer = cfg.port_features.unpack(r.read_u32()?);
            port.curr_speed = r.read_u32()?;
            port.max_speed = r.read_u32()?;
        }
        ProtocolVersion::V5 => {
            port.port_no = r.read_u32()?;
            let length = r.read_u16()? as usize;
            if length < PORT_V5_PREFIX {
                return Err(CodecError::InvalidFieldValue {
                    field: "port entry length",
                    value: length as u32,
                });
            }
            // The length covers the whole entry; the first 6 bytes are
            // already consumed.
            let mut entry = r.sub_reader(length - 6)?;
            entry.skip(2)?;
            port.hw_addr = entry.read_array()?;
            entry.skip(2)?;
            port.name = super::read_fixed_str(&mut entry, 16)?;
            port.config = cfg.port_config.unpack(entry.read_u32()?);
            port.state = cfg.port_state.unpack(entry.read_u32()?);

            let props_len = entry.remaining();
            let mut props = tlv::PropertyReader::new(&mut entry, props_len, "port_desc")?;
            while let Some(mut prop) = props.next()? {
                match prop.type_code {
                    PROP_ETHERNET => {
                        prop.payload.skip(4)?;
                        port.curr = cfg.port_features.unpack(prop.payload.read_u32()?);
                        port.advertised = cfg.port_features.unpack(prop.payload.read_u32()?);
                        port.supported = cfg.port_features.unpack(prop.payload.read_u32()?);
                        port.peer = cfg.port_features.unpack(prop.payload.read_u32()?);
                        port.curr_speed = prop.payload.read_u32()?;
                        port.max_speed = prop.payload.read_u32()?;
                    }
                    PROP_EXPERIMENTER => {
                        let experimenter = prop.payload.read_u32()?;
                        let exp_type = prop.payload.read_u32()?;
                        let decoded = match ctx.registry.find_experimenter_decoder(
                            ctx.version,
                            ExperimenterSpace::PortDescProperty,
                            experimenter,
                        ) {
                            Some(decoder) => {
                                decoder.decode(experimenter, exp_type, &mut prop.payload)?
                            }
                            None => ExperimenterBody {
                                experimenter,
                                exp_type,
                                data: Bytes::copy_from_slice(prop.payload.read_rest()),
                            },
                        };
                        port.experimenter_props.push(decoded);
                    }
                    other => {
                        debug!(
                            property_type = other,
                            "skipping unrecognized port description property"
                        );
                    }
                }
            }
        }
    }

    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagSet;
    use crate::registry::CodecRegistry;
    use crate::types::port::{PortConfig, PortFeature, PortState};

    fn sample_port() -> Port {
        Port {
            port_no: 7,
            hw_addr: [0x02, 0, 0, 0, 0, 0x07],
            name: "eth7".to_string(),
            config: FlagSet::new().with(PortConfig::NoFwd),
            state: FlagSet::new().with(PortState::LinkDown),
            curr: FlagSet::new()
                .with(PortFeature::Speed1GbFd)
                .with(PortFeature::Copper),
            advertised: FlagSet::new().with(PortFeature::Speed1GbFd),
            supported: FlagSet::new()
                .with(PortFeature::Speed1GbFd)
                .with(PortFeature::Speed10GbFd),
            peer: FlagSet::new(),
            curr_speed: 1_000_000,
            max_speed: 10_000_000,
            experimenter_props: Vec::new(),
        }
    }

    fn roundtrip(version: ProtocolVersion, port: &Port) -> Port {
        let registry = CodecRegistry::with_defaults().unwrap();
        let cfg = VersionConfig::for_version(version).unwrap();
        let ectx = EncodeContext {
            registry: &registry,
            version,
        };
        let mut w = WireWriter::new();
        encode_port(&cfg, &ectx, port, &mut w).unwrap();
        assert_eq!(
            w.position(),
            port_len(&cfg, &ectx, port).unwrap(),
            "declared and written port sizes must agree"
        );

        let written = w.into_inner();
        let dctx = DecodeContext {
            registry: &registry,
            version,
        };
        let mut r = WireReader::new(&written);
        let decoded = decode_port(&cfg, &dctx, &mut r).unwrap();
        assert!(r.is_empty());
        decoded
    }

    #[test]
    fn test_v4_port_roundtrip() {
        let port = sample_port();
        assert_eq!(roundtrip(ProtocolVersion::V4, &port), port);
    }

    #[test]
    fn test_v5_port_roundtrip() {
        let port = sample_port();
        assert_eq!(roundtrip(ProtocolVersion::V5, &port), port);
    }

    #[test]
    fn test_v5_port_with_experimenter_prop() {
        let mut port = sample_port();
        port.experimenter_props.push(ExperimenterBody {
            experimenter: 0xCAFE,
            exp_type: 2,
            data: Bytes::from_static(b"\x01\x02\x03"),
        });
        assert_eq!(roundtrip(ProtocolVersion::V5, &port), port);
    }

    #[test]
    fn test_v1_port_roundtrip_without_speeds() {
        let mut port = sample_port();
        port.curr_speed = 0;
        port.max_speed = 0;
        assert_eq!(roundtrip(ProtocolVersion::V1, &port), port);
    }

    #[test]
    fn test_v1_rejects_wide_port_number() {
        let registry = CodecRegistry::with_defaults().unwrap();
        let cfg = VersionConfig::for_version(ProtocolVersion::V1).unwrap();
        let ctx = EncodeContext {
            registry: &registry,
            version: ProtocolVersion::V1,
        };
        let mut port = sample_port();
        port.port_no = 0x1_0000;
        port.curr_speed = 0;
        port.max_speed = 0;

        let mut w = WireWriter::new();
        assert!(matches!(
            encode_port(&cfg, &ctx, &port, &mut w),
            Err(CodecError::BadRecord { .. })
        ));
    }

    #[test]
    fn test_v1_wire_size() {
        let registry = CodecRegistry::with_defaults().unwrap();
        let cfg = VersionConfig::for_version(ProtocolVersion::V1).unwrap();
        let ctx = EncodeContext {
            registry: &registry,
            version: ProtocolVersion::V1,
        };
        let mut port = sample_port();
        port.curr_speed = 0;
        port.max_speed = 0;

        let mut w = WireWriter::new();
        encode_port(&cfg, &ctx, &port, &mut w).unwrap();
        assert_eq!(w.position(), 48);
    }

    #[test]
    fn test_v5_unknown_property_skipped() {
        // Hand-build a V5 port with an unknown property between the
        // prefix and the ethernet block.
        let registry = CodecRegistry::with_defaults().unwrap();
        let cfg = VersionConfig::for_version(ProtocolVersion::V5).unwrap();
        let mut w = WireWriter::new();
        w.put_u32(3); // port_no
        w.put_u16((PORT_V5_PREFIX + 8) as u16); // prefix + unknown prop
        w.put_zeros(2);
        w.put_slice(&[0; 6]);
        w.put_zeros(2);
        super::super::write_fixed_str(&mut w, "p3", 16, "port name").unwrap();
        w.put_u32(0);
        w.put_u32(0);
        tlv::write_property(&mut w, 0x7770, |w| {
            w.put_u32(0xFFFF_FFFF);
            Ok(())
        })
        .unwrap();

        let written = w.into_inner();
        let dctx = DecodeContext {
            registry: &registry,
            version: ProtocolVersion::V5,
        };
        let mut r = WireReader::new(&written);
        let port = decode_port(&cfg, &dctx, &mut r).unwrap();
        assert_eq!(port.port_no, 3);
        assert_eq!(port.name, "p3");
        assert!(port.curr.is_empty());
    }
}
