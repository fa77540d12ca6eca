//! Per-type message factories.
//!
//! One module per message family; a factory instance is registered per
//! protocol version, carrying that version's `config::VersionConfig`.
//! Factories are stateless aside from that configuration: every call
//! works exclusively on the buffer and context it is handed.

pub(crate) mod config;
mod echo;
mod error_msg;
mod experimenter;
mod features;
mod hello;
mod multipart;
mod port;
mod port_status;
mod switch_config;
mod table_features;

pub use experimenter::OpaqueExperimenter;

use crate::error::CodecError;
use crate::header::ProtocolVersion;
use crate::registry::{
    CodecRegistryBuilder, DecodeContext, EncodeContext, MessageDecoder, MessageEncoder,
};
use crate::types::{MsgBody, MsgKind};
use config::VersionConfig;
use ofwire_buffer::{WireReader, WireWriter};
use std::sync::Arc;

/// Wire type codes, version-scoped.
mod type_codes {
    pub mod v1 {
        pub const HELLO: u8 = 0;
        pub const ERROR: u8 = 1;
        pub const ECHO_REQUEST: u8 = 2;
        pub const ECHO_REPLY: u8 = 3;
        pub const VENDOR: u8 = 4;
        pub const FEATURES_REQUEST: u8 = 5;
        pub const FEATURES_REPLY: u8 = 6;
        pub const GET_CONFIG_REQUEST: u8 = 7;
        pub const GET_CONFIG_REPLY: u8 = 8;
        pub const SET_CONFIG: u8 = 9;
        pub const PORT_STATUS: u8 = 12;
        pub const BARRIER_REQUEST: u8 = 18;
        pub const BARRIER_REPLY: u8 = 19;
    }

    pub mod v4 {
        pub const HELLO: u8 = 0;
        pub const ERROR: u8 = 1;
        pub const ECHO_REQUEST: u8 = 2;
        pub const ECHO_REPLY: u8 = 3;
        pub const EXPERIMENTER: u8 = 4;
        pub const FEATURES_REQUEST: u8 = 5;
        pub const FEATURES_REPLY: u8 = 6;
        pub const GET_CONFIG_REQUEST: u8 = 7;
        pub const GET_CONFIG_REPLY: u8 = 8;
        pub const SET_CONFIG: u8 = 9;
        pub const PORT_STATUS: u8 = 12;
        pub const MULTIPART_REQUEST: u8 = 18;
        pub const MULTIPART_REPLY: u8 = 19;
        pub const BARRIER_REQUEST: u8 = 20;
        pub const BARRIER_REPLY: u8 = 21;
    }
}

/// Factory for messages whose body is empty.
struct EmptyCodec {
    body: MsgBody,
}

impl EmptyCodec {
    fn new(body: MsgBody) -> Arc<Self> {
        Arc::new(Self { body })
    }

    fn check(&self, body: &MsgBody) -> Result<(), CodecError> {
        if body.kind() != self.body.kind() {
            return Err(CodecError::bad_record(format!(
                "expected {:?} body, got {:?}",
                self.body.kind(),
                body.kind()
            )));
        }
        Ok(())
    }
}

impl MessageDecoder for EmptyCodec {
    fn decode_body(
        &self,
        _r: &mut WireReader<'_>,
        _ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError> {
        Ok(self.body.clone())
    }
}

impl MessageEncoder for EmptyCodec {
    fn body_len(&self, body: &MsgBody, _ctx: &EncodeContext<'_>) -> Result<usize, CodecError> {
        self.check(body)?;
        Ok(0)
    }

    fn encode_body(
        &self,
        body: &MsgBody,
        _w: &mut WireWriter,
        _ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError> {
        self.check(body)
    }
}

/// Writes a NUL-padded fixed-width string field.
pub(crate) fn write_fixed_str(
    w: &mut WireWriter,
    s: &str,
    width: usize,
    what: &str,
) -> Result<(), CodecError> {
    crate::types::check_name_fits(s, width, what)?;
    w.put_slice(s.as_bytes());
    w.put_zeros(width - s.len());
    Ok(())
}

/// Reads a NUL-padded fixed-width string field, truncating at the
/// first NUL. Non-UTF-8 bytes are replaced rather than rejected.
pub(crate) fn read_fixed_str(r: &mut WireReader<'_>, width: usize) -> Result<String, CodecError> {
    let raw = r.read_bytes(width)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(width);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Registers every built-in codec for every supported version.
pub(crate) fn register_builtins(b: &mut CodecRegistryBuilder) -> Result<(), CodecError> {
    for version in ProtocolVersion::all() {
        let cfg = VersionConfig::for_version(version)?;
        match version {
            ProtocolVersion::V1 => register_v1(b, cfg),
            ProtocolVersion::V4 | ProtocolVersion::V5 => register_extensible(b, cfg),
        }
    }
    Ok(())
}

fn register_common(b: &mut CodecRegistryBuilder, cfg: VersionConfig, codes: CommonCodes) {
    let v = cfg.version;

    b.register_message(v, codes.hello, MsgKind::Hello, Arc::new(hello::HelloCodec));
    b.register_message(
        v,
        codes.error,
        MsgKind::ErrorMsg,
        Arc::new(error_msg::ErrorMsgCodec),
    );
    b.register_message(
        v,
        codes.echo_request,
        MsgKind::EchoRequest,
        Arc::new(echo::EchoCodec { reply: false }),
    );
    b.register_message(
        v,
        codes.echo_reply,
        MsgKind::EchoReply,
        Arc::new(echo::EchoCodec { reply: true }),
    );
    b.register_message(
        v,
        codes.experimenter,
        MsgKind::Experimenter,
        Arc::new(experimenter::ExperimenterMsgCodec),
    );
    b.register_message(
        v,
        codes.features_request,
        MsgKind::FeaturesRequest,
        EmptyCodec::new(MsgBody::FeaturesRequest),
    );
    b.register_message(
        v,
        codes.features_reply,
        MsgKind::FeaturesReply,
        Arc::new(features::FeaturesReplyCodec { cfg }),
    );
    b.register_message(
        v,
        codes.get_config_request,
        MsgKind::GetConfigRequest,
        EmptyCodec::new(MsgBody::GetConfigRequest),
    );
    b.register_message(
        v,
        codes.get_config_reply,
        MsgKind::GetConfigReply,
        Arc::new(switch_config::SwitchConfigCodec {
            cfg,
            reply: true,
        }),
    );
    b.register_message(
        v,
        codes.set_config,
        MsgKind::SetConfig,
        Arc::new(switch_config::SwitchConfigCodec {
            cfg,
            reply: false,
        }),
    );
    b.register_message(
        v,
        codes.port_status,
        MsgKind::PortStatus,
        Arc::new(port_status::PortStatusCodec { cfg }),
    );
    b.register_message(
        v,
        codes.barrier_request,
        MsgKind::BarrierRequest,
        EmptyCodec::new(MsgBody::BarrierRequest),
    );
    b.register_message(
        v,
        codes.barrier_reply,
        MsgKind::BarrierReply,
        EmptyCodec::new(MsgBody::BarrierReply),
    );
}

struct CommonCodes {
    hello: u8,
    error: u8,
    echo_request: u8,
    echo_reply: u8,
    experimenter: u8,
    features_request: u8,
    features_reply: u8,
    get_config_request: u8,
    get_config_reply: u8,
    set_config: u8,
    port_status: u8,
    barrier_request: u8,
    barrier_reply: u8,
}

fn register_v1(b: &mut CodecRegistryBuilder, cfg: VersionConfig) {
    use type_codes::v1;
    register_common(
        b,
        cfg,
        CommonCodes {
            hello: v1::HELLO,
            error: v1::ERROR,
            echo_request: v1::ECHO_REQUEST,
            echo_reply: v1::ECHO_REPLY,
            experimenter: v1::VENDOR,
            features_request: v1::FEATURES_REQUEST,
            features_reply: v1::FEATURES_REPLY,
            get_config_request: v1::GET_CONFIG_REQUEST,
            get_config_reply: v1::GET_CONFIG_REPLY,
            set_config: v1::SET_CONFIG,
            port_status: v1::PORT_STATUS,
            barrier_request: v1::BARRIER_REQUEST,
            barrier_reply: v1::BARRIER_REPLY,
        },
    );
}

fn register_extensible(b: &mut CodecRegistryBuilder, cfg: VersionConfig) {
    use type_codes::v4;
    let v = cfg.version;
    register_common(
        b,
        cfg,
        CommonCodes {
            hello: v4::HELLO,
            error: v4::ERROR,
            echo_request: v4::ECHO_REQUEST,
            echo_reply: v4::ECHO_REPLY,
            experimenter: v4::EXPERIMENTER,
            features_request: v4::FEATURES_REQUEST,
            features_reply: v4::FEATURES_REPLY,
            get_config_request: v4::GET_CONFIG_REQUEST,
            get_config_reply: v4::GET_CONFIG_REPLY,
            set_config: v4::SET_CONFIG,
            port_status: v4::PORT_STATUS,
            barrier_request: v4::BARRIER_REQUEST,
            barrier_reply: v4::BARRIER_REPLY,
        },
    );

    b.register_message(
        v,
        v4::MULTIPART_REQUEST,
        MsgKind::MultipartRequest,
        Arc::new(multipart::MultipartRequestCodec { cfg }),
    );
    b.register_message(
        v,
        v4::MULTIPART_REPLY,
        MsgKind::MultipartReply,
        Arc::new(multipart::MultipartReplyCodec { cfg }),
    );
}
