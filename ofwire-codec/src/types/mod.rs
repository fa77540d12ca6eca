//! Plain data records for decoded messages.
//!
//! These are the structured values the codec produces and consumes.
//! They carry no wire logic; field layouts, type codes, and per-version
//! differences live in the codecs. One record type serves every
//! protocol version of a logical message; fields a version does not
//! carry decode to their default and are ignored (or rejected, where
//! silently dropping data would lie) on encode.

pub mod multipart;
pub mod port;
pub mod table_features;

pub use multipart::{
    MultipartFlag, MultipartReply, MultipartReplyBody, MultipartRequest, MultipartRequestBody,
    PortStats, SwitchDesc,
};
pub use port::{Port, PortConfig, PortFeature, PortReason, PortState, PortStatus};
pub use table_features::{ActionId, InstructionId, TableFeatureProp, TableFeatures};

use crate::error::CodecError;
use crate::flags::FlagSet;
use crate::header::ProtocolVersion;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A complete protocol message: addressing fields plus a typed body.
///
/// The wire type code and length are derived during encode; the
/// transaction id is caller-assigned and opaque to the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub version: ProtocolVersion,
    pub xid: u32,
    pub body: MsgBody,
}

impl Message {
    pub fn new(version: ProtocolVersion, xid: u32, body: MsgBody) -> Self {
        Self { version, xid, body }
    }

    /// Semantic kind of this message, the serializer-side registry key.
    pub fn kind(&self) -> MsgKind {
        self.body.kind()
    }
}

/// Semantic message kinds, version-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgKind {
    Hello,
    ErrorMsg,
    EchoRequest,
    EchoReply,
    Experimenter,
    FeaturesRequest,
    FeaturesReply,
    GetConfigRequest,
    GetConfigReply,
    SetConfig,
    PortStatus,
    MultipartRequest,
    MultipartReply,
    BarrierRequest,
    BarrierReply,
}

/// Message bodies as a closed sum type.
///
/// Experimenter extension happens through the registry's experimenter
/// tables, never by widening this enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgBody {
    Hello(Hello),
    ErrorMsg(ErrorMsg),
    EchoRequest(Bytes),
    EchoReply(Bytes),
    Experimenter(ExperimenterBody),
    FeaturesRequest,
    FeaturesReply(SwitchFeatures),
    GetConfigRequest,
    GetConfigReply(SwitchConfig),
    SetConfig(SwitchConfig),
    PortStatus(PortStatus),
    MultipartRequest(MultipartRequest),
    MultipartReply(MultipartReply),
    BarrierRequest,
    BarrierReply,
}

impl MsgBody {
    pub fn kind(&self) -> MsgKind {
        match self {
            MsgBody::Hello(_) => MsgKind::Hello,
            MsgBody::ErrorMsg(_) => MsgKind::ErrorMsg,
            MsgBody::EchoRequest(_) => MsgKind::EchoRequest,
            MsgBody::EchoReply(_) => MsgKind::EchoReply,
            MsgBody::Experimenter(_) => MsgKind::Experimenter,
            MsgBody::FeaturesRequest => MsgKind::FeaturesRequest,
            MsgBody::FeaturesReply(_) => MsgKind::FeaturesReply,
            MsgBody::GetConfigRequest => MsgKind::GetConfigRequest,
            MsgBody::GetConfigReply(_) => MsgKind::GetConfigReply,
            MsgBody::SetConfig(_) => MsgKind::SetConfig,
            MsgBody::PortStatus(_) => MsgKind::PortStatus,
            MsgBody::MultipartRequest(_) => MsgKind::MultipartRequest,
            MsgBody::MultipartReply(_) => MsgKind::MultipartReply,
            MsgBody::BarrierRequest => MsgKind::BarrierRequest,
            MsgBody::BarrierReply => MsgKind::BarrierReply,
        }
    }
}

/// Hello body: version negotiation elements (empty at V1).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hello {
    pub elements: Vec<HelloElem>,
}

/// Hello elements. Unknown element types are skipped on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HelloElem {
    /// Bitmap of supported wire versions: bit `n` of word `w` set
    /// means version `32 * w + n` is spoken.
    VersionBitmap(Vec<u32>),
}

/// Error notification: a type/code pair plus the offending bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMsg {
    pub err_type: u16,
    pub code: u16,
    pub data: Bytes,
}

/// Experimenter (vendor) message body.
///
/// At V1 the wire carries no subtype; `exp_type` decodes as zero and
/// must be zero to encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimenterBody {
    pub experimenter: u32,
    pub exp_type: u32,
    pub data: Bytes,
}

/// Switch capability bits advertised in a features reply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Capability {
    FlowStats,
    TableStats,
    PortStats,
    /// V1 only.
    Stp,
    /// V4/V5 only.
    GroupStats,
    IpReasm,
    QueueStats,
    /// V1 only.
    ArpMatchIp,
    /// V4/V5 only.
    PortBlocked,
}

/// Action kinds a V1 switch advertises support for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ActionCapability {
    Output,
    SetVlanVid,
    SetVlanPcp,
    StripVlan,
    SetDlSrc,
    SetDlDst,
    SetNwSrc,
    SetNwDst,
    SetNwTos,
    SetTpSrc,
    SetTpDst,
    Enqueue,
}

/// Features reply body.
///
/// `auxiliary_id` exists from V4 on; `actions` and `ports` exist only
/// at V1 (later versions report ports via multipart).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwitchFeatures {
    pub datapath_id: u64,
    pub n_buffers: u32,
    pub n_tables: u8,
    pub auxiliary_id: u8,
    pub capabilities: FlagSet<Capability>,
    pub actions: FlagSet<ActionCapability>,
    pub ports: Vec<Port>,
}

/// Fragment handling flags in a switch config.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ConfigFlag {
    FragDrop,
    FragReasm,
}

/// Get-config reply / set-config body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub flags: FlagSet<ConfigFlag>,
    pub miss_send_len: u16,
}

/// Validates a NUL-padded fixed-width name field on the encode path.
pub(crate) fn check_name_fits(
    name: &str,
    width: usize,
    what: &str,
) -> Result<(), CodecError> {
    // One byte is reserved for the terminating NUL.
    if name.len() >= width {
        return Err(CodecError::bad_record(format!(
            "{what} of {} bytes does not fit a {width}-byte field",
            name.len()
        )));
    }
    Ok(())
}
