//! Per-version codec configuration.
//!
//! The factories share one pure encoding core; everything that differs
//! between protocol revisions - flag bit assignments, which fields a
//! layout carries - is captured here as data and handed to the factory
//! at registration time.

use crate::error::CodecError;
use crate::flags::BitTable;
use crate::header::ProtocolVersion;
use crate::types::multipart::MultipartFlag;
use crate::types::port::{PortConfig, PortFeature, PortState};
use crate::types::{ActionCapability, Capability, ConfigFlag};

const CAPABILITIES_V1: &[(u8, Capability)] = &[
    (0, Capability::FlowStats),
    (1, Capability::TableStats),
    (2, Capability::PortStats),
    (3, Capability::Stp),
    (5, Capability::IpReasm),
    (6, Capability::QueueStats),
    (7, Capability::ArpMatchIp),
];

const CAPABILITIES_V4: &[(u8, Capability)] = &[
    (0, Capability::FlowStats),
    (1, Capability::TableStats),
    (2, Capability::PortStats),
    (3, Capability::GroupStats),
    (5, Capability::IpReasm),
    (6, Capability::QueueStats),
    (8, Capability::PortBlocked),
];

const ACTIONS_V1: &[(u8, ActionCapability)] = &[
    (0, ActionCapability::Output),
    (1, ActionCapability::SetVlanVid),
    (2, ActionCapability::SetVlanPcp),
    (3, ActionCapability::StripVlan),
    (4, ActionCapability::SetDlSrc),
    (5, ActionCapability::SetDlDst),
    (6, ActionCapability::SetNwSrc),
    (7, ActionCapability::SetNwDst),
    (8, ActionCapability::SetNwTos),
    (9, ActionCapability::SetTpSrc),
    (10, ActionCapability::SetTpDst),
    (11, ActionCapability::Enqueue),
];

// Later versions moved action discovery into table features; the
// features-reply word became reserved and carries no flags.
const ACTIONS_NONE: &[(u8, ActionCapability)] = &[];

const CONFIG_FLAGS: &[(u8, ConfigFlag)] = &[(0, ConfigFlag::FragDrop), (1, ConfigFlag::FragReasm)];

const PORT_CONFIG_V1: &[(u8, PortConfig)] = &[
    (0, PortConfig::PortDown),
    (1, PortConfig::NoStp),
    (2, PortConfig::NoRecv),
    (3, PortConfig::NoRecvStp),
    (4, PortConfig::NoFlood),
    (5, PortConfig::NoFwd),
    (6, PortConfig::NoPacketIn),
];

const PORT_CONFIG_V4: &[(u8, PortConfig)] = &[
    (0, PortConfig::PortDown),
    (2, PortConfig::NoRecv),
    (5, PortConfig::NoFwd),
    (6, PortConfig::NoPacketIn),
];

const PORT_STATE_V1: &[(u8, PortState)] = &[
    (0, PortState::LinkDown),
    (8, PortState::StpListen),
    (9, PortState::StpLearn),
];

const PORT_STATE_V4: &[(u8, PortState)] = &[
    (0, PortState::LinkDown),
    (1, PortState::Blocked),
    (2, PortState::Live),
];

const PORT_FEATURES_V1: &[(u8, PortFeature)] = &[
    (0, PortFeature::Speed10MbHd),
    (1, PortFeature::Speed10MbFd),
    (2, PortFeature::Speed100MbHd),
    (3, PortFeature::Speed100MbFd),
    (4, PortFeature::Speed1GbHd),
    (5, PortFeature::Speed1GbFd),
    (6, PortFeature::Speed10GbFd),
    (7, PortFeature::Copper),
    (8, PortFeature::Fiber),
    (9, PortFeature::Autoneg),
    (10, PortFeature::Pause),
    (11, PortFeature::PauseAsym),
];

const PORT_FEATURES_V4: &[(u8, PortFeature)] = &[
    (0, PortFeature::Speed10MbHd),
    (1, PortFeature::Speed10MbFd),
    (2, PortFeature::Speed100MbHd),
    (3, PortFeature::Speed100MbFd),
    (4, PortFeature::Speed1GbHd),
    (5, PortFeature::Speed1GbFd),
    (6, PortFeature::Speed10GbFd),
    (7, PortFeature::Speed40GbFd),
    (8, PortFeature::Speed100GbFd),
    (9, PortFeature::SpeedOtherFd),
    (10, PortFeature::Copper),
    (11, PortFeature::Fiber),
    (12, PortFeature::Autoneg),
    (13, PortFeature::Pause),
    (14, PortFeature::PauseAsym),
];

const MULTIPART_FLAGS: &[(u8, MultipartFlag)] = &[(0, MultipartFlag::More)];

/// Everything version-specific the factories consult, validated once
/// at registry construction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VersionConfig {
    pub version: ProtocolVersion,
    pub capabilities: BitTable<Capability>,
    pub actions: BitTable<ActionCapability>,
    pub config_flags: BitTable<ConfigFlag>,
    pub port_config: BitTable<PortConfig>,
    pub port_state: BitTable<PortState>,
    pub port_features: BitTable<PortFeature>,
    pub multipart_flags: BitTable<MultipartFlag>,
}

impl VersionConfig {
    pub fn for_version(version: ProtocolVersion) -> Result<Self, CodecError> {
        let v1 = version == ProtocolVersion::V1;
        Ok(Self {
            version,
            capabilities: BitTable::new(if v1 { CAPABILITIES_V1 } else { CAPABILITIES_V4 })?,
            actions: BitTable::new(if v1 { ACTIONS_V1 } else { ACTIONS_NONE })?,
            config_flags: BitTable::new(CONFIG_FLAGS)?,
            port_config: BitTable::new(if v1 { PORT_CONFIG_V1 } else { PORT_CONFIG_V4 })?,
            port_state: BitTable::new(if v1 { PORT_STATE_V1 } else { PORT_STATE_V4 })?,
            port_features: BitTable::new(if v1 { PORT_FEATURES_V1 } else { PORT_FEATURES_V4 })?,
            multipart_flags: BitTable::new(MULTIPART_FLAGS)?,
        })
    }
}
