//! Port records and port flag enumerations.

use super::ExperimenterBody;
use crate::flags::FlagSet;
use serde::{Deserialize, Serialize};

/// Administrative port configuration bits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PortConfig {
    PortDown,
    /// V1 only.
    NoStp,
    NoRecv,
    /// V1 only.
    NoRecvStp,
    /// V1 only.
    NoFlood,
    NoFwd,
    NoPacketIn,
}

/// Observed port state bits.
///
/// The V1 spanning-tree bits form a multi-bit combination; decode
/// combines every set bit rather than stopping at the first match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PortState {
    LinkDown,
    /// V4/V5 only.
    Blocked,
    /// V4/V5 only.
    Live,
    /// V1 only.
    StpListen,
    /// V1 only.
    StpLearn,
}

/// Link speed and medium feature bits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PortFeature {
    Speed10MbHd,
    Speed10MbFd,
    Speed100MbHd,
    Speed100MbFd,
    Speed1GbHd,
    Speed1GbFd,
    Speed10GbFd,
    /// V4/V5 only.
    Speed40GbFd,
    /// V4/V5 only.
    Speed100GbFd,
    /// V4/V5 only.
    SpeedOtherFd,
    Copper,
    Fiber,
    Autoneg,
    Pause,
    PauseAsym,
}

/// A switch port description.
///
/// One record serves all versions: V1 ports are 48-byte fixed records
/// (16-bit port numbers, no speed fields), V4 ports are 64-byte fixed
/// records, V5 ports carry their ethernet block as a TLV property plus
/// any experimenter properties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Port {
    pub port_no: u32,
    pub hw_addr: [u8; 6],
    pub name: String,
    pub config: FlagSet<PortConfig>,
    pub state: FlagSet<PortState>,
    pub curr: FlagSet<PortFeature>,
    pub advertised: FlagSet<PortFeature>,
    pub supported: FlagSet<PortFeature>,
    pub peer: FlagSet<PortFeature>,
    /// Current speed in kbps. Not on the wire at V1.
    pub curr_speed: u32,
    /// Maximum speed in kbps. Not on the wire at V1.
    pub max_speed: u32,
    /// V5 experimenter port-description properties, wire order.
    pub experimenter_props: Vec<ExperimenterBody>,
}

/// Why a port-status message was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PortReason {
    Add = 0,
    Delete = 1,
    Modify = 2,
}

impl PortReason {
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(PortReason::Add),
            1 => Some(PortReason::Delete),
            2 => Some(PortReason::Modify),
            _ => None,
        }
    }
}

/// Port-status body: a reason and the affected port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortStatus {
    pub reason: PortReason,
    pub port: Port,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_reason_from_wire() {
        assert_eq!(PortReason::from_wire(0), Some(PortReason::Add));
        assert_eq!(PortReason::from_wire(1), Some(PortReason::Delete));
        assert_eq!(PortReason::from_wire(2), Some(PortReason::Modify));
        assert_eq!(PortReason::from_wire(3), None);
    }

    #[test]
    fn test_port_default_is_empty() {
        let port = Port::default();
        assert!(port.config.is_empty());
        assert!(port.experimenter_props.is_empty());
        assert_eq!(port.curr_speed, 0);
    }
}
