//! Multipart (statistics) request and reply records.

use super::port::Port;
use super::table_features::TableFeatures;
use super::ExperimenterBody;
use crate::flags::FlagSet;
use serde::{Deserialize, Serialize};

/// Multipart transfer flags. `More` marks a segmented exchange with
/// further messages to follow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MultipartFlag {
    More,
}

/// Multipart request body, keyed by the wire's multipart type field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultipartRequestBody {
    /// Switch description. Empty request body.
    Desc,
    /// Per-port counters for one port, or all ports via `PORT_ANY`.
    PortStats { port_no: u32 },
    /// Table feature read (empty list) or configure (full list).
    TableFeatures(Vec<TableFeatures>),
    /// Port descriptions. Empty request body.
    PortDesc,
    /// Vendor-defined statistics.
    Experimenter(ExperimenterBody),
}

/// A multipart request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartRequest {
    pub flags: FlagSet<MultipartFlag>,
    pub body: MultipartRequestBody,
}

/// Multipart reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultipartReplyBody {
    Desc(SwitchDesc),
    PortStats(Vec<PortStats>),
    TableFeatures(Vec<TableFeatures>),
    PortDesc(Vec<Port>),
    Experimenter(ExperimenterBody),
}

/// A multipart reply message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartReply {
    pub flags: FlagSet<MultipartFlag>,
    pub body: MultipartReplyBody,
}

/// Switch description strings, NUL-padded fixed-width fields on the
/// wire (256 bytes each, 32 for the serial number).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwitchDesc {
    pub mfr_desc: String,
    pub hw_desc: String,
    pub sw_desc: String,
    pub serial_num: String,
    pub dp_desc: String,
}

/// Per-port counters (one 112-byte wire entry at V4).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortStats {
    pub port_no: u32,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_dropped: u64,
    pub tx_dropped: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
    pub rx_frame_err: u64,
    pub rx_over_err: u64,
    pub rx_crc_err: u64,
    pub collisions: u64,
    pub duration_sec: u32,
    pub duration_nsec: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_variants() {
        let req = MultipartRequest {
            flags: FlagSet::new().with(MultipartFlag::More),
            body: MultipartRequestBody::PortStats { port_no: 7 },
        };
        assert!(req.flags.contains(&MultipartFlag::More));
        assert!(matches!(
            req.body,
            MultipartRequestBody::PortStats { port_no: 7 }
        ));
    }

    #[test]
    fn test_port_stats_default() {
        let stats = PortStats::default();
        assert_eq!(stats.rx_packets, 0);
        assert_eq!(stats.duration_nsec, 0);
    }
}
