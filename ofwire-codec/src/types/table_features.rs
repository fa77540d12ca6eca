//! Table-features records: per-table capability descriptions built
//! from TLV properties.

use super::ExperimenterBody;
use serde::{Deserialize, Serialize};

/// One flow-table description from a table-features multipart exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableFeatures {
    pub table_id: u8,
    pub name: String,
    pub metadata_match: u64,
    pub metadata_write: u64,
    /// Raw table config word, carried through as-is.
    pub config: u32,
    pub max_entries: u32,
    /// Properties in wire order.
    pub properties: Vec<TableFeatureProp>,
}

/// An instruction identifier inside an instructions property
/// (4 bytes on the wire: type + length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionId {
    pub instr_type: u16,
}

/// An action identifier inside an actions property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionId {
    pub action_type: u16,
}

/// Table-features properties.
///
/// The `miss` flavor of a property describes the table-miss flow
/// entry; on the wire it is the property type code plus one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableFeatureProp {
    Instructions { miss: bool, ids: Vec<InstructionId> },
    NextTables { miss: bool, table_ids: Vec<u8> },
    WriteActions { miss: bool, ids: Vec<ActionId> },
    ApplyActions { miss: bool, ids: Vec<ActionId> },
    Match { ids: Vec<u32> },
    Wildcards { ids: Vec<u32> },
    WriteSetfield { miss: bool, ids: Vec<u32> },
    ApplySetfield { miss: bool, ids: Vec<u32> },
    Experimenter { miss: bool, body: ExperimenterBody },
}
