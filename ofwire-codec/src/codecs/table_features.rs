//! Table-features entries: a fixed prefix followed by a TLV property
//! list, the whole entry length-prefixed and 8-byte aligned.

use crate::error::CodecError;
use crate::registry::{DecodeContext, EncodeContext, ExperimenterSpace};
use crate::types::table_features::{ActionId, InstructionId, TableFeatureProp, TableFeatures};
use crate::types::ExperimenterBody;
use crate::{align, tlv};
use bytes::Bytes;
use ofwire_buffer::{WireReader, WireWriter};
use tracing::debug;

/// Fixed entry bytes before the property list, length field included.
const ENTRY_FIXED_LEN: usize = 64;

const PROP_INSTRUCTIONS: u16 = 0;
const PROP_NEXT_TABLES: u16 = 2;
const PROP_WRITE_ACTIONS: u16 = 4;
const PROP_APPLY_ACTIONS: u16 = 6;
const PROP_MATCH: u16 = 8;
const PROP_WILDCARDS: u16 = 10;
const PROP_WRITE_SETFIELD: u16 = 12;
const PROP_APPLY_SETFIELD: u16 = 14;
const PROP_EXPERIMENTER: u16 = 0xFFFE;
const PROP_EXPERIMENTER_MISS: u16 = 0xFFFF;

/// Wire type code of a property; the miss flavor is the base code
/// plus one (experimenter-miss uses its own reserved code).
fn prop_type_code(prop: &TableFeatureProp) -> u16 {
    let (base, miss) = match prop {
        TableFeatureProp::Instructions { miss, .. } => (PROP_INSTRUCTIONS, *miss),
        TableFeatureProp::NextTables { miss, .. } => (PROP_NEXT_TABLES, *miss),
        TableFeatureProp::WriteActions { miss, .. } => (PROP_WRITE_ACTIONS, *miss),
        TableFeatureProp::ApplyActions { miss, .. } => (PROP_APPLY_ACTIONS, *miss),
        TableFeatureProp::Match { .. } => (PROP_MATCH, false),
        TableFeatureProp::Wildcards { .. } => (PROP_WILDCARDS, false),
        TableFeatureProp::WriteSetfield { miss, .. } => (PROP_WRITE_SETFIELD, *miss),
        TableFeatureProp::ApplySetfield { miss, .. } => (PROP_APPLY_SETFIELD, *miss),
        TableFeatureProp::Experimenter { miss, .. } => {
            return if *miss {
                PROP_EXPERIMENTER_MISS
            } else {
                PROP_EXPERIMENTER
            };
        }
    };
    base + u16::from(miss)
}

fn prop_payload_len(
    ctx: &EncodeContext<'_>,
    prop: &TableFeatureProp,
) -> Result<usize, CodecError> {
    Ok(match prop {
        TableFeatureProp::Instructions { ids, .. } => 4 * ids.len(),
        TableFeatureProp::NextTables { table_ids, .. } => table_ids.len(),
        TableFeatureProp::WriteActions { ids, .. }
        | TableFeatureProp::ApplyActions { ids, .. } => 4 * ids.len(),
        TableFeatureProp::Match { ids }
        | TableFeatureProp::Wildcards { ids }
        | TableFeatureProp::WriteSetfield { ids, .. }
        | TableFeatureProp::ApplySetfield { ids, .. } => 4 * ids.len(),
        TableFeatureProp::Experimenter { body, .. } => {
            let payload = match ctx.registry.find_experimenter_encoder(
                ctx.version,
                ExperimenterSpace::TableFeatureProperty,
                body.experimenter,
            ) {
                Some(encoder) => encoder.payload_len(body)?,
                None => body.data.len(),
            };
            8 + payload
        }
    })
}

/// Pure wire size of one entry, properties and pads included.
pub(crate) fn entry_len(
    ctx: &EncodeContext<'_>,
    entry: &TableFeatures,
) -> Result<usize, CodecError> {
    let mut len = ENTRY_FIXED_LEN;
    for prop in &entry.properties {
        len += tlv::property_len(prop_payload_len(ctx, prop)?);
    }
    Ok(len)
}

pub(crate) fn encode_entry(
    ctx: &EncodeContext<'_>,
    entry: &TableFeatures,
    w: &mut WireWriter,
) -> Result<(), CodecError> {
    let total = entry_len(ctx, entry)?;
    if total > u16::MAX as usize {
        return Err(CodecError::bad_record(format!(
            "table-features entry of {total} bytes exceeds its 16-bit length field"
        )));
    }

    let start = w.position();
    w.put_u16(total as u16);
    w.put_u8(entry.table_id);
    w.put_zeros(5);
    super::write_fixed_str(w, &entry.name, 32, "table name")?;
    w.put_u64(entry.metadata_match);
    w.put_u64(entry.metadata_write);
    w.put_u32(entry.config);
    w.put_u32(entry.max_entries);

    for prop in &entry.properties {
        encode_prop(ctx, prop, w)?;
    }

    let written = w.position() - start;
    if written != total {
        debug_assert_eq!(written, total, "entry_len and encode_entry disagree");
        return Err(CodecError::EncodeLengthMismatch {
            context: "table_features",
            computed: total,
            written,
        });
    }
    align::write_padding(w, total);
    Ok(())
}

fn encode_prop(
    ctx: &EncodeContext<'_>,
    prop: &TableFeatureProp,
    w: &mut WireWriter,
) -> Result<(), CodecError> {
    tlv::write_property(w, prop_type_code(prop), |w| {
        match prop {
            TableFeatureProp::Instructions { ids, .. } => {
                for id in ids {
                    w.put_u16(id.instr_type);
                    w.put_u16(4);
                }
            }
            TableFeatureProp::NextTables { table_ids, .. } => {
                w.put_slice(table_ids);
            }
            TableFeatureProp::WriteActions { ids, .. }
            | TableFeatureProp::ApplyActions { ids, .. } => {
                for id in ids {
                    w.put_u16(id.action_type);
                    w.put_u16(4);
                }
            }
            TableFeatureProp::Match { ids }
            | TableFeatureProp::Wildcards { ids }
            | TableFeatureProp::WriteSetfield { ids, .. }
            | TableFeatureProp::ApplySetfield { ids, .. } => {
                for &id in ids {
                    w.put_u32(id);
                }
            }
            TableFeatureProp::Experimenter { body, .. } => {
                w.put_u32(body.experimenter);
                w.put_u32(body.exp_type);
                match ctx.registry.find_experimenter_encoder(
                    ctx.version,
                    ExperimenterSpace::TableFeatureProperty,
                    body.experimenter,
                ) {
                    Some(encoder) => encoder.encode_payload(body, w)?,
                    None => w.put_slice(&body.data),
                }
            }
        }
        Ok(())
    })
}

pub(crate) fn decode_entry(
    ctx: &DecodeContext<'_>,
    r: &mut WireReader<'_>,
) -> Result<TableFeatures, CodecError> {
    let length = r.read_u16()? as usize;
    if length < ENTRY_FIXED_LEN {
        return Err(CodecError::InvalidFieldValue {
            field: "table-features entry length",
            value: length as u32,
        });
    }
    let available = r.remaining();
    let mut entry_r =
        r.sub_reader(length - 2)
            .map_err(|_| CodecError::TruncatedOrOverrunProperty {
                context: "table_features",
                expected: length - 2,
                actual: available,
            })?;

    let mut entry = TableFeatures {
        table_id: entry_r.read_u8()?,
        ..TableFeatures::default()
    };
    entry_r.skip(5)?;
    entry.name = super::read_fixed_str(&mut entry_r, 32)?;
    entry.metadata_match = entry_r.read_u64()?;
    entry.metadata_write = entry_r.read_u64()?;
    entry.config = entry_r.read_u32()?;
    entry.max_entries = entry_r.read_u32()?;

    let props_len = entry_r.remaining();
    let mut props = tlv::PropertyReader::new(&mut entry_r, props_len, "table_features")?;
    while let Some(mut prop) = props.next()? {
        let miss = prop.type_code & 1 == 1;
        match prop.type_code {
            PROP_INSTRUCTIONS | 1 => {
                entry.properties.push(TableFeatureProp::Instructions {
                    miss,
                    ids: decode_instruction_ids(&mut prop.payload)?,
                });
            }
            PROP_NEXT_TABLES | 3 => {
                entry.properties.push(TableFeatureProp::NextTables {
                    miss,
                    table_ids: prop.payload.read_rest().to_vec(),
                });
            }
            PROP_WRITE_ACTIONS | 5 => {
                entry.properties.push(TableFeatureProp::WriteActions {
                    miss,
                    ids: decode_action_ids(&mut prop.payload)?,
                });
            }
            PROP_APPLY_ACTIONS | 7 => {
                entry.properties.push(TableFeatureProp::ApplyActions {
                    miss,
                    ids: decode_action_ids(&mut prop.payload)?,
                });
            }
            PROP_MATCH => {
                entry.properties.push(TableFeatureProp::Match {
                    ids: decode_oxm_ids(&mut prop.payload)?,
                });
            }
            PROP_WILDCARDS => {
                entry.properties.push(TableFeatureProp::Wildcards {
                    ids: decode_oxm_ids(&mut prop.payload)?,
                });
            }
            PROP_WRITE_SETFIELD | 13 => {
                entry.properties.push(TableFeatureProp::WriteSetfield {
                    miss,
                    ids: decode_oxm_ids(&mut prop.payload)?,
                });
            }
            PROP_APPLY_SETFIELD | 15 => {
                entry.properties.push(TableFeatureProp::ApplySetfield {
                    miss,
                    ids: decode_oxm_ids(&mut prop.payload)?,
                });
            }
            PROP_EXPERIMENTER | PROP_EXPERIMENTER_MISS => {
                let miss = prop.type_code == PROP_EXPERIMENTER_MISS;
                let experimenter = prop.payload.read_u32()?;
                let exp_type = prop.payload.read_u32()?;
                let body = match ctx.registry.find_experimenter_decoder(
                    ctx.version,
                    ExperimenterSpace::TableFeatureProperty,
                    experimenter,
                ) {
                    Some(decoder) => decoder.decode(experimenter, exp_type, &mut prop.payload)?,
                    None => ExperimenterBody {
                        experimenter,
                        exp_type,
                        data: Bytes::copy_from_slice(prop.payload.read_rest()),
                    },
                };
                entry
                    .properties
                    .push(TableFeatureProp::Experimenter { miss, body });
            }
            other => {
                debug!(
                    property_type = other,
                    table_id = entry.table_id,
                    "skipping unrecognized table-features property"
                );
            }
        }
    }

    // Entry lengths are 8-aligned on a conforming wire; skip anything a
    // sloppy peer left between entries, clamped to the parent range.
    let pad = align::padding_for(length).min(r.remaining());
    r.skip(pad)?;
    Ok(entry)
}

fn decode_instruction_ids(
    payload: &mut WireReader<'_>,
) -> Result<Vec<InstructionId>, CodecError> {
    let mut ids = Vec::with_capacity(payload.remaining() / 4);
    while !payload.is_empty() {
        let instr_type = payload.read_u16()?;
        let len = payload.read_u16()? as usize;
        if len < 4 {
            return Err(CodecError::InvalidFieldValue {
                field: "instruction id length",
                value: len as u32,
            });
        }
        // Experimenter instruction ids carry extra bytes; the id is
        // all the table cares about.
        payload.skip(len - 4)?;
        ids.push(InstructionId { instr_type });
    }
    Ok(ids)
}

fn decode_action_ids(payload: &mut WireReader<'_>) -> Result<Vec<ActionId>, CodecError> {
    let mut ids = Vec::with_capacity(payload.remaining() / 4);
    while !payload.is_empty() {
        let action_type = payload.read_u16()?;
        let len = payload.read_u16()? as usize;
        if len < 4 {
            return Err(CodecError::InvalidFieldValue {
                field: "action id length",
                value: len as u32,
            });
        }
        payload.skip(len - 4)?;
        ids.push(ActionId { action_type });
    }
    Ok(ids)
}

fn decode_oxm_ids(payload: &mut WireReader<'_>) -> Result<Vec<u32>, CodecError> {
    let mut ids = Vec::with_capacity(payload.remaining() / 4);
    while !payload.is_empty() {
        ids.push(payload.read_u32()?);
    }
    Ok(ids)
}
