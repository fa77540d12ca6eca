//! Hello: version negotiation.
//!
//! V1 hellos have no body; any trailing bytes a newer peer appended
//! are ignored, which is what lets dissimilar versions negotiate at
//! all. From V4 on the body is a list of padded elements sharing the
//! TLV property layout, of which version-bitmap (type 1) is the one
//! defined kind; unknown element types are skipped.

use crate::error::CodecError;
use crate::registry::{DecodeContext, EncodeContext, MessageDecoder, MessageEncoder};
use crate::types::{Hello, HelloElem, MsgBody};
use crate::{tlv, ProtocolVersion};
use ofwire_buffer::{WireReader, WireWriter};
use tracing::debug;

const ELEM_VERSION_BITMAP: u16 = 1;

pub(crate) struct HelloCodec;

fn record(body: &MsgBody) -> Result<&Hello, CodecError> {
    match body {
        MsgBody::Hello(hello) => Ok(hello),
        _ => Err(CodecError::bad_record(format!(
            "hello codec got {:?} body",
            body.kind()
        ))),
    }
}

impl MessageDecoder for HelloCodec {
    fn decode_body(
        &self,
        r: &mut WireReader<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError> {
        if !ctx.version.is_extensible() {
            // Trailing data from a newer peer carries no meaning here.
            r.read_rest();
            return Ok(MsgBody::Hello(Hello::default()));
        }

        let mut elements = Vec::new();
        let len = r.remaining();
        let mut props = tlv::PropertyReader::new(r, len, "hello")?;
        while let Some(mut prop) = props.next()? {
            match prop.type_code {
                ELEM_VERSION_BITMAP => {
                    let mut bitmaps = Vec::with_capacity(prop.payload.remaining() / 4);
                    while !prop.payload.is_empty() {
                        bitmaps.push(prop.payload.read_u32()?);
                    }
                    elements.push(HelloElem::VersionBitmap(bitmaps));
                }
                other => {
                    debug!(element_type = other, "skipping unrecognized hello element");
                }
            }
        }
        Ok(MsgBody::Hello(Hello { elements }))
    }
}

impl MessageEncoder for HelloCodec {
    fn body_len(&self, body: &MsgBody, ctx: &EncodeContext<'_>) -> Result<usize, CodecError> {
        let hello = record(body)?;
        if ctx.version == ProtocolVersion::V1 {
            check_v1(hello)?;
            return Ok(0);
        }
        Ok(hello
            .elements
            .iter()
            .map(|elem| match elem {
                HelloElem::VersionBitmap(bitmaps) => tlv::property_len(4 * bitmaps.len()),
            })
            .sum())
    }

    fn encode_body(
        &self,
        body: &MsgBody,
        w: &mut WireWriter,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError> {
        let hello = record(body)?;
        if ctx.version == ProtocolVersion::V1 {
            return check_v1(hello);
        }
        for elem in &hello.elements {
            match elem {
                HelloElem::VersionBitmap(bitmaps) => {
                    tlv::write_property(w, ELEM_VERSION_BITMAP, |w| {
                        for &word in bitmaps {
                            w.put_u32(word);
                        }
                        Ok(())
                    })?;
                }
            }
        }
        Ok(())
    }
}

fn check_v1(hello: &Hello) -> Result<(), CodecError> {
    if hello.elements.is_empty() {
        Ok(())
    } else {
        Err(CodecError::bad_record(
            "hello elements are not expressible at version 0x01",
        ))
    }
}
