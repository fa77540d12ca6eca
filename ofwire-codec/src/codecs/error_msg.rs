//! Error notification: type/code pair plus the offending bytes.

use crate::error::CodecError;
use crate::registry::{DecodeContext, EncodeContext, MessageDecoder, MessageEncoder};
use crate::types::{ErrorMsg, MsgBody};
use bytes::Bytes;
use ofwire_buffer::{WireReader, WireWriter};

pub(crate) struct ErrorMsgCodec;

fn record(body: &MsgBody) -> Result<&ErrorMsg, CodecError> {
    match body {
        MsgBody::ErrorMsg(err) => Ok(err),
        _ => Err(CodecError::bad_record(format!(
            "error codec got {:?} body",
            body.kind()
        ))),
    }
}

impl MessageDecoder for ErrorMsgCodec {
    fn decode_body(
        &self,
        r: &mut WireReader<'_>,
        _ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError> {
        let err_type = r.read_u16()?;
        let code = r.read_u16()?;
        let data = Bytes::copy_from_slice(r.read_rest());
        Ok(MsgBody::ErrorMsg(ErrorMsg {
            err_type,
            code,
            data,
        }))
    }
}

impl MessageEncoder for ErrorMsgCodec {
    fn body_len(&self, body: &MsgBody, _ctx: &EncodeContext<'_>) -> Result<usize, CodecError> {
        Ok(4 + record(body)?.data.len())
    }

    fn encode_body(
        &self,
        body: &MsgBody,
        w: &mut WireWriter,
        _ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError> {
        let err = record(body)?;
        w.put_u16(err.err_type);
        w.put_u16(err.code);
        w.put_slice(&err.data);
        Ok(())
    }
}
