//! Echo request/reply: an opaque payload sized by the message length.

use crate::error::CodecError;
use crate::registry::{DecodeContext, EncodeContext, MessageDecoder, MessageEncoder};
use crate::types::MsgBody;
use bytes::Bytes;
use ofwire_buffer::{WireReader, WireWriter};

pub(crate) struct EchoCodec {
    pub reply: bool,
}

impl EchoCodec {
    fn payload<'a>(&self, body: &'a MsgBody) -> Result<&'a Bytes, CodecError> {
        match (self.reply, body) {
            (false, MsgBody::EchoRequest(payload)) | (true, MsgBody::EchoReply(payload)) => {
                Ok(payload)
            }
            _ => Err(CodecError::bad_record(format!(
                "echo codec got {:?} body",
                body.kind()
            ))),
        }
    }
}

impl MessageDecoder for EchoCodec {
    fn decode_body(
        &self,
        r: &mut WireReader<'_>,
        _ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError> {
        let payload = Bytes::copy_from_slice(r.read_rest());
        Ok(if self.reply {
            MsgBody::EchoReply(payload)
        } else {
            MsgBody::EchoRequest(payload)
        })
    }
}

impl MessageEncoder for EchoCodec {
    fn body_len(&self, body: &MsgBody, _ctx: &EncodeContext<'_>) -> Result<usize, CodecError> {
        Ok(self.payload(body)?.len())
    }

    fn encode_body(
        &self,
        body: &MsgBody,
        w: &mut WireWriter,
        _ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError> {
        w.put_slice(self.payload(body)?);
        Ok(())
    }
}
