//! Switch config bodies: a 16-bit fragment-handling bitmask and the
//! miss-send length. Shared by get-config replies and set-config.

use super::config::VersionConfig;
use crate::error::CodecError;
use crate::registry::{DecodeContext, EncodeContext, MessageDecoder, MessageEncoder};
use crate::types::{MsgBody, SwitchConfig};
use ofwire_buffer::{WireReader, WireWriter};

pub(crate) struct SwitchConfigCodec {
    pub cfg: VersionConfig,
    /// Get-config reply when set, set-config otherwise.
    pub reply: bool,
}

impl SwitchConfigCodec {
    fn record<'a>(&self, body: &'a MsgBody) -> Result<&'a SwitchConfig, CodecError> {
        match (self.reply, body) {
            (true, MsgBody::GetConfigReply(config)) | (false, MsgBody::SetConfig(config)) => {
                Ok(config)
            }
            _ => Err(CodecError::bad_record(format!(
                "switch-config codec got {:?} body",
                body.kind()
            ))),
        }
    }

    fn wrap(&self, config: SwitchConfig) -> MsgBody {
        if self.reply {
            MsgBody::GetConfigReply(config)
        } else {
            MsgBody::SetConfig(config)
        }
    }
}

impl MessageDecoder for SwitchConfigCodec {
    fn decode_body(
        &self,
        r: &mut WireReader<'_>,
        _ctx: &DecodeContext<'_>,
    ) -> Result<MsgBody, CodecError> {
        let flags = self.cfg.config_flags.unpack(r.read_u16()? as u32);
        let miss_send_len = r.read_u16()?;
        Ok(self.wrap(SwitchConfig {
            flags,
            miss_send_len,
        }))
    }
}

impl MessageEncoder for SwitchConfigCodec {
    fn body_len(&self, body: &MsgBody, _ctx: &EncodeContext<'_>) -> Result<usize, CodecError> {
        self.record(body)?;
        Ok(4)
    }

    fn encode_body(
        &self,
        body: &MsgBody,
        w: &mut WireWriter,
        _ctx: &EncodeContext<'_>,
    ) -> Result<(), CodecError> {
        let config = self.record(body)?;
        w.put_u16(self.cfg.config_flags.pack(&config.flags) as u16);
        w.put_u16(config.miss_send_len);
        Ok(())
    }
}
