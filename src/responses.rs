use net::{LoginDisconnectS2c, PacketEncode, ProtoError, StatusResponseS2c};
use serde_json::json;

use crate::config::HoneypotConfig;

#[derive(Debug, thiserror::Error)]
pub enum ResponseBuildError {
    #[error("failed to serialize {0} json: {1}")]
    Json(&'static str, #[source] serde_json::Error),
    #[error("failed to encode {0} payload: {1}")]
    Encode(&'static str, #[source] ProtoError),
}

/// Pre-serialized response bodies, built once before the listener opens.
///
/// Each body is the String-encoded JSON document, ready to go behind a packet id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResponses {
    pub status: Vec<u8>,
    pub kick: Vec<u8>,
}

impl StaticResponses {
    pub fn build(config: &HoneypotConfig) -> Result<Self, ResponseBuildError> {
        let status_json = status_json(config)?;
        let kick_json = kick_json(config)?;

        let mut status = Vec::new();
        StatusResponseS2c { json: &status_json }
            .encode_body(&mut status)
            .map_err(|e| ResponseBuildError::Encode("status", e))?;

        let mut kick = Vec::new();
        LoginDisconnectS2c { reason: &kick_json }
            .encode_body(&mut kick)
            .map_err(|e| ResponseBuildError::Encode("kick", e))?;

        Ok(Self { status, kick })
    }
}

fn status_json(config: &HoneypotConfig) -> Result<String, ResponseBuildError> {
    let v = json! {
        {
          "version": {
            "name": config.protocol_text,
            "protocol": config.protocol_version
          },
          "players": {
            "max": config.max_slots,
            "online": 0
          },
          "description": {
            "text": config.motd
          }
        }
    };
    serde_json::to_string(&v).map_err(|e| ResponseBuildError::Json("status", e))
}

fn kick_json(config: &HoneypotConfig) -> Result<String, ResponseBuildError> {
    let v = json!({ "text": config.kick_message });
    serde_json::to_string(&v).map_err(|e| ResponseBuildError::Json("kick", e))
}
