use super::error::{ProtoError, Result};

/// Next state value in the handshake packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeNextState {
    Status,
    Login,
    /// Login initiated by a server transfer; served exactly like `Login`.
    Transfer,
}

impl HandshakeNextState {
    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            1 => Ok(Self::Status),
            2 => Ok(Self::Login),
            3 => Ok(Self::Transfer),
            other => Err(ProtoError::UnrecognizedNextState(other)),
        }
    }

    pub const fn as_raw(self) -> u8 {
        match self {
            Self::Status => 1,
            Self::Login => 2,
            Self::Transfer => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Login => "login",
            Self::Transfer => "transfer",
        }
    }
}
