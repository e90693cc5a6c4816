use net::ProtoError;

use crate::threat::ClientFail;

/// Everything a connection task can end with.
#[derive(thiserror::Error, Debug)]
pub enum ReportableError {
    #[error("Protocol error - {0} (re::pe)")]
    Protocol(#[from] ProtoError),
    #[error("Client error - {0} (re::ce)")]
    ClientError(#[from] ClientFail),
}

impl ReportableError {
    /// Short label used as the metrics attribute for failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientError(ClientFail::Timeout(_)) => "timeout",
            Self::Protocol(ProtoError::UnexpectedEof) => "eof",
            Self::Protocol(ProtoError::WriteFailed(_)) => "write",
            Self::Protocol(_) => "protocol",
        }
    }
}
