use std::io;

/// Protocol decode/encode error.
///
/// Every variant is local to one connection: the caller closes the stream and
/// moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtoError {
    /// The peer closed the stream, or the stream failed, before a value was complete.
    #[error("unexpected end of stream")]
    UnexpectedEof,
    /// A VarInt kept its continuation bit set past the fifth byte.
    #[error("varint is longer than 5 bytes")]
    VarIntTooLarge,
    /// Declared frame length is shorter than the packet id it carries.
    #[error("frame length {declared} cannot hold a {id_len} byte packet id")]
    FrameLength { declared: u32, id_len: usize },
    #[error("packet of {len} bytes exceeds the protocol maximum")]
    PacketTooLarge { len: usize },
    #[error("length {actual} exceeds maximum {max}")]
    LengthTooLarge { max: usize, actual: usize },
    #[error("unexpected packet id: received {actual:#04x} instead of {expected:#04x}")]
    UnexpectedPacketId { expected: u32, actual: u32 },
    #[error("empty string")]
    EmptyString,
    #[error("string is not valid utf-8")]
    InvalidUtf8,
    #[error("unrecognized handshake next state {0}")]
    UnrecognizedNextState(u8),
    #[error("failed to write frame: {0}")]
    WriteFailed(io::ErrorKind),
}

pub type Result<T> = std::result::Result<T, ProtoError>;

pub(crate) fn debug_log_error(context: &str, error: &ProtoError) {
    #[cfg(debug_assertions)]
    {
        log::debug!("{}: {}", context, error);
    }
    let _ = context;
    let _ = error;
}
