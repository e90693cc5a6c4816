use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{
    error::{debug_log_error, ProtoError, Result},
    varint::{read_varint_from, varint_len, write_varint},
};

/// Maximum packet length in bytes (protocol limit).
pub const MAX_PACKET_SIZE: usize = 2_097_152;

/// Clientbound or serverbound packet body encoding.
pub trait PacketEncode {
    const ID: u32;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()>;
}

/// Clientbound or serverbound packet body decoding.
pub trait PacketDecode<'a>: Sized {
    const ID: u32;

    fn decode_body(input: &mut &'a [u8]) -> Result<Self>;
}

/// Decoded packet frame with the raw body (without ID).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketFrame {
    pub id: u32,
    pub body: Vec<u8>,
}

impl PacketFrame {
    pub fn new(id: u32, body: Vec<u8>) -> Self {
        Self { id, body }
    }

    /// Reads exactly one length-prefixed frame from `reader`.
    ///
    /// Nothing past the declared length is consumed. When `expected_id` is set
    /// and the peer sent something else, the whole frame is still drained
    /// before [`ProtoError::UnexpectedPacketId`] is returned.
    pub async fn read_from<R>(reader: &mut R, expected_id: Option<u32>) -> Result<Self>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let (declared, _) = read_varint_from(reader).await.inspect_err(|err| {
            debug_log_error("packet length varint decode failed", err);
        })?;

        if declared as usize > MAX_PACKET_SIZE {
            let err = ProtoError::PacketTooLarge {
                len: declared as usize,
            };
            debug_log_error("packet too large", &err);
            return Err(err);
        }

        let (id, id_len) = read_varint_from(reader).await.inspect_err(|err| {
            debug_log_error("packet id varint decode failed", err);
        })?;

        let Some(body_len) = (declared as usize).checked_sub(id_len) else {
            let err = ProtoError::FrameLength { declared, id_len };
            debug_log_error("frame length shorter than packet id", &err);
            return Err(err);
        };

        let mut body = vec![0u8; body_len];
        reader
            .read_exact(&mut body)
            .await
            .map_err(|_| ProtoError::UnexpectedEof)?;

        if let Some(expected) = expected_id {
            if id != expected {
                let err = ProtoError::UnexpectedPacketId {
                    expected,
                    actual: id,
                };
                debug_log_error("unexpected packet", &err);
                return Err(err);
            }
        }

        Ok(Self { id, body })
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        write_raw_packet(writer, self.id, &self.body).await
    }

    /// Decodes the body as `P`, rejecting frames that carry another id.
    pub fn decode<'a, P: PacketDecode<'a>>(&'a self) -> Result<P> {
        if self.id != P::ID {
            return Err(ProtoError::UnexpectedPacketId {
                expected: P::ID,
                actual: self.id,
            });
        }
        let mut input = self.body.as_slice();
        P::decode_body(&mut input).inspect_err(|err| {
            debug_log_error("packet body decode failed", err);
        })
    }
}

/// Writes one frame with a single `write_all` so it never interleaves on the wire.
pub async fn write_raw_packet<W>(writer: &mut W, id: u32, body: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = Vec::with_capacity(varint_len(id) + body.len() + 5);
    encode_raw_packet(&mut buf, id, body)?;
    writer
        .write_all(&buf)
        .await
        .map_err(|e| ProtoError::WriteFailed(e.kind()))?;
    writer
        .flush()
        .await
        .map_err(|e| ProtoError::WriteFailed(e.kind()))?;
    Ok(())
}

pub fn encode_packet<P: PacketEncode>(out: &mut Vec<u8>, pkt: &P) -> Result<()> {
    let mut body = Vec::new();
    pkt.encode_body(&mut body)?;
    encode_raw_packet(out, P::ID, &body)
}

pub fn encode_raw_packet(out: &mut Vec<u8>, id: u32, body: &[u8]) -> Result<()> {
    let packet_len = varint_len(id) + body.len();
    if packet_len > MAX_PACKET_SIZE {
        return Err(ProtoError::PacketTooLarge { len: packet_len });
    }

    write_varint(out, packet_len as u32);
    write_varint(out, id);
    out.extend_from_slice(body);
    Ok(())
}
