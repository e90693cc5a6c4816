use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::{ProtoError, Result};

/// Longest legal encoding of a 32 bit value.
pub const MAX_VARINT_LEN: usize = 5;

#[inline]
pub fn read_varint(input: &mut &[u8]) -> Result<u32> {
    let Some((value, len)) = read_varint_partial(input)? else {
        return Err(ProtoError::UnexpectedEof);
    };
    *input = &input[len..];
    Ok(value)
}

/// Decodes a VarInt from the front of `input` without consuming it.
///
/// Returns `Ok(None)` when `input` ends before the value terminates.
#[inline]
pub(crate) fn read_varint_partial(input: &[u8]) -> Result<Option<(u32, usize)>> {
    let mut value: u32 = 0;
    for i in 0..MAX_VARINT_LEN {
        if i >= input.len() {
            return Ok(None);
        }

        let byte = input[i];
        value |= ((byte & 0x7f) as u32) << (i * 7);
        if (byte & 0x80) == 0 {
            return Ok(Some((value, i + 1)));
        }
    }

    Err(ProtoError::VarIntTooLarge)
}

/// Reads a VarInt one byte at a time from a stream.
///
/// Returns the value together with the number of bytes it occupied on the wire.
pub async fn read_varint_from<R>(reader: &mut R) -> Result<(u32, usize)>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut value: u32 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = reader
            .read_u8()
            .await
            .map_err(|_| ProtoError::UnexpectedEof)?;
        value |= ((byte & 0x7f) as u32) << (i * 7);
        if (byte & 0x80) == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(ProtoError::VarIntTooLarge)
}

#[inline]
pub fn write_varint(out: &mut Vec<u8>, value: u32) {
    let mut val = value;
    loop {
        if (val & 0xffffff80) == 0 {
            out.push(val as u8);
            return;
        }
        out.push((val as u8 & 0x7f) | 0x80);
        val >>= 7;
    }
}

#[inline]
pub fn varint_len(value: u32) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        0x4000..=0x1f_ffff => 3,
        0x20_0000..=0x0fff_ffff => 4,
        _ => 5,
    }
}
