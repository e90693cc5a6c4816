use super::{
    error::{ProtoError, Result},
    varint::{read_varint, write_varint},
};

#[inline]
pub(crate) fn take<'a>(input: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if input.len() < len {
        return Err(ProtoError::UnexpectedEof);
    }

    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head)
}

#[inline]
pub(crate) fn read_u8(input: &mut &[u8]) -> Result<u8> {
    Ok(take(input, 1)?[0])
}

#[inline]
pub(crate) fn read_u16_be(input: &mut &[u8]) -> Result<u16> {
    let bytes = take(input, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

#[inline]
pub(crate) fn write_u16_be(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Reads a VarInt length-prefixed UTF-8 string.
///
/// A zero length is rejected with [`ProtoError::EmptyString`].
pub fn read_string<'a>(input: &mut &'a [u8]) -> Result<&'a str> {
    let byte_len = read_varint(input)? as usize;
    if byte_len == 0 {
        return Err(ProtoError::EmptyString);
    }

    let bytes = take(input, byte_len)?;
    std::str::from_utf8(bytes).map_err(|_| ProtoError::InvalidUtf8)
}

pub fn write_string(out: &mut Vec<u8>, value: &str) -> Result<()> {
    let len = value.len();
    let len = u32::try_from(len).map_err(|_| ProtoError::LengthTooLarge {
        max: u32::MAX as usize,
        actual: len,
    })?;

    write_varint(out, len);
    out.extend_from_slice(value.as_bytes());
    Ok(())
}
