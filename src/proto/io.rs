use bytes::Bytes;

use super::{
    error::{ProtoError, Result},
    types::Uuid,
    varint::{read_varint_len, write_varint},
};

/// Default upper bound for varint-prefixed byte arrays.
pub(crate) const MAX_BYTE_ARRAY: usize = 1_048_576;

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
fn take_array<const N: usize>(input: &mut &[u8]) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(take(input, N)?);
    Ok(bytes)
}

#[inline]
pub(crate) fn read_u8(input: &mut &[u8]) -> Result<u8> {
    Ok(take(input, 1)?[0])
}

#[inline]
pub(crate) fn write_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

#[inline]
pub(crate) fn read_bool(input: &mut &[u8]) -> Result<bool> {
    let value = read_u8(input)?;
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ProtoError::InvalidBool(other)),
    }
}

#[inline]
pub(crate) fn write_bool(out: &mut Vec<u8>, value: bool) {
    out.push(value as u8);
}

#[inline]
pub(crate) fn read_u16_be(input: &mut &[u8]) -> Result<u16> {
    Ok(u16::from_be_bytes(take_array(input)?))
}

#[inline]
pub(crate) fn write_u16_be(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

#[inline]
pub(crate) fn read_i64_be(input: &mut &[u8]) -> Result<i64> {
    Ok(i64::from_be_bytes(take_array(input)?))
}

#[inline]
pub(crate) fn write_i64_be(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_be_bytes());
}

#[inline]
pub(crate) fn read_u64_be(input: &mut &[u8]) -> Result<u64> {
    Ok(u64::from_be_bytes(take_array(input)?))
}

#[inline]
pub(crate) fn write_u64_be(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

#[inline]
pub(crate) fn read_f32_be(input: &mut &[u8]) -> Result<f32> {
    Ok(f32::from_be_bytes(take_array(input)?))
}

#[inline]
pub(crate) fn write_f32_be(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_be_bytes());
}

#[inline]
pub(crate) fn read_uuid(input: &mut &[u8]) -> Result<Uuid> {
    let msb = read_u64_be(input)?;
    let lsb = read_u64_be(input)?;
    Ok(Uuid::from_u64s(msb, lsb))
}

#[inline]
pub(crate) fn write_uuid(out: &mut Vec<u8>, value: &Uuid) {
    let (msb, lsb) = value.as_u64s();
    write_u64_be(out, msb);
    write_u64_be(out, lsb);
}

pub(crate) fn read_string_bounded<'a>(input: &mut &'a [u8], max_chars: usize) -> Result<&'a str> {
    let byte_len = read_varint_len(input)?;
    let max_bytes = max_chars.saturating_mul(4);
    if byte_len > max_bytes {
        return Err(ProtoError::LengthTooLarge {
            max: max_bytes,
            actual: byte_len,
        });
    }

    let bytes = take(input, byte_len)?;
    let s = std::str::from_utf8(bytes).map_err(|_| ProtoError::InvalidUtf8)?;

    let char_count = s.encode_utf16().count();
    if char_count > max_chars {
        return Err(ProtoError::StringTooLong {
            max: max_chars,
            actual: char_count,
        });
    }

    Ok(s)
}

pub(crate) fn write_string_bounded(out: &mut Vec<u8>, value: &str, max_chars: usize) -> Result<()> {
    let char_count = value.encode_utf16().count();
    if char_count > max_chars {
        return Err(ProtoError::StringTooLong {
            max: max_chars,
            actual: char_count,
        });
    }

    let len = value.len();
    if len > i32::MAX as usize {
        return Err(ProtoError::LengthTooLarge {
            max: i32::MAX as usize,
            actual: len,
        });
    }

    write_varint(out, len as i32);
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

pub(crate) fn read_byte_array<'a>(input: &mut &'a [u8], max: usize) -> Result<&'a [u8]> {
    let len = read_varint_len(input)?;
    if len > max {
        return Err(ProtoError::LengthTooLarge { max, actual: len });
    }
    take(input, len)
}

pub(crate) fn write_byte_array(out: &mut Vec<u8>, value: &[u8]) -> Result<()> {
    if value.len() > i32::MAX as usize {
        return Err(ProtoError::LengthTooLarge {
            max: i32::MAX as usize,
            actual: value.len(),
        });
    }
    write_varint(out, value.len() as i32);
    out.extend_from_slice(value);
    Ok(())
}

/// Retains every remaining byte of the body, viewing into `owner` when possible.
pub(crate) fn read_remaining(input: &mut &[u8], owner: &Bytes) -> Bytes {
    let rest = *input;
    *input = &[];
    retain(owner, rest)
}

/// Shares `slice` out of `owner` without copying when it lies inside it.
pub(crate) fn retain(owner: &Bytes, slice: &[u8]) -> Bytes {
    if slice.is_empty() {
        return Bytes::new();
    }
    let start = owner.as_ptr() as usize;
    let at = slice.as_ptr() as usize;
    if at >= start && at + slice.len() <= start + owner.len() {
        owner.slice_ref(slice)
    } else {
        Bytes::copy_from_slice(slice)
    }
}
