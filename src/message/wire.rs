//! Protobuf wire primitives shared by both message models.
//!
//! Canonical form written here: fields in ascending number order, proto3
//! defaults omitted for singular scalars, repeated fields unpacked. The
//! reader additionally accepts packed repeated varints.

use prost::encoding::{WireType, decode_key, decode_varint, encode_key, encode_varint};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Wire(#[from] prost::DecodeError),
    #[error("length-delimited value overruns buffer ({len} > {remaining})")]
    Truncated { len: usize, remaining: usize },
    #[error("unknown field number {number} for message {message}")]
    UnknownField { message: String, number: u32 },
    #[error("wire type {wire_type:?} does not match {message}.{field}")]
    WireTypeMismatch {
        message: String,
        field: String,
        wire_type: WireType,
    },
    #[error("invalid UTF-8 in {message}.{field}")]
    InvalidUtf8 { message: String, field: String },
    #[error("nested message {0} not found in registry")]
    MessageNotFound(String),
}

pub fn put_varint(tag: u32, value: u64, buf: &mut Vec<u8>) {
    encode_key(tag, WireType::Varint, buf);
    encode_varint(value, buf);
}

pub fn put_len(tag: u32, data: &[u8], buf: &mut Vec<u8>) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(data.len() as u64, buf);
    buf.extend_from_slice(data);
}

pub fn read_key(buf: &mut &[u8]) -> Result<(u32, WireType), DecodeError> {
    Ok(decode_key(buf)?)
}

pub fn read_varint(buf: &mut &[u8]) -> Result<u64, DecodeError> {
    Ok(decode_varint(buf)?)
}

/// Split off one length-delimited payload.
pub fn read_len<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], DecodeError> {
    let len = decode_varint(buf)? as usize;
    if buf.len() < len {
        return Err(DecodeError::Truncated {
            len,
            remaining: buf.len(),
        });
    }
    let (head, rest) = buf.split_at(len);
    *buf = rest;
    Ok(head)
}

/// Decode a packed run of varints.
pub fn read_packed(mut chunk: &[u8]) -> Result<Vec<u64>, DecodeError> {
    let mut out = Vec::new();
    while !chunk.is_empty() {
        out.push(decode_varint(&mut chunk)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_field_layout() {
        let mut buf = Vec::new();
        put_varint(1, 150, &mut buf);
        assert_eq!(buf, vec![0x08, 0x96, 0x01]);
    }

    #[test]
    fn len_field_layout() {
        let mut buf = Vec::new();
        put_len(2, b"testing", &mut buf);
        assert_eq!(buf, vec![0x12, 0x07, b't', b'e', b's', b't', b'i', b'n', b'g']);

        let mut cursor: &[u8] = &buf;
        let (tag, wt) = read_key(&mut cursor).unwrap();
        assert_eq!(tag, 2);
        assert_eq!(wt, WireType::LengthDelimited);
        assert_eq!(read_len(&mut cursor).unwrap(), b"testing");
        assert!(cursor.is_empty());
    }

    #[test]
    fn truncated_len_rejected() {
        let mut cursor: &[u8] = &[0x05, b'a', b'b'];
        assert!(matches!(
            read_len(&mut cursor),
            Err(DecodeError::Truncated { len: 5, remaining: 2 })
        ));
    }

    #[test]
    fn packed_varints() {
        assert_eq!(read_packed(&[0x03, 0x8E, 0x02]).unwrap(), vec![3, 270]);
    }
}
