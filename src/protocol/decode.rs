//! Protocol message decoding

use super::constants::{
    ADMIN_HEADER_SIZE, FIELD_COUNT_OFFSET, FIELD_HEADER_SIZE, MSG_TYPE_ADMIN, MSG_VERSION,
    PROTO_HEADER_SIZE, RESULT_CODE_OFFSET,
};
use super::message::AdminResponse;
use bytes::{Bytes, BytesMut};
use std::io;

/// Maximum admin response body accepted (1 MB).
///
/// Admin replies are a header and a handful of small fields; anything larger is
/// rejected before allocation.
const MAX_BODY_SIZE: usize = 1 << 20;

/// Decode an admin response from the front of `data`
///
/// Does not advance the buffer; the caller advances by the returned byte count.
///
/// # Returns
/// `Ok((msg, consumed))` - Response and number of bytes consumed
/// `Err(e)` - `UnexpectedEof` if more bytes are needed, `InvalidData` if malformed
pub fn decode_response(data: &BytesMut) -> io::Result<(AdminResponse, usize)> {
    if data.len() < PROTO_HEADER_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "incomplete proto header",
        ));
    }

    let version = data[0];
    let msg_type = data[1];
    if version != MSG_VERSION || msg_type != MSG_TYPE_ADMIN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "unexpected proto header: version {} type {}",
                version, msg_type
            ),
        ));
    }

    let mut size_bytes = [0u8; 8];
    size_bytes[2..].copy_from_slice(&data[2..PROTO_HEADER_SIZE]);
    let body_len = u64::from_be_bytes(size_bytes);
    let body_len = usize::try_from(body_len)
        .ok()
        .filter(|len| *len <= MAX_BODY_SIZE)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "response length {} exceeds maximum allowed {}",
                    body_len, MAX_BODY_SIZE
                ),
            )
        })?;

    if body_len < ADMIN_HEADER_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("response body too short: {} bytes", body_len),
        ));
    }

    if data.len() < PROTO_HEADER_SIZE + body_len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "incomplete response body",
        ));
    }

    let body = &data[PROTO_HEADER_SIZE..PROTO_HEADER_SIZE + body_len];
    let result_code = body[RESULT_CODE_OFFSET];
    let field_count = body[FIELD_COUNT_OFFSET] as usize;
    let fields = decode_fields(&body[ADMIN_HEADER_SIZE..], field_count)?;

    Ok((
        AdminResponse {
            result_code,
            fields,
        },
        PROTO_HEADER_SIZE + body_len,
    ))
}

pub(crate) fn decode_fields(mut data: &[u8], field_count: usize) -> io::Result<Vec<(u8, Bytes)>> {
    let mut fields = Vec::with_capacity(field_count.min(16));

    for _ in 0..field_count {
        if data.len() < FIELD_HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "truncated field header",
            ));
        }

        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "field length must include the id byte",
            ));
        }
        let id = data[4];
        let data_len = len - 1;
        let rest = &data[FIELD_HEADER_SIZE..];
        if rest.len() < data_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("field {} overruns response body", id),
            ));
        }

        fields.push((id, Bytes::copy_from_slice(&rest[..data_len])));
        data = &rest[data_len..];
    }

    Ok(fields)
}
