//! RESP2 encoding and decoding
//!
//! Commands go out as arrays of bulk strings; replies come back as any RESP2
//! type. Decoding works on a cursor over a partially filled read buffer and
//! returns `Ok(None)` until a whole reply is available.

use crate::error::{RedisError, RedisResult};
use crate::value::RespValue;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

const CRLF: &[u8] = b"\r\n";

/// Encodes commands and reply values into bytes
pub struct RespEncoder;

impl RespEncoder {
    /// Append a reply value to `buf`.
    pub fn encode(value: &RespValue, buf: &mut BytesMut) {
        match value {
            RespValue::SimpleString(s) => Self::put_line(buf, b'+', s.as_bytes()),
            RespValue::Error(e) => Self::put_line(buf, b'-', e.as_bytes()),
            RespValue::Integer(i) => Self::put_line(buf, b':', i.to_string().as_bytes()),
            RespValue::BulkString(data) => Self::put_bulk(buf, data),
            RespValue::Null => buf.put_slice(b"$-1\r\n"),
            RespValue::Array(items) => {
                Self::put_line(buf, b'*', items.len().to_string().as_bytes());
                for item in items {
                    Self::encode(item, buf);
                }
            }
        }
    }

    /// Append one command to `buf` as an array of bulk strings.
    ///
    /// Integer arguments are sent as their decimal text, which is what the
    /// server expects inside a request.
    pub fn encode_command_into(
        command: &str,
        args: &[RespValue],
        buf: &mut BytesMut,
    ) -> RedisResult<()> {
        Self::put_line(buf, b'*', (1 + args.len()).to_string().as_bytes());
        Self::put_bulk(buf, command.as_bytes());
        for arg in args {
            match arg {
                RespValue::BulkString(data) => Self::put_bulk(buf, data),
                RespValue::SimpleString(s) => Self::put_bulk(buf, s.as_bytes()),
                RespValue::Integer(i) => Self::put_bulk(buf, i.to_string().as_bytes()),
                other => {
                    return Err(RedisError::Protocol(format!(
                        "Cannot send {other:?} as a command argument"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Encode a single command into a fresh buffer.
    pub fn encode_command(command: &str, args: &[RespValue]) -> RedisResult<Bytes> {
        let mut buf = BytesMut::new();
        Self::encode_command_into(command, args, &mut buf)?;
        Ok(buf.freeze())
    }

    fn put_line(buf: &mut BytesMut, prefix: u8, body: &[u8]) {
        buf.put_u8(prefix);
        buf.put_slice(body);
        buf.put_slice(CRLF);
    }

    fn put_bulk(buf: &mut BytesMut, data: &[u8]) {
        Self::put_line(buf, b'$', data.len().to_string().as_bytes());
        buf.put_slice(data);
        buf.put_slice(CRLF);
    }
}

/// One step of decoding: either a complete value or the header of an array
/// whose elements follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete value, including nil and empty arrays
    Value(RespValue),
    /// `*<len>` header of a non-empty array; `len` elements follow
    ArrayStart(usize),
}

/// Decodes RESP values from bytes
pub struct RespDecoder;

impl RespDecoder {
    /// Decode one value from the cursor.
    ///
    /// Returns `Ok(None)` when the buffer holds only part of a value; the
    /// cursor position is then meaningless and the caller should retry from
    /// the same start once more bytes arrive.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<RespValue>> {
        match Self::decode_frame(buf)? {
            None => Ok(None),
            Some(Frame::Value(value)) => Ok(Some(value)),
            Some(Frame::ArrayStart(len)) => {
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    match Self::decode(buf)? {
                        Some(item) => items.push(item),
                        None => return Ok(None),
                    }
                }
                Ok(Some(RespValue::Array(items)))
            }
        }
    }

    /// Decode a scalar or an array header, without descending into array
    /// elements.
    ///
    /// Lets a reader assemble large arrays element by element instead of
    /// re-parsing the whole reply each time more bytes arrive. `Ok(None)`
    /// has the same meaning as in [`decode`](Self::decode).
    pub fn decode_frame(buf: &mut Cursor<&[u8]>) -> RedisResult<Option<Frame>> {
        if !buf.has_remaining() {
            return Ok(None);
        }

        let type_byte = buf.get_u8();
        let Some(line) = Self::read_line(buf) else {
            return Ok(None);
        };

        let value = match type_byte {
            b'+' => RespValue::SimpleString(Self::utf8(line)?),
            b'-' => RespValue::Error(Self::utf8(line)?),
            b':' => RespValue::Integer(Self::parse_len(line, "integer")?),
            b'$' => {
                let len = Self::parse_len(line, "bulk string length")?;
                if len == -1 {
                    return Ok(Some(Frame::Value(RespValue::Null)));
                }
                let len = Self::checked_len(len)?;
                if buf.remaining() < len + 2 {
                    return Ok(None);
                }
                let data = Bytes::copy_from_slice(&buf.chunk()[..len]);
                buf.advance(len);
                if &buf.chunk()[..2] != CRLF {
                    return Err(RedisError::Protocol(
                        "Bulk string not terminated by CRLF".to_string(),
                    ));
                }
                buf.advance(2);
                RespValue::BulkString(data)
            }
            b'*' => {
                let len = Self::parse_len(line, "array length")?;
                if len == -1 {
                    return Ok(Some(Frame::Value(RespValue::Null)));
                }
                match Self::checked_len(len)? {
                    0 => RespValue::Array(Vec::new()),
                    len => return Ok(Some(Frame::ArrayStart(len))),
                }
            }
            other => {
                return Err(RedisError::Protocol(format!(
                    "Invalid RESP type byte: {}",
                    other as char
                )))
            }
        };
        Ok(Some(Frame::Value(value)))
    }

    fn read_line<'a>(buf: &mut Cursor<&'a [u8]>) -> Option<&'a [u8]> {
        let start = buf.position() as usize;
        let slice: &'a [u8] = *buf.get_ref();
        let end = slice[start..]
            .windows(2)
            .position(|w| w == CRLF)
            .map(|offset| start + offset)?;
        buf.set_position((end + 2) as u64);
        Some(&slice[start..end])
    }

    fn utf8(line: &[u8]) -> RedisResult<String> {
        String::from_utf8(line.to_vec())
            .map_err(|e| RedisError::Protocol(format!("Invalid UTF-8: {e}")))
    }

    fn parse_len(line: &[u8], what: &str) -> RedisResult<i64> {
        std::str::from_utf8(line)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| RedisError::Protocol(format!("Invalid {what}: {line:?}")))
    }

    fn checked_len(len: i64) -> RedisResult<usize> {
        usize::try_from(len).map_err(|_| RedisError::Protocol(format!("Negative length: {len}")))
    }
}
