//! RESP (`REdis` Serialization Protocol) reply values

use crate::error::{RedisError, RedisResult};
use bytes::Bytes;

/// One reply read off the wire
///
/// Every accessor is a checked conversion: a reply of the wrong shape yields
/// [`RedisError::Type`] instead of a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Simple string: +OK\r\n
    SimpleString(String),
    /// Error: -ERR message\r\n
    Error(String),
    /// Integer: :1000\r\n
    Integer(i64),
    /// Bulk string: $6\r\nfoobar\r\n
    BulkString(Bytes),
    /// Null bulk string or null array: $-1\r\n
    Null,
    /// Array: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Turn an error reply into [`RedisError::Server`], passing any other
    /// reply through.
    pub fn into_result(self) -> RedisResult<Self> {
        match self {
            Self::Error(msg) => Err(RedisError::Server(msg)),
            other => Ok(other),
        }
    }

    /// Read a status or bulk reply as UTF-8 text.
    pub fn as_string(&self) -> RedisResult<String> {
        match self {
            Self::SimpleString(s) => Ok(s.clone()),
            Self::BulkString(b) => String::from_utf8(b.to_vec())
                .map_err(|e| RedisError::Type(format!("Invalid UTF-8: {e}"))),
            _ => Err(RedisError::Type(format!(
                "Cannot convert {self:?} to string"
            ))),
        }
    }

    /// Read an integer reply, or a bulk string holding a decimal integer
    /// (scan cursors arrive that way).
    pub fn as_int(&self) -> RedisResult<i64> {
        match self {
            Self::Integer(i) => Ok(*i),
            Self::BulkString(b) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| {
                    RedisError::Type(format!("Cannot parse integer from {b:?}"))
                }),
            _ => Err(RedisError::Type(format!(
                "Cannot convert {self:?} to integer"
            ))),
        }
    }

    /// Read a bulk or status reply as raw bytes.
    pub fn as_bytes(&self) -> RedisResult<Bytes> {
        match self {
            Self::BulkString(b) => Ok(b.clone()),
            Self::SimpleString(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
            _ => Err(RedisError::Type(format!(
                "Cannot convert {self:?} to bytes"
            ))),
        }
    }

    /// Read a bulk reply that may be nil.
    pub fn into_optional_bytes(self) -> RedisResult<Option<Bytes>> {
        match self {
            Self::Null => Ok(None),
            other => other.as_bytes().map(Some),
        }
    }

    /// Take the elements of an array reply.
    pub fn into_array(self) -> RedisResult<Vec<Self>> {
        match self {
            Self::Array(items) => Ok(items),
            other => Err(RedisError::Type(format!(
                "Cannot convert {other:?} to array"
            ))),
        }
    }
}

impl From<&str> for RespValue {
    fn from(s: &str) -> Self {
        Self::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for RespValue {
    fn from(s: String) -> Self {
        Self::BulkString(Bytes::from(s))
    }
}

impl From<i64> for RespValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<Bytes> for RespValue {
    fn from(b: Bytes) -> Self {
        Self::BulkString(b)
    }
}

impl From<&Bytes> for RespValue {
    fn from(b: &Bytes) -> Self {
        Self::BulkString(b.clone())
    }
}

impl From<Vec<u8>> for RespValue {
    fn from(b: Vec<u8>) -> Self {
        Self::BulkString(Bytes::from(b))
    }
}
