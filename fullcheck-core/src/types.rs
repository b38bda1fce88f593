//! Key descriptors and per-type command dispatch

use crate::error::RedisError;
use crate::value::RespValue;
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

/// Data type of a key, as reported by `TYPE`
///
/// Each variant knows the commands used to measure and fetch it, so batch
/// operations dispatch with a single match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Plain string
    String,
    /// Hash of field/value pairs
    Hash,
    /// List
    List,
    /// Unordered set
    Set,
    /// Sorted set
    ZSet,
    /// Key does not exist
    None,
}

impl KeyType {
    /// Name as returned by `TYPE`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Hash => "hash",
            Self::List => "list",
            Self::Set => "set",
            Self::ZSet => "zset",
            Self::None => "none",
        }
    }

    /// Command returning the element count (byte length for strings)
    #[must_use]
    pub const fn length_command(self) -> &'static str {
        match self {
            Self::String | Self::None => "strlen",
            Self::Hash => "hlen",
            Self::List => "llen",
            Self::Set => "scard",
            Self::ZSet => "zcard",
        }
    }

    /// Command and trailing arguments fetching the whole value
    ///
    /// The key goes between the command and the returned arguments.
    #[must_use]
    pub fn value_request(self) -> (&'static str, Vec<RespValue>) {
        match self {
            Self::String | Self::None => ("get", Vec::new()),
            Self::Hash => ("hgetall", Vec::new()),
            Self::List => ("lrange", vec![RespValue::Integer(0), RespValue::Integer(-1)]),
            Self::Set => ("smembers", Vec::new()),
            Self::ZSet => (
                "zrange",
                vec![
                    RespValue::Integer(0),
                    RespValue::Integer(-1),
                    RespValue::from("WITHSCORES"),
                ],
            ),
        }
    }

    /// Incremental scan command, for the types that have one
    #[must_use]
    pub const fn scan_command(self) -> Option<&'static str> {
        match self {
            Self::Hash => Some("hscan"),
            Self::Set => Some("sscan"),
            Self::ZSet => Some("zscan"),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyType {
    type Err = RedisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "hash" => Ok(Self::Hash),
            "list" => Ok(Self::List),
            "set" => Ok(Self::Set),
            "zset" => Ok(Self::ZSet),
            "none" => Ok(Self::None),
            other => Err(RedisError::UnexpectedResponse(format!(
                "unknown key type: {other}"
            ))),
        }
    }
}

/// A key to inspect, with the type the caller believes it has
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Raw key bytes
    pub key: Bytes,
    /// Declared type, which selects the commands sent for this key
    pub key_type: KeyType,
}

impl Key {
    /// Create a key descriptor
    pub fn new(key: impl Into<Bytes>, key_type: KeyType) -> Self {
        Self {
            key: key.into(),
            key_type,
        }
    }
}
