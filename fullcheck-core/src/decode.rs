//! Reply decoders
//!
//! Collection values come back as flat arrays: `hgetall` and
//! `zrange .. WITHSCORES` alternate field/value (member/score), `smembers`
//! lists members, `lrange` lists elements. These functions turn those shapes
//! into typed values. A nil or empty reply decodes to an empty value.

use crate::error::{RedisError, RedisResult};
use crate::types::KeyType;
use crate::value::RespValue;
use bytes::Bytes;
use std::collections::HashMap;

/// Field (or member) to value (or score) map; set members carry `None`
pub type FieldMap = HashMap<Bytes, Option<Bytes>>;

/// A fully decoded value of one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    /// The key was missing
    Nil,
    /// String value
    String(Bytes),
    /// Field to value
    Hash(FieldMap),
    /// Elements in order
    List(Vec<Bytes>),
    /// Members, each mapped to `None`
    Set(FieldMap),
    /// Member to score
    ZSet(FieldMap),
}

impl DecodedValue {
    /// Decode a value-fetch reply for a key of `key_type`.
    pub fn decode(key_type: KeyType, reply: RespValue) -> RedisResult<Self> {
        match key_type {
            KeyType::Hash => decode_pairs(reply).map(Self::Hash),
            KeyType::ZSet => decode_pairs(reply).map(Self::ZSet),
            KeyType::Set => decode_members(reply).map(Self::Set),
            KeyType::List => decode_list(reply).map(Self::List),
            KeyType::String | KeyType::None => match reply {
                RespValue::Null => Ok(Self::Nil),
                other => other.as_bytes().map(Self::String),
            },
        }
    }
}

/// Decode a flat field/value sequence into a map.
///
/// Later duplicates overwrite earlier ones. An odd number of items is an
/// error rather than a silent truncation.
pub fn decode_pairs(reply: RespValue) -> RedisResult<FieldMap> {
    let mut map = FieldMap::new();
    extend_pairs(&mut map, flat_items(reply)?)?;
    Ok(map)
}

/// Decode a flat member sequence into a map of members to `None`.
pub fn decode_members(reply: RespValue) -> RedisResult<FieldMap> {
    let mut map = FieldMap::new();
    extend_members(&mut map, flat_items(reply)?)?;
    Ok(map)
}

/// Decode a flat sequence into its elements, keeping order.
pub fn decode_list(reply: RespValue) -> RedisResult<Vec<Bytes>> {
    flat_items(reply)?.iter().map(RespValue::as_bytes).collect()
}

/// Add alternating field/value items to `map`.
pub fn extend_pairs(map: &mut FieldMap, items: Vec<RespValue>) -> RedisResult<()> {
    if items.len() % 2 != 0 {
        return Err(RedisError::Type(format!(
            "expected field/value pairs, got {} items",
            items.len()
        )));
    }
    map.reserve(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
        map.insert(field.as_bytes()?, Some(value.as_bytes()?));
    }
    Ok(())
}

/// Add member items to `map`, each with a `None` payload.
pub fn extend_members(map: &mut FieldMap, items: Vec<RespValue>) -> RedisResult<()> {
    map.reserve(items.len());
    for member in items {
        map.insert(member.as_bytes()?, None);
    }
    Ok(())
}

fn flat_items(reply: RespValue) -> RedisResult<Vec<RespValue>> {
    match reply {
        RespValue::Null => Ok(Vec::new()),
        other => other.into_array(),
    }
}
