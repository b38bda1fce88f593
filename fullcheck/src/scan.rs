//! Incremental value fetch for large collections
//!
//! Hashes, sets and sorted sets can be too large to fetch with one command.
//! [`RedisClient::scan_value`] walks them with `HSCAN`/`SSCAN`/`ZSCAN` until
//! the server hands back cursor 0.

use crate::client::RedisClient;
use crate::core::{
    decode::{extend_members, extend_pairs, FieldMap},
    error::{RedisError, RedisResult},
    types::{Key, KeyType},
    value::RespValue,
};
use tracing::{debug, error};

impl RedisClient {
    /// Fetch the whole value of a hash, set or sorted set, asking for at
    /// most `count` items per round.
    ///
    /// Hash fields map to their values and sorted-set members to their
    /// scores. Set members map to `None`. A field seen in several rounds
    /// keeps the last value.
    ///
    /// Iteration ends only when the server returns cursor 0, so the usual
    /// scan caveats apply to keys that change while being walked. Items
    /// that cannot be decoded yield [`RedisError::InvariantViolation`].
    pub async fn scan_value(&mut self, key: &Key, count: usize) -> RedisResult<FieldMap> {
        let command = key.key_type.scan_command().ok_or_else(|| {
            RedisError::Type(format!("cannot scan a key of type {}", key.key_type))
        })?;

        let mut map = FieldMap::new();
        let mut cursor: u64 = 0;
        let mut rounds = 0usize;
        loop {
            let reply = self
                .execute(
                    command,
                    vec![
                        RespValue::from(&key.key),
                        RespValue::from(cursor.to_string()),
                        RespValue::from("count"),
                        RespValue::from(count.to_string()),
                    ],
                )
                .await?;
            rounds += 1;

            let (next, items) = split_scan_reply(command, reply)?;
            let added = match key.key_type {
                KeyType::Set => extend_members(&mut map, items),
                _ => extend_pairs(&mut map, items),
            };
            if let Err(err) = added {
                error!("{command} {:?} returned undecodable items: {err}", key.key);
                return Err(RedisError::InvariantViolation(format!(
                    "{command} items not decodable: {err}"
                )));
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(
            "{command} {:?}: {} entries in {rounds} rounds",
            key.key,
            map.len()
        );
        Ok(map)
    }
}

/// Split a scan reply into the next cursor and its flat item list.
fn split_scan_reply(command: &str, reply: RespValue) -> RedisResult<(u64, Vec<RespValue>)> {
    let shape_error = |reply: &dyn std::fmt::Debug| {
        RedisError::UnexpectedResponse(format!("{command} returned {reply:?}"))
    };

    let mut parts = match reply {
        RespValue::Array(parts) if parts.len() == 2 => parts,
        other => return Err(shape_error(&other)),
    };
    let items = parts.pop().unwrap_or(RespValue::Null);
    let cursor = parts.pop().unwrap_or(RespValue::Null);

    let next = cursor
        .as_string()
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| shape_error(&cursor))?;

    match items {
        RespValue::Array(items) => Ok((next, items)),
        other => {
            error!("{command} returned a non-list item set: {other:?}");
            Err(RedisError::InvariantViolation(format!(
                "{command} item set is not a list: {other:?}"
            )))
        }
    }
}
