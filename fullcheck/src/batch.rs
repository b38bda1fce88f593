//! Pipelined batch reads
//!
//! Each method queues one request per input item, flushes once and reads the
//! replies back in order. On success the output has one entry per input, in
//! input order. A server error reply for any item fails the whole batch,
//! except that [`RedisClient::pipe_lengths`] records `-1` for keys whose
//! actual type does not match the declared one.

use crate::client::RedisClient;
use crate::core::{
    decode::DecodedValue,
    error::RedisResult,
    types::Key,
    value::RespValue,
};
use crate::pipeline::{Pipeline, Request};
use bytes::Bytes;

/// Length reported for a key whose server-side type differs from the
/// declared one
pub const WRONG_TYPE_LENGTH: i64 = -1;

impl RedisClient {
    /// `TYPE` of every key, as the server names it.
    pub async fn pipe_types(&mut self, keys: &[Key]) -> RedisResult<Vec<String>> {
        let pipeline = per_key(keys, |_| ("type", Vec::new()));
        self.collect(&pipeline, |reply| reply.into_result()?.as_string())
            .await
    }

    /// `EXISTS` of every key: 1 if present, 0 if not.
    pub async fn pipe_exists(&mut self, keys: &[Key]) -> RedisResult<Vec<i64>> {
        let pipeline = per_key(keys, |_| ("exists", Vec::new()));
        self.collect(&pipeline, |reply| reply.into_result()?.as_int())
            .await
    }

    /// Length of every key, measured with the command for its declared type.
    ///
    /// A key holding a different type yields [`WRONG_TYPE_LENGTH`] in its
    /// slot; the rest of the batch is unaffected. Any other error reply fails
    /// the batch.
    pub async fn pipe_lengths(&mut self, keys: &[Key]) -> RedisResult<Vec<i64>> {
        let pipeline = per_key(keys, |key| (key.key_type.length_command(), Vec::new()));
        self.collect(&pipeline, |reply| match reply.into_result() {
            Ok(len) => len.as_int(),
            Err(err) if err.is_wrong_type() => Ok(WRONG_TYPE_LENGTH),
            Err(err) => Err(err),
        })
        .await
    }

    /// Whole value of every key, fetched with the command for its declared
    /// type, as the raw reply.
    ///
    /// Use [`DecodedValue::decode`] or [`pipe_decoded_values`] to get typed
    /// values.
    ///
    /// [`pipe_decoded_values`]: RedisClient::pipe_decoded_values
    pub async fn pipe_values(&mut self, keys: &[Key]) -> RedisResult<Vec<RespValue>> {
        let pipeline = per_key(keys, |key| key.key_type.value_request());
        self.collect(&pipeline, RespValue::into_result).await
    }

    /// Like [`pipe_values`](RedisClient::pipe_values), decoding each reply by
    /// the key's declared type.
    pub async fn pipe_decoded_values(&mut self, keys: &[Key]) -> RedisResult<Vec<DecodedValue>> {
        let replies = self.pipe_values(keys).await?;
        keys.iter()
            .zip(replies)
            .map(|(key, reply)| DecodedValue::decode(key.key_type, reply))
            .collect()
    }

    /// `SISMEMBER key member` for every member.
    pub async fn pipe_sismember(
        &mut self,
        key: &Bytes,
        members: &[Bytes],
    ) -> RedisResult<Vec<bool>> {
        let pipeline = per_member(key, members, "SISMEMBER");
        self.collect(&pipeline, |reply| Ok(reply.into_result()?.as_int()? == 1))
            .await
    }

    /// `ZSCORE key member` for every member; `None` when the member is
    /// absent.
    pub async fn pipe_zscore(
        &mut self,
        key: &Bytes,
        members: &[Bytes],
    ) -> RedisResult<Vec<Option<Bytes>>> {
        let pipeline = per_member(key, members, "ZSCORE");
        self.collect(&pipeline, |reply| reply.into_result()?.into_optional_bytes())
            .await
    }

    async fn collect<T>(
        &mut self,
        pipeline: &Pipeline,
        convert: impl FnMut(RespValue) -> RedisResult<T>,
    ) -> RedisResult<Vec<T>> {
        self.executor
            .run(pipeline)
            .await?
            .into_iter()
            .map(convert)
            .collect()
    }
}

fn per_key(
    keys: &[Key],
    request: impl Fn(&Key) -> (&'static str, Vec<RespValue>),
) -> Pipeline {
    let mut pipeline = Pipeline::with_capacity(keys.len());
    for key in keys {
        let (command, extra) = request(key);
        let mut args = Vec::with_capacity(1 + extra.len());
        args.push(RespValue::from(&key.key));
        args.extend(extra);
        pipeline.add(command, args);
    }
    pipeline
}

fn per_member(key: &Bytes, members: &[Bytes], command: &str) -> Pipeline {
    members
        .iter()
        .map(|member| {
            Request::new(command, vec![RespValue::from(key), RespValue::from(member)])
        })
        .collect()
}
