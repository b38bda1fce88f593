//! Request batching
//!
//! A [`Pipeline`] queues every request, flushes once, then reads the replies
//! in the order the requests were queued. One round trip covers the whole
//! batch.

use crate::connection::Transport;
use crate::core::{error::RedisResult, value::RespValue};

/// One command and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    command: String,
    args: Vec<RespValue>,
}

impl Request {
    /// Create a request
    pub fn new(command: impl Into<String>, args: Vec<RespValue>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// An ordered batch of requests sent in a single round trip
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    requests: Vec<Request>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty pipeline with room for `capacity` requests
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            requests: Vec::with_capacity(capacity),
        }
    }

    /// Queue a request
    pub fn add(&mut self, command: impl Into<String>, args: Vec<RespValue>) -> &mut Self {
        self.requests.push(Request::new(command, args));
        self
    }

    /// Number of queued requests
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Run one round on `transport`: send everything, flush, then read one
    /// reply per request.
    ///
    /// Error replies are returned in place as [`RespValue::Error`] and the
    /// remaining replies are still read, so the transport stays in step with
    /// the server. Only transport-level failures end the round early.
    pub async fn run_on(&self, transport: &mut dyn Transport) -> RedisResult<Vec<RespValue>> {
        for request in &self.requests {
            transport.send(&request.command, &request.args).await?;
        }
        transport.flush().await?;

        let mut replies = Vec::with_capacity(self.requests.len());
        for _ in 0..self.requests.len() {
            replies.push(transport.receive().await?);
        }
        Ok(replies)
    }
}

impl FromIterator<Request> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Request>>(iter: I) -> Self {
        Self {
            requests: iter.into_iter().collect(),
        }
    }
}
