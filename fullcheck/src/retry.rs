//! Bounded retry around pipelined rounds
//!
//! Every request the client makes goes through [`RetryExecutor::run`]. A
//! network failure at any stage (dial, auth, send, flush, receive) drops the
//! transport, waits for the policy backoff, reconnects and replays the whole
//! round. Any other failure is returned at once. The requests are reads, so
//! replaying them is safe.

use crate::connection::ConnectionManager;
use crate::core::{config::RetryPolicy, error::RedisResult, value::RespValue};
use crate::pipeline::Pipeline;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Runs pipelines against a [`ConnectionManager`] under a [`RetryPolicy`]
pub struct RetryExecutor {
    manager: ConnectionManager,
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create an executor
    pub fn new(manager: ConnectionManager, policy: RetryPolicy) -> Self {
        Self { manager, policy }
    }

    /// Run `pipeline`, retrying network failures up to
    /// `policy.max_retries` times.
    ///
    /// On success the replies line up with the queued requests. When the
    /// retries run out, the last network error is returned.
    pub async fn run(&mut self, pipeline: &Pipeline) -> RedisResult<Vec<RespValue>> {
        if pipeline.is_empty() {
            return Ok(Vec::new());
        }

        let mut retries = 0;
        loop {
            match self.attempt(pipeline).await {
                Ok(replies) => return Ok(replies),
                Err(err) if err.is_network_error() && retries < self.policy.max_retries => {
                    retries += 1;
                    warn!(
                        "{}: network error, retrying ({}/{}): {}",
                        self.manager.host(),
                        retries,
                        self.policy.max_retries,
                        err
                    );
                    self.manager.close();
                    sleep(self.policy.backoff).await;
                }
                Err(err) => {
                    // Partial writes or undecodable bytes leave the stream
                    // unusable either way.
                    self.manager.close();
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(&mut self, pipeline: &Pipeline) -> RedisResult<Vec<RespValue>> {
        self.manager.connect().await?;
        debug!(
            "{}: sending {} pipelined requests",
            self.manager.host(),
            pipeline.len()
        );
        pipeline.run_on(self.manager.transport()?).await
    }

    /// Connection manager, for lifecycle queries
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Drop the transport; the next run reconnects.
    pub fn close(&mut self) {
        self.manager.close();
    }
}
