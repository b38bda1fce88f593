//! Verification client
//!
//! [`RedisClient`] owns one connection to one endpoint and exposes the reads
//! a consistency check needs. Every call runs through the retry executor.
//! A client is driven through `&mut self`; run one client per task and
//! several clients for concurrency.

use crate::connection::{ConnectionManager, Connector, TcpConnector};
use crate::core::{
    config::{HostConfig, RetryPolicy},
    error::{RedisError, RedisResult},
    info::{parse_info, parse_keyspace},
    value::RespValue,
};
use crate::pipeline::Pipeline;
use crate::retry::RetryExecutor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Resilient client for one Redis endpoint and database
pub struct RedisClient {
    pub(crate) executor: RetryExecutor,
}

impl RedisClient {
    /// Connect to database `db` on `host` over TCP with the default retry
    /// policy.
    ///
    /// The client checks the endpoint with `ping` before returning.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fullcheck::{HostConfig, Key, KeyType, RedisClient, Role};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let host = HostConfig::new("127.0.0.1:6379").with_role(Role::Source);
    ///     let mut client = RedisClient::connect(host, 0).await?;
    ///
    ///     let keys = vec![Key::new("user:1", KeyType::Hash)];
    ///     let lengths = client.pipe_lengths(&keys).await?;
    ///     println!("{lengths:?}");
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(host: HostConfig, db: u32) -> RedisResult<Self> {
        Self::connect_with(host, db, RetryPolicy::default(), Arc::new(TcpConnector)).await
    }

    /// Connect with an explicit retry policy and connector.
    pub async fn connect_with(
        host: HostConfig,
        db: u32,
        policy: RetryPolicy,
        connector: Arc<dyn Connector>,
    ) -> RedisResult<Self> {
        host.validate()?;
        let manager = ConnectionManager::new(host, db, connector);
        let mut client = Self {
            executor: RetryExecutor::new(manager, policy),
        };

        match client.execute("ping", Vec::new()).await? {
            RespValue::SimpleString(ref s) if s == "PONG" => {}
            other => {
                client.close();
                return Err(RedisError::UnexpectedResponse(format!(
                    "ping returned {other:?}"
                )));
            }
        }

        info!("{} ready (db {})", client.host(), client.db());
        Ok(client)
    }

    /// Send one command and wait for its reply, retrying network failures.
    ///
    /// An error reply becomes [`RedisError::Server`].
    pub async fn execute(
        &mut self,
        command: &str,
        args: Vec<RespValue>,
    ) -> RedisResult<RespValue> {
        let mut pipeline = Pipeline::with_capacity(1);
        pipeline.add(command, args);
        let reply = self
            .executor
            .run(&pipeline)
            .await?
            .pop()
            .ok_or_else(|| RedisError::UnexpectedResponse(format!("no reply to {command}")))?;
        reply.into_result()
    }

    /// Run `INFO` (optionally for one section) and parse it into
    /// field → value.
    pub async fn info(&mut self, section: Option<&str>) -> RedisResult<HashMap<String, String>> {
        let args = section.map(RespValue::from).into_iter().collect();
        let reply = self.execute("info", args).await?;
        Ok(parse_info(&reply.as_bytes()?))
    }

    /// Run `INFO keyspace` and parse it into database index → key count.
    pub async fn info_keyspace(&mut self) -> RedisResult<HashMap<u32, i64>> {
        let reply = self.execute("info", vec![RespValue::from("keyspace")]).await?;
        parse_keyspace(&reply.as_bytes()?)
    }

    /// Drop the connection. The next call reconnects.
    pub fn close(&mut self) {
        self.executor.close();
    }

    /// Endpoint this client talks to
    pub fn host(&self) -> &HostConfig {
        self.executor.manager().host()
    }

    /// Selected database
    pub fn db(&self) -> u32 {
        self.executor.manager().db()
    }

    /// Whether a connection is currently open
    pub fn is_connected(&self) -> bool {
        self.executor.manager().is_connected()
    }
}

impl fmt::Display for RedisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.host(), f)
    }
}
