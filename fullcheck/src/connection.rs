//! Transport and connection lifecycle
//!
//! [`Transport`] is the wire boundary: queue requests, flush them, read the
//! replies back in order. [`RedisConnection`] implements it over TCP.
//! [`ConnectionManager`] owns at most one live transport and re-establishes it
//! (dial, auth, select) on demand.

use crate::core::{
    config::HostConfig,
    error::{RedisError, RedisResult},
    protocol::{Frame, RespDecoder, RespEncoder},
    value::RespValue,
};
use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use std::future::Future;
use std::io::{self, Cursor};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

/// A Redis-protocol connection that supports pipelining
#[async_trait]
pub trait Transport: Send {
    /// Queue a request without waiting for its reply.
    async fn send(&mut self, command: &str, args: &[RespValue]) -> RedisResult<()>;

    /// Write every queued request to the server.
    async fn flush(&mut self) -> RedisResult<()>;

    /// Read the next reply, in request order. Error replies come back as
    /// [`RespValue::Error`].
    async fn receive(&mut self) -> RedisResult<RespValue>;

    /// Send one request and wait for its reply; an error reply becomes
    /// [`RedisError::Server`].
    async fn execute(&mut self, command: &str, args: &[RespValue]) -> RedisResult<RespValue> {
        self.send(command, args).await?;
        self.flush().await?;
        self.receive().await?.into_result()
    }
}

/// Opens transports to an endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    /// Dial `host` and return a raw, unauthenticated transport.
    async fn dial(&self, host: &HostConfig) -> RedisResult<Box<dyn Transport>>;
}

/// Dials plain TCP connections
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn dial(&self, host: &HostConfig) -> RedisResult<Box<dyn Transport>> {
        let conn = RedisConnection::connect(host).await?;
        Ok(Box::new(conn))
    }
}

/// A TCP connection to a Redis server
pub struct RedisConnection {
    stream: TcpStream,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
    io_timeout: Option<Duration>,
    // Arrays still being filled, innermost last: (elements missing, elements so far)
    partial: Vec<(usize, Vec<RespValue>)>,
}

impl RedisConnection {
    /// Connect to `host.address`, bounding the dial by the host timeout when
    /// one is configured.
    pub async fn connect(host: &HostConfig) -> RedisResult<Self> {
        debug!("Dialing {}", host);
        let io_timeout = host.timeout();
        let stream = with_deadline(io_timeout, TcpStream::connect(&host.address)).await?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            read_buffer: BytesMut::with_capacity(16 * 1024),
            write_buffer: BytesMut::with_capacity(4 * 1024),
            io_timeout,
            partial: Vec::new(),
        })
    }

    /// Read one reply. Every byte is decoded once: completed array elements
    /// are kept in `partial` while the rest of the array is still in flight.
    async fn read_reply(&mut self) -> RedisResult<RespValue> {
        loop {
            let mut cursor = Cursor::new(&self.read_buffer[..]);
            let Some(frame) = RespDecoder::decode_frame(&mut cursor)? else {
                let n = self.stream.read_buf(&mut self.read_buffer).await?;
                if n == 0 {
                    return Err(RedisError::closed_by_peer());
                }
                continue;
            };
            let consumed = cursor.position() as usize;
            self.read_buffer.advance(consumed);

            let value = match frame {
                Frame::Value(value) => value,
                Frame::ArrayStart(len) => {
                    self.partial.push((len, Vec::with_capacity(len.min(1024))));
                    continue;
                }
            };
            if let Some(done) = self.attach(value) {
                return Ok(done);
            }
        }
    }

    /// Add `value` to the innermost open array, closing every array it
    /// completes. Returns the finished top-level reply, if any.
    fn attach(&mut self, mut value: RespValue) -> Option<RespValue> {
        loop {
            let Some((missing, items)) = self.partial.last_mut() else {
                return Some(value);
            };
            items.push(value);
            *missing -= 1;
            if *missing > 0 {
                return None;
            }
            let (_, items) = self.partial.pop()?;
            value = RespValue::Array(items);
        }
    }
}

#[async_trait]
impl Transport for RedisConnection {
    async fn send(&mut self, command: &str, args: &[RespValue]) -> RedisResult<()> {
        RespEncoder::encode_command_into(command, args, &mut self.write_buffer)
    }

    async fn flush(&mut self) -> RedisResult<()> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }
        let limit = self.io_timeout;
        let pending = self.write_buffer.split();
        let stream = &mut self.stream;
        let write = async move {
            stream.write_all(&pending).await?;
            stream.flush().await
        };
        with_deadline(limit, write).await
    }

    async fn receive(&mut self) -> RedisResult<RespValue> {
        match self.io_timeout {
            Some(limit) => timeout(limit, self.read_reply())
                .await
                .map_err(|_| RedisError::Timeout)?,
            None => self.read_reply().await,
        }
    }
}

async fn with_deadline<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = io::Result<T>>,
) -> RedisResult<T> {
    match limit {
        Some(limit) => timeout(limit, fut)
            .await
            .map_err(|_| RedisError::Timeout)?
            .map_err(RedisError::Io),
        None => fut.await.map_err(RedisError::Io),
    }
}

/// Owns the client's single transport and brings it up on demand
pub struct ConnectionManager {
    host: HostConfig,
    db: u32,
    connector: Arc<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
}

impl ConnectionManager {
    /// Create a disconnected manager for database `db` on `host`
    pub fn new(host: HostConfig, db: u32, connector: Arc<dyn Connector>) -> Self {
        Self {
            host,
            db,
            connector,
            transport: None,
        }
    }

    /// Dial, authenticate and select the database unless a transport is
    /// already live.
    ///
    /// A transport that fails auth or select is dropped rather than kept.
    pub async fn connect(&mut self) -> RedisResult<()> {
        if self.transport.is_some() {
            return Ok(());
        }

        let mut transport = self.connector.dial(&self.host).await?;

        if let Some(password) = self.host.password() {
            let auth = self.host.auth_type.command();
            debug!("Authenticating to {} with {}", self.host, auth);
            transport
                .execute(auth, &[RespValue::from(password)])
                .await
                .map_err(|e| match e {
                    RedisError::Server(msg) => RedisError::Auth(msg),
                    other => other,
                })?;
        }

        transport
            .execute("select", &[RespValue::Integer(i64::from(self.db))])
            .await?;

        info!("Connected to {} db {}", self.host, self.db);
        self.transport = Some(transport);
        Ok(())
    }

    /// The live transport
    pub fn transport(&mut self) -> RedisResult<&mut (dyn Transport + 'static)> {
        self.transport
            .as_deref_mut()
            .ok_or_else(|| RedisError::Connection(format!("{} is not connected", self.host)))
    }

    /// Drop the transport, if any. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!("Closed connection to {}", self.host);
        }
    }

    /// Whether a transport is live
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Endpoint this manager connects to
    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    /// Database selected after each connect
    pub fn db(&self) -> u32 {
        self.db
    }
}
