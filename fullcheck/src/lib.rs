//! Resilient Redis data-access client for consistency checks
//!
//! `fullcheck` talks to a source or target Redis endpoint on behalf of a
//! migration checker. It keeps one connection per client, reconnects and
//! replays reads after network failures, and exposes pipelined batch reads
//! over large key sets plus an incremental scan for big collections.
//!
//! # Features
//!
//! - Bounded retry with reconnect, `auth`/`adminauth` and `select` on every
//!   fresh connection
//! - One round trip per batch: types, existence, lengths, whole values,
//!   set membership and sorted-set scores
//! - `HSCAN`/`SSCAN`/`ZSCAN` walking for values too large to fetch at once
//! - `INFO` and `INFO keyspace` parsing
//!
//! # Quick Start
//!
//! ```no_run
//! use fullcheck::{HostConfig, Key, KeyType, RedisClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = HostConfig::new("127.0.0.1:6379").with_password("secret");
//!     let mut client = RedisClient::connect(host, 0).await?;
//!
//!     let keys = vec![
//!         Key::new("user:1", KeyType::Hash),
//!         Key::new("queue", KeyType::List),
//!     ];
//!     let types = client.pipe_types(&keys).await?;
//!     let lengths = client.pipe_lengths(&keys).await?;
//!     println!("{types:?} {lengths:?}");
//!
//!     let fields = client.scan_value(&keys[0], 512).await?;
//!     println!("{} fields", fields.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

pub mod batch;
pub mod client;
pub mod connection;
pub mod pipeline;
pub mod retry;
pub mod scan;

#[cfg(test)]
mod mock;

pub use fullcheck_core as core;

pub use batch::WRONG_TYPE_LENGTH;
pub use client::RedisClient;
pub use connection::{ConnectionManager, Connector, RedisConnection, TcpConnector, Transport};
pub use pipeline::{Pipeline, Request};
pub use retry::RetryExecutor;

pub use fullcheck_core::{
    config::{AuthType, HostConfig, RetryPolicy, Role},
    decode::{DecodedValue, FieldMap},
    error::{RedisError, RedisResult},
    types::{Key, KeyType},
    value::RespValue,
};
pub use fullcheck_core::{decode, info, protocol};
