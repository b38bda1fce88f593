//! Core types for the fullcheck verification client
//!
//! This crate holds the I/O-free pieces: RESP reply values and codec, the
//! error taxonomy, endpoint configuration, key descriptors, reply decoders
//! and `INFO` text parsers.

#![warn(missing_docs)]

pub mod config;
pub mod decode;
pub mod error;
pub mod info;
pub mod protocol;
pub mod types;
pub mod value;

pub use config::{AuthType, HostConfig, RetryPolicy, Role};
pub use decode::{DecodedValue, FieldMap};
pub use error::{RedisError, RedisResult};
pub use types::{Key, KeyType};
pub use value::RespValue;
