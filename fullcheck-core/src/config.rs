//! Endpoint and retry configuration

use crate::error::{RedisError, RedisResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which side of a migration an endpoint is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The instance data is migrated from
    #[default]
    Source,
    /// The instance data is migrated to
    Target,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Command used to authenticate after dialing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Plain `auth <password>`
    #[default]
    Auth,
    /// `adminauth <password>`, used by some managed deployments
    AdminAuth,
}

impl AuthType {
    /// Command name sent to the server
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::AdminAuth => "adminauth",
        }
    }
}

/// Connection parameters for one Redis endpoint
///
/// ```
/// use fullcheck_core::{AuthType, HostConfig, Role};
///
/// let host = HostConfig::new("10.0.0.1:6379")
///     .with_password("secret")
///     .with_timeout_ms(3000)
///     .with_role(Role::Target)
///     .with_auth_type(AuthType::AdminAuth);
/// assert_eq!(host.to_string(), "target redis addr: 10.0.0.1:6379");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// `host:port` to dial
    pub address: String,

    /// Password sent with the auth command; no auth when absent
    #[serde(default)]
    pub password: Option<String>,

    /// Connect, read and write timeout in milliseconds; zero disables timeouts
    #[serde(default)]
    pub timeout_ms: u64,

    /// Migration side, used in log and error messages
    #[serde(default)]
    pub role: Role,

    /// Authentication command variant
    #[serde(default)]
    pub auth_type: AuthType,
}

impl HostConfig {
    /// Create a configuration for `address` with no password and no timeouts
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: None,
            timeout_ms: 0,
            role: Role::default(),
            auth_type: AuthType::default(),
        }
    }

    /// Set the password for authentication
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the connect/read/write timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the migration side
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the authentication command variant
    #[must_use]
    pub const fn with_auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = auth_type;
        self
    }

    /// Configured timeout, or `None` when timeouts are disabled
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }

    /// Check that the configuration can be dialed.
    pub fn validate(&self) -> RedisResult<()> {
        if self.address.trim().is_empty() {
            return Err(RedisError::Config(format!("{} has no address", self.role)));
        }
        Ok(())
    }

    /// Password to authenticate with, ignoring an empty string
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

impl fmt::Display for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} redis addr: {}", self.role, self.address)
    }
}

/// Bounded retry behaviour for network failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; the call fails once this many retries
    /// have also failed
    pub max_retries: usize,

    /// Pause after each network failure before reconnecting
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 20,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given retry ceiling and backoff
    #[must_use]
    pub const fn new(max_retries: usize, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }
}
