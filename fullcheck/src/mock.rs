//! Scripted in-memory transport for unit tests

use crate::connection::{Connector, Transport};
use crate::core::{
    config::HostConfig,
    error::{RedisError, RedisResult},
    value::RespValue,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

type Handler = dyn Fn(&str, &[RespValue]) -> RespValue + Send + Sync;

#[derive(Default)]
struct State {
    dials: usize,
    dial_failures: usize,
    flush_failures: usize,
    receive_failures: usize,
    commands: Vec<String>,
}

/// Shared script behind every transport a [`MockServer`] hands out
#[derive(Clone)]
pub(crate) struct MockServer {
    state: Arc<Mutex<State>>,
    password: Option<String>,
    ping_reply: RespValue,
    handler: Arc<Handler>,
}

impl MockServer {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::default(),
            password: None,
            ping_reply: RespValue::SimpleString("PONG".into()),
            handler: Arc::new(|_: &str, _: &[RespValue]| RespValue::Null),
        }
    }

    /// Answer non-connection commands with `handler`.
    pub(crate) fn with_handler(
        mut self,
        handler: impl Fn(&str, &[RespValue]) -> RespValue + Send + Sync + 'static,
    ) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    pub(crate) fn with_ping_reply(mut self, reply: RespValue) -> Self {
        self.ping_reply = reply;
        self
    }

    pub(crate) fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Fail the next `n` dials with a refused connection.
    pub(crate) fn fail_dials(&self, n: usize) {
        self.state.lock().unwrap().dial_failures = n;
    }

    /// Fail the next `n` flushes with a broken pipe.
    pub(crate) fn fail_flushes(&self, n: usize) {
        self.state.lock().unwrap().flush_failures = n;
    }

    /// Fail the next `n` reads with a reset connection.
    pub(crate) fn fail_receives(&self, n: usize) {
        self.state.lock().unwrap().receive_failures = n;
    }

    pub(crate) fn dials(&self) -> usize {
        self.state.lock().unwrap().dials
    }

    /// Every command sent so far, rendered as space-separated text.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Commands sent so far, minus connection setup.
    pub(crate) fn data_commands(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| !c.starts_with("select") && !c.starts_with("auth") && c != "ping")
            .collect()
    }

    pub(crate) fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(self.clone())
    }

    fn reply(&self, command: &str, args: &[RespValue]) -> RespValue {
        match command {
            "ping" => self.ping_reply.clone(),
            "select" => RespValue::SimpleString("OK".into()),
            "auth" | "adminauth" => {
                let given = args.first().and_then(|a| a.as_string().ok());
                match &self.password {
                    Some(expected) if given.as_deref() != Some(expected.as_str()) => {
                        RespValue::Error("WRONGPASS invalid password".into())
                    }
                    _ => RespValue::SimpleString("OK".into()),
                }
            }
            _ => (self.handler)(command, args),
        }
    }
}

#[async_trait]
impl Connector for MockServer {
    async fn dial(&self, _host: &HostConfig) -> RedisResult<Box<dyn Transport>> {
        let mut state = self.state.lock().unwrap();
        state.dials += 1;
        if state.dial_failures > 0 {
            state.dial_failures -= 1;
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into());
        }
        Ok(Box::new(MockTransport {
            server: self.clone(),
            queued: VecDeque::new(),
            pending: VecDeque::new(),
        }))
    }
}

struct MockTransport {
    server: MockServer,
    queued: VecDeque<RespValue>,
    pending: VecDeque<RespValue>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, command: &str, args: &[RespValue]) -> RedisResult<()> {
        let rendered = std::iter::once(command.to_string())
            .chain(args.iter().map(|a| match a {
                RespValue::Integer(i) => i.to_string(),
                other => other.as_string().unwrap_or_else(|_| format!("{other:?}")),
            }))
            .collect::<Vec<_>>()
            .join(" ");
        self.server.state.lock().unwrap().commands.push(rendered);
        self.queued.push_back(self.server.reply(command, args));
        Ok(())
    }

    async fn flush(&mut self) -> RedisResult<()> {
        {
            let mut state = self.server.state.lock().unwrap();
            if state.flush_failures > 0 {
                state.flush_failures -= 1;
                self.queued.clear();
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe").into());
            }
        }
        self.pending.append(&mut self.queued);
        Ok(())
    }

    async fn receive(&mut self) -> RedisResult<RespValue> {
        {
            let mut state = self.server.state.lock().unwrap();
            if state.receive_failures > 0 {
                state.receive_failures -= 1;
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset").into());
            }
        }
        self.pending.pop_front().ok_or_else(RedisError::closed_by_peer)
    }
}
