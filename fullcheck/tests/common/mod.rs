//! In-process Redis stand-in for integration tests
//!
//! Speaks RESP2 over a real TCP listener and implements the handful of read
//! commands the client issues, against a fixed in-memory keyspace. Scan
//! cursors are plain offsets into each collection.

#![allow(dead_code)]

use bytes::{Buf, Bytes, BytesMut};
use fullcheck::protocol::{RespDecoder, RespEncoder};
use fullcheck::{HostConfig, RespValue};
use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A stored value. Collections keep insertion order so scans page
/// deterministically.
#[derive(Debug, Clone)]
pub enum Value {
    String(Bytes),
    Hash(Vec<(Bytes, Bytes)>),
    List(Vec<Bytes>),
    Set(Vec<Bytes>),
    ZSet(Vec<(Bytes, Bytes)>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Hash(_) => "hash",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::ZSet(_) => "zset",
        }
    }
}

#[derive(Default)]
struct Shared {
    keyspace: Mutex<HashMap<Bytes, Value>>,
    password: Mutex<Option<String>>,
    drop_next: AtomicUsize,
    accepted: AtomicUsize,
    commands: Mutex<Vec<String>>,
}

/// Handle to a running fake server
#[derive(Clone)]
pub struct FakeRedis {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl FakeRedis {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Shared::default());

        let accept_shared = shared.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                accept_shared.accepted.fetch_add(1, Ordering::SeqCst);
                let dropped = accept_shared
                    .drop_next
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
                if dropped {
                    drop(socket);
                    continue;
                }
                tokio::spawn(serve(socket, accept_shared.clone()));
            }
        });

        Self { addr, shared }
    }

    /// Host descriptor pointing at this server.
    pub fn host(&self) -> HostConfig {
        HostConfig::new(self.addr.to_string()).with_timeout_ms(2_000)
    }

    pub fn require_password(&self, password: &str) {
        *self.shared.password.lock().unwrap() = Some(password.to_string());
    }

    /// Close the next `n` accepted connections straight away.
    pub fn drop_next_connections(&self, n: usize) {
        self.shared.drop_next.store(n, Ordering::SeqCst);
    }

    /// Connections accepted so far, dropped ones included.
    pub fn accepted(&self) -> usize {
        self.shared.accepted.load(Ordering::SeqCst)
    }

    /// Command names received so far, lowercased.
    pub fn commands(&self) -> Vec<String> {
        self.shared.commands.lock().unwrap().clone()
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.shared
            .keyspace
            .lock()
            .unwrap()
            .insert(Bytes::copy_from_slice(key.as_bytes()), value);
    }

    /// Seed one key of every type.
    pub fn seed(&self) {
        self.insert("str", Value::String(b("hello")));
        self.insert("hash", Value::Hash(vec![(b("f1"), b("v1")), (b("f2"), b("v2"))]));
        self.insert("list", Value::List(vec![b("a"), b("b"), b("c")]));
        self.insert("set", Value::Set(vec![b("x"), b("y")]));
        self.insert("zset", Value::ZSet(vec![(b("m1"), b("1")), (b("m2"), b("2.5"))]));
    }
}

/// A listener that accepts connections and never answers. Returns the
/// address and a count of accepted connections.
pub async fn silent_listener() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            open.push(socket);
        }
    });

    (addr, accepted)
}

pub fn b(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

async fn serve(mut socket: TcpStream, shared: Arc<Shared>) {
    let mut read_buffer = BytesMut::with_capacity(4096);
    let mut authenticated = shared.password.lock().unwrap().is_none();

    loop {
        let mut replies = BytesMut::new();
        loop {
            let mut cursor = Cursor::new(&read_buffer[..]);
            let request = match RespDecoder::decode(&mut cursor) {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(_) => return,
            };
            let consumed = cursor.position() as usize;
            read_buffer.advance(consumed);

            let Ok(parts) = request.into_array() else {
                return;
            };
            let mut words = parts.iter().filter_map(|p| p.as_bytes().ok());
            let Some(name) = words.next() else {
                return;
            };
            let name = String::from_utf8_lossy(&name).to_lowercase();
            let args: Vec<Bytes> = words.collect();
            shared.commands.lock().unwrap().push(name.clone());

            let reply = if name == "auth" || name == "adminauth" {
                let expected = shared.password.lock().unwrap().clone();
                let given = args.first().map(|a| String::from_utf8_lossy(a).into_owned());
                if expected.is_none() || expected == given {
                    authenticated = true;
                    RespValue::SimpleString("OK".into())
                } else {
                    RespValue::Error("WRONGPASS invalid username-password pair".into())
                }
            } else if !authenticated {
                RespValue::Error("NOAUTH Authentication required.".into())
            } else {
                let keyspace = shared.keyspace.lock().unwrap();
                dispatch(&keyspace, &name, &args)
            };
            RespEncoder::encode(&reply, &mut replies);
        }

        if !replies.is_empty() && socket.write_all(&replies).await.is_err() {
            return;
        }
        match socket.read_buf(&mut read_buffer).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

fn wrong_type() -> RespValue {
    RespValue::Error(
        "WRONGTYPE Operation against a key holding the wrong kind of value".into(),
    )
}

fn bulk(data: &Bytes) -> RespValue {
    RespValue::BulkString(data.clone())
}

fn flat_pairs<'a>(pairs: impl IntoIterator<Item = &'a (Bytes, Bytes)>) -> Vec<RespValue> {
    pairs
        .into_iter()
        .flat_map(|(k, v)| [bulk(k), bulk(v)])
        .collect()
}

fn arg_usize(args: &[Bytes], index: usize) -> Option<usize> {
    std::str::from_utf8(args.get(index)?).ok()?.parse().ok()
}

fn dispatch(keyspace: &HashMap<Bytes, Value>, name: &str, args: &[Bytes]) -> RespValue {
    let value = args.first().and_then(|key| keyspace.get(key));
    let len = |n: usize| RespValue::Integer(n as i64);
    let empty = || RespValue::Array(Vec::new());

    match (name, value) {
        ("ping", _) => RespValue::SimpleString("PONG".into()),
        ("select", _) => RespValue::SimpleString("OK".into()),
        ("info", _) => info_reply(keyspace, args.first()),

        ("type", v) => RespValue::SimpleString(v.map_or("none", Value::type_name).into()),
        ("exists", v) => len(usize::from(v.is_some())),

        ("strlen", Some(Value::String(s))) => len(s.len()),
        ("hlen", Some(Value::Hash(h))) => len(h.len()),
        ("llen", Some(Value::List(l))) => len(l.len()),
        ("scard", Some(Value::Set(s))) => len(s.len()),
        ("zcard", Some(Value::ZSet(z))) => len(z.len()),
        ("strlen" | "hlen" | "llen" | "scard" | "zcard", None) => len(0),

        ("get", Some(Value::String(s))) => bulk(s),
        ("get", None) => RespValue::Null,
        ("hgetall", Some(Value::Hash(h))) => RespValue::Array(flat_pairs(h)),
        ("lrange", Some(Value::List(l))) => RespValue::Array(l.iter().map(bulk).collect()),
        ("smembers", Some(Value::Set(s))) => RespValue::Array(s.iter().map(bulk).collect()),
        ("zrange", Some(Value::ZSet(z))) => RespValue::Array(flat_pairs(z)),
        ("hgetall" | "lrange" | "smembers" | "zrange", None) => empty(),

        ("sismember", Some(Value::Set(s))) => {
            len(usize::from(args.get(1).is_some_and(|m| s.contains(m))))
        }
        ("sismember", None) => len(0),
        ("zscore", Some(Value::ZSet(z))) => args
            .get(1)
            .and_then(|m| z.iter().find(|(member, _)| member == m))
            .map_or(RespValue::Null, |(_, score)| bulk(score)),
        ("zscore", None) => RespValue::Null,

        ("hscan", Some(Value::Hash(h))) => scan_page(args, h.len(), |range| {
            flat_pairs(&h[range])
        }),
        ("sscan", Some(Value::Set(s))) => {
            scan_page(args, s.len(), |range| s[range].iter().map(bulk).collect())
        }
        ("zscan", Some(Value::ZSet(z))) => scan_page(args, z.len(), |range| {
            flat_pairs(&z[range])
        }),
        ("hscan" | "sscan" | "zscan", None) => RespValue::Array(vec![bulk(&b("0")), empty()]),

        (
            "strlen" | "hlen" | "llen" | "scard" | "zcard" | "get" | "hgetall" | "lrange"
            | "smembers" | "zrange" | "sismember" | "zscore" | "hscan" | "sscan" | "zscan",
            Some(_),
        ) => wrong_type(),

        (other, _) => RespValue::Error(format!("ERR unknown command '{other}'")),
    }
}

/// `<cmd> key cursor count n`: return `n` items from offset `cursor`.
fn scan_page(
    args: &[Bytes],
    total: usize,
    items: impl FnOnce(std::ops::Range<usize>) -> Vec<RespValue>,
) -> RespValue {
    let start = arg_usize(args, 1).unwrap_or(0).min(total);
    let count = arg_usize(args, 3).unwrap_or(10).max(1);
    let end = (start + count).min(total);
    let next = if end == total { 0 } else { end };
    RespValue::Array(vec![
        bulk(&b(&next.to_string())),
        RespValue::Array(items(start..end)),
    ])
}

fn info_reply(keyspace: &HashMap<Bytes, Value>, section: Option<&Bytes>) -> RespValue {
    let keyspace_section = if keyspace.is_empty() {
        "# Keyspace\r\n".to_string()
    } else {
        format!("# Keyspace\r\ndb0:keys={},expires=0,avg_ttl=0\r\n", keyspace.len())
    };
    let text = match section.map(|s| s.to_ascii_lowercase()) {
        Some(s) if s == b"keyspace" => keyspace_section,
        _ => format!(
            "# Server\r\nredis_version:7.2.4\r\nredis_mode:standalone\r\n\r\n{keyspace_section}"
        ),
    };
    RespValue::BulkString(Bytes::from(text))
}
