//! Parsers for `INFO` command output

use crate::error::{RedisError, RedisResult};
use std::collections::HashMap;

const KEYSPACE_HEADER: &str = "# Keyspace";

/// Parse the output of `INFO keyspace` into database index → key count.
///
/// ```
/// use fullcheck_core::info::parse_keyspace;
///
/// let text = b"# Keyspace\r\ndb0:keys=18,expires=0,avg_ttl=0\r\ndb2:keys=3,expires=1,avg_ttl=0\r\n";
/// let counts = parse_keyspace(text).unwrap();
/// assert_eq!(counts[&0], 18);
/// assert_eq!(counts[&2], 3);
/// ```
///
/// The text must start with the `# Keyspace` header. Every line starting
/// with `db` must look like `db<N>:keys=<count>,...`; one malformed line fails
/// the whole parse.
pub fn parse_keyspace(content: &[u8]) -> RedisResult<HashMap<u32, i64>> {
    let text = std::str::from_utf8(content)
        .map_err(|e| RedisError::InvalidInfo(format!("keyspace is not UTF-8: {e}")))?;
    if !text.starts_with(KEYSPACE_HEADER) {
        return Err(RedisError::InvalidInfo(format!(
            "missing {KEYSPACE_HEADER} header: {text:?}"
        )));
    }

    let mut counts = HashMap::new();
    for line in text.lines().map(str::trim) {
        let Some(rest) = line.strip_prefix("db") else {
            continue;
        };
        let (db, stats) = rest
            .split_once(':')
            .ok_or_else(|| RedisError::InvalidInfo(format!("no stats in line {line:?}")))?;
        let db = db
            .parse::<u32>()
            .map_err(|e| RedisError::InvalidInfo(format!("bad db index in {line:?}: {e}")))?;
        let keys = stats
            .split(',')
            .next()
            .and_then(|entry| entry.strip_prefix("keys="))
            .ok_or_else(|| RedisError::InvalidInfo(format!("no keys= entry in {line:?}")))?;
        let keys = keys
            .parse::<i64>()
            .map_err(|e| RedisError::InvalidInfo(format!("bad key count in {line:?}: {e}")))?;
        counts.insert(db, keys);
    }
    Ok(counts)
}

/// Parse generic `INFO` output into field → value.
///
/// Lines are split on CRLF and then on the first colon. Lines without a
/// colon (section headers, blanks) are skipped. Never fails.
///
/// Values are returned as text: any byte sequence that is not valid UTF-8
/// becomes U+FFFD in the field or value it appears in. Other lines are
/// unaffected. Read the raw reply when exact bytes matter.
///
/// ```
/// use fullcheck_core::info::parse_info;
///
/// let info = parse_info(b"# Server\r\nredis_version:7.2.4\r\n\r\n");
/// assert_eq!(info["redis_version"], "7.2.4");
/// assert_eq!(info.len(), 1);
/// ```
pub fn parse_info(content: &[u8]) -> HashMap<String, String> {
    String::from_utf8_lossy(content)
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .collect()
}
