//! A string-keyed parameter map, used to move feeds in and out of query strings.

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

/// Case-sensitive, unique-key parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    inner: BTreeMap<String, String>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Parse `k1=v1&k2=v2`. Percent escapes are decoded; `+` is a space.
    /// A key that appears twice is rejected.
    pub fn from_query(query: &str) -> Result<Self> {
        let mut values = Self::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = percent_decode(key)?;
            if values.inner.contains_key(&key) {
                return Err(CoreError::InvalidValue(format!(
                    "duplicate query parameter: {}",
                    key
                )));
            }
            values.inner.insert(key, percent_decode(value)?);
        }
        Ok(values)
    }

    /// Render as `k1=v1&k2=v2`, keys in sorted order.
    pub fn to_query(&self) -> String {
        self.inner
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn percent_decode(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1..i + 3).ok_or_else(|| {
                    CoreError::InvalidValue(format!("truncated percent escape in {:?}", s))
                })?;
                let mut decoded = [0u8; 1];
                hex::decode_to_slice(escape, &mut decoded).map_err(|_| {
                    CoreError::InvalidValue(format!("bad percent escape in {:?}", s))
                })?;
                out.push(decoded[0]);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| CoreError::InvalidValue("query is not UTF-8".into()))
}
