use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::store::CursorStore;

#[derive(Clone)]
pub struct AppState {
    pub store: CursorStore,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: CursorStore::new(config.store.reset_time()),
            config,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query string of `GET /splitedfile`. Both fields stay raw so malformed
/// values never reject the request.
#[derive(Debug, Clone, Default)]
pub struct SplitQuery {
    pub filename: Option<String>,
    pub n: Option<String>,
}

impl SplitQuery {
    /// Build from raw query pairs; the first occurrence of a key wins.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "filename" if query.filename.is_none() => query.filename = Some(value),
                "n" if query.n.is_none() => query.n = Some(value),
                _ => {}
            }
        }
        query
    }

    /// Requested window size, parsed like a leading-integer parse.
    /// Missing, non-numeric and negative values all count as zero.
    pub fn count(&self) -> usize {
        self.n.as_deref().map_or(0, parse_count)
    }
}

fn parse_count(raw: &str) -> usize {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = &digits[..digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len())];
    if negative || digits.is_empty() {
        return 0;
    }
    digits.bytes().fold(0usize, |acc, d| {
        acc.saturating_mul(10).saturating_add(usize::from(d - b'0'))
    })
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub datasets: usize,
}
