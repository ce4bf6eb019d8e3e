//! Memory-related types

use super::value::Value;
use serde::{Deserialize, Serialize};

/// Page protection flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protection {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Protection {
    pub fn new(read: bool, write: bool, execute: bool) -> Self {
        Self {
            read,
            write,
            execute,
        }
    }

    /// Parse `rwx` style strings; `-` or a missing position means unset
    pub fn parse(s: &str) -> Self {
        let bytes = s.as_bytes();
        Self {
            read: bytes.first() == Some(&b'r'),
            write: bytes.get(1) == Some(&b'w'),
            execute: bytes.get(2) == Some(&b'x'),
        }
    }

    /// Whether every flag set in `required` is also set here
    pub fn satisfies(&self, required: &Protection) -> bool {
        (!required.read || self.read)
            && (!required.write || self.write)
            && (!required.execute || self.execute)
    }
}

impl std::fmt::Display for Protection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' }
        )
    }
}

/// Memory range descriptor as produced by range listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDetails {
    pub base: u64,
    pub size: u64,
    pub protection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// One hit of a memory scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMatch {
    pub address: u64,
    pub size: u64,
}

impl From<RangeDetails> for Value {
    fn from(details: RangeDetails) -> Self {
        serde_json::to_value(&details)
            .map(Value::Json)
            .unwrap_or(Value::Null)
    }
}

impl From<ScanMatch> for Value {
    fn from(details: ScanMatch) -> Self {
        serde_json::to_value(&details)
            .map(Value::Json)
            .unwrap_or(Value::Null)
    }
}
