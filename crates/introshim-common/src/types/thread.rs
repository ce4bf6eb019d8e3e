//! Thread-related types

use super::value::Value;
use serde::{Deserialize, Serialize};

/// Thread descriptor as produced by thread listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDetails {
    pub id: u64,
    pub name: Option<String>,
    pub state: ThreadState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadState {
    Running,
    Stopped,
    Waiting,
    Uninterruptible,
    Halted,
}

impl From<ThreadDetails> for Value {
    fn from(details: ThreadDetails) -> Self {
        serde_json::to_value(&details)
            .map(Value::Json)
            .unwrap_or(Value::Null)
    }
}
