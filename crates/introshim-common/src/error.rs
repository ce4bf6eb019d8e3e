//! Error types for introshim

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Memory access error at {address:#x}: {message}")]
    MemoryAccess { address: u64, message: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Unsupported operation: {namespace}.{name}")]
    UnsupportedOperation { namespace: String, name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Member is read-only: {0}")]
    ReadOnlyMember(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a missing operation on a namespace
    pub fn unsupported(namespace: &str, name: &str) -> Self {
        Error::UnsupportedOperation {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Whether this error means "the thing looked up does not exist"
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Error::ModuleNotFound(_) | Error::SymbolNotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("JSON error: {}", e))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
