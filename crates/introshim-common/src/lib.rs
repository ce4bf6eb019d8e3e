//! introshim common types
//!
//! Value model, host contract traits, configuration and logging shared by
//! the shim and by host implementations.

pub mod config;
pub mod error;
pub mod logging;
pub mod namespace;
pub mod traits;
pub mod types;

pub use config::{EnumerationTarget, Relocation, ShimConfig};
pub use error::{Error, Result};
pub use logging::{init_agent_logging, init_debug_logging, init_logging, LogConfig};
pub use namespace::ObjectNamespace;
pub use traits::{Host, HostModule, Namespace, TypedMemory};
pub use types::*;

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, trace, warn};
