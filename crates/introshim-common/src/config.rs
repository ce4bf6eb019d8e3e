//! Shim configuration
//!
//! Loaded from TOML. Every table is optional; the defaults reproduce the
//! standard namespace layout and enumeration list.

use crate::error::{Error, Result};
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level shim configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimConfig {
    /// Namespaces that must exist after negotiation
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<String>,

    /// Namespaces to alias at top level when missing there
    #[serde(default = "default_relocations")]
    pub relocations: Vec<Relocation>,

    /// Enumeration operations to expose in both calling conventions
    #[serde(default = "default_enumerations")]
    pub enumerations: Vec<EnumerationTarget>,

    /// Install a tracing subscriber from `logging` during `install`
    #[serde(default)]
    pub init_logging: bool,

    #[serde(default)]
    pub logging: LogConfig,
}

/// `to` resolves to `from` when the host has no `to` namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationTarget {
    pub namespace: String,
    pub operation: String,
}

impl EnumerationTarget {
    pub fn new(namespace: &str, operation: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Name of the collecting form
    pub fn sync_name(&self) -> String {
        format!("{}Sync", self.operation)
    }
}

fn default_namespaces() -> Vec<String> {
    ["Module", "Memory", "Process", "Thread", "Kernel"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_relocations() -> Vec<Relocation> {
    ["Interceptor", "Stalker", "NativeFunction", "NativeCallback"]
        .iter()
        .map(|name| Relocation {
            from: format!("Gum.{}", name),
            to: name.to_string(),
        })
        .collect()
}

fn default_enumerations() -> Vec<EnumerationTarget> {
    vec![
        EnumerationTarget::new("Process", "enumerateModules"),
        EnumerationTarget::new("Process", "enumerateThreads"),
        EnumerationTarget::new("Process", "enumerateRanges"),
        EnumerationTarget::new("Kernel", "enumerateModules"),
        EnumerationTarget::new("Kernel", "enumerateRanges"),
        EnumerationTarget::new("Kernel", "enumerateModuleRanges"),
    ]
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            namespaces: default_namespaces(),
            relocations: default_relocations(),
            enumerations: default_enumerations(),
            init_logging: false,
            logging: LogConfig::default(),
        }
    }
}

impl ShimConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for target in &self.enumerations {
            if target.namespace.is_empty() || target.operation.is_empty() {
                return Err(Error::Config(format!(
                    "enumeration target needs a namespace and an operation: {:?}",
                    target
                )));
            }
            if target.operation.ends_with("Sync") {
                return Err(Error::Config(format!(
                    "enumeration target {}.{} must name the visitor form, not the Sync form",
                    target.namespace, target.operation
                )));
            }
        }
        for relocation in &self.relocations {
            if relocation.from == relocation.to {
                return Err(Error::Config(format!(
                    "relocation of {} onto itself",
                    relocation.from
                )));
            }
        }
        Ok(())
    }
}
