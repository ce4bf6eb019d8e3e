//! Module-related types

use super::value::Value;
use crate::traits::HostModule;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared handle to a host-owned module
#[derive(Clone)]
pub struct ModuleRef(Arc<dyn HostModule>);

impl ModuleRef {
    pub fn new(module: Arc<dyn HostModule>) -> Self {
        Self(module)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }
}

impl std::ops::Deref for ModuleRef {
    type Target = dyn HostModule;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for ModuleRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name() == other.0.name() && self.0.base() == other.0.base()
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRef")
            .field("name", &self.0.name())
            .field("base", &self.0.base())
            .finish()
    }
}

/// Module descriptor as produced by module listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDetails {
    pub name: String,
    pub path: String,
    pub base: u64,
    pub size: u64,
}

/// Export entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDetails {
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub name: String,
    pub address: u64,
}

/// Import entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDetails {
    pub name: String,
    pub module: String,
    pub address: u64,
}

/// Symbol table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDetails {
    pub name: String,
    pub address: u64,
    pub is_global: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Variable,
}

macro_rules! impl_into_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(details: $ty) -> Self {
                    serde_json::to_value(&details)
                        .map(Value::Json)
                        .unwrap_or(Value::Null)
                }
            }
        )*
    };
}

impl_into_value!(ModuleDetails, ExportDetails, ImportDetails, SymbolDetails);

/// Module name from a path, either separator style
pub fn module_name_from_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Case-insensitive match on name, full path or path file name
pub fn module_name_matches(name: &str, path: &str, query: &str) -> bool {
    name.eq_ignore_ascii_case(query)
        || path.eq_ignore_ascii_case(query)
        || module_name_from_path(path).eq_ignore_ascii_case(query)
}
