//! Dynamic values passed to and returned from host operations

use super::module::ModuleRef;
use super::pointer::NativePointer;
use super::visitor::Visitor;
use crate::error::{Error, Result};

/// Argument or return value of a host operation
///
/// `Null` doubles as the "not found" sentinel returned by lookups.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Pointer(NativePointer),
    Module(ModuleRef),
    Array(Vec<Value>),
    /// Opaque structured payload (module, thread, range descriptors)
    Json(serde_json::Value),
    Visitor(Visitor),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; negative integers and fractional floats are rejected
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
            Value::Json(j) => j.as_u64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Json(j) => j.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            Value::Json(j) => j.as_f64(),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&NativePointer> {
        match self {
            Value::Pointer(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_visitor(&self) -> Option<&Visitor> {
        match self {
            Value::Visitor(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Module name argument: `Null` means "global scope"
    pub fn as_module_name(&self) -> Result<Option<&str>> {
        match self {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Module(m) => Ok(Some(m.name())),
            other => Err(Error::InvalidArgument(format!(
                "expected a module name, got {}",
                other.kind()
            ))),
        }
    }

    /// Turn the result of a collecting operation into its elements
    pub fn into_sequence(self) -> Result<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items),
            Value::Json(serde_json::Value::Array(items)) => {
                Ok(items.into_iter().map(Value::Json).collect())
            }
            other => Err(Error::InvalidArgument(format!(
                "expected a sequence, got {}",
                other.kind()
            ))),
        }
    }

    /// Short type name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Pointer(_) => "pointer",
            Value::Module(_) => "module",
            Value::Array(_) => "array",
            Value::Json(_) => "json",
            Value::Visitor(_) => "visitor",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<NativePointer> for Value {
    fn from(v: NativePointer) -> Self {
        Value::Pointer(v)
    }
}

impl From<Option<NativePointer>> for Value {
    fn from(v: Option<NativePointer>) -> Self {
        v.map(Value::Pointer).unwrap_or(Value::Null)
    }
}

impl From<ModuleRef> for Value {
    fn from(v: ModuleRef) -> Self {
        Value::Module(v)
    }
}

impl From<Visitor> for Value {
    fn from(v: Visitor) -> Self {
        Value::Visitor(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}
