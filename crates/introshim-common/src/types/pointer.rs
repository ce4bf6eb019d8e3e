//! Wrapped pointer values

use super::accessor::AccessorType;
use super::value::Value;
use crate::error::{Error, Result};
use crate::traits::TypedMemory;
use std::fmt;
use std::sync::Arc;

/// Canonical pointer representation: an address bound to the host's typed
/// accessors
#[derive(Clone)]
pub struct NativePointer {
    address: u64,
    memory: Arc<dyn TypedMemory>,
}

impl NativePointer {
    pub fn new(address: u64, memory: Arc<dyn TypedMemory>) -> Self {
        Self { address, memory }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn is_null(&self) -> bool {
        self.address == 0
    }

    /// Pointer at `offset` bytes past this one, bound to the same memory
    pub fn add(&self, offset: u64) -> Self {
        Self {
            address: self.address.wrapping_add(offset),
            memory: Arc::clone(&self.memory),
        }
    }

    /// Typed read, `extra` forwarded positionally (lengths for strings and
    /// byte arrays)
    pub fn read(&self, ty: AccessorType, extra: &[Value]) -> Result<Value> {
        self.memory.read(self.address, ty, extra)
    }

    /// Typed write, `extra` forwarded positionally
    pub fn write(&self, ty: AccessorType, value: &Value, extra: &[Value]) -> Result<()> {
        self.memory.write(self.address, ty, value, extra)
    }
}

impl PartialEq for NativePointer {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl fmt::Debug for NativePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativePointer({:#x})", self.address)
    }
}

impl fmt::Display for NativePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.address)
    }
}

/// Parse a raw address value (number or `0x`-prefixed / bare hex string)
pub fn parse_address(value: &Value) -> Result<u64> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    if let Some(s) = value.as_str() {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        return u64::from_str_radix(digits, 16)
            .map_err(|_| Error::InvalidAddress(s.to_string()));
    }
    Err(Error::InvalidAddress(format!(
        "cannot use a {} as an address",
        value.kind()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoMemory;

    impl TypedMemory for NoMemory {
        fn read(&self, address: u64, _ty: AccessorType, _extra: &[Value]) -> Result<Value> {
            Err(Error::MemoryAccess {
                address,
                message: "no memory".into(),
            })
        }

        fn write(
            &self,
            address: u64,
            _ty: AccessorType,
            _value: &Value,
            _extra: &[Value],
        ) -> Result<()> {
            Err(Error::MemoryAccess {
                address,
                message: "no memory".into(),
            })
        }
    }

    #[test]
    fn test_parse_address_forms() {
        assert_eq!(parse_address(&Value::UInt(0x1000)).unwrap(), 0x1000);
        assert_eq!(parse_address(&Value::from("0x2000")).unwrap(), 0x2000);
        assert_eq!(parse_address(&Value::from("7fff0000")).unwrap(), 0x7fff0000);
        assert!(parse_address(&Value::from("zz")).is_err());
        assert!(parse_address(&Value::Int(-4)).is_err());
        assert!(parse_address(&Value::Null).is_err());
    }

    #[test]
    fn test_pointer_equality_is_by_address() {
        let a = NativePointer::new(0x10, Arc::new(NoMemory));
        let b = NativePointer::new(0x10, Arc::new(NoMemory));
        assert_eq!(a, b);
        assert_eq!(a.add(0x10).address(), 0x20);
        assert_eq!(format!("{}", a), "0x10");
    }

    #[test]
    fn test_pointer_forwards_errors() {
        let p = NativePointer::new(0x10, Arc::new(NoMemory));
        assert!(matches!(
            p.read(AccessorType::U32, &[]),
            Err(Error::MemoryAccess { address: 0x10, .. })
        ));
    }
}
