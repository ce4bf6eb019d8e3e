//! Host contract
//!
//! These traits describe what the instrumentation host exposes. The host's
//! named operations live behind [`Namespace`] and may differ from version to
//! version; the remaining traits are the primitives every host version is
//! expected to provide and which the shim builds its fallbacks from.

use crate::error::{Error, Result};
use crate::types::{AccessorType, Member, ModuleRef, NativePointer, Operation, Value};
use std::sync::Arc;

/// Typed accessors behind a pointer
pub trait TypedMemory: Send + Sync {
    /// Read a value of kind `ty` at `address`
    fn read(&self, address: u64, ty: AccessorType, extra: &[Value]) -> Result<Value>;

    /// Write `value` as kind `ty` at `address`
    fn write(&self, address: u64, ty: AccessorType, value: &Value, extra: &[Value]) -> Result<()>;
}

/// A loaded module as the host sees it
pub trait HostModule: Send + Sync {
    fn name(&self) -> &str;

    fn path(&self) -> &str;

    fn base(&self) -> NativePointer;

    fn size(&self) -> u64;

    /// Export address, `None` if the module does not export `name`
    fn find_export_by_name(&self, name: &str) -> Result<Option<NativePointer>>;

    /// Export address, failing if the module does not export `name`
    fn get_export_by_name(&self, name: &str) -> Result<NativePointer>;

    fn find_symbol_by_name(&self, name: &str) -> Result<Option<NativePointer>>;

    fn get_symbol_by_name(&self, name: &str) -> Result<NativePointer>;

    /// Exports in the host's native order
    fn enumerate_exports(&self) -> Result<Vec<Value>>;

    fn enumerate_imports(&self) -> Result<Vec<Value>>;

    fn enumerate_symbols(&self) -> Result<Vec<Value>>;

    /// Run the module's static initializers if they have not run yet
    fn ensure_initialized(&self) -> Result<()>;
}

/// A named bag of operations and properties (`Module`, `Memory`, `Process`,
/// `Kernel`, ...)
pub trait Namespace: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, member: &str) -> Option<Member>;

    /// Assign a member. Hosts may reject writes to read-only members.
    fn set(&self, member: &str, value: Member) -> Result<()>;

    /// Names of all members, sorted
    fn members(&self) -> Vec<String>;

    fn contains(&self, member: &str) -> bool {
        self.get(member).is_some()
    }

    fn operation(&self, name: &str) -> Option<Operation> {
        match self.get(name) {
            Some(Member::Operation(op)) => Some(op),
            _ => None,
        }
    }

    fn property(&self, name: &str) -> Option<Value> {
        match self.get(name) {
            Some(Member::Property(value)) => Some(value),
            _ => None,
        }
    }

    /// Invoke a named operation
    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.operation(name)
            .ok_or_else(|| Error::unsupported(self.name(), name))?
            .call(args)
    }
}

/// Entry point to a running host
pub trait Host: Send + Sync {
    /// Namespace by name; nested namespaces use dotted paths
    /// (`Gum.Interceptor`)
    fn namespace(&self, name: &str) -> Option<Arc<dyn Namespace>>;

    /// Resolve a loaded module by name or path
    fn module_by_name(&self, name: &str) -> Result<ModuleRef>;

    /// Coerce a raw address value into the host's pointer representation
    fn ptr(&self, value: &Value) -> Result<NativePointer>;
}
