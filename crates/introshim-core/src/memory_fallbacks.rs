//! Memory namespace fallbacks
//!
//! `Memory.read<T>(address, ...)` and `Memory.write<T>(address, value, ...)`
//! forward to the typed accessors of the pointer. Failures of the accessor
//! itself are the host's errors and propagate unchanged.

use crate::names;
use crate::probe;
use crate::registry::OperationTable;
use introshim_common::{
    AccessorType, Error, Host, Namespace, NativePointer, Operation, Result, Value,
};
use std::sync::Arc;

/// Use `value` as a pointer, converting raw addresses through the host
pub fn coerce_pointer(host: &dyn Host, value: &Value) -> Result<NativePointer> {
    match value {
        Value::Pointer(pointer) => Ok(pointer.clone()),
        other => host.ptr(other),
    }
}

fn read(host: &dyn Host, ty: AccessorType, args: &[Value]) -> Result<Value> {
    let (address, extra) = args
        .split_first()
        .ok_or_else(|| Error::InvalidArgument(format!("{} expects an address", ty.read_name())))?;
    coerce_pointer(host, address)?.read(ty, extra)
}

fn write(host: &dyn Host, ty: AccessorType, args: &[Value]) -> Result<Value> {
    let [address, value, extra @ ..] = args else {
        return Err(Error::InvalidArgument(format!(
            "{} expects an address and a value",
            ty.write_name()
        )));
    };
    let pointer = coerce_pointer(host, address)?;
    pointer.write(ty, value, extra)?;
    Ok(Value::Pointer(pointer))
}

/// Register missing typed accessors and `scanSync` into `table`
pub fn synthesize(
    host: &Arc<dyn Host>,
    memory_ns: &Arc<dyn Namespace>,
    table: &mut OperationTable,
) -> Result<()> {
    for ty in AccessorType::ALL {
        let reader = Arc::clone(host);
        table.register_missing(
            memory_ns.as_ref(),
            &ty.read_name(),
            Operation::plain(move |args| read(reader.as_ref(), ty, args)),
        )?;

        let writer = Arc::clone(host);
        table.register_missing(
            memory_ns.as_ref(),
            &ty.write_name(),
            Operation::plain(move |args| write(writer.as_ref(), ty, args)),
        )?;
    }

    // scanSync is only derived from a native scan
    if probe::has(memory_ns.as_ref(), names::SCAN) {
        let ns = Arc::clone(memory_ns);
        table.register_missing(
            memory_ns.as_ref(),
            names::SCAN_SYNC,
            Operation::collecting(move |args| ns.call(names::SCAN, args)),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use introshim_test_host::{HostShape, TestHost};

    fn synthesized(shape: HostShape) -> (Arc<dyn Host>, OperationTable) {
        let host: Arc<dyn Host> = Arc::new(TestHost::new(shape));
        let memory_ns = host.namespace(names::MEMORY).unwrap();
        let mut table = OperationTable::new(names::MEMORY);
        synthesize(&host, &memory_ns, &mut table).unwrap();
        (host, table)
    }

    #[test]
    fn test_legacy_host_gets_nothing() {
        let (_, table) = synthesized(HostShape::Legacy);
        assert!(table.is_empty(), "{}", table.summary());
    }

    #[test]
    fn test_modern_host_gets_accessors_and_scan_sync() {
        let (_, table) = synthesized(HostShape::Modern);
        assert_eq!(table.len(), 45);
        assert!(table.contains("readAnsiString"));
        assert!(table.contains("writeULong"));
        assert!(table.contains("scanSync"));
    }

    #[test]
    fn test_write_then_read_raw_and_wrapped() {
        let (host, table) = synthesized(HostShape::Modern);
        let chained = table
            .get("writeU32")
            .unwrap()
            .call(&[Value::UInt(0x2000), Value::UInt(42)])
            .unwrap();
        assert_eq!(chained.as_pointer().unwrap().address(), 0x2000);

        let read_u32 = table.get("readU32").unwrap();
        assert_eq!(read_u32.call(&[Value::UInt(0x2000)]).unwrap(), Value::UInt(42));
        assert_eq!(read_u32.call(&[Value::from("0x2000")]).unwrap(), Value::UInt(42));

        let wrapped = host.ptr(&Value::UInt(0x2000)).unwrap();
        assert_eq!(read_u32.call(&[Value::Pointer(wrapped)]).unwrap(), Value::UInt(42));
    }

    #[test]
    fn test_extra_arguments_forwarded() {
        let (_, table) = synthesized(HostShape::Modern);
        table
            .get("writeUtf8String")
            .unwrap()
            .call(&[Value::UInt(0x3000), Value::from("hello")])
            .unwrap();
        let prefix = table
            .get("readUtf8String")
            .unwrap()
            .call(&[Value::UInt(0x3000), Value::UInt(4)])
            .unwrap();
        assert_eq!(prefix, Value::from("hell"));
    }

    #[test]
    fn test_argument_errors() {
        let (_, table) = synthesized(HostShape::Modern);
        let err = table.get("readU8").unwrap().call(&[]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = table
            .get("writeU8")
            .unwrap()
            .call(&[Value::UInt(0x10)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = table
            .get("readU8")
            .unwrap()
            .call(&[Value::from("not an address")])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }

    #[test]
    fn test_memory_access_errors_propagate() {
        let (_, table) = synthesized(HostShape::Modern);
        let err = table
            .get("readU64")
            .unwrap()
            .call(&[Value::UInt(0xdead_0000)])
            .unwrap_err();
        assert!(matches!(err, Error::MemoryAccess { .. }));
    }

    #[test]
    fn test_scan_sync_delegates() {
        let (_, table) = synthesized(HostShape::Modern);
        table
            .get("writeByteArray")
            .unwrap()
            .call(&[Value::UInt(0x5000), Value::Bytes(vec![0x13, 0x37, 0xca, 0xfe])])
            .unwrap();
        let matches = table
            .get("scanSync")
            .unwrap()
            .call(&[Value::UInt(0x5000), Value::UInt(4), Value::from("37 ?? fe")])
            .unwrap()
            .into_sequence()
            .unwrap();
        assert_eq!(matches.len(), 1);
    }
}
