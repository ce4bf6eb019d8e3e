//! Synthesized Module and Memory operations against the modern host, checked
//! against the legacy host's native answers

mod common;

use common::{address, shim, SHAPES};
use introshim_common::{Error, Host, Namespace, Value};
use introshim_test_host::{fixture, HostShape};

#[test]
fn test_global_export_lookup() {
    for shape in SHAPES {
        let shim = shim(shape);
        let malloc = shim
            .call("Module", "findExportByName", &[Value::Null, Value::from("malloc")])
            .unwrap();
        assert_eq!(address(&malloc), 0x1000, "{:?}", shape);
    }
}

#[test]
fn test_unknown_module_is_null() {
    let shim = shim(HostShape::Modern);
    for op in [
        "findExportByName",
        "getExportByName",
        "findSymbolByName",
        "getSymbolByName",
    ] {
        let result = shim
            .call("Module", op, &[Value::from("unknownmod"), Value::from("malloc")])
            .unwrap();
        assert!(result.is_null(), "{} returned {:?}", op, result);
    }
    assert!(shim
        .call("Module", "getBaseAddress", &[Value::from("unknownmod")])
        .unwrap()
        .is_null());
}

#[test]
fn test_fallbacks_match_legacy_natives() {
    let legacy = shim(HostShape::Legacy);
    let modern = shim(HostShape::Modern);
    let cases = [
        ("findExportByName", vec![Value::from(fixture::LIBC), Value::from("free")]),
        ("getExportByName", vec![Value::from(fixture::APP), Value::from("app_main")]),
        (
            "findSymbolByName",
            vec![Value::from(fixture::LIBC), Value::from(fixture::HIDDEN_SYMBOL)],
        ),
        ("findBaseAddress", vec![Value::from(fixture::APP)]),
        ("getBaseAddress", vec![Value::from(fixture::LIBC_PATH)]),
    ];
    for (op, args) in cases {
        let native = legacy.call("Module", op, &args).unwrap();
        let synthesized = modern.call("Module", op, &args).unwrap();
        assert!(!native.is_null(), "{}", op);
        assert_eq!(native, synthesized, "{} diverged", op);
    }

    // listings: the legacy native only takes a visitor, the fallback takes both
    let exports = modern
        .call("Module", "enumerateExports", &[Value::from(fixture::LIBC)])
        .unwrap()
        .into_sequence()
        .unwrap();
    let (visitor, seen) = introshim_common::Visitor::accumulator();
    legacy
        .call(
            "Module",
            "enumerateExports",
            &[Value::from(fixture::LIBC), Value::Visitor(visitor)],
        )
        .unwrap();
    assert_eq!(*seen.lock(), exports);
}

#[test]
fn test_typed_accessor_coercion() {
    let shim = shim(HostShape::Modern);
    let memory = shim.memory().unwrap();
    memory
        .call("writeU32", &[Value::UInt(0x2000), Value::UInt(42)])
        .unwrap();

    let raw = memory.call("readU32", &[Value::UInt(0x2000)]).unwrap();
    assert_eq!(raw, Value::UInt(42));

    let wrapped = shim.ptr(&Value::from("0x2000")).unwrap();
    let via_pointer = memory.call("readU32", &[Value::Pointer(wrapped)]).unwrap();
    assert_eq!(via_pointer, Value::UInt(42));
}

#[test]
fn test_write_chaining() {
    let shim = shim(HostShape::Modern);
    let memory = shim.memory().unwrap();

    let first = memory
        .call("writeU8", &[Value::UInt(0x2100), Value::UInt(0xaa)])
        .unwrap();
    assert_eq!(address(&first), 0x2100);

    // feed the returned pointer straight into the next write
    let second = memory
        .call("writeS8", &[first.clone(), Value::Int(-1)])
        .unwrap();
    assert_eq!(second, first);
    assert_eq!(
        memory.call("readS8", &[second]).unwrap(),
        Value::Int(-1)
    );
}

#[test]
fn test_every_accessor_type_is_reachable() {
    let shim = shim(HostShape::Modern);
    let memory = shim.memory().unwrap();
    let cases = [
        ("Pointer", Value::UInt(0xdead), 0x3000u64),
        ("S64", Value::Int(-5), 0x3010),
        ("Double", Value::Float(1.5), 0x3020),
        ("Float", Value::Float(0.25), 0x3030),
        ("Long", Value::Int(i64::MIN), 0x3040),
        ("UShort", Value::UInt(65535), 0x3050),
        ("AnsiString", Value::from("ansi"), 0x3060),
    ];
    for (suffix, value, at) in cases {
        memory
            .call(&format!("write{}", suffix), &[Value::UInt(at), value.clone()])
            .unwrap();
        let back = memory
            .call(&format!("read{}", suffix), &[Value::UInt(at)])
            .unwrap();
        match back {
            Value::Pointer(p) => assert_eq!(Value::UInt(p.address()), value),
            other => assert_eq!(other, value, "{}", suffix),
        }
    }
}

#[test]
fn test_memory_errors_are_not_swallowed() {
    let shim = shim(HostShape::Modern);
    let err = shim
        .call("Memory", "readPointer", &[Value::UInt(0x9999_0000)])
        .unwrap_err();
    assert!(matches!(err, Error::MemoryAccess { .. }));
}

#[test]
fn test_scan_sync_on_modern_host() {
    let shim = shim(HostShape::Modern);
    let memory = shim.memory().unwrap();
    assert!(memory.is_override("scanSync"));
    memory
        .call("writeUtf8String", &[Value::UInt(0x4000), Value::from("needle")])
        .unwrap();
    let hits = memory
        .call(
            "scanSync",
            &[Value::UInt(0x4000), Value::UInt(6), Value::from("65 ?? 6c")],
        )
        .unwrap()
        .into_sequence()
        .unwrap();
    assert_eq!(hits.len(), 1);
}
