//! Negotiation-level properties: idempotence, non-regression, pass-through,
//! relocation and bootstrap

mod common;

use common::{raw_host, shim, SHAPES};
use introshim_common::{Host, Namespace, ShimConfig, Value};
use introshim_core::{ApiShape, Shim};
use introshim_test_host::{HostShape, TestHost};
use std::sync::Arc;

#[test]
fn test_negotiating_twice_adds_nothing() {
    for shape in [HostShape::Legacy, HostShape::Modern, HostShape::Bare] {
        let first = Arc::new(shim(shape));
        let second = Shim::negotiate(first.clone(), &ShimConfig::default()).unwrap();
        assert!(
            second.report().is_noop(),
            "{:?}: second pass changed {:?}",
            shape,
            second.report()
        );
        assert_eq!(first.namespace_names(), second.namespace_names());
        for name in first.namespace_names() {
            assert_eq!(
                first.facade(&name).unwrap().members(),
                second.facade(&name).unwrap().members(),
                "{:?}: members of {} differ",
                shape,
                name
            );
        }
    }
}

#[test]
fn test_legacy_operations_keep_native_handlers() {
    let host = raw_host(HostShape::Legacy);
    let shim = Shim::negotiate(host.clone(), &ShimConfig::default()).unwrap();

    for ns_name in ["Module", "Memory", "Process", "Kernel", "Thread"] {
        let native = host.namespace(ns_name).unwrap();
        let facade = shim.facade(ns_name).unwrap();
        for member in native.members() {
            if facade.is_override(&member) {
                continue;
            }
            let (Some(before), Some(after)) = (native.operation(&member), facade.operation(&member))
            else {
                continue;
            };
            assert!(
                before.same_handler(&after),
                "{}.{} was replaced",
                ns_name,
                member
            );
        }
    }
}

#[test]
fn test_legacy_calls_behave_identically() {
    let host = raw_host(HostShape::Legacy);
    let shim = Shim::negotiate(host.clone(), &ShimConfig::default()).unwrap();

    let cases: Vec<(&str, &str, Vec<Value>)> = vec![
        ("Module", "findExportByName", vec![Value::Null, Value::from("free")]),
        ("Module", "findExportByName", vec![Value::from("libc.so"), Value::from("nope")]),
        ("Module", "findBaseAddress", vec![Value::from("app")]),
        ("Process", "enumerateModulesSync", vec![]),
        ("Process", "enumerateRangesSync", vec![Value::from("r-x")]),
        ("Kernel", "enumerateRangesSync", vec![]),
        ("Process", "getCurrentThreadId", vec![]),
    ];
    for (ns, op, args) in cases {
        let native = host.namespace(ns).unwrap().call(op, &args).unwrap();
        let shimmed = shim.call(ns, op, &args).unwrap();
        assert_eq!(native, shimmed, "{}.{} diverged", ns, op);
    }
}

#[test]
fn test_pass_through_transparency() {
    for shape in SHAPES {
        let shim = shim(shape);
        let process = shim.process().unwrap();
        assert_eq!(process.property("arch"), Some(Value::from("x64")));
        assert_eq!(process.property("id"), Some(Value::UInt(4242)));

        // read-only write is swallowed and the value is kept
        process.set("arch", Value::from("arm64").into()).unwrap();
        assert_eq!(process.property("arch"), Some(Value::from("x64")));

        // writable member: the write lands on the original
        process.set("pageSize", Value::UInt(16384).into()).unwrap();
        assert_eq!(process.property("pageSize"), Some(Value::UInt(16384)));
        assert_eq!(
            process.original().property("pageSize"),
            Some(Value::UInt(16384))
        );

        assert!(shim.thread().unwrap().contains("sleep"));
        assert!(shim.call("Thread", "sleep", &[Value::Float(0.01)]).unwrap().is_null());
    }
}

#[test]
fn test_detected_shapes() {
    assert_eq!(shim(HostShape::Legacy).report().shape, Some(ApiShape::Legacy));
    assert_eq!(shim(HostShape::Modern).report().shape, Some(ApiShape::Modern));
    assert_eq!(shim(HostShape::Bare).report().shape, None);
}

#[test]
fn test_bare_host_gets_namespaces_and_memory_fallbacks() {
    let shim = shim(HostShape::Bare);
    assert_eq!(shim.report().created.len(), 5);

    // raw addresses still work through the host pointer primitive
    let memory = shim.memory().unwrap();
    memory
        .call("writeU16", &[Value::UInt(0x6000), Value::UInt(0xbeef)])
        .unwrap();
    assert_eq!(
        memory.call("readU16", &[Value::UInt(0x6000)]).unwrap(),
        Value::UInt(0xbeef)
    );
    // scan is absent, so no scanSync
    assert!(!memory.contains("scanSync"));
}

#[test]
fn test_relocated_namespace_reachable_through_host() {
    let host = TestHost::builder(HostShape::Modern)
        .with_gum_interceptor()
        .build();
    let shim = Shim::negotiate(Arc::new(host), &ShimConfig::default()).unwrap();
    let interceptor = Host::namespace(&shim, "Interceptor").unwrap();
    assert_eq!(interceptor.name(), "Interceptor");
    assert!(interceptor.call("attach", &[Value::UInt(0x1000)]).unwrap().is_null());
    // the nested path stays reachable unchanged
    assert!(Host::namespace(&shim, "Gum.Interceptor").is_some());
}

#[test]
fn test_config_from_toml_drives_negotiation() {
    let config = ShimConfig::from_toml(
        r#"
            namespaces = ["Module", "Memory", "Process"]
            relocations = []

            [[enumerations]]
            namespace = "Kernel"
            operation = "enumerateRanges"
        "#,
    )
    .unwrap();
    let shim = Shim::negotiate(raw_host(HostShape::Modern), &config).unwrap();
    assert!(shim.thread().is_none());
    let kernel = shim.kernel().unwrap();
    assert!(kernel.contains("enumerateRangesSync"));
    assert!(!kernel.contains("enumerateModulesSync"));
}
