//! Process-wide installation
//!
//! Kept in its own test binary: the install cell is global.

use introshim_common::{Host, ShimConfig, Value};
use introshim_core::{install, installed};
use introshim_test_host::{HostShape, TestHost};
use std::sync::Arc;
use std::thread;

#[test]
fn test_install_once_per_process() {
    assert!(installed().is_none());

    let config = ShimConfig::default();
    let first = install(Arc::new(TestHost::new(HostShape::Modern)), &config).unwrap();

    // a different host on the second call is ignored
    let second = install(Arc::new(TestHost::new(HostShape::Bare)), &config).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &installed().unwrap()));
    assert!(second.report().created.is_empty());

    let racers: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                install(
                    Arc::new(TestHost::new(HostShape::Legacy)),
                    &ShimConfig::default(),
                )
                .unwrap()
            })
        })
        .collect();
    for racer in racers {
        assert!(Arc::ptr_eq(&first, &racer.join().unwrap()));
    }

    let malloc = first
        .call("Module", "findExportByName", &[Value::Null, Value::from("malloc")])
        .unwrap();
    assert_eq!(malloc.as_pointer().unwrap().address(), 0x1000);
    assert!(first.namespace("Kernel").is_some());
}
