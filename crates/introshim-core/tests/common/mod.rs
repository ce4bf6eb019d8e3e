//! Shared helpers for the introshim integration tests

#![allow(dead_code)]

use introshim_common::{Directive, Host, ShimConfig, Value, Visitor};
use introshim_core::Shim;
use introshim_test_host::{HostShape, TestHost};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const SHAPES: [HostShape; 2] = [HostShape::Legacy, HostShape::Modern];

pub fn raw_host(shape: HostShape) -> Arc<dyn Host> {
    Arc::new(TestHost::new(shape))
}

pub fn shim(shape: HostShape) -> Shim {
    Shim::negotiate(raw_host(shape), &ShimConfig::default()).expect("negotiation failed")
}

/// Visitor that records elements, optionally stopping after `stop_after`
pub struct Recorder {
    pub visitor: Visitor,
    pub seen: Arc<Mutex<Vec<Value>>>,
    pub completions: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new(stop_after: Option<usize>) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let done = Arc::clone(&completions);
        let visitor = Visitor::new(move |element| {
            let mut seen = sink.lock();
            seen.push(element.clone());
            match stop_after {
                Some(k) if seen.len() >= k => Directive::Stop,
                _ => Directive::Continue,
            }
        })
        .with_complete(move || {
            done.fetch_add(1, Ordering::SeqCst);
        });
        Self {
            visitor,
            seen,
            completions,
        }
    }

    pub fn arg(&self) -> Value {
        Value::Visitor(self.visitor.clone())
    }

    pub fn seen(&self) -> Vec<Value> {
        self.seen.lock().clone()
    }

    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }
}

pub fn address(value: &Value) -> u64 {
    value
        .as_pointer()
        .map(|p| p.address())
        .unwrap_or_else(|| panic!("expected a pointer, got {:?}", value))
}
