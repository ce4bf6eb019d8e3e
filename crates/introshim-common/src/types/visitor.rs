//! Visitor-style enumeration callbacks

use super::value::Value;
use parking_lot::{Mutex, ReentrantMutex};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// What an element callback asks the enumeration to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Directive {
    #[default]
    Continue,
    Stop,
}

type MatchFn = Box<dyn FnMut(&Value) -> Directive + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

type Slot<F> = Arc<ReentrantMutex<RefCell<F>>>;

/// Element callback plus optional completion callback
///
/// Passed as the last positional argument of a visitor-form enumeration.
/// Calls from other threads wait for the running callback. A callback that
/// re-enters its own visitor (a clone handed to a nested enumeration) gets
/// [`Directive::Stop`] for the nested run instead of blocking.
#[derive(Clone)]
pub struct Visitor {
    on_match: Slot<MatchFn>,
    on_complete: Option<Slot<CompleteFn>>,
}

impl Visitor {
    pub fn new<F>(on_match: F) -> Self
    where
        F: FnMut(&Value) -> Directive + Send + 'static,
    {
        Self {
            on_match: Arc::new(ReentrantMutex::new(RefCell::new(Box::new(on_match)))),
            on_complete: None,
        }
    }

    pub fn with_complete<F>(mut self, on_complete: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_complete = Some(Arc::new(ReentrantMutex::new(RefCell::new(Box::new(
            on_complete,
        )))));
        self
    }

    /// Visitor that records every element and never stops
    pub fn accumulator() -> (Self, Arc<Mutex<Vec<Value>>>) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let target = Arc::clone(&sink);
        let visitor = Self::new(move |element| {
            target.lock().push(element.clone());
            Directive::Continue
        });
        (visitor, sink)
    }

    pub fn on_match(&self, element: &Value) -> Directive {
        let guard = self.on_match.lock();
        let Ok(mut callback) = guard.try_borrow_mut() else {
            warn!(target: "introshim_common::visitor", "Visitor re-entered from its own callback");
            return Directive::Stop;
        };
        (*callback)(element)
    }

    /// Runs the completion callback; skipped when re-entered
    pub fn on_complete(&self) {
        if let Some(ref complete) = self.on_complete {
            let guard = complete.lock();
            match guard.try_borrow_mut() {
                Ok(mut callback) => (*callback)(),
                Err(_) => warn!(
                    target: "introshim_common::visitor",
                    "Completion callback re-entered"
                ),
            };
        }
    }

    pub fn has_complete(&self) -> bool {
        self.on_complete.is_some()
    }
}

impl PartialEq for Visitor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.on_match, &other.on_match)
    }
}

impl fmt::Debug for Visitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Visitor")
            .field("has_complete", &self.has_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_accumulator_records_elements() {
        let (visitor, sink) = Visitor::accumulator();
        assert_eq!(visitor.on_match(&Value::UInt(1)), Directive::Continue);
        assert_eq!(visitor.on_match(&Value::Null), Directive::Continue);
        assert_eq!(*sink.lock(), vec![Value::UInt(1), Value::Null]);
        assert!(!visitor.has_complete());
    }

    #[test]
    fn test_completion_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let visitor = Visitor::new(|_| Directive::Stop).with_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(visitor.on_match(&Value::Null), Directive::Stop);
        visitor.on_complete();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_callback_stops_nested_run() {
        let inner: Arc<Mutex<Option<Visitor>>> = Arc::new(Mutex::new(None));
        let nested = Arc::new(Mutex::new(Vec::new()));
        let (handle, record) = (Arc::clone(&inner), Arc::clone(&nested));
        let visitor = Visitor::new(move |element| {
            let me = handle.lock().clone();
            if let Some(me) = me {
                record.lock().push(me.on_match(element));
            }
            Directive::Continue
        });
        *inner.lock() = Some(visitor.clone());

        assert_eq!(visitor.on_match(&Value::UInt(1)), Directive::Continue);
        assert_eq!(visitor.on_match(&Value::UInt(2)), Directive::Continue);
        assert_eq!(*nested.lock(), vec![Directive::Stop, Directive::Stop]);
    }

    #[test]
    fn test_shared_across_threads() {
        let (visitor, sink) = Visitor::accumulator();
        let workers: Vec<_> = (0..4u64)
            .map(|i| {
                let visitor = visitor.clone();
                std::thread::spawn(move || visitor.on_match(&Value::UInt(i)))
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), Directive::Continue);
        }
        assert_eq!(sink.lock().len(), 4);
    }

    #[test]
    fn test_clones_share_identity() {
        let visitor = Visitor::new(|_| Directive::Continue);
        let other = Visitor::new(|_| Directive::Continue);
        assert_eq!(visitor, visitor.clone());
        assert_ne!(visitor, other);
    }
}
