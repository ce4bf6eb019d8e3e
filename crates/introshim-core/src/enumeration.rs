//! Enumeration style adapter
//!
//! Bridges the collecting convention (`<op>Sync`, returns the whole ordered
//! sequence) and the visitor convention (`<op>(..., visitor)`). Both are
//! derived from whichever primitive the host actually has, so callers see
//! the same order and the same early-stop behavior either way.

use crate::registry::OperationTable;
use introshim_common::{
    CallStyle, Directive, EnumerationTarget, Namespace, Operation, Result, Value, Visitor,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// How a visitor run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every element was visited and the completion callback ran
    Finished { visited: usize },
    /// The element callback returned [`Directive::Stop`]
    Stopped { visited: usize },
}

impl Completion {
    pub fn visited(&self) -> usize {
        match self {
            Completion::Finished { visited } | Completion::Stopped { visited } => *visited,
        }
    }
}

/// Feed `elements` to `visitor` in order
///
/// Stops right after the element whose callback returns
/// [`Directive::Stop`]. The completion callback only runs when no stop was
/// requested.
pub fn drive<I>(visitor: &Visitor, elements: I) -> Completion
where
    I: IntoIterator<Item = Value>,
{
    let mut visited = 0;
    for element in elements {
        visited += 1;
        if visitor.on_match(&element) == Directive::Stop {
            trace!(target: "introshim_core::enumeration", visited, "Visitor requested stop");
            return Completion::Stopped { visited };
        }
    }
    visitor.on_complete();
    Completion::Finished { visited }
}

/// Split a trailing visitor off the argument list
pub fn split_visitor(args: &[Value]) -> (&[Value], Option<&Visitor>) {
    match args.split_last() {
        Some((Value::Visitor(visitor), rest)) => (rest, Some(visitor)),
        _ => (args, None),
    }
}

type Collector = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync>;

/// Which primitive a collector was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    NativeSync,
    NativeCollecting,
    NativeVisitor,
}

fn collector_from(native: Option<&Operation>, native_sync: Option<&Operation>) -> Option<(Collector, Source)> {
    if let Some(sync) = native_sync.cloned() {
        let collector: Collector = Arc::new(move |args| sync.call(args)?.into_sequence());
        return Some((collector, Source::NativeSync));
    }

    let op = native.cloned()?;
    if op.style().collects() {
        let collector: Collector = Arc::new(move |args| op.call(args)?.into_sequence());
        Some((collector, Source::NativeCollecting))
    } else {
        let collector: Collector = Arc::new(move |args| {
            let (visitor, sink) = Visitor::accumulator();
            let mut full = args.to_vec();
            full.push(Value::Visitor(visitor));
            op.call(&full)?;
            let elements = std::mem::take(&mut *sink.lock());
            Ok(elements)
        });
        Some((collector, Source::NativeVisitor))
    }
}

/// Register the collecting and dual forms of `target` into `table`
///
/// `<op>Sync` is added when the host lacks it; the dual `<op>` is added
/// unless the native operation already accepts both forms. Returns `false`
/// when nothing was registered: no primitive to build on, both forms
/// already native, or the target was already adapted.
pub fn adapt(
    namespace: &Arc<dyn Namespace>,
    target: &EnumerationTarget,
    table: &mut OperationTable,
) -> Result<bool> {
    let op_name = target.operation.as_str();
    let sync_name = target.sync_name();

    if table.contains(op_name) || table.contains(&sync_name) {
        return Ok(false);
    }

    let native = namespace.operation(op_name);
    let native_sync = namespace.operation(&sync_name);
    let native_dual = native.as_ref().map(|op| op.style()) == Some(CallStyle::Dual);

    if native_dual && native_sync.is_some() {
        trace!(
            target: "introshim_core::enumeration",
            namespace = namespace.name(),
            operation = op_name,
            "Both forms native"
        );
        return Ok(false);
    }

    let Some((collector, source)) = collector_from(native.as_ref(), native_sync.as_ref()) else {
        debug!(
            target: "introshim_core::enumeration",
            namespace = namespace.name(),
            operation = op_name,
            "No enumeration primitive, leaving unresolved"
        );
        return Ok(false);
    };

    if native_sync.is_none() {
        let collect = Arc::clone(&collector);
        table.register(
            sync_name.clone(),
            Operation::collecting(move |args| Ok(Value::Array(collect(args)?))),
        )?;
    }

    if native_dual {
        debug!(
            target: "introshim_core::enumeration",
            namespace = namespace.name(),
            operation = sync_name.as_str(),
            "Added collecting alias for native dual enumeration"
        );
        return Ok(true);
    }

    let dual = Operation::new(CallStyle::Dual, move |args| match split_visitor(args) {
        (filters, Some(visitor)) => {
            if let Some(ref op) = native {
                if op.style() == CallStyle::Visitor {
                    return op.call(args);
                }
            }
            let elements = collector(filters)?;
            drive(visitor, elements);
            Ok(Value::Null)
        }
        (_, None) => {
            if let Some(ref op) = native {
                if op.style().collects() {
                    return op.call(args);
                }
            }
            Ok(Value::Array(collector(args)?))
        }
    });
    table.register(op_name, dual)?;

    debug!(
        target: "introshim_core::enumeration",
        namespace = namespace.name(),
        operation = op_name,
        ?source,
        "Adapted enumeration"
    );
    Ok(true)
}
