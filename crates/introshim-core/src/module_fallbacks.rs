//! Module namespace fallbacks
//!
//! Fills in legacy `Module` operations from the per-module primitives and
//! the global lookups. Resolution failures never escape: they come back as
//! `Null` (or an empty listing).

use crate::enumeration::{drive, split_visitor};
use crate::names;
use crate::registry::OperationTable;
use introshim_common::{
    CallStyle, Host, ModuleRef, Namespace, NativePointer, Operation, Result, Value,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    FindExport,
    GetExport,
    FindSymbol,
    GetSymbol,
}

impl Lookup {
    const ALL: [Lookup; 4] = [
        Lookup::FindExport,
        Lookup::GetExport,
        Lookup::FindSymbol,
        Lookup::GetSymbol,
    ];

    fn name(self) -> &'static str {
        match self {
            Lookup::FindExport => names::FIND_EXPORT_BY_NAME,
            Lookup::GetExport => names::GET_EXPORT_BY_NAME,
            Lookup::FindSymbol => names::FIND_SYMBOL_BY_NAME,
            Lookup::GetSymbol => names::GET_SYMBOL_BY_NAME,
        }
    }

    /// Global operation used when no module is given
    fn global_name(self) -> &'static str {
        match self {
            Lookup::FindExport | Lookup::FindSymbol => names::FIND_GLOBAL_EXPORT_BY_NAME,
            Lookup::GetExport | Lookup::GetSymbol => names::GET_GLOBAL_EXPORT_BY_NAME,
        }
    }

    fn in_module(self, module: &ModuleRef, symbol: &str) -> Result<Option<NativePointer>> {
        match self {
            Lookup::FindExport => module.find_export_by_name(symbol),
            Lookup::GetExport => module.get_export_by_name(symbol).map(Some),
            Lookup::FindSymbol => module.find_symbol_by_name(symbol),
            Lookup::GetSymbol => module.get_symbol_by_name(symbol).map(Some),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Exports,
    Imports,
    Symbols,
}

impl Listing {
    const ALL: [Listing; 3] = [Listing::Exports, Listing::Imports, Listing::Symbols];

    fn name(self) -> &'static str {
        match self {
            Listing::Exports => names::ENUMERATE_EXPORTS,
            Listing::Imports => names::ENUMERATE_IMPORTS,
            Listing::Symbols => names::ENUMERATE_SYMBOLS,
        }
    }

    fn list(self, module: &ModuleRef) -> Result<Vec<Value>> {
        match self {
            Listing::Exports => module.enumerate_exports(),
            Listing::Imports => module.enumerate_imports(),
            Listing::Symbols => module.enumerate_symbols(),
        }
    }
}

/// Resolve a module argument (name, path or module handle)
///
/// Never cached: every call asks the host again.
fn resolve_module(host: &dyn Host, arg: Option<&Value>) -> Option<ModuleRef> {
    let arg = arg?;
    if let Value::Module(module) = arg {
        return Some(module.clone());
    }
    let name = match arg.as_module_name() {
        Ok(Some(name)) => name,
        Ok(None) => return None,
        Err(e) => {
            tracing::trace!(target: "introshim_core::synth", error = %e, "Unusable module argument");
            return None;
        }
    };
    match host.module_by_name(name) {
        Ok(module) => Some(module),
        Err(e) if e.is_resolution_failure() => {
            tracing::trace!(target: "introshim_core::synth", module = name, "No such module");
            None
        }
        Err(e) => {
            tracing::debug!(target: "introshim_core::synth", module = name, error = %e, "Module resolution failed");
            None
        }
    }
}

fn lookup(host: &dyn Host, module_ns: &dyn Namespace, kind: Lookup, args: &[Value]) -> Result<Value> {
    let Some(symbol) = args.get(1).and_then(Value::as_str) else {
        tracing::trace!(target: "introshim_core::synth", operation = kind.name(), "No symbol name given");
        return Ok(Value::Null);
    };
    let scope = args.first().unwrap_or(&Value::Null);

    let resolved = if scope.is_null() {
        module_ns.call(kind.global_name(), &[Value::from(symbol)])
    } else {
        match resolve_module(host, Some(scope)) {
            Some(module) => kind.in_module(&module, symbol).map(Value::from),
            None => return Ok(Value::Null),
        }
    };

    Ok(resolved.unwrap_or_else(|e| {
        if e.is_resolution_failure() {
            tracing::trace!(target: "introshim_core::synth", operation = kind.name(), symbol, "Not found");
        } else {
            tracing::debug!(
                target: "introshim_core::synth",
                operation = kind.name(),
                symbol,
                error = %e,
                "Lookup failed"
            );
        }
        Value::Null
    }))
}

fn enumerate(host: &dyn Host, kind: Listing, args: &[Value]) -> Result<Value> {
    let (rest, visitor) = split_visitor(args);
    let elements = match resolve_module(host, rest.first()) {
        Some(module) => kind.list(&module)?,
        None if visitor.is_some() => return Ok(Value::Null),
        None => Vec::new(),
    };
    match visitor {
        Some(visitor) => {
            drive(visitor, elements);
            Ok(Value::Null)
        }
        None => Ok(Value::Array(elements)),
    }
}

/// Register every missing `Module` operation into `table`
pub fn synthesize(
    host: &Arc<dyn Host>,
    module_ns: &Arc<dyn Namespace>,
    table: &mut OperationTable,
) -> Result<()> {
    for kind in Lookup::ALL {
        let host = Arc::clone(host);
        let ns = Arc::clone(module_ns);
        table.register_missing(
            module_ns.as_ref(),
            kind.name(),
            Operation::plain(move |args| lookup(host.as_ref(), ns.as_ref(), kind, args)),
        )?;
    }

    for name in [names::GET_BASE_ADDRESS, names::FIND_BASE_ADDRESS] {
        let host = Arc::clone(host);
        table.register_missing(
            module_ns.as_ref(),
            name,
            Operation::plain(move |args| {
                Ok(resolve_module(host.as_ref(), args.first())
                    .map(|module| Value::Pointer(module.base()))
                    .unwrap_or(Value::Null))
            }),
        )?;
    }

    let init_host = Arc::clone(host);
    table.register_missing(
        module_ns.as_ref(),
        names::ENSURE_INITIALIZED,
        Operation::plain(move |args| {
            if let Some(module) = resolve_module(init_host.as_ref(), args.first()) {
                if let Err(e) = module.ensure_initialized() {
                    tracing::debug!(
                        target: "introshim_core::synth",
                        module = module.name(),
                        error = %e,
                        "Initialization failed"
                    );
                }
            }
            Ok(Value::Null)
        }),
    )?;

    for kind in Listing::ALL {
        let host = Arc::clone(host);
        table.register_missing(
            module_ns.as_ref(),
            kind.name(),
            Operation::new(CallStyle::Dual, move |args| enumerate(host.as_ref(), kind, args)),
        )?;
    }

    Ok(())
}
