//! Capability probing
//!
//! Every fallback is gated on [`has`]: an operation the host already
//! provides is never replaced.

use crate::names;
use introshim_common::{AccessorType, Namespace};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Whether `namespace` has a callable operation called `name`
///
/// A plain property with that name does not count.
pub fn has(namespace: &dyn Namespace, name: &str) -> bool {
    namespace
        .get(name)
        .map(|member| member.is_callable())
        .unwrap_or(false)
}

/// Names from `candidates` that `namespace` cannot serve
pub fn missing<'a>(
    namespace: &dyn Namespace,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Vec<&'a str> {
    candidates
        .into_iter()
        .filter(|name| !has(namespace, name))
        .collect()
}

/// Broad classification of the host API generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiShape {
    /// Module-scoped lookups and namespace-level typed accessors are native
    Legacy,
    /// Only global lookups are native; typed accessors live on pointers
    Modern,
    /// Some of both
    Mixed,
    /// No lookup surface at all
    Bare,
}

/// Classify the host from its `Module` and `Memory` namespaces
///
/// Informational only: each fallback is still decided by [`has`].
pub fn detect_shape(module: Option<&dyn Namespace>, memory: Option<&dyn Namespace>) -> ApiShape {
    let Some(module) = module else {
        return ApiShape::Bare;
    };

    let module_scoped = has(module, names::FIND_EXPORT_BY_NAME);
    let global = has(module, names::FIND_GLOBAL_EXPORT_BY_NAME);
    let typed = memory
        .map(|m| has(m, &AccessorType::Pointer.read_name()))
        .unwrap_or(false);

    let shape = match (module_scoped, typed, global) {
        (true, true, false) => ApiShape::Legacy,
        (false, false, true) => ApiShape::Modern,
        (false, false, false) => ApiShape::Bare,
        _ => ApiShape::Mixed,
    };
    debug!(
        target: "introshim_core::probe",
        module_scoped, global, typed, ?shape,
        "Classified host API"
    );
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use introshim_common::{ObjectNamespace, Operation, Value};

    fn op() -> Operation {
        Operation::plain(|_| Ok(Value::Null))
    }

    fn some(ns: &ObjectNamespace) -> Option<&dyn Namespace> {
        Some(ns)
    }

    #[test]
    fn test_has_requires_callable() {
        let ns = ObjectNamespace::new("Module")
            .with_operation("findExportByName", op())
            .with_property("getBaseAddress", Value::Null);
        assert!(has(&ns, "findExportByName"));
        assert!(!has(&ns, "getBaseAddress"));
        assert!(!has(&ns, "ensureInitialized"));
    }

    #[test]
    fn test_missing() {
        let ns = ObjectNamespace::new("Memory").with_operation("scan", op());
        assert_eq!(missing(&ns, ["scan", "scanSync"]), vec!["scanSync"]);
    }

    #[test]
    fn test_detect_shape() {
        let legacy_module = ObjectNamespace::new("Module").with_operation("findExportByName", op());
        let legacy_memory = ObjectNamespace::new("Memory").with_operation("readPointer", op());
        let modern_module =
            ObjectNamespace::new("Module").with_operation("findGlobalExportByName", op());
        let empty_memory = ObjectNamespace::new("Memory");

        assert_eq!(
            detect_shape(some(&legacy_module), some(&legacy_memory)),
            ApiShape::Legacy
        );
        assert_eq!(
            detect_shape(some(&modern_module), some(&empty_memory)),
            ApiShape::Modern
        );
        assert_eq!(
            detect_shape(some(&modern_module), some(&legacy_memory)),
            ApiShape::Mixed
        );
        assert_eq!(
            detect_shape(some(&ObjectNamespace::new("Module")), None),
            ApiShape::Bare
        );
        assert_eq!(detect_shape(None, some(&legacy_memory)), ApiShape::Bare);
    }
}
