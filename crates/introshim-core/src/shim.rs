//! Capability negotiation and installation
//!
//! [`Shim::negotiate`] probes the host once, builds every override table and
//! freezes the result behind facades. [`install`] does this once per process.

use crate::enumeration;
use crate::facade::NamespaceFacade;
use crate::memory_fallbacks;
use crate::module_fallbacks;
use crate::names;
use crate::probe::{self, ApiShape};
use crate::registry::OperationTable;
use introshim_common::{
    init_logging, Error, Host, ModuleRef, Namespace, NativePointer, ObjectNamespace, Relocation, Result,
    ShimConfig, Value,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// What negotiation found and changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationReport {
    /// `None` when the host has no `Module` namespace to classify
    pub shape: Option<ApiShape>,
    /// Namespaces the host lacked, created empty
    pub created: Vec<String>,
    /// Relocations that applied
    pub relocated: Vec<Relocation>,
    /// Synthesized operation names per namespace
    pub synthesized: BTreeMap<String, Vec<String>>,
}

impl NegotiationReport {
    /// Whether negotiation left the host exactly as it found it
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.relocated.is_empty() && self.synthesized.is_empty()
    }

    pub fn synthesized_count(&self) -> usize {
        self.synthesized.values().map(Vec::len).sum()
    }
}

/// Negotiated view of a host
///
/// Immutable once built. Implements [`Host`] itself, so negotiating over a
/// `Shim` is possible and adds nothing.
pub struct Shim {
    host: Arc<dyn Host>,
    namespaces: BTreeMap<String, Arc<NamespaceFacade>>,
    report: NegotiationReport,
}

impl Shim {
    pub fn negotiate(host: Arc<dyn Host>, config: &ShimConfig) -> Result<Self> {
        config.validate()?;
        let mut report = NegotiationReport::default();
        let mut originals: BTreeMap<String, Arc<dyn Namespace>> = BTreeMap::new();

        for relocation in &config.relocations {
            if host.namespace(&relocation.to).is_some() {
                continue;
            }
            if let Some(ns) = host.namespace(&relocation.from) {
                debug!(
                    target: "introshim_core::shim",
                    from = %relocation.from,
                    to = %relocation.to,
                    "Relocating namespace"
                );
                originals.insert(relocation.to.clone(), ns);
                report.relocated.push(relocation.clone());
            }
        }

        report.shape = host
            .namespace(names::MODULE)
            .map(|module| {
                let memory = host.namespace(names::MEMORY);
                probe::detect_shape(Some(module.as_ref()), memory.as_deref())
            });

        for name in &config.namespaces {
            if originals.contains_key(name) {
                continue;
            }
            let ns = match host.namespace(name) {
                Some(ns) => ns,
                None => {
                    debug!(target: "introshim_core::shim", namespace = %name, "Creating missing namespace");
                    report.created.push(name.clone());
                    Arc::new(ObjectNamespace::new(name.as_str()))
                }
            };
            originals.insert(name.clone(), ns);
        }

        for target in &config.enumerations {
            if !originals.contains_key(&target.namespace) {
                if let Some(ns) = host.namespace(&target.namespace) {
                    originals.insert(target.namespace.clone(), ns);
                }
            }
        }

        let mut tables: BTreeMap<String, OperationTable> = originals
            .keys()
            .map(|name| (name.clone(), OperationTable::new(name.as_str())))
            .collect();

        if let (Some(ns), Some(table)) = (originals.get(names::MODULE), tables.get_mut(names::MODULE)) {
            module_fallbacks::synthesize(&host, ns, table)?;
        }
        if let (Some(ns), Some(table)) = (originals.get(names::MEMORY), tables.get_mut(names::MEMORY)) {
            memory_fallbacks::synthesize(&host, ns, table)?;
        }

        for target in &config.enumerations {
            match (originals.get(&target.namespace), tables.get_mut(&target.namespace)) {
                (Some(ns), Some(table)) => {
                    enumeration::adapt(ns, target, table)?;
                }
                _ => debug!(
                    target: "introshim_core::shim",
                    namespace = %target.namespace,
                    operation = %target.operation,
                    "Enumeration target has no namespace"
                ),
            }
        }

        let mut namespaces = BTreeMap::new();
        for (name, original) in originals {
            let table = tables
                .remove(&name)
                .unwrap_or_else(|| OperationTable::new(name.as_str()));
            if !table.is_empty() {
                debug!(target: "introshim_core::shim", "{}", table.summary());
                report.synthesized.insert(name.clone(), table.names());
            }
            let facade = NamespaceFacade::new(name.as_str(), original, Arc::new(table));
            namespaces.insert(name, Arc::new(facade));
        }

        info!(
            target: "introshim_core::shim",
            shape = ?report.shape,
            created = report.created.len(),
            relocated = report.relocated.len(),
            synthesized = report.synthesized_count(),
            "Host API negotiated"
        );

        Ok(Self {
            host,
            namespaces,
            report,
        })
    }

    /// Facade for `name`, if negotiation produced one
    pub fn facade(&self, name: &str) -> Option<Arc<NamespaceFacade>> {
        self.namespaces.get(name).cloned()
    }

    pub fn module(&self) -> Option<Arc<NamespaceFacade>> {
        self.facade(names::MODULE)
    }

    pub fn memory(&self) -> Option<Arc<NamespaceFacade>> {
        self.facade(names::MEMORY)
    }

    pub fn process(&self) -> Option<Arc<NamespaceFacade>> {
        self.facade(names::PROCESS)
    }

    pub fn thread(&self) -> Option<Arc<NamespaceFacade>> {
        self.facade(names::THREAD)
    }

    pub fn kernel(&self) -> Option<Arc<NamespaceFacade>> {
        self.facade(names::KERNEL)
    }

    /// Names of every facade, sorted
    pub fn namespace_names(&self) -> Vec<String> {
        self.namespaces.keys().cloned().collect()
    }

    pub fn report(&self) -> &NegotiationReport {
        &self.report
    }

    /// Call `namespace.operation(args)` through the facades
    pub fn call(&self, namespace: &str, operation: &str, args: &[Value]) -> Result<Value> {
        match Host::namespace(self, namespace) {
            Some(ns) => ns.call(operation, args),
            None => Err(Error::unsupported(namespace, operation)),
        }
    }
}

impl Host for Shim {
    fn namespace(&self, name: &str) -> Option<Arc<dyn Namespace>> {
        match self.namespaces.get(name) {
            Some(facade) => Some(Arc::clone(facade) as Arc<dyn Namespace>),
            None => self.host.namespace(name),
        }
    }

    fn module_by_name(&self, name: &str) -> Result<ModuleRef> {
        self.host.module_by_name(name)
    }

    fn ptr(&self, value: &Value) -> Result<NativePointer> {
        self.host.ptr(value)
    }
}

impl std::fmt::Debug for Shim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shim")
            .field("namespaces", &self.namespace_names())
            .field("report", &self.report)
            .finish()
    }
}

static INSTALLED: OnceCell<Arc<Shim>> = OnceCell::new();

/// Negotiate once for the whole process
///
/// Later calls return the shim built by the first one; their host and
/// config are ignored.
pub fn install(host: Arc<dyn Host>, config: &ShimConfig) -> Result<Arc<Shim>> {
    if let Some(shim) = INSTALLED.get() {
        debug!(target: "introshim_core::shim", "Already installed");
        return Ok(Arc::clone(shim));
    }
    INSTALLED
        .get_or_try_init(|| {
            if config.init_logging {
                init_logging(&config.logging);
            }
            Shim::negotiate(host, config).map(Arc::new)
        })
        .map(Arc::clone)
}

/// The process-wide shim, if [`install`] has run
pub fn installed() -> Option<Arc<Shim>> {
    INSTALLED.get().cloned()
}
