//! Operation registry
//!
//! Per-namespace table of synthesized operations. Filled during negotiation,
//! then frozen inside a facade.

use crate::probe;
use introshim_common::{Error, Namespace, Operation, Result};
use std::collections::BTreeMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    namespace: String,
    entries: BTreeMap<String, Operation>,
}

impl OperationTable {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register an operation; a name can only be registered once
    pub fn register(&mut self, name: impl Into<String>, op: Operation) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(Error::Internal(format!(
                "duplicate operation {}.{}",
                self.namespace, name
            )));
        }
        self.entries.insert(name, op);
        Ok(())
    }

    /// Register `op` only if neither `original` nor this table already
    /// provides `name`; returns whether it was registered
    pub fn register_missing(
        &mut self,
        original: &dyn Namespace,
        name: &str,
        op: Operation,
    ) -> Result<bool> {
        if probe::has(original, name) {
            trace!(
                target: "introshim_core::synth",
                namespace = %self.namespace,
                operation = name,
                "Native implementation present"
            );
            return Ok(false);
        }
        if self.contains(name) {
            return Ok(false);
        }
        self.register(name, op)?;
        debug!(
            target: "introshim_core::synth",
            namespace = %self.namespace,
            operation = name,
            "Synthesized fallback"
        );
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "{}: {} synthesized [{}]",
            self.namespace,
            self.entries.len(),
            self.entries.keys().cloned().collect::<Vec<_>>().join(", ")
        )
    }
}
