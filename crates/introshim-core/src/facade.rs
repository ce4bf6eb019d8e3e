//! Namespace interception facade
//!
//! Overlays a frozen override table on an original namespace. Reads prefer
//! the overrides, writes always go to the original, and a write the original
//! rejects is dropped instead of failing the caller.

use crate::registry::OperationTable;
use introshim_common::{Member, Namespace, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

pub struct NamespaceFacade {
    name: String,
    original: Arc<dyn Namespace>,
    overrides: Arc<OperationTable>,
}

impl NamespaceFacade {
    pub fn new(
        name: impl Into<String>,
        original: Arc<dyn Namespace>,
        overrides: Arc<OperationTable>,
    ) -> Self {
        Self {
            name: name.into(),
            original,
            overrides,
        }
    }

    /// The wrapped namespace
    pub fn original(&self) -> &Arc<dyn Namespace> {
        &self.original
    }

    pub fn overrides(&self) -> &OperationTable {
        &self.overrides
    }

    /// Whether `member` is served by a synthesized operation
    pub fn is_override(&self, member: &str) -> bool {
        self.overrides.contains(member)
    }
}

impl Namespace for NamespaceFacade {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, member: &str) -> Option<Member> {
        match self.overrides.get(member) {
            Some(op) => Some(Member::Operation(op.clone())),
            None => self.original.get(member),
        }
    }

    fn set(&self, member: &str, value: Member) -> Result<()> {
        if let Err(e) = self.original.set(member, value) {
            debug!(
                target: "introshim_core::facade",
                namespace = %self.name,
                member,
                error = %e,
                "Suppressed rejected write"
            );
        }
        Ok(())
    }

    fn members(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.original.members().into_iter().collect();
        names.extend(self.overrides.names());
        names.into_iter().collect()
    }

    fn contains(&self, member: &str) -> bool {
        self.overrides.contains(member) || self.original.contains(member)
    }
}

impl std::fmt::Debug for NamespaceFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceFacade")
            .field("name", &self.name)
            .field("original", &self.original.name())
            .field("overrides", &self.overrides.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use introshim_common::{Error, ObjectNamespace, Operation, Value};

    fn facade() -> NamespaceFacade {
        let original = ObjectNamespace::new("Process")
            .with_read_only("arch", "x64")
            .with_property("pageSize", Value::UInt(4096))
            .with_operation("getCurrentThreadId", Operation::plain(|_| Ok(Value::UInt(7))));
        let mut table = OperationTable::new("Process");
        table
            .register(
                "enumerateModulesSync",
                Operation::collecting(|_| Ok(Value::Array(vec![]))),
            )
            .unwrap();
        NamespaceFacade::new("Process", Arc::new(original), Arc::new(table))
    }

    #[test]
    fn test_reads_prefer_overrides_then_original() {
        let facade = facade();
        assert!(facade.is_override("enumerateModulesSync"));
        assert_eq!(
            facade.call("enumerateModulesSync", &[]).unwrap(),
            Value::Array(vec![])
        );
        assert_eq!(facade.call("getCurrentThreadId", &[]).unwrap(), Value::UInt(7));
        assert_eq!(facade.property("arch"), Some(Value::from("x64")));
        assert!(facade.get("enumerateThreads").is_none());
    }

    #[test]
    fn test_unknown_call_is_unsupported() {
        let err = facade().call("enumerateThreads", &[]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_writes_reach_original() {
        let facade = facade();
        facade.set("pageSize", Value::UInt(16384).into()).unwrap();
        assert_eq!(facade.property("pageSize"), Some(Value::UInt(16384)));
        assert_eq!(
            facade.original().property("pageSize"),
            Some(Value::UInt(16384))
        );
    }

    #[test]
    fn test_rejected_write_is_suppressed() {
        let facade = facade();
        assert!(facade.set("arch", Value::from("arm64").into()).is_ok());
        assert_eq!(facade.property("arch"), Some(Value::from("x64")));
    }

    #[test]
    fn test_membership_is_union() {
        let facade = facade();
        assert!(facade.contains("arch"));
        assert!(facade.contains("enumerateModulesSync"));
        assert!(!facade.contains("enumerateThreadsSync"));
        assert_eq!(
            facade.members(),
            vec!["arch", "enumerateModulesSync", "getCurrentThreadId", "pageSize"]
        );
    }
}
