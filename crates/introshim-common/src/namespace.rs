//! Plain object namespace

use crate::error::{Error, Result};
use crate::traits::Namespace;
use crate::types::{Member, Operation, Value};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

/// Namespace backed by a member map, optionally with read-only members
#[derive(Debug, Default)]
pub struct ObjectNamespace {
    name: String,
    members: RwLock<BTreeMap<String, Member>>,
    read_only: BTreeSet<String>,
}

impl ObjectNamespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: RwLock::new(BTreeMap::new()),
            read_only: BTreeSet::new(),
        }
    }

    /// Add an operation
    pub fn with_operation(self, name: &str, op: Operation) -> Self {
        self.members
            .write()
            .insert(name.to_string(), Member::Operation(op));
        self
    }

    /// Add a writable property
    pub fn with_property(self, name: &str, value: impl Into<Value>) -> Self {
        self.members
            .write()
            .insert(name.to_string(), Member::Property(value.into()));
        self
    }

    /// Add a property that rejects later writes
    pub fn with_read_only(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.read_only.insert(name.to_string());
        self.with_property(name, value)
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

impl Namespace for ObjectNamespace {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, member: &str) -> Option<Member> {
        self.members.read().get(member).cloned()
    }

    fn set(&self, member: &str, value: Member) -> Result<()> {
        if self.read_only.contains(member) {
            return Err(Error::ReadOnlyMember(format!("{}.{}", self.name, member)));
        }
        self.members.write().insert(member.to_string(), value);
        Ok(())
    }

    fn members(&self) -> Vec<String> {
        self.members.read().keys().cloned().collect()
    }
}
