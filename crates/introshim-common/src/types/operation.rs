//! Namespace members: callable operations and plain properties

use super::value::Value;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Operation handler: positional arguments in, one value out
pub type Handler = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Calling convention an operation was registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStyle {
    /// Ordinary call, no enumeration semantics
    Plain,
    /// Returns the complete ordered sequence
    Collecting,
    /// Takes a trailing visitor and drives it
    Visitor,
    /// Accepts both forms: a trailing visitor is driven, otherwise the
    /// sequence is returned
    Dual,
}

impl CallStyle {
    /// Whether a call without a visitor yields the full sequence
    pub fn collects(self) -> bool {
        matches!(self, CallStyle::Plain | CallStyle::Collecting | CallStyle::Dual)
    }
}

#[derive(Clone)]
pub struct Operation {
    style: CallStyle,
    handler: Handler,
}

impl Operation {
    pub fn new<F>(style: CallStyle, handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            style,
            handler: Arc::new(handler),
        }
    }

    pub fn plain<F>(handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(CallStyle::Plain, handler)
    }

    pub fn collecting<F>(handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(CallStyle::Collecting, handler)
    }

    pub fn visitor<F>(handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(CallStyle::Visitor, handler)
    }

    pub fn style(&self) -> CallStyle {
        self.style
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.handler)(args)
    }

    /// Whether two handles point at the same implementation
    pub fn same_handler(&self, other: &Operation) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("style", &self.style)
            .finish()
    }
}

/// A named member of a namespace
#[derive(Debug, Clone)]
pub enum Member {
    Operation(Operation),
    Property(Value),
}

impl Member {
    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Member::Operation(op) => Some(op),
            Member::Property(_) => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Member::Operation(_))
    }
}

impl From<Operation> for Member {
    fn from(op: Operation) -> Self {
        Member::Operation(op)
    }
}

impl From<Value> for Member {
    fn from(v: Value) -> Self {
        Member::Property(v)
    }
}
