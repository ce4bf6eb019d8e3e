//! introshim core
//!
//! Negotiates with an instrumentation host whose API shape varies between
//! versions and exposes one stable surface on top of it:
//!
//! - [`probe`] decides what the host already provides
//! - [`module_fallbacks`] and [`memory_fallbacks`] synthesize what is missing
//! - [`enumeration`] makes enumerations callable in both conventions
//! - [`facade`] layers the result over the original namespaces
//!
//! [`install`] runs the negotiation once per process.

pub mod enumeration;
pub mod facade;
pub mod memory_fallbacks;
pub mod module_fallbacks;
pub mod names;
pub mod probe;
pub mod registry;
pub mod shim;

pub use enumeration::{drive, split_visitor, Completion};
pub use facade::NamespaceFacade;
pub use probe::{detect_shape, has, ApiShape};
pub use registry::OperationTable;
pub use shim::{install, installed, NegotiationReport, Shim};
