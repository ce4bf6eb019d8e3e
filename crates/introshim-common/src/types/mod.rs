//! Value model shared by the host contract and the shim
//!
//! - `value` - dynamic argument/return values
//! - `pointer` - wrapped pointers and address parsing
//! - `accessor` - typed memory accessor kinds
//! - `visitor` - visitor callbacks and stop directives
//! - `operation` - namespace members and call styles
//! - `module` - module handles and export/import/symbol descriptors
//! - `thread` - thread descriptors
//! - `memory` - range descriptors, protections and scan hits

pub mod accessor;
pub mod memory;
pub mod module;
pub mod operation;
pub mod pointer;
pub mod thread;
pub mod value;
pub mod visitor;

pub use accessor::*;
pub use memory::*;
pub use module::*;
pub use operation::*;
pub use pointer::*;
pub use thread::*;
pub use value::*;
pub use visitor::*;
