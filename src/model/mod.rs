//! # RDF Model
//!
//! Plain data types that cross every boundary: parser ↔ storage ↔ execution
//! ↔ user. No I/O, no state, no async.

pub mod term;
pub mod triple;
pub mod bindings;

pub use term::{Term, Literal};
pub use triple::Triple;
pub use bindings::BindingsGroup;
