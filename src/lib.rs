//! argmarshal - format-string driven argument parsing for native extensions
//!
//! An extension function declares its parameters with a compact format
//! string (`"O|i:my_func"`) and hands the call's positional and keyword
//! arguments to the engine, which matches them to slots and converts each to
//! a native type or a borrowed/owned handle.
//!
//! Pipeline: [`format`] parses the declaration, [`matcher`] binds arguments
//! to slots, [`convert`] produces typed [`Slot`]s, and [`errors`] builds the
//! exact error message on any failure.

// Core engine
pub mod convert;
pub mod errors;
pub mod format;
pub mod matcher;
pub mod object;
mod parse;

// Support
pub mod bindings;
pub mod cache;
pub mod config;
pub mod logging;
pub mod runtime;
pub mod tracker;

// Re-export commonly used items
pub use cache::{CacheStats, SpecCache};
pub use config::Config;
pub use errors::{ArgError, ErrorKind, Reporter, Template};
pub use format::{ArgSpec, FormatSpec, TypeCode, Variant};
pub use object::{Context, Number, Owned, Slot};
pub use parse::{parse_keywords, parse_positional, Parsed};
pub use runtime::{Heap, ObjRef, Value};
pub use tracker::Tracker;
