//! Argument matching - map call arguments onto declared parameter slots
//!
//! Two variants:
//! - `positional` - values bind to slots by index
//! - `keywords` - values bind by index, then by declared parameter name
//!
//! Matchers only decide *which* handle lands in which slot. Conversion to
//! native types happens afterwards in [`crate::convert`].

mod keywords;
mod positional;

pub use keywords::{match_keywords, validate_names};
pub use positional::match_positional;

use smallvec::SmallVec;

/// Raw handle per slot, `None` for unmatched optional slots
pub type Bindings<'a, H> = SmallVec<[Option<&'a H>; 8]>;
