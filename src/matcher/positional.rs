//! Positional-only matching

use super::Bindings;
use crate::errors::{ArgError, Template};
use crate::format::FormatSpec;

/// Bind `args[i]` to slot `i`; trailing optional slots stay unbound
pub fn match_positional<'a, H>(spec: &FormatSpec, args: &'a [H]) -> Result<Bindings<'a, H>, ArgError> {
    let reporter = spec.reporter();

    if args.len() < spec.min_required() {
        return Err(reporter.report(Template::RequiredPositionalMissing));
    }
    if args.len() > spec.max_total() {
        return Err(reporter.report(Template::TooManyArguments));
    }

    let mut bindings: Bindings<'a, H> = args.iter().map(Some).collect();
    bindings.resize(spec.max_total(), None);
    Ok(bindings)
}
