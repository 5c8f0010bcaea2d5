//! Positional + keyword matching

use super::Bindings;
use crate::errors::{ArgError, Template};
use crate::format::FormatSpec;
use crate::object::Context;
use tracing::debug;

/// Check the declared parameter names against the format
///
/// An empty name marks a positional-only parameter. Those must form a leading
/// run and may not be keyword-only. Runs before any argument is looked at.
pub fn validate_names(spec: &FormatSpec, names: &[&str]) -> Result<(), ArgError> {
    let mut seen_named = false;

    for (i, name) in names.iter().enumerate() {
        if !name.is_empty() {
            seen_named = true;
            continue;
        }

        let keyword_only = spec.args().get(i).is_some_and(|a| a.keyword_only);
        if seen_named || keyword_only {
            return Err(spec.reporter().report(Template::EmptyKeywordName));
        }
    }

    Ok(())
}

/// Bind positional values by index, then keyword values by name
///
/// `kwargs` entries whose handle is null count as not supplied.
pub fn match_keywords<'a, C, K>(
    ctx: &C,
    spec: &FormatSpec,
    args: &'a [C::Handle],
    kwargs: &'a [(K, C::Handle)],
    names: &[&str],
) -> Result<Bindings<'a, C::Handle>, ArgError>
where
    C: Context + ?Sized,
    K: AsRef<str>,
{
    let reporter = spec.reporter();

    validate_names(spec, names)?;

    if spec.len() > names.len() {
        return Err(reporter.report(Template::TooFewKeywords));
    }
    if spec.len() < names.len() {
        return Err(reporter.report(Template::TooManyKeywords));
    }

    let mut bindings: Bindings<'a, C::Handle> = smallvec::smallvec![None; spec.len()];

    for (i, value) in args.iter().enumerate() {
        let Some(arg) = spec.args().get(i) else {
            return Err(reporter.report(Template::TooManyKeywords));
        };
        if arg.keyword_only {
            return Err(reporter.report(Template::KeywordOnlyAsPositional));
        }
        bindings[i] = Some(value);
    }

    let mut supplied = 0usize;
    let mut collisions = 0usize;

    for (key, value) in kwargs {
        if ctx.is_null(value) {
            continue;
        }
        supplied += 1;

        let key = key.as_ref();
        let slot = names.iter().position(|name| !name.is_empty() && *name == key);
        match slot {
            Some(i) if bindings[i].is_some() => {
                debug!(target: "argmarshal", keyword = key, "keyword collides with positional argument");
                collisions += 1;
            }
            Some(i) => bindings[i] = Some(value),
            None => {
                debug!(target: "argmarshal", keyword = key, "keyword matches no parameter");
            }
        }
    }

    if collisions > 0 || args.len() + supplied > spec.max_total() {
        return Err(reporter.report(Template::TooManyKeywords));
    }

    let missing = spec
        .args()
        .iter()
        .zip(&bindings)
        .filter(|(arg, bound)| !arg.optional && bound.is_none())
        .count();

    match missing {
        0 => Ok(bindings),
        1 => Err(reporter.report(Template::NoValueForRequired)),
        _ => Err(reporter.report(Template::TooFewKeywords)),
    }
}
