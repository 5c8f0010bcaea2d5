//! Entry points - format string + call arguments in, typed slots out

use crate::convert::{convert_all, Slots};
use crate::errors::{ArgError, Template};
use crate::format::{FormatSpec, Variant};
use crate::matcher::{match_keywords, match_positional};
use crate::object::{Context, Owned, Slot};
use tracing::trace;

/// Successful parse: one typed slot per declared parameter
///
/// Slot accessors return `None` when the index is out of range, the slot is
/// unset, or it holds a different type.
pub struct Parsed<'a, C: Context + ?Sized> {
    slots: Slots<'a, C>,
}

impl<'a, C: Context + ?Sized> Parsed<'a, C> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slot<'a, C>> {
        self.slots.get(index)
    }

    /// Whether an optional parameter received no argument
    pub fn is_unset(&self, index: usize) -> bool {
        self.slots.get(index).map_or(true, Slot::is_unset)
    }

    pub fn int(&self, index: usize) -> Option<i32> {
        match self.slots.get(index)? {
            Slot::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn long(&self, index: usize) -> Option<i64> {
        match self.slots.get(index)? {
            Slot::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn double(&self, index: usize) -> Option<f64> {
        match self.slots.get(index)? {
            Slot::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Handle of an `O` or `N` slot
    pub fn handle(&self, index: usize) -> Option<&C::Handle> {
        self.slots.get(index)?.handle()
    }

    /// Move a slot out, leaving it unset
    pub fn take(&mut self, index: usize) -> Slot<'a, C> {
        match self.slots.get_mut(index) {
            Some(slot) => std::mem::replace(slot, Slot::Unset),
            None => Slot::Unset,
        }
    }

    /// Move an `N` slot out
    ///
    /// Any other slot kind is left in place.
    pub fn take_owned(&mut self, index: usize) -> Option<Owned<'a, C>> {
        let slot = self.slots.get_mut(index)?;
        if !matches!(slot, Slot::Owned(_)) {
            return None;
        }
        match std::mem::replace(slot, Slot::Unset) {
            Slot::Owned(owned) => Some(owned),
            _ => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot<'a, C>> {
        self.slots.iter()
    }

    pub fn into_slots(self) -> Vec<Slot<'a, C>> {
        self.slots.into_vec()
    }
}

impl<C: Context + ?Sized> std::fmt::Debug for Parsed<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}

impl FormatSpec {
    /// Match and convert a positional-only call
    pub fn parse_positional<'a, C: Context + ?Sized>(
        &self,
        ctx: &'a C,
        args: &'a [C::Handle],
    ) -> Result<Parsed<'a, C>, ArgError> {
        self.expect_variant(Variant::Positional)?;
        trace!(target: "argmarshal", function = self.name(), nargs = args.len(), "parse positional");

        let bindings = match_positional(self, args)?;
        let slots = convert_all(ctx, self.args(), &bindings, &self.reporter())?;
        Ok(Parsed { slots })
    }

    /// Match and convert a call with positional and keyword arguments
    ///
    /// `names` pairs one declared name with each parameter; an empty name
    /// marks a leading positional-only parameter.
    pub fn parse_keywords<'a, C, K>(
        &self,
        ctx: &'a C,
        args: &'a [C::Handle],
        kwargs: &'a [(K, C::Handle)],
        names: &[&str],
    ) -> Result<Parsed<'a, C>, ArgError>
    where
        C: Context + ?Sized,
        K: AsRef<str>,
    {
        self.expect_variant(Variant::Keywords)?;
        trace!(
            target: "argmarshal",
            function = self.name(),
            nargs = args.len(),
            nkwargs = kwargs.len(),
            "parse keywords"
        );

        let bindings = match_keywords(ctx, self, args, kwargs, names)?;
        let slots = convert_all(ctx, self.args(), &bindings, &self.reporter())?;
        Ok(Parsed { slots })
    }

    /// A spec is only valid for the entry point it was parsed for
    fn expect_variant(&self, entry: Variant) -> Result<(), ArgError> {
        if self.variant() == entry {
            return Ok(());
        }
        Err(self.reporter().report(Template::UnknownFormatCode))
    }
}

/// Parse a positional-only call against `fmt`
pub fn parse_positional<'a, C: Context + ?Sized>(
    ctx: &'a C,
    args: &'a [C::Handle],
    fmt: &str,
) -> Result<Parsed<'a, C>, ArgError> {
    FormatSpec::positional(fmt)?.parse_positional(ctx, args)
}

/// Parse a positional + keyword call against `fmt` and declared `names`
pub fn parse_keywords<'a, C, K>(
    ctx: &'a C,
    args: &'a [C::Handle],
    kwargs: &'a [(K, C::Handle)],
    fmt: &str,
    names: &[&str],
) -> Result<Parsed<'a, C>, ArgError>
where
    C: Context + ?Sized,
    K: AsRef<str>,
{
    FormatSpec::keywords(fmt)?.parse_keywords(ctx, args, kwargs, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Heap;

    #[test]
    fn test_take_owned_transfers_release() {
        let heap = Heap::new();
        let args = [heap.str("a"), heap.int(2)];
        let mut parsed = parse_positional(&heap, &args, "Ni").unwrap();

        assert!(parsed.take_owned(1).is_none());
        assert_eq!(parsed.int(1), Some(2));

        let owned = parsed.take_owned(0).unwrap();
        assert!(parsed.is_unset(0));
        drop(parsed);
        assert_eq!(heap.refcount(args[0]), 2);

        let raw = owned.into_raw();
        heap.close(raw);
        assert_eq!(heap.refcount(args[0]), 1);
    }

    #[test]
    fn test_take_leaves_unset() {
        let heap = Heap::new();
        let args = [heap.float(0.5)];
        let mut parsed = parse_positional(&heap, &args, "d|d").unwrap();

        assert!(matches!(parsed.take(0), Slot::Double(v) if v == 0.5));
        assert!(parsed.is_unset(0));
        assert!(parsed.take(5).is_unset());
        assert_eq!(parsed.double(0), None);
    }

    #[test]
    fn test_keyword_spec_rejected_by_positional_entry() {
        let heap = Heap::new();
        let args = [heap.int(1), heap.int(2)];
        let spec = FormatSpec::keywords("O$O:two_add").unwrap();

        let err = spec.parse_positional(&heap, &args).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.message(), "two_add() unknown arg format code");
    }

    #[test]
    fn test_positional_spec_rejected_by_keyword_entry() {
        let heap = Heap::new();
        let args = [heap.int(1)];
        let spec = FormatSpec::positional("O|O;custom").unwrap();

        let err = spec.parse_keywords::<_, &str>(&heap, &args, &[], &["a", "b"]).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.message(), "function unknown arg format code");
        assert_eq!(heap.refcount(args[0]), 1);
    }

    #[test]
    fn test_dropping_parsed_releases_owned_slots() {
        let heap = Heap::new();
        let args = [heap.int(1), heap.int(2)];
        let parsed = parse_positional(&heap, &args, "NN").unwrap();
        assert_eq!(heap.refcount(args[1]), 2);

        drop(parsed);
        assert_eq!(heap.refcount(args[0]), 1);
        assert_eq!(heap.refcount(args[1]), 1);
    }
}
