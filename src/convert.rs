//! Converter dispatch - raw handles to typed slots
//!
//! Design: one match on the type code per slot, no allocation for scalars:
//! - `i`/`l` need an exact integer in native range
//! - `d` takes any number, including integers too wide for `i128`
//! - `O` passes the borrowed handle through
//! - `N` duplicates into an [`Owned`]
//!
//! Conversion stops at the first failure. Slots converted before it are
//! dropped with the partial result, which closes every `Owned` among them.

use crate::errors::{ArgError, Reporter, Template};
use crate::format::{ArgSpec, TypeCode};
use crate::object::{Context, Number, Owned, Slot};
use smallvec::SmallVec;

/// Converted slots for one call
pub type Slots<'a, C> = SmallVec<[Slot<'a, C>; 8]>;

/// Convert every bound handle according to its spec
pub fn convert_all<'a, C: Context + ?Sized>(
    ctx: &'a C,
    specs: &[ArgSpec],
    bindings: &[Option<&'a C::Handle>],
    reporter: &Reporter<'_>,
) -> Result<Slots<'a, C>, ArgError> {
    debug_assert_eq!(specs.len(), bindings.len());

    let mut slots = Slots::with_capacity(specs.len());
    for (spec, bound) in specs.iter().zip(bindings) {
        let slot = match *bound {
            Some(handle) => convert(ctx, spec.code, handle)
                .map_err(|template| reporter.report(template))?,
            None => Slot::Unset,
        };
        slots.push(slot);
    }
    Ok(slots)
}

/// Convert a single handle
pub fn convert<'a, C: Context + ?Sized>(
    ctx: &'a C,
    code: TypeCode,
    handle: &'a C::Handle,
) -> Result<Slot<'a, C>, Template> {
    match code {
        TypeCode::Int => {
            let value = exact_int(ctx, handle)?;
            i32::try_from(value).map(Slot::Int).map_err(|_| out_of_range(value))
        }
        TypeCode::Long => {
            let value = exact_int(ctx, handle)?;
            i64::try_from(value).map(Slot::Long).map_err(|_| out_of_range(value))
        }
        TypeCode::Double => match ctx.number(handle) {
            Some(Number::Float(v)) => Ok(Slot::Double(v)),
            Some(Number::Int(v)) => Ok(Slot::Double(v as f64)),
            Some(Number::WideInt(v)) => Ok(Slot::Double(v)),
            None => Err(Template::ExpectedNumber),
        },
        TypeCode::Object => Ok(Slot::Borrowed(handle)),
        TypeCode::NewObject => Ok(Slot::Owned(Owned::dup(ctx, handle))),
    }
}

fn exact_int<C: Context + ?Sized>(ctx: &C, handle: &C::Handle) -> Result<i128, Template> {
    match ctx.number(handle) {
        Some(Number::Int(v)) => Ok(v),
        Some(Number::WideInt(v)) if v.is_sign_negative() => Err(Template::IntUnderflow),
        Some(Number::WideInt(_)) => Err(Template::IntOverflow),
        _ => Err(Template::ExpectedInt),
    }
}

fn out_of_range(value: i128) -> Template {
    if value > 0 {
        Template::IntOverflow
    } else {
        Template::IntUnderflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Heap;

    #[test]
    fn test_int_conversion() {
        let heap = Heap::new();
        let one = heap.int(1);
        let neg = heap.int(-2);
        assert!(matches!(convert(&heap, TypeCode::Int, &one), Ok(Slot::Int(1))));
        assert!(matches!(convert(&heap, TypeCode::Int, &neg), Ok(Slot::Int(-2))));
    }

    #[test]
    fn test_int_rejects_float_and_str() {
        let heap = Heap::new();
        let f = heap.float(1.0);
        let s = heap.str("1");
        assert_eq!(convert(&heap, TypeCode::Int, &f).unwrap_err(), Template::ExpectedInt);
        assert_eq!(convert(&heap, TypeCode::Long, &s).unwrap_err(), Template::ExpectedInt);
    }

    #[test]
    fn test_bool_is_integral() {
        let heap = Heap::new();
        let t = heap.bool(true);
        assert!(matches!(convert(&heap, TypeCode::Long, &t), Ok(Slot::Long(1))));
    }

    #[test]
    fn test_int_range() {
        let heap = Heap::new();
        let big = heap.int(i128::from(i32::MAX) + 1);
        let small = heap.int(i128::from(i32::MIN) - 1);
        assert_eq!(convert(&heap, TypeCode::Int, &big).unwrap_err(), Template::IntOverflow);
        assert_eq!(convert(&heap, TypeCode::Int, &small).unwrap_err(), Template::IntUnderflow);
        assert!(matches!(convert(&heap, TypeCode::Long, &big), Ok(Slot::Long(2147483648))));

        let huge = heap.int(i128::from(i64::MAX) + 1);
        assert_eq!(convert(&heap, TypeCode::Long, &huge).unwrap_err(), Template::IntOverflow);
    }

    /// Host whose handles are already numbers
    struct Numbers;

    impl Context for Numbers {
        type Handle = Number;

        fn dup(&self, handle: &Number) -> Number {
            *handle
        }

        fn close(&self, _handle: Number) {}

        fn is_null(&self, _handle: &Number) -> bool {
            false
        }

        fn number(&self, handle: &Number) -> Option<Number> {
            Some(*handle)
        }

        fn long_from(&self, value: i64) -> Number {
            Number::Int(i128::from(value))
        }

        fn float_from(&self, value: f64) -> Number {
            Number::Float(value)
        }
    }

    #[test]
    fn test_wide_int_keeps_magnitude_as_double() {
        let googol = Number::WideInt(1e100);
        assert!(matches!(convert(&Numbers, TypeCode::Double, &googol), Ok(Slot::Double(v)) if v == 1e100));

        let neg = Number::WideInt(-1e100);
        assert!(matches!(convert(&Numbers, TypeCode::Double, &neg), Ok(Slot::Double(v)) if v == -1e100));
    }

    #[test]
    fn test_wide_int_out_of_native_range() {
        let big = Number::WideInt(1e100);
        let small = Number::WideInt(f64::NEG_INFINITY);
        assert_eq!(convert(&Numbers, TypeCode::Long, &big).unwrap_err(), Template::IntOverflow);
        assert_eq!(convert(&Numbers, TypeCode::Int, &small).unwrap_err(), Template::IntUnderflow);
    }

    #[test]
    fn test_double_accepts_numbers() {
        let heap = Heap::new();
        let f = heap.float(1.0);
        let i = heap.int(-2);
        let s = heap.str("x");
        assert!(matches!(convert(&heap, TypeCode::Double, &f), Ok(Slot::Double(v)) if v == 1.0));
        assert!(matches!(convert(&heap, TypeCode::Double, &i), Ok(Slot::Double(v)) if v == -2.0));
        assert_eq!(convert(&heap, TypeCode::Double, &s).unwrap_err(), Template::ExpectedNumber);
    }

    #[test]
    fn test_object_codes() {
        let heap = Heap::new();
        let obj = heap.str("a");

        let borrowed = convert(&heap, TypeCode::Object, &obj).unwrap();
        assert!(matches!(borrowed, Slot::Borrowed(h) if *h == obj));
        assert_eq!(heap.refcount(obj), 1);

        let owned = convert(&heap, TypeCode::NewObject, &obj).unwrap();
        assert_eq!(heap.refcount(obj), 2);
        drop(owned);
        assert_eq!(heap.refcount(obj), 1);
    }

    #[test]
    fn test_failure_releases_earlier_owned_slots() {
        let heap = Heap::new();
        let a = heap.str("a");
        let b = heap.str("b");
        let specs = [
            ArgSpec { code: TypeCode::NewObject, optional: false, keyword_only: false },
            ArgSpec { code: TypeCode::Int, optional: false, keyword_only: false },
        ];
        let bindings = [Some(&a), Some(&b)];

        let err = convert_all(&heap, &specs, &bindings, &Reporter::new(Some("f"), None)).unwrap_err();
        assert_eq!(err.message(), "f() argument must be int");
        assert_eq!(heap.refcount(a), 1);
    }
}
