//! Object model seam - the handle operations the engine needs from its host
//!
//! Design: the engine never owns values itself. A host implements [`Context`]
//! over its own handle type, and the engine expresses release obligations in
//! the types it hands back:
//! - [`Slot::Borrowed`] for `O` codes, nothing to release
//! - [`Slot::Owned`] for `N` codes, released exactly once by [`Owned`]

use std::fmt;
use std::mem::ManuallyDrop;

/// Numeric view of a handle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Exact integer (booleans included). Wide enough to report values that
    /// overflow every native integer type.
    Int(i128),
    /// Integer outside `i128`, carried as its nearest float
    WideInt(f64),
    Float(f64),
}

/// Handle operations supplied by the host object model
pub trait Context {
    type Handle: fmt::Debug;

    /// New reference to the same value
    fn dup(&self, handle: &Self::Handle) -> Self::Handle;

    /// Release one reference
    fn close(&self, handle: Self::Handle);

    /// Whether the handle is the host's null/unset marker
    fn is_null(&self, handle: &Self::Handle) -> bool;

    /// Numeric coercion, `None` for non-numeric values
    fn number(&self, handle: &Self::Handle) -> Option<Number>;

    fn long_from(&self, value: i64) -> Self::Handle;

    fn float_from(&self, value: f64) -> Self::Handle;
}

/// An owned handle, closed exactly once
///
/// Dropping an `Owned` releases it through its context. [`Owned::into_raw`]
/// transfers the obligation to the caller instead.
pub struct Owned<'c, C: Context + ?Sized> {
    ctx: &'c C,
    handle: ManuallyDrop<C::Handle>,
}

impl<'c, C: Context + ?Sized> Owned<'c, C> {
    /// Take ownership of an already-owned handle
    #[inline]
    pub fn new(ctx: &'c C, handle: C::Handle) -> Self {
        Self {
            ctx,
            handle: ManuallyDrop::new(handle),
        }
    }

    /// Duplicate a borrowed handle into an owned one
    #[inline]
    pub fn dup(ctx: &'c C, handle: &C::Handle) -> Self {
        Self::new(ctx, ctx.dup(handle))
    }

    #[inline]
    pub fn get(&self) -> &C::Handle {
        &self.handle
    }

    pub fn context(&self) -> &'c C {
        self.ctx
    }

    /// Give up the RAII guard; the caller must close the handle
    pub fn into_raw(self) -> C::Handle {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the handle is moved out once
        unsafe { ManuallyDrop::take(&mut this.handle) }
    }

    /// Release now
    pub fn close(self) {
        drop(self);
    }
}

impl<C: Context + ?Sized> Drop for Owned<'_, C> {
    fn drop(&mut self) {
        // SAFETY: drop runs at most once and the handle is not used afterwards
        let handle = unsafe { ManuallyDrop::take(&mut self.handle) };
        self.ctx.close(handle);
    }
}

impl<C: Context + ?Sized> fmt::Debug for Owned<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(self.get()).finish()
    }
}

/// One converted output slot
pub enum Slot<'a, C: Context + ?Sized> {
    /// Optional parameter with no argument
    Unset,
    Int(i32),
    Long(i64),
    Double(f64),
    Borrowed(&'a C::Handle),
    Owned(Owned<'a, C>),
}

impl<'a, C: Context + ?Sized> Slot<'a, C> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Handle carried by an `O` or `N` slot
    pub fn handle(&self) -> Option<&C::Handle> {
        match self {
            Self::Borrowed(h) => Some(*h),
            Self::Owned(owned) => Some(owned.get()),
            _ => None,
        }
    }
}

impl<C: Context + ?Sized> fmt::Debug for Slot<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "Unset"),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Long(v) => f.debug_tuple("Long").field(v).finish(),
            Self::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Self::Borrowed(h) => f.debug_tuple("Borrowed").field(h).finish(),
            Self::Owned(owned) => owned.fmt(f),
        }
    }
}
