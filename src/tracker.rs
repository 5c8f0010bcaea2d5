//! Handle tracker - scratch-handle registry for extension code
//!
//! Collects owned handles created while building a result so a single call
//! releases all of them on an error path. On success, [`Tracker::forget_all`]
//! hands them back without releasing.

use crate::object::{Context, Owned};
use tracing::trace;

pub struct Tracker<'c, C: Context + ?Sized> {
    ctx: &'c C,
    handles: Vec<C::Handle>,
}

impl<'c, C: Context + ?Sized> Tracker<'c, C> {
    pub fn new(ctx: &'c C) -> Self {
        Self::with_capacity(ctx, 0)
    }

    pub fn with_capacity(ctx: &'c C, capacity: usize) -> Self {
        Self {
            ctx,
            handles: Vec::with_capacity(capacity),
        }
    }

    /// Track an owned handle, returning a borrow of it
    pub fn add(&mut self, handle: C::Handle) -> &C::Handle {
        self.handles.push(handle);
        &self.handles[self.handles.len() - 1]
    }

    /// Take over an [`Owned`] guard
    pub fn track(&mut self, owned: Owned<'c, C>) -> &C::Handle {
        self.add(owned.into_raw())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop tracking everything; the caller now owns the handles
    pub fn forget_all(&mut self) -> Vec<C::Handle> {
        std::mem::take(&mut self.handles)
    }

    /// Release every tracked handle
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.handles.is_empty() {
            trace!(event = "tracker_close", count = self.handles.len());
        }
        for handle in self.handles.drain(..) {
            self.ctx.close(handle);
        }
    }
}

impl<C: Context + ?Sized> Drop for Tracker<'_, C> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Heap;

    #[test]
    fn test_close_releases_all() {
        let heap = Heap::new();
        let mut tracker = Tracker::new(&heap);
        tracker.add(heap.int(1));
        tracker.add(heap.str("two"));
        assert_eq!(tracker.len(), 2);
        assert_eq!(heap.live_objects(), 2);

        tracker.close();
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_drop_releases_all() {
        let heap = Heap::new();
        {
            let mut tracker = Tracker::with_capacity(&heap, 1);
            tracker.track(Owned::new(&heap, heap.float(1.0)));
        }
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn test_forget_all_keeps_handles() {
        let heap = Heap::new();
        let mut tracker = Tracker::new(&heap);
        let obj = *tracker.add(heap.int(5));

        let handles = tracker.forget_all();
        assert_eq!(handles, vec![obj]);
        assert!(tracker.is_empty());
        drop(tracker);

        assert_eq!(heap.refcount(obj), 1);
        heap.close(obj);
    }
}
