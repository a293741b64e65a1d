use std::cell::Cell;
use std::ptr::NonNull;

/// A separately allocated record, lazily materialized the first time a
/// non-owning reference is taken to an object. Holds the object's real
/// counter+flags (`org_counter`) once the object itself goes indirect, a
/// nullable pointer to the live object, and the block's own refcount
/// (live [`crate::Weak`] references plus the object's own self-link).
///
/// Multiple `Weak<T>` pointing at the same object share one `WeakBlock`.
///
/// This is deliberately not itself a `Managed` instance — its lifetime never
/// participates in a deep copy, only its address is used as a
/// correspondence-map key, so there is no need to route it through the same
/// retain/release vtable as user objects.
pub struct WeakBlock {
    target: Cell<Option<NonNull<()>>>,
    org_counter: Cell<usize>,
    self_count: Cell<usize>,
}

impl WeakBlock {
    /// Allocates a new block for `target`, migrating `org_counter` in from
    /// the object's previously-inline state word. The block starts with a
    /// self-count of 1 (the object's own back-reference); the caller is
    /// expected to retain it again for the `Weak` handle being constructed.
    pub(crate) fn allocate(target: NonNull<()>, org_counter: usize) -> NonNull<Self> {
        let block = Box::new(WeakBlock {
            target: Cell::new(Some(target)),
            org_counter: Cell::new(org_counter),
            self_count: Cell::new(1),
        });
        NonNull::from(Box::leak(block))
    }

    pub(crate) fn org_counter(&self) -> usize {
        self.org_counter.get()
    }

    pub(crate) fn set_org_counter(&self, bits: usize) {
        self.org_counter.set(bits);
    }

    pub(crate) fn target(&self) -> Option<NonNull<()>> {
        self.target.get()
    }

    /// Called once, when the underlying object is finalized: clears the
    /// live target and releases the block's self-link.
    ///
    /// # Safety
    /// Must be called at most once per block, exactly when the owned object
    /// is being destroyed.
    pub(crate) unsafe fn mark_dead(block: NonNull<WeakBlock>) {
        unsafe { block.as_ref() }.target.set(None);
        unsafe { WeakBlock::release(block) };
    }

    /// Retains the block (one more live `Weak` reference, or the initial
    /// self-link accounted for by [`WeakBlock::allocate`]).
    ///
    /// # Safety
    /// `block` must point at a live, still-allocated `WeakBlock`.
    pub(crate) unsafe fn retain(block: NonNull<WeakBlock>) {
        let b = unsafe { block.as_ref() };
        let n = b.self_count.get();
        b.self_count
            .set(n.checked_add(1).expect("ltm: weak-block counter overflowed"));
    }

    /// Releases the block. Deallocates it once its own count reaches zero
    /// (which can only happen after the object has already died, since the
    /// object holds one unit of this count itself until then).
    ///
    /// # Safety
    /// `block` must point at a live, still-allocated `WeakBlock`, and must
    /// not be used again if this call deallocates it.
    pub(crate) unsafe fn release(block: NonNull<WeakBlock>) {
        let n = unsafe { block.as_ref() }.self_count.get();
        debug_assert!(n > 0);
        let n = n - 1;
        unsafe { block.as_ref() }.self_count.set(n);
        if n == 0 {
            drop(unsafe { Box::from_raw(block.as_ptr()) });
        }
    }
}
