use crate::header::Header;
use crate::weak_block::WeakBlock;
use std::ptr::NonNull;

/// The capability every managed type provides to LTM: access to its header,
/// and the two small traversal hooks the copy transaction's commit phase
/// uses to find owning children and non-owning slots without a bespoke
/// reflection layer per type.
///
/// This is the same shape as the `trace(&self, tracer)` visitor used by
/// cycle collectors across the Rust ecosystem (e.g. `gcmodule::Trace`); LTM
/// needs two visitors rather than one because it distinguishes owning edges
/// (recursed into) from non-owning ones (never recursed into, only
/// redirected).
///
/// `visit_owned` and `visit_weak` default to "no children" so that leaf
/// types (no `Own`/`Weak` fields at all) need not implement them.
pub trait Managed: 'static {
    /// Access to this object's lifetime header. Must always return the same
    /// `Header` instance for the lifetime of `self`.
    fn header(&self) -> &Header;

    /// Calls `visitor` once for every owning (`Own<_>`) field.
    fn visit_owned(&self, visitor: &mut dyn FnMut(&dyn Managed)) {
        let _ = visitor;
    }

    /// Calls `visitor` once for every non-owning (`Weak<_>`) field.
    fn visit_weak(&self, visitor: &mut dyn FnMut(&dyn WeakSlot)) {
        let _ = visitor;
    }
}

/// Object-safe view of a `Weak<T>` field, used by the copy transaction's
/// commit phase to inspect and, if needed, redirect a non-owning reference
/// without knowing its concrete pointee type `T`.
pub trait WeakSlot {
    /// The weak-block this slot currently points at, if any.
    fn block(&self) -> Option<NonNull<WeakBlock>>;

    /// Rewrites this slot to point at `new_block` instead, retaining the new
    /// block and releasing the old one. Called only when `new_block` is the
    /// clone produced for `self.block()` during this transaction.
    fn redirect(&self, new_block: NonNull<WeakBlock>);
}

/// Types whose value can be deep-copied: the per-type "clone hook" the copy
/// transaction calls on every node it recurses into.
///
/// `clone_value` must:
/// - copy plain value fields directly,
/// - recurse into owning (`Own<_>`) fields via [`crate::Own::deep_copy`],
/// - shallow-copy non-owning (`Weak<_>`) fields via their ordinary `Clone`
///   impl (the redirection happens later, at transaction commit).
///
/// Implement this by hand for full control, or with the [`crate::managed`]
/// macro for the common case of listing fields by kind.
pub trait DeepClone: Managed + Sized {
    /// Failure here aborts the enclosing copy transaction (see
    /// [`crate::error::CloneError`]).
    fn clone_value(&self) -> Result<Self, crate::error::CloneError>;
}

/// Releases one retain unit on `target`'s header and, if that was the last
/// one outstanding, finalizes the object: marks its weak-block dead (if any)
/// and drops/deallocates the `Box` that originally allocated it.
///
/// Shared by every reference kind whose `Drop` can be the one that brings
/// the real count to zero — [`crate::Own`], [`crate::Temp`], and
/// [`crate::InterfacePin`] — so the finalization sequence lives in one
/// place instead of being copy-pasted per reference kind.
///
/// # Safety
/// `target` must point at a still-live object that was originally allocated
/// via `Box::new` and leaked via `Box::leak`/`Box::into_raw`.
pub(crate) unsafe fn release_target<T: Managed>(target: NonNull<T>) {
    let header = unsafe { target.as_ref() }.header();
    if header.release() {
        if let Some(block) = header.weak_block_if_present() {
            unsafe { WeakBlock::mark_dead(block) };
        }
        drop(unsafe { Box::from_raw(target.as_ptr()) });
    }
}
