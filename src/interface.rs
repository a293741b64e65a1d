//! Non-owning references to a capability rather than a concrete holder type.
//!
//! [`Weak<T>`]/[`Temp<T>`] are keyed to one concrete `T`. Sometimes the
//! thing worth holding a non-owning reference to is a trait a node
//! implements, independent of which concrete type provides it — a renderer
//! holding a back-reference to "whatever implements `Drawable`" without
//! caring if that's a `Sprite` or a `TileLayer`. A manually tagged union of
//! `Weak<Sprite>` / `Weak<TileLayer>` doesn't scale past a couple of
//! implementors, so this module wraps the same weak-block machinery behind
//! a type-erased, trait-object-shaped handle instead.

use std::fmt;
use std::ptr::NonNull;

use crate::managed::{Managed, WeakSlot};
use crate::weak_block::WeakBlock;

/// A non-owning reference to a `dyn I` capability, backed by the same
/// weak-block as a concrete [`crate::Weak<T>`] to the object providing it.
///
/// Constructed via [`InterfaceWeak::new`], which takes both a concrete
/// [`crate::Weak<T>`] (for lifetime tracking and redirection) and a
/// downcasting closure that recovers the `&dyn I` view from `&T` each time
/// the reference is pinned. This mirrors a fat pointer split into its two
/// halves — a data pointer that can move (as the weak target is redirected
/// across a deep copy) and a vtable selection that stays fixed for the life
/// of the handle.
pub struct InterfaceWeak<I: ?Sized + 'static> {
    block: std::cell::Cell<Option<NonNull<WeakBlock>>>,
    downcast: Box<dyn Fn(NonNull<()>) -> *const I>,
    retain_target: fn(NonNull<()>),
    release_target: fn(NonNull<()>),
}

/// Monomorphized per `T`, so it knows how to bump `T`'s real header counter
/// without `InterfaceWeak<I>` itself being generic over `T`.
fn retain_target<T: Managed>(ptr: NonNull<()>) {
    unsafe { ptr.cast::<T>().as_ref() }.header().retain();
}

/// Monomorphized per `T`, so it knows how to release `T`'s real header
/// counter — and, if that was the last one, finalize `T` — without
/// `InterfaceWeak<I>` itself being generic over `T`.
fn release_target<T: Managed>(ptr: NonNull<()>) {
    unsafe { crate::managed::release_target(ptr.cast::<T>()) };
}

impl<I: ?Sized + 'static> InterfaceWeak<I> {
    /// Builds an interface-typed weak reference out of a concrete one.
    /// `downcast` receives the type-erased target pointer recorded in the
    /// weak-block and must produce a `*const I` view of it — typically
    /// `|p| p.cast::<ConcreteType>().as_ptr() as *const ConcreteType as *const dyn I`.
    pub fn new<T: Managed>(
        source: &crate::weak::Weak<T>,
        downcast: impl Fn(NonNull<()>) -> *const I + 'static,
    ) -> Self {
        let block = source.block();
        if let Some(b) = block {
            unsafe { WeakBlock::retain(b) };
        }
        InterfaceWeak {
            block: std::cell::Cell::new(block),
            downcast: Box::new(downcast),
            retain_target: retain_target::<T>,
            release_target: release_target::<T>,
        }
    }

    /// Resolves to a live `&I` view plus a retain guard, or `None` if the
    /// underlying object has died.
    ///
    /// Retains both the weak-block (so `target`/`mark_dead` bookkeeping
    /// stays valid) and the target's real header count (so the object
    /// itself cannot be finalized while the returned [`InterfacePin`] is
    /// alive) — the same two-level retain a [`crate::Temp`] gets via its
    /// own header, split in two here because `InterfaceWeak` only has a
    /// type-erased pointer to work with.
    pub fn pin(&self) -> Option<InterfacePin<I>> {
        let block = self.block.get()?;
        let target = unsafe { block.as_ref() }.target()?;
        unsafe { WeakBlock::retain(block) };
        (self.retain_target)(target);
        let raw = (self.downcast)(target);
        Some(InterfacePin {
            block,
            target,
            release_target: self.release_target,
            ptr: NonNull::new(raw as *mut I).expect("downcast returned a null pointer"),
        })
    }

    pub fn is_alive(&self) -> bool {
        self.block
            .get()
            .is_some_and(|b| unsafe { b.as_ref() }.target().is_some())
    }
}

impl<I: ?Sized + 'static> Drop for InterfaceWeak<I> {
    fn drop(&mut self) {
        if let Some(block) = self.block.get() {
            unsafe { WeakBlock::release(block) };
        }
    }
}

impl<I: ?Sized + 'static> WeakSlot for InterfaceWeak<I> {
    fn block(&self) -> Option<NonNull<WeakBlock>> {
        self.block.get()
    }

    fn redirect(&self, new_block: NonNull<WeakBlock>) {
        if let Some(old) = self.block.get() {
            unsafe {
                WeakBlock::retain(new_block);
                WeakBlock::release(old);
            }
            self.block.set(Some(new_block));
        }
    }
}

impl<I: ?Sized + 'static> fmt::Debug for InterfaceWeak<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(if self.is_alive() {
            "InterfaceWeak::Live"
        } else {
            "InterfaceWeak::Dead"
        })
        .finish()
    }
}

/// A retained, live `&I` view produced by [`InterfaceWeak::pin`]. Holds a
/// real retain on the underlying object — like [`crate::Temp`], it keeps the
/// target alive for as long as it exists, just reached through a type-erased
/// pointer and a stored release function instead of a concrete `Header`.
pub struct InterfacePin<I: ?Sized + 'static> {
    block: NonNull<WeakBlock>,
    target: NonNull<()>,
    release_target: fn(NonNull<()>),
    ptr: NonNull<I>,
}

impl<I: ?Sized + 'static> std::ops::Deref for InterfacePin<I> {
    type Target = I;

    fn deref(&self) -> &I {
        unsafe { self.ptr.as_ref() }
    }
}

impl<I: ?Sized + 'static> Drop for InterfacePin<I> {
    fn drop(&mut self) {
        (self.release_target)(self.target);
        unsafe { WeakBlock::release(self.block) };
    }
}
