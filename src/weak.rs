use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::managed::{Managed, WeakSlot};
use crate::own::Own;
use crate::temp::Temp;
use crate::weak_block::WeakBlock;

/// A non-owning reference: records an association without keeping the
/// target alive. Implemented via the weak-block: copying a `Weak<T>`
/// retains the *block*, never the object.
///
/// Dereferencing goes through [`Weak::pin`]; if the block's target has been
/// cleared (the object died), it yields `None`.
pub struct Weak<T: Managed> {
    block: Cell<Option<NonNull<WeakBlock>>>,
    _marker: PhantomData<T>,
}

impl<T: Managed> Weak<T> {
    /// A weak reference that never resolves to anything, as if its target
    /// had already been dropped.
    pub fn null() -> Self {
        Weak {
            block: Cell::new(None),
            _marker: PhantomData,
        }
    }

    pub(crate) fn from_target(target: NonNull<T>) -> Self {
        let header = unsafe { target.as_ref() }.header();
        let block = header.ensure_weak_block(target.cast::<()>());
        unsafe { WeakBlock::retain(block) };
        Weak {
            block: Cell::new(Some(block)),
            _marker: PhantomData,
        }
    }

    /// If the target is still alive, produces a pinning reference to it and
    /// retains it; otherwise `None`.
    pub fn pin(&self) -> Option<Temp<T>> {
        let block = self.block.get()?;
        let target = unsafe { block.as_ref() }.target()?;
        // SAFETY: non-null target in a weak-block is always the original
        // `T` the block was created for (`Weak<T>` never changes `T`).
        let target = target.cast::<T>();
        Some(Temp::from_target(target))
    }

    /// True if the target is still alive, without pinning it.
    pub fn is_alive(&self) -> bool {
        self.block
            .get()
            .is_some_and(|b| unsafe { b.as_ref() }.target().is_some())
    }

    /// (Re)points this reference at `owner`, through a shared borrow.
    ///
    /// `Weak<T>` already needs interior mutability for [`WeakSlot::redirect`]
    /// (the commit walk only ever has `&dyn WeakSlot`), so the same `Cell`
    /// serves ordinary reassignment too. This is what makes a
    /// self-referential or cyclic association constructible at all: the
    /// field starts `null`, and is bound after the node it lives in already
    /// exists, without requiring unique (`&mut`) access to that node.
    pub fn bind(&self, owner: &Own<T>) {
        let header = unsafe { owner.target.as_ref() }.header();
        let block = header.ensure_weak_block(owner.target.cast::<()>());
        unsafe { WeakBlock::retain(block) };
        if let Some(old) = self.block.replace(Some(block)) {
            unsafe { WeakBlock::release(old) };
        }
    }

    /// Clears this reference back to [`Weak::null`].
    pub fn unbind(&self) {
        if let Some(old) = self.block.replace(None) {
            unsafe { WeakBlock::release(old) };
        }
    }
}

impl<T: Managed> From<&Own<T>> for Weak<T> {
    fn from(owner: &Own<T>) -> Self {
        owner.weak()
    }
}

impl<T: Managed> From<&Temp<T>> for Weak<T> {
    fn from(pinned: &Temp<T>) -> Self {
        pinned.weak()
    }
}

impl<T: Managed> Clone for Weak<T> {
    fn clone(&self) -> Self {
        if let Some(block) = self.block.get() {
            unsafe { WeakBlock::retain(block) };
        }
        Weak {
            block: Cell::new(self.block.get()),
            _marker: PhantomData,
        }
    }
}

impl<T: Managed> Drop for Weak<T> {
    fn drop(&mut self) {
        if let Some(block) = self.block.get() {
            unsafe { WeakBlock::release(block) };
        }
    }
}

impl<T: Managed> Default for Weak<T> {
    fn default() -> Self {
        Weak::null()
    }
}

impl<T: Managed> PartialEq for Weak<T> {
    fn eq(&self, other: &Self) -> bool {
        let a = self.block.get().and_then(|b| unsafe { b.as_ref() }.target());
        let b = other
            .block
            .get()
            .and_then(|b| unsafe { b.as_ref() }.target());
        a == b
    }
}

impl<T: Managed> PartialEq<Own<T>> for Weak<T> {
    fn eq(&self, other: &Own<T>) -> bool {
        let a = self.block.get().and_then(|b| unsafe { b.as_ref() }.target());
        a == Some(other.target.cast::<()>())
    }
}

impl<T: Managed> PartialEq<Temp<T>> for Weak<T> {
    fn eq(&self, other: &Temp<T>) -> bool {
        let a = self.block.get().and_then(|b| unsafe { b.as_ref() }.target());
        a == Some(other.target.cast::<()>())
    }
}

impl<T: Managed + fmt::Debug> fmt::Debug for Weak<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pin() {
            Some(live) => f.debug_tuple("Weak::Live").field(&*live).finish(),
            None => f.debug_tuple("Weak::Dead").finish(),
        }
    }
}

/// Object-safe hook the copy transaction's commit phase uses to inspect and
/// possibly rewrite this slot, without knowing the concrete `T`.
impl<T: Managed> WeakSlot for Weak<T> {
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
