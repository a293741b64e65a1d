use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::managed::Managed;
use crate::own::Own;
use crate::weak::Weak;

/// A pinning (temporary) reference: keeps its target alive (adds a retain)
/// but asserts no ownership. Used for traversal, arguments, and the
/// right-hand side of assignments.
///
/// Copying a `Temp<T>` is a plain retain, never a deep copy — only
/// converting a `Temp<T>` *into* an `Own<T>` triggers the deep-copy rule
/// (see [`Own::deep_copy`] via [`Temp::to_owned_copy`]).
pub struct Temp<T: Managed> {
    pub(crate) target: NonNull<T>,
    pub(crate) _marker: PhantomData<T>,
}

impl<T: Managed> Temp<T> {
    pub(crate) fn from_target(target: NonNull<T>) -> Self {
        unsafe { target.as_ref() }.header().retain();
        Temp {
            target,
            _marker: PhantomData,
        }
    }

    /// Produces a non-owning reference to this object.
    pub fn weak(&self) -> Weak<T> {
        Weak::from_target(self.target)
    }

    /// Converts to an owning reference via deep copy, unless the target is
    /// SHARED (in which case this retains instead) — assigning a pinning
    /// reference into an owning slot always goes through a deep copy.
    pub fn to_owned_copy(&self) -> Result<Own<T>, crate::error::CloneError>
    where
        T: crate::managed::DeepClone,
    {
        // The deep-copy algorithm only inspects the target's SHARED flag and
        // its owning fields, never the reference kind doing the copying, so
        // a transient `Own` view over the same target drives it directly.
        let transient = Own {
            target: self.target,
            _marker: PhantomData,
        };
        let result = transient.deep_copy();
        std::mem::forget(transient); // we never owned this retain unit
        result
    }
}

impl<T: Managed> Clone for Temp<T> {
    fn clone(&self) -> Self {
        unsafe { self.target.as_ref() }.header().retain();
        Temp {
            target: self.target,
            _marker: PhantomData,
        }
    }
}

impl<T: Managed> Deref for Temp<T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { self.target.as_ref() }
    }
}

impl<T: Managed> Drop for Temp<T> {
    fn drop(&mut self) {
        unsafe { crate::managed::release_target(self.target) };
    }
}

impl<T: Managed + fmt::Debug> fmt::Debug for Temp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Temp").field(&**self).finish()
    }
}

impl<T: Managed> PartialEq for Temp<T> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

impl<T: Managed> PartialEq<Own<T>> for Temp<T> {
    fn eq(&self, other: &Own<T>) -> bool {
        self.target == other.target
    }
}

impl<T: Managed> PartialEq<Weak<T>> for Temp<T> {
    fn eq(&self, other: &Weak<T>) -> bool {
        other == self
    }
}

impl<T: Managed> From<&Own<T>> for Temp<T> {
    fn from(owner: &Own<T>) -> Self {
        owner.pin()
    }
}
