use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::error::CloneError;
use crate::managed::{DeepClone, Managed};
use crate::temp::Temp;
use crate::transaction;
use crate::weak::Weak;

/// An owning reference: sole ownership of a sub-tree by default.
///
/// Assigning/copying an `Own<T>` never happens implicitly in Rust — instead,
/// [`Own::deep_copy`] makes "assignment deep-copies the sub-tree" an explicit,
/// fallible call (it is fallible because a user clone hook can fail; see
/// [`crate::error::CloneError`]).
///
/// Dropping the last `Own<T>` to an object tears down its owned sub-tree
/// recursively, because every owning field inside `T` is itself an `Own<_>`
/// that releases on `Drop`.
pub struct Own<T: Managed> {
    pub(crate) target: NonNull<T>,
    pub(crate) _marker: PhantomData<T>,
}

impl<T: Managed> Own<T> {
    /// Wraps a fresh value as the sole owner: the object starts at count 1,
    /// inline, then `OWNED` is set before the pointer is handed back.
    pub fn new(value: T) -> Self {
        let boxed = Box::new(value);
        let target = NonNull::from(Box::leak(boxed));
        unsafe { target.as_ref() }.header().set_owned();
        Own {
            target,
            _marker: PhantomData,
        }
    }

    /// Marks the object SHARED: from now on, copying an `Own<T>` pointing at
    /// it retains instead of deep-copying.
    pub fn make_shared(&self) {
        unsafe { self.target.as_ref() }.header().make_shared();
    }

    pub fn is_shared(&self) -> bool {
        unsafe { self.target.as_ref() }.header().is_shared()
    }

    /// Produces a non-owning reference to this object.
    pub fn weak(&self) -> Weak<T> {
        Weak::from_target(self.target)
    }

    /// Produces a pinning reference, retaining the object for as long as the
    /// `Temp` is alive.
    pub fn pin(&self) -> Temp<T> {
        Temp::from_target(self.target)
    }

    /// Unique (mutable) access, if this is the only owning/pinning reference
    /// and no weak-block has ever been materialized for it — mirrors
    /// `std::rc::Rc::get_mut`'s precondition, adapted to LTM's header.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let header = unsafe { self.target.as_ref() }.header();
        if header.weak_block_if_present().is_some() {
            return None;
        }
        if !header.is_uniquely_owned() {
            return None;
        }
        Some(unsafe { self.target.as_mut() })
    }

    /// Object-safe view of this node, for transaction-commit tree walks.
    pub(crate) fn as_managed(&self) -> &dyn Managed {
        unsafe { self.target.as_ref() }
    }

    fn deep_copy_body(&self) -> Result<Own<T>, CloneError>
    where
        T: DeepClone,
    {
        let target_ref = unsafe { self.target.as_ref() };
        if target_ref.header().is_shared() {
            target_ref.header().retain();
            return Ok(Own {
                target: self.target,
                _marker: PhantomData,
            });
        }

        let new_value = target_ref.clone_value()?;
        let boxed = Box::new(new_value);
        let new_target = NonNull::from(Box::leak(boxed));
        unsafe { new_target.as_ref() }.header().set_owned();

        let old_block = target_ref
            .header()
            .ensure_weak_block(self.target.cast::<()>());
        let new_block = unsafe { new_target.as_ref() }
            .header()
            .ensure_weak_block(new_target.cast::<()>());
        transaction::record_correspondence(old_block, new_block);

        Ok(Own {
            target: new_target,
            _marker: PhantomData,
        })
    }

    /// Deep-copies the owned sub-tree rooted at this reference. If the
    /// object is SHARED, this is a cheap retain instead. Joins the ambient
    /// copy transaction if one is already in progress (a nested call from an
    /// enclosing `deep_copy`), otherwise opens and commits/aborts a new one.
    pub fn deep_copy(&self) -> Result<Own<T>, CloneError>
    where
        T: DeepClone,
    {
        let outermost = transaction::enter();
        let result = self.deep_copy_body();
        if outermost {
            match &result {
                Ok(clone) => transaction::commit(&[clone.as_managed()]),
                Err(_) => transaction::abort(),
            }
        }
        result
    }
}

impl<T: Managed> Deref for Own<T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { self.target.as_ref() }
    }
}

impl<T: Managed> Drop for Own<T> {
    fn drop(&mut self) {
        unsafe { crate::managed::release_target(self.target) };
    }
}

impl<T: Managed + fmt::Debug> fmt::Debug for Own<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Own").field(&**self).finish()
    }
}

impl<T: Managed> PartialEq for Own<T> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

/// Clones a slice of sibling owning references as a single copy
/// transaction, so cross-links between them (a weak reference from one
/// sibling's sub-tree to another's) still redirect correctly.
pub fn copy_siblings<T: DeepClone>(items: &[Own<T>]) -> Result<Vec<Own<T>>, CloneError> {
    let outermost = transaction::enter();
    let mut cloned = Vec::with_capacity(items.len());
    let mut failure = None;
    for item in items {
        match item.deep_copy_body() {
            Ok(clone) => cloned.push(clone),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    if outermost {
        match &failure {
            None => {
                let roots: Vec<&dyn Managed> = cloned.iter().map(Own::as_managed).collect();
                transaction::commit(&roots);
            }
            Some(_) => transaction::abort(),
        }
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(cloned),
    }
}
