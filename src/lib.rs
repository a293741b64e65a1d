//! Ownership, sharing and association for in-memory object graphs.
//!
//! Every managed type embeds a [`Header`] and implements [`Managed`] (by
//! hand, or via [`impl_managed`]). Three reference kinds then govern how a
//! graph of such types grows, traverses, and tears down:
//!
//! - [`Own<T>`] — owning. Holds a sub-tree; dropping the last one recursively
//!   tears the sub-tree down. "Assigning" one (producing a second owner of
//!   the same logical content) is [`Own::deep_copy`], an explicit, fallible
//!   call rather than an implicit `Clone`.
//! - [`Temp<T>`] — pinning. A temporary retain, for traversal and arguments;
//!   never deep-copies, only [`Temp::to_owned_copy`] does.
//! - [`Weak<T>`] — non-owning. Records an association without keeping the
//!   target alive; resolves to `None` once the target is gone.
//!
//! The hard part is [`Own::deep_copy`]: when a sub-tree is duplicated, any
//! `Weak<T>` *inside* that sub-tree that pointed at another node *inside*
//! it must end up pointing at that node's clone, while a `Weak<T>` pointing
//! *outside* the copied region is left untouched. This is handled by a
//! thread-local copy transaction (see the `transaction` module) that a
//! nested call to `deep_copy` joins rather than re-opens, so a whole tree
//! copies as one atomic unit regardless of recursion depth.
//!
//! An object marked [`Own::make_shared`] opts out of this: copying an
//! owning reference to it is a cheap retain, and the commit walk treats it
//! as a boundary it never steps into.

mod error;
mod header;
mod interface;
mod macros;
mod managed;
mod own;
mod temp;
mod transaction;
mod weak;
mod weak_block;

pub use error::CloneError;
pub use header::Header;
pub use interface::{InterfacePin, InterfaceWeak};
pub use managed::{DeepClone, Managed, WeakSlot};
pub use own::{copy_siblings, Own};
pub use temp::Temp;
pub use weak::Weak;
pub use weak_block::WeakBlock;

#[cfg(test)]
mod graph_tests;
#[cfg(test)]
mod shared_tests;
