//! The copy transaction: thread-local bookkeeping that lets an arbitrary
//! nesting of deep copies (one per owning edge recursed into) behave as a
//! single atomic operation.
//!
//! `enter` is called at the start of every [`crate::Own::deep_copy`],
//! whether it is the user-visible top-level call or a nested recursion
//! through an owning field. Only the call that finds `transaction_depth == 0`
//! (the outermost one) is responsible for finalizing the transaction, by
//! calling [`commit`] on success or [`abort`] on failure; every nested call
//! just lets its `Result` propagate and leaves the transaction state alone.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr::NonNull;

use crate::managed::{Managed, WeakSlot};
use crate::weak_block::WeakBlock;

struct State {
    depth: usize,
    // Keyed by the *address* of the original weak-block rather than the
    // `NonNull` itself, purely so the map doesn't need `NonNull: Hash`.
    correspondence: HashMap<usize, NonNull<WeakBlock>>,
}

impl State {
    fn new() -> Self {
        State {
            depth: 0,
            correspondence: HashMap::new(),
        }
    }
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::new());
}

/// Enters one level of the copy transaction. Returns `true` if this call is
/// the outermost one (the caller is responsible for calling [`commit`] or
/// [`abort`]); `false` if it is nested inside an already-running transaction
/// (the caller must do nothing further — the outermost call will finalize).
pub(crate) fn enter() -> bool {
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        s.depth += 1;
        s.depth == 1
    })
}

/// Records that `old` (a weak-block in the source region) corresponds to
/// `new` (the weak-block of its freshly produced clone). Populated bottom-up
/// as each node finishes cloning, so that by the time the commit walk runs
/// the map is complete for the entire copied region regardless of traversal
/// order — including a clone's own entry, which covers the "non-owning
/// reference to the root of the copy" edge case.
pub(crate) fn record_correspondence(old: NonNull<WeakBlock>, new: NonNull<WeakBlock>) {
    STATE.with(|s| {
        s.borrow_mut()
            .correspondence
            .insert(old.as_ptr() as usize, new);
    });
}

/// Finalizes a successful outermost transaction: walks every `roots` tree
/// (skipping any SHARED boundary) and redirects non-owning slots whose
/// current block was cloned during this transaction, then clears all
/// transaction state.
pub(crate) fn commit(roots: &[&dyn Managed]) {
    let correspondence = STATE.with(|s| {
        let mut s = s.borrow_mut();
        s.depth = 0;
        std::mem::take(&mut s.correspondence)
    });
    for root in roots {
        walk(*root, &correspondence);
    }
}

/// Aborts a failed outermost transaction: drops all transaction state
/// without applying any redirection. Partially-built clones have already
/// been released through ordinary `Drop` as the `Result` chain unwound.
pub(crate) fn abort() {
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        s.depth = 0;
        s.correspondence.clear();
    });
}

fn walk(node: &dyn Managed, correspondence: &HashMap<usize, NonNull<WeakBlock>>) {
    // A SHARED node was retained, never cloned: it is the exact same
    // identity as before the copy, so neither it nor anything it owns is
    // part of the new region. Stepping into it would rewrite the original.
    if node.header().is_shared() {
        return;
    }
    node.visit_weak(&mut |slot: &dyn WeakSlot| {
        if let Some(old_block) = slot.block() {
            if let Some(&new_block) = correspondence.get(&(old_block.as_ptr() as usize)) {
                slot.redirect(new_block);
            }
        }
    });
    node.visit_owned(&mut |child| walk(child, correspondence));
}
