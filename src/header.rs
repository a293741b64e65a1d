use std::cell::Cell;
use std::ptr::NonNull;

use crate::weak_block::WeakBlock;

/// The object is currently in inline mode: `state` holds flags + counter
/// directly. When clear, `state` is a tagged pointer to a [`WeakBlock`].
pub(crate) const WEAKLESS: usize = 1;

/// The object is reachable through at least one owning pointer.
pub(crate) const OWNED: usize = 2;

/// Copies act as retains rather than deep copies (see [`Header::make_shared`]).
pub(crate) const SHARED: usize = 4;

/// Reserved for an optional atomic-counter mode. Inert in this crate: the
/// core contract is single-threaded, so no operation ever inspects this bit.
pub(crate) const ATOMIC: usize = 8;

/// One retain/release unit. Flags occupy bits 0..=3, the counter lives above.
pub(crate) const COUNTER_STEP: usize = 16;

const FLAGS_MASK: usize = COUNTER_STEP - 1;

/// The one-machine-word lifetime state every managed object carries.
///
/// Interpreted in one of two modes, distinguished by the `WEAKLESS` bit:
///
/// - inline (`WEAKLESS` set): the word is flags + counter.
/// - indirect (`WEAKLESS` clear): the word is a pointer to a [`WeakBlock`],
///   whose `org_counter` field is authoritative for flags + counter.
///
/// A type embeds one `Header` field and implements [`crate::Managed::header`]
/// to expose it; `Header` itself provides no public constructor access to its
/// raw bits so that `retain`/`release` stay the only way to move the count.
pub struct Header {
    state: Cell<usize>,
}

impl Header {
    /// A freshly created object: one retain, inline, not owned, not shared.
    pub fn new() -> Self {
        Header {
            state: Cell::new(COUNTER_STEP | WEAKLESS),
        }
    }

    fn is_weakless(&self) -> bool {
        self.state.get() & WEAKLESS != 0
    }

    fn weak_block(&self) -> Option<NonNull<WeakBlock>> {
        if self.is_weakless() {
            None
        } else {
            NonNull::new(self.state.get() as *mut WeakBlock)
        }
    }

    /// Returns the current flags+counter word, reading through the weak
    /// block when indirect.
    fn bits(&self) -> usize {
        match self.weak_block() {
            Some(block) => unsafe { block.as_ref() }.org_counter(),
            None => self.state.get(),
        }
    }

    fn set_bits(&self, bits: usize) {
        match self.weak_block() {
            Some(block) => unsafe { block.as_ref() }.set_org_counter(bits),
            None => self.state.set(bits),
        }
    }

    pub fn is_owned(&self) -> bool {
        self.bits() & OWNED != 0
    }

    pub fn set_owned(&self) {
        self.set_bits(self.bits() | OWNED);
    }

    pub fn is_shared(&self) -> bool {
        self.bits() & SHARED != 0
    }

    /// Marks the object SHARED: owning references to it retain rather than
    /// deep-copy. Called by application code, typically from a constructor.
    pub fn make_shared(&self) {
        self.set_bits(self.bits() | SHARED);
    }

    fn count(&self) -> usize {
        self.bits() >> 4
    }

    /// True if exactly one retain unit is outstanding (no other owning,
    /// pinning, or weak-upgrade reference is alive right now).
    pub fn is_uniquely_owned(&self) -> bool {
        self.count() == 1
    }

    /// Adds one retain unit. No-op equivalent for null handled by callers
    /// (`Header` itself always describes a live, allocated object).
    pub fn retain(&self) {
        let bits = self.bits();
        let (count, flags) = (bits >> 4, bits & FLAGS_MASK);
        let new_count = count
            .checked_add(1)
            .unwrap_or_else(|| panic!("ltm: reference counter overflowed"));
        self.set_bits((new_count << 4) | flags);
    }

    /// Removes one retain unit. Returns `true` if the count reached zero and
    /// the object must now be finalized by the caller.
    pub fn release(&self) -> bool {
        let bits = self.bits();
        let (count, flags) = (bits >> 4, bits & FLAGS_MASK);
        debug_assert!(count > 0, "ltm: released an object with zero count");
        let new_count = count - 1;
        self.set_bits((new_count << 4) | flags);
        new_count == 0
    }

    /// Ensures a weak-block exists for this object and returns it, migrating
    /// the inline counter/flags into the block the first time this is
    /// called. `self_ptr` is the (type-erased) address of the managed object
    /// this header belongs to, recorded as the block's initial live target.
    pub fn ensure_weak_block(&self, self_ptr: NonNull<()>) -> NonNull<WeakBlock> {
        if let Some(block) = self.weak_block() {
            return block;
        }
        let bits = self.state.get();
        let block = WeakBlock::allocate(self_ptr, bits);
        let addr = block.as_ptr() as usize;
        debug_assert_eq!(addr & WEAKLESS, 0, "WeakBlock must be pointer-aligned");
        self.state.set(addr);
        block
    }

    /// The existing weak-block, if any, without creating one.
    pub fn weak_block_if_present(&self) -> Option<NonNull<WeakBlock>> {
        self.weak_block()
    }
}

impl Default for Header {
    fn default() -> Self {
        Header::new()
    }
}

/// Cloning a `Header` never copies its bits: a clone is a *new* object
/// identity with its own fresh lifetime, starting back at count 1 and with no
/// flags set. This is what lets a `DeepClone::clone_value` implementation
/// just clone the header field like any other, whether written by hand or
/// generated by [`crate::impl_managed`].
impl Clone for Header {
    fn clone(&self) -> Self {
        Header::new()
    }
}
