use crate::{Header, InterfaceWeak, Managed, Own, Weak};

struct Counter {
    header: Header,
    count: i32,
}

impl Managed for Counter {
    fn header(&self) -> &Header {
        &self.header
    }
}

fn counter(count: i32) -> Own<Counter> {
    Own::new(Counter {
        header: Header::new(),
        count,
    })
}

#[test]
fn get_mut_is_refused_while_a_pinning_reference_is_alive() {
    let mut owner = counter(1);
    let guard = owner.pin();
    assert!(owner.get_mut().is_none());

    drop(guard);
    assert!(owner.get_mut().is_some());
}

#[test]
fn get_mut_is_refused_once_a_weak_block_exists() {
    let mut owner = counter(1);
    let handle = owner.weak();
    // the weak-block now holds the authoritative counter; get_mut refuses
    // even though `handle` itself never retained the object.
    assert!(owner.get_mut().is_none());
    drop(handle);
}

#[test]
fn shared_identity_survives_several_rounds_of_deep_copy() {
    let shared = counter(42);
    shared.make_shared();

    let first_copy = shared.deep_copy().unwrap();
    let second_copy = first_copy.deep_copy().unwrap();

    assert_eq!(shared.target, first_copy.target);
    assert_eq!(first_copy.target, second_copy.target);
}

#[test]
fn weak_handle_shares_liveness_with_every_clone() {
    let owner = counter(1);
    let handle = owner.weak();
    let handle_clone = handle.clone();

    drop(owner);

    assert!(!handle.is_alive());
    assert!(!handle_clone.is_alive());
}

trait Drawable {
    fn area(&self) -> i32;
}

struct Square {
    header: Header,
    side: i32,
}

impl Managed for Square {
    fn header(&self) -> &Header {
        &self.header
    }
}

impl Drawable for Square {
    fn area(&self) -> i32 {
        self.side * self.side
    }
}

#[test]
fn interface_weak_resolves_through_a_downcasting_closure() {
    let square = Own::new(Square {
        header: Header::new(),
        side: 4,
    });
    let concrete: Weak<Square> = square.weak();
    let capability = InterfaceWeak::<dyn Drawable>::new(&concrete, |ptr| {
        ptr.cast::<Square>().as_ptr() as *const Square as *const dyn Drawable
    });

    let pinned = capability.pin().unwrap();
    assert_eq!(pinned.area(), 16);

    // the pin holds a real retain on the square, not just on the weak-block,
    // so dropping the last owning reference while it's alive must not free
    // the square out from under it.
    drop(square);
    assert_eq!(pinned.area(), 16);
    drop(pinned);

    assert!(!capability.is_alive());
    assert!(capability.pin().is_none());
}
