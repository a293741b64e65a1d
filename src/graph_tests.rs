use crate::{copy_siblings, impl_managed, Header, Own, Weak};

struct Node {
    header: Header,
    value: i32,
    child: Option<Own<Node>>,
    back: Weak<Node>,
}

impl_managed!(Node {
    header: header,
    owned_opt: [child],
    weak: [back],
    value: [value],
});

fn leaf(value: i32) -> Own<Node> {
    Own::new(Node {
        header: Header::new(),
        value,
        child: None,
        back: Weak::null(),
    })
}

#[test]
fn linear_chain_deep_copy_produces_distinct_identities() {
    let mut root = leaf(1);
    root.get_mut().unwrap().child = Some(leaf(2));

    let clone = root.deep_copy().unwrap();

    assert_eq!(clone.value, 1);
    assert_eq!(clone.child.as_ref().unwrap().value, 2);
    assert_ne!(root.target, clone.target);
    assert_ne!(
        root.child.as_ref().unwrap().target,
        clone.child.as_ref().unwrap().target
    );
}

#[test]
fn internal_back_reference_redirects_to_the_clone() {
    let mut root = leaf(10);
    root.get_mut().unwrap().child = Some(leaf(20));
    root.child.as_ref().unwrap().back.bind(&root);

    let clone = root.deep_copy().unwrap();

    let resolved = clone.child.as_ref().unwrap().back.pin().unwrap();
    assert_eq!(resolved.target, clone.target);
    assert_ne!(resolved.target, root.target);
}

#[test]
fn back_reference_escaping_the_copied_region_is_left_untouched() {
    let outside = leaf(99);
    let root = leaf(1);
    root.back.bind(&outside);

    let clone = root.deep_copy().unwrap();

    let resolved = clone.back.pin().unwrap();
    assert_eq!(resolved.target, outside.target);
}

#[test]
fn self_back_reference_to_root_redirects_to_the_new_root() {
    let root = leaf(1);
    root.back.bind(&root);

    let clone = root.deep_copy().unwrap();

    let resolved = clone.back.pin().unwrap();
    assert_eq!(resolved.target, clone.target);
    assert_ne!(resolved.target, root.target);
}

#[test]
fn shared_leaf_is_retained_not_duplicated() {
    let shared_leaf = leaf(7);
    shared_leaf.make_shared();
    let mut root = leaf(1);
    // Deep-copying a SHARED node is itself just a retain, so `root.child`
    // and `shared_leaf` end up aliasing the same object.
    root.get_mut().unwrap().child = Some(shared_leaf.deep_copy().unwrap());

    let clone = root.deep_copy().unwrap();

    assert_eq!(clone.child.as_ref().unwrap().target, shared_leaf.target);
}

#[test]
fn weak_reference_dies_once_its_target_is_orphaned() {
    let root = leaf(1);
    let handle = root.weak();
    assert!(handle.is_alive());

    drop(root);

    assert!(!handle.is_alive());
    assert!(handle.pin().is_none());
}

#[test]
fn copy_siblings_redirects_cross_links_between_siblings() {
    let first = leaf(1);
    let second = leaf(2);
    first.back.bind(&second);
    let siblings = vec![first, second];

    let cloned = copy_siblings(&siblings).unwrap();

    let resolved = cloned[0].back.pin().unwrap();
    assert_eq!(resolved.target, cloned[1].target);
    assert_ne!(resolved.target, siblings[1].target);
}

#[test]
fn deep_copy_round_trip_preserves_topology_but_not_identity() {
    let mut root = leaf(1);
    root.get_mut().unwrap().child = Some(leaf(2));
    root.get_mut()
        .unwrap()
        .child
        .as_mut()
        .unwrap()
        .get_mut()
        .unwrap()
        .child = Some(leaf(3));

    let clone = root.deep_copy().unwrap();

    assert_eq!(clone.value, root.value);
    let root_child = root.child.as_ref().unwrap();
    let clone_child = clone.child.as_ref().unwrap();
    assert_eq!(clone_child.value, root_child.value);
    assert_eq!(
        clone_child.child.as_ref().unwrap().value,
        root_child.child.as_ref().unwrap().value
    );
    assert_ne!(clone.target, root.target);
}

#[test]
fn closure_capturing_weak_reference_is_not_redirected_by_deep_copy() {
    let mut root = leaf(1);
    root.get_mut().unwrap().child = Some(leaf(2));

    let captured = root.child.as_ref().unwrap().weak();
    let resolve = move || captured.pin();

    assert!(resolve().unwrap() == *root.child.as_ref().unwrap());

    let clone = root.deep_copy().unwrap();

    // `captured` is a plain local value inside the closure, invisible to
    // `visit_weak`, so deep-copying `root` never touches it: it still
    // resolves to the original child, not the clone's.
    let still_original = resolve().unwrap();
    assert!(still_original == *root.child.as_ref().unwrap());
    assert!(still_original != *clone.child.as_ref().unwrap());
}
