use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ltm::{impl_managed, Header, Managed, Own};
use std::rc::Rc;

struct Node {
    header: Header,
    value: i64,
    child: Option<Own<Node>>,
}

impl_managed!(Node {
    header: header,
    owned_opt: [child],
    value: [value],
});

fn chain(depth: usize) -> Own<Node> {
    let mut node = Own::new(Node {
        header: Header::new(),
        value: depth as i64,
        child: None,
    });
    if depth > 0 {
        node.get_mut().unwrap().child = Some(chain(depth - 1));
    }
    node
}

fn benchmark_own_new(c: &mut Criterion) {
    c.bench_function("own_new", |b| {
        b.iter_with_large_drop(|| {
            Own::new(Node {
                header: Header::new(),
                value: 42,
                child: None,
            })
        });
    });
}

fn benchmark_own_drop(c: &mut Criterion) {
    c.bench_function("own_drop", |b| {
        b.iter_batched(
            || {
                Own::new(Node {
                    header: Header::new(),
                    value: 42,
                    child: None,
                })
            },
            |node| drop(black_box(node)),
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_weak_pin_live(c: &mut Criterion) {
    c.bench_function("weak_pin_live", |b| {
        let owner = Own::new(Node {
            header: Header::new(),
            value: 1,
            child: None,
        });
        let handle = owner.weak();
        b.iter(|| black_box(handle.pin()));
    });
}

fn benchmark_weak_pin_dead(c: &mut Criterion) {
    c.bench_function("weak_pin_dead", |b| {
        let owner = Own::new(Node {
            header: Header::new(),
            value: 1,
            child: None,
        });
        let handle = owner.weak();
        drop(owner);
        b.iter(|| black_box(handle.pin()));
    });
}

fn benchmark_weak_clone(c: &mut Criterion) {
    c.bench_function("weak_clone", |b| {
        let owner = Own::new(Node {
            header: Header::new(),
            value: 1,
            child: None,
        });
        let handle = owner.weak();
        b.iter_with_large_drop(|| black_box(handle.clone()));
    });
}

fn benchmark_deep_copy_small_tree(c: &mut Criterion) {
    c.bench_function("deep_copy_chain_16", |b| {
        b.iter_batched(
            || chain(16),
            |root| black_box(root.deep_copy().unwrap()),
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_comparison_rc_new(c: &mut Criterion) {
    c.bench_function("rc_new", |b| {
        b.iter_with_large_drop(|| Rc::new(42));
    });
}

fn benchmark_comparison_rc_weak_clone(c: &mut Criterion) {
    c.bench_function("rc_weak_clone", |b| {
        let data = Rc::new(42);
        let weak = Rc::downgrade(&data);
        b.iter_with_large_drop(|| black_box(weak.clone()));
    });
}

criterion_group!(
    benches,
    benchmark_own_new,
    benchmark_own_drop,
    benchmark_weak_pin_live,
    benchmark_weak_pin_dead,
    benchmark_weak_clone,
    benchmark_deep_copy_small_tree,
    benchmark_comparison_rc_new,
    benchmark_comparison_rc_weak_clone,
);

criterion_main!(benches);
