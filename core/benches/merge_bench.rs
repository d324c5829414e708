use criterion::{black_box, criterion_group, criterion_main, Criterion};
use boolsearch_core::{DocId, PostingList, SkipDistance};

fn list(ids: Vec<DocId>, skip: SkipDistance) -> PostingList {
    PostingList::new(ids).expect("sorted ids").with_skips(skip)
}

fn bench_merges(c: &mut Criterion) {
    let dense: Vec<DocId> = (0..100_000).collect();
    let sparse: Vec<DocId> = (0..100_000).step_by(997).collect();

    for (name, skip) in [("plain", SkipDistance::None), ("sqrt", SkipDistance::Sqrt)] {
        let a = list(dense.clone(), skip);
        let b = list(sparse.clone(), skip);
        c.bench_function(&format!("intersect_{name}"), |bench| bench.iter(|| black_box(a.intersect(&b))));
        c.bench_function(&format!("difference_{name}"), |bench| bench.iter(|| black_box(b.difference(&a))));
    }

    let a = list(dense, SkipDistance::None);
    let b = list(sparse, SkipDistance::None);
    c.bench_function("union", |bench| bench.iter(|| black_box(a.union(&b))));
}

criterion_group!(benches, bench_merges);
criterion_main!(benches);
