//! Benchmarks for version parsing and comparison.
//!
//! Range endpoints parse every version string an index lists for a package,
//! which can be several hundred entries, so the parse path should stay well
//! under a microsecond per string.

use criterion::{Criterion, criterion_group, criterion_main};
use depot_core::Version;
use std::hint::black_box;

const LISTED: &[&str] = &[
    "0.1", "0.2", "0.9.1", "1.0.0", "1.0.1", "1.2.3a1", "1.2.3b2", "1.2.3rc1", "1.2.3",
    "1.5.0", "2.0.0.post1", "2020.12.5", "not-a-version", "3.0.0dev0",
];

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_listing", |b| {
        b.iter(|| {
            for s in LISTED {
                black_box(Version::parse(black_box(s)));
            }
        });
    });
}

fn bench_compare(c: &mut Criterion) {
    let a = Version::parse("1.2.3").unwrap();
    let b_version = Version::parse("1.2.3a1").unwrap();

    c.bench_function("compare_equal_triple", |b| {
        b.iter(|| black_box(black_box(&a).cmp(black_box(&b_version))));
    });
}

criterion_group!(benches, bench_parse, bench_compare);
criterion_main!(benches);
