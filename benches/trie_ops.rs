//! Benchmarks for trie operations against `BTreeMap`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use patricia_map::PatriciaTrie;
use std::collections::BTreeMap;

fn generate_sequential_keys(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("key:{:08}", i).into_bytes()).collect()
}

fn generate_url_like_keys(n: usize) -> Vec<Vec<u8>> {
    let domains = ["example.com", "test.org", "demo.net", "sample.io"];
    let paths = ["users", "posts", "comments", "api/v1", "api/v2"];

    (0..n)
        .map(|i| {
            let domain = domains[i % domains.len()];
            let path = paths[(i / domains.len()) % paths.len()];
            let id = i / (domains.len() * paths.len());
            format!("{}/{}/{}", domain, path, id).into_bytes()
        })
        .collect()
}

fn build_trie(keys: &[Vec<u8>]) -> PatriciaTrie<Vec<u8>, u64> {
    keys.iter()
        .enumerate()
        .map(|(i, k)| (k.clone(), i as u64))
        .collect()
}

fn build_btree(keys: &[Vec<u8>]) -> BTreeMap<Vec<u8>, u64> {
    keys.iter()
        .enumerate()
        .map(|(i, k)| (k.clone(), i as u64))
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_url_like_keys(size);

        group.bench_with_input(BenchmarkId::new("PatriciaTrie", size), &keys, |b, keys| {
            b.iter(|| {
                let mut trie = PatriciaTrie::new();
                for (i, key) in keys.iter().enumerate() {
                    trie.insert(key.clone(), i as u64);
                }
                black_box(trie)
            });
        });

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut map: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
                for (i, key) in keys.iter().enumerate() {
                    map.insert(key.clone(), i as u64);
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_sequential_keys(size);
        let trie = build_trie(&keys);
        let btree = build_btree(&keys);

        group.bench_with_input(BenchmarkId::new("PatriciaTrie", size), &keys, |b, keys| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in keys.iter() {
                    if let Some(v) = trie.get(key.as_slice()) {
                        sum += *v;
                    }
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in keys.iter() {
                    if let Some(v) = btree.get(key) {
                        sum += *v;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_longest_prefix(c: &mut Criterion) {
    let mut group = c.benchmark_group("longest_prefix");

    for size in [1_000, 10_000] {
        let keys = generate_url_like_keys(size);
        let trie = build_trie(&keys);
        let btree = build_btree(&keys);
        let queries: Vec<Vec<u8>> = keys
            .iter()
            .map(|k| {
                let mut q = k.clone();
                q.extend_from_slice(b"/edit");
                q
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("PatriciaTrie", size), &queries, |b, queries| {
            b.iter(|| {
                let mut hits = 0usize;
                for q in queries.iter() {
                    if trie.prefix_entry(q.as_slice()).is_some() {
                        hits += 1;
                    }
                }
                black_box(hits)
            });
        });

        // Scan every shorter length, longest first.
        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &queries, |b, queries| {
            b.iter(|| {
                let mut hits = 0usize;
                for q in queries.iter() {
                    if (0..=q.len()).rev().any(|n| btree.contains_key(&q[..n])) {
                        hits += 1;
                    }
                }
                black_box(hits)
            });
        });
    }

    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for size in [10_000, 100_000] {
        let keys = generate_sequential_keys(size);
        let trie = build_trie(&keys);
        let btree = build_btree(&keys);

        group.bench_function(BenchmarkId::new("PatriciaTrie", size), |b| {
            b.iter(|| black_box(trie.values().sum::<u64>()));
        });

        group.bench_function(BenchmarkId::new("BTreeMap", size), |b| {
            b.iter(|| black_box(btree.values().sum::<u64>()));
        });

        let p = b"key:0000".to_vec();
        group.bench_function(BenchmarkId::new("PatriciaTrie/prefixed", size), |b| {
            b.iter(|| black_box(trie.prefixed(p.clone(), true).iter().count()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_lookup,
    bench_longest_prefix,
    bench_iterate
);
criterion_main!(benches);
