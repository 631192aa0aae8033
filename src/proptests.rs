use super::*;

use crate::node::{Back, NodeId, Role};

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::ops::Bound;

fn validate_trie<K: BitKey + Debug, V>(t: &PatriciaTrie<K, V>) {
    let store = &t.nodes;
    let root = &store[NodeId::ROOT];
    match (&root.entry, root.role) {
        (None, Role::RootUnset) => {}
        (Some((k, _)), Role::RootEmpty) => assert_eq!(k.bit_len(), 0, "root key must be empty"),
        (entry, role) => panic!("root role {role:?} with entry present: {}", entry.is_some()),
    }
    assert_eq!(root.back, Back::Detached, "root has no back link");
    assert!(root.sibling.is_none(), "root has no siblings");

    let mut count = usize::from(root.entry.is_some());
    let mut stack = vec![NodeId::ROOT];
    while let Some(owner) = stack.pop() {
        let owner_key = store.key(owner);
        let owner_len = owner_key.map_or(0, |k| k.bit_len());
        let mut prev: Option<NodeId> = None;
        let mut last_role: Option<Role> = None;
        let mut cur = store[owner].children;

        while let Some(id) = cur {
            let node = &store[id];
            let (key, _) = node.entry.as_ref().expect("linked node must hold an entry");
            count += 1;

            let expected_back = match prev {
                None => Back::Parent(owner),
                Some(p) => Back::Prev(p),
            };
            assert_eq!(
                node.back, expected_back,
                "back link must mirror forward link"
            );

            match node.role {
                Role::Branch(i) => {
                    let i = i as usize;
                    let okey = owner_key.expect("branch owner must hold an entry");
                    assert_eq!(okey.contrast(key), Some(i), "branch {key:?} under {okey:?}");
                    assert!(key.bit(i) && !okey.bit(i), "branch bit at {i}");
                }
                Role::EdgeOne(i) | Role::EdgeZero(i) => {
                    assert_eq!(i as usize, owner_len, "edge must sit at owner length");
                    if let Some(okey) = owner_key {
                        assert!(
                            key.is_prefixed_by(okey, false),
                            "edge {key:?} under {okey:?}"
                        );
                    }
                    assert_eq!(key.bit(owner_len), matches!(node.role, Role::EdgeOne(_)));
                }
                Role::RootUnset | Role::RootEmpty => panic!("root role below the root"),
            }

            if let Some(last) = last_role {
                match (last, node.role) {
                    (Role::Branch(a), Role::Branch(b)) => {
                        assert!(a < b, "branch indices must ascend along a chain")
                    }
                    (Role::Branch(_), _) | (Role::EdgeOne(_), Role::EdgeZero(_)) => {}
                    (a, b) => panic!("{a:?} may not precede {b:?}"),
                }
            }

            if node.children.is_some() {
                stack.push(id);
            }
            last_role = Some(node.role);
            prev = Some(id);
            cur = node.sibling;
        }
    }

    assert_eq!(count, t.len(), "reachable entry count must match len");
    assert_eq!(
        store.entries().count(),
        t.len(),
        "freed slots must not hold entries"
    );

    let keys: Vec<&K> = t.keys().collect();
    for w in keys.windows(2) {
        assert_eq!(w[0].compare(w[1]), Ordering::Less, "iteration must ascend");
    }
}

#[derive(Clone, Copy, Debug, Arbitrary)]
enum Query {
    Floor,
    Lower,
    Ceiling,
    Higher,
    Prefix,
    NextPrefix,
    LeastPrefixed(bool),
    LastPrefixed(bool),
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>, u64),
    Remove(Vec<u8>),
    Get(Vec<u8>),
    PopFirst,
    PopLast,
    Query(Query, Vec<u8>),
    Clear,
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A tiny alphabet so that shared prefixes and prefix-of relations are common.
    let alphabet = prop::sample::select(vec![0x00u8, 0x01, 0x80, 0xC0, 0xFF]);
    prop::collection::vec(alphabet, 0..=4)
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        40 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        20 => key.clone().prop_map(Op::Remove),
        10 => key.clone().prop_map(Op::Get),
        3 => Just(Op::PopFirst),
        3 => Just(Op::PopLast),
        23 => (any::<Query>(), key.clone()).prop_map(|(q, k)| Op::Query(q, k)),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=400)
}

fn model_query(m: &BTreeMap<Vec<u8>, u64>, query: Query, key: &[u8]) -> Option<(Vec<u8>, u64)> {
    let prefixed = |k: &[u8], inclusive: bool| k.starts_with(key) && (inclusive || k != key);
    let found = match query {
        Query::Floor => m
            .range::<[u8], _>((Bound::Unbounded, Bound::Included(key)))
            .next_back(),
        Query::Lower => m
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key)))
            .next_back(),
        Query::Ceiling => m
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
            .next(),
        Query::Higher => m
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next(),
        Query::Prefix => m
            .iter()
            .filter(|(k, _)| key.starts_with(k))
            .max_by_key(|(k, _)| k.len()),
        Query::NextPrefix => m
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .find(|(k, _)| !k.starts_with(key)),
        Query::LeastPrefixed(inclusive) => m.iter().find(|(k, _)| prefixed(k, inclusive)),
        Query::LastPrefixed(inclusive) => m.iter().rev().find(|(k, _)| prefixed(k, inclusive)),
    };
    found.map(|(k, v)| (k.clone(), *v))
}

fn trie_query(t: &PatriciaTrie<Vec<u8>, u64>, query: Query, key: &[u8]) -> Option<(Vec<u8>, u64)> {
    let found = match query {
        Query::Floor => t.floor_entry(key),
        Query::Lower => t.lower_entry(key),
        Query::Ceiling => t.ceiling_entry(key),
        Query::Higher => t.higher_entry(key),
        Query::Prefix => t.prefix_entry(key),
        Query::NextPrefix => t.next_prefix_entry(key),
        Query::LeastPrefixed(inclusive) => t.least_prefixed(key, inclusive),
        Query::LastPrefixed(inclusive) => t.last_prefixed(key, inclusive),
    };
    found.map(|(k, v)| (k.clone(), *v))
}

fn build(entries: &[(Vec<u8>, u64)]) -> (PatriciaTrie<Vec<u8>, u64>, BTreeMap<Vec<u8>, u64>) {
    let mut t = PatriciaTrie::new();
    let mut m = BTreeMap::new();
    for (k, v) in entries {
        assert_eq!(t.insert(k.clone(), *v), m.insert(k.clone(), *v));
    }
    (t, m)
}

fn entries_strategy() -> impl Strategy<Value = Vec<(Vec<u8>, u64)>> {
    prop::collection::vec((key_strategy(), any::<u64>()), 0..=120)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: PatriciaTrie<Vec<u8>, u64> = PatriciaTrie::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let old_t = t.insert(key.clone(), value);
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Remove(key) => {
                    let old_t = t.remove(key.as_slice());
                    let old_m = m.remove(key.as_slice());
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Get(key) => {
                    let got_t = t.get(key.as_slice()).copied();
                    let got_m = m.get(key.as_slice()).copied();
                    prop_assert_eq!(got_t, got_m);
                }
                Op::PopFirst => {
                    prop_assert_eq!(t.pop_first(), m.pop_first());
                }
                Op::PopLast => {
                    prop_assert_eq!(t.pop_last(), m.pop_last());
                }
                Op::Query(query, key) => {
                    prop_assert_eq!(
                        trie_query(&t, query, &key),
                        model_query(&m, query, &key),
                        "{:?} {:?}", query, key
                    );
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_trie(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);
        let rev: Vec<&Vec<u8>> = t.keys().rev().collect();
        let expected_rev: Vec<&Vec<u8>> = m.keys().rev().collect();
        prop_assert_eq!(rev, expected_rev);
    }

    #[test]
    fn prop_range_views(entries in entries_strategy(), lo in key_strategy(), hi in key_strategy()) {
        let (t, m) = build(&entries);

        if lo > hi {
            prop_assert!(matches!(t.range(lo.clone()..hi.clone()), Err(Error::InvalidRange)));
            return Ok(());
        }

        let view = t.range(lo.clone()..hi.clone()).unwrap();
        let got: Vec<&Vec<u8>> = view.keys().collect();
        let expected: Vec<&Vec<u8>> = m.range(lo.clone()..hi.clone()).map(|(k, _)| k).collect();
        prop_assert_eq!(&got, &expected);
        prop_assert_eq!(view.len(), expected.len());
        prop_assert_eq!(view.first_key(), expected.first().copied());
        prop_assert_eq!(view.last_key(), expected.last().copied());

        let closed = t.range(lo.clone()..=hi.clone()).unwrap();
        let got: Vec<&Vec<u8>> = closed.keys().rev().collect();
        let expected: Vec<&Vec<u8>> = m.range(lo..=hi).rev().map(|(k, _)| k).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_prefix_views(
        entries in entries_strategy(),
        prefix in key_strategy(),
        inclusive in any::<bool>(),
    ) {
        let (t, m) = build(&entries);
        let view = t.prefixed(prefix.clone(), inclusive);
        let got: Vec<&Vec<u8>> = view.keys().collect();
        let expected: Vec<&Vec<u8>> = m
            .keys()
            .filter(|k| k.starts_with(&prefix) && (inclusive || **k != prefix))
            .collect();
        prop_assert_eq!(&got, &expected);
        prop_assert_eq!(view.first_key(), expected.first().copied());
        prop_assert_eq!(view.last_key(), expected.last().copied());
    }

    #[test]
    fn prop_cursor_remove(entries in entries_strategy(), pick in any::<u64>()) {
        let (mut t, mut m) = build(&entries);
        let mut cursor = t.cursor();
        while let Some((_, v)) = cursor.next(&t).unwrap() {
            if (*v ^ pick) & 1 == 1 {
                cursor.remove(&mut t).unwrap();
            }
        }
        m.retain(|_, v| (*v ^ pick) & 1 == 0);

        validate_trie(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_nearest_fixed_width(
        keys in prop::collection::vec(any::<u32>(), 1..=200),
        query in any::<u32>(),
    ) {
        let t: PatriciaTrie<u32, ()> = keys.iter().map(|k| (*k, ())).collect();
        let best = keys.iter().copied().min_by_key(|k| k ^ query);
        prop_assert_eq!(t.nearest_key(&query).copied(), best);
    }

    #[test]
    fn prop_codec_roundtrip(entries in entries_strategy()) {
        let (t, _) = build(&entries);
        let back: PatriciaTrie<Vec<u8>, u64> = PatriciaTrie::decode(&t.encode().unwrap()).unwrap();
        validate_trie(&back);
        prop_assert_eq!(back.tree_string(), t.tree_string());
        prop_assert_eq!(back, t);
    }
}

/// Calls `f` with every ordering of `items`, one swap apart (Heap's algorithm).
fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    let mut perm = items.to_vec();
    let mut counters = vec![0usize; perm.len()];
    f(perm.clone());
    let mut i = 1;
    while i < perm.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            perm.swap(j, i);
            f(perm.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
}

#[test]
fn permutations_cover_every_ordering_once() {
    let mut seen = BTreeSet::new();
    for_each_permutation(&[1, 2, 3, 4], |perm| assert!(seen.insert(perm)));
    assert_eq!(seen.len(), 24);

    let mut calls = 0;
    for_each_permutation(&[] as &[u8], |perm| {
        assert!(perm.is_empty());
        calls += 1;
    });
    assert_eq!(calls, 1);
}

fn small_set() -> Vec<BitString> {
    ["", "0", "1", "01", "011", "10", "0110"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect()
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_set();
    let mut expected: Vec<BitString> = keys.clone();
    expected.sort();

    for_each_permutation(&keys, |perm| {
        let mut t: PatriciaTrie<BitString, usize> = PatriciaTrie::new();
        for (i, k) in perm.into_iter().enumerate() {
            assert_eq!(t.insert(k, i), None);
        }

        validate_trie(&t);
        let got: Vec<BitString> = t.keys().cloned().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_set();

    // Insert in a fixed order, then remove in all permutations.
    let mut base_trie: PatriciaTrie<BitString, usize> = PatriciaTrie::new();
    let mut base_map: BTreeMap<BitString, usize> = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(
            base_trie.insert(k.clone(), i),
            base_map.insert(k.clone(), i)
        );
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base_trie.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(&k), m.remove(&k));
            assert_eq!(t.len(), m.len());
            validate_trie(&t);
            let got: Vec<&BitString> = t.keys().collect();
            let expected: Vec<&BitString> = m.keys().collect();
            assert_eq!(got, expected);
        }
        assert!(t.is_empty());
        assert!(t.nodes[NodeId::ROOT].children.is_none());
    });
}
