// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

use super::*;
use std::collections::HashSet;

#[test]
fn sets() {
    let a: HashSet<&str> = ["a", "b"].into_iter().collect();
    let b: HashSet<&str> = ["b", "c"].into_iter().collect();
    let (only_a, only_b, both) = diff(a, b);
    assert_eq!(only_a, HashSet::from(["a"]));
    assert_eq!(only_b, HashSet::from(["c"]));
    assert_eq!(both, HashSet::from(["b"]));
}

#[test]
fn map_key_views_and_sequences() {
    use std::collections::HashMap;
    let b: HashMap<&str, i32> = HashMap::from([("b", 1), ("c", 2)]);
    let (only_b, only_d, both) = diff(b.keys().copied(), vec!["c", "d"]);
    assert_eq!(only_b, HashSet::from(["b"]));
    assert_eq!(only_d, HashSet::from(["d"]));
    assert_eq!(both, HashSet::from(["c"]));
}

#[test]
fn duplicates_collapse() {
    let (only_a, only_b, both) = diff(vec!["x", "x", "y"], vec!["y", "y"]);
    assert_eq!(only_a, HashSet::from(["x"]));
    assert!(only_b.is_empty());
    assert_eq!(both, HashSet::from(["y"]));
}

#[test]
fn both_empty() {
    let (only_a, only_b, both) = diff(Vec::<&str>::new(), Vec::<&str>::new());
    assert!(only_a.is_empty() && only_b.is_empty() && both.is_empty());
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// `diff(A, B) = (A\B, B\A, A∩B)`; the three results are pairwise
        /// disjoint and their union equals `A∪B` (spec.md §8).
        #[test]
        fn diff_partitions_the_union(a in prop::collection::hash_set(0i32..20, 0..10),
                                      b in prop::collection::hash_set(0i32..20, 0..10)) {
            let (only_a, only_b, both) = diff(a.clone(), b.clone());

            prop_assert!(only_a.is_disjoint(&only_b));
            prop_assert!(only_a.is_disjoint(&both));
            prop_assert!(only_b.is_disjoint(&both));

            let union: std::collections::HashSet<_> =
                only_a.iter().chain(only_b.iter()).chain(both.iter()).cloned().collect();
            let expected_union: std::collections::HashSet<_> = a.union(&b).cloned().collect();
            prop_assert_eq!(union, expected_union);

            prop_assert_eq!(only_a, &a - &b);
            prop_assert_eq!(only_b, &b - &a);
            prop_assert_eq!(both, a.intersection(&b).cloned().collect());
        }
    }
}
