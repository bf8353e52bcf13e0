// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! The single set-arithmetic primitive reconciliation is built on.

use std::collections::HashSet;
use std::hash::Hash;

/// Compare two key sets, returning `(only_in_a, only_in_b, in_both)`.
///
/// Operates on key sets only — inputs may be sets, map-key views, or
/// sequences; duplicates collapse. Pure and generic over any
/// hashable/cloneable key type so it serves both the container-name
/// keyed removal set and the service-id keyed start set.
pub fn diff<T>(a: impl IntoIterator<Item = T>, b: impl IntoIterator<Item = T>) -> (HashSet<T>, HashSet<T>, HashSet<T>)
where
    T: Eq + Hash + Clone,
{
    let a: HashSet<T> = a.into_iter().collect();
    let b: HashSet<T> = b.into_iter().collect();
    let only_a = a.difference(&b).cloned().collect();
    let only_b = b.difference(&a).cloned().collect();
    let both = a.intersection(&b).cloned().collect();
    (only_a, only_b, both)
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
