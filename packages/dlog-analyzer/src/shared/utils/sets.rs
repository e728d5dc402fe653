//! Unordered-set helpers required by C1 (spec §4.1).
//!
//! These operate on `HashSet<T>` rather than the attribute-bag sets of the
//! original source; semantics (including the deliberately odd
//! empty/empty convention of `set_includes`) are preserved verbatim.

use rustc_hash::FxHashSet;
use std::hash::Hash;

pub fn set_union<T: Eq + Hash + Clone>(a: &FxHashSet<T>, b: &FxHashSet<T>) -> FxHashSet<T> {
    a.union(b).cloned().collect()
}

pub fn set_difference<T: Eq + Hash + Clone>(a: &FxHashSet<T>, b: &FxHashSet<T>) -> FxHashSet<T> {
    a.difference(b).cloned().collect()
}

/// True iff `outer` is a superset of `inner`, with one deliberate
/// exception preserved from the source system: `outer={}, inner={}` is
/// `false`, even though set-theoretically the empty set is a subset of
/// itself. This affects guard detection for rules whose body has no
/// variables (spec §9 Open Question — preserve, don't "fix").
pub fn set_includes<T: Eq + Hash>(outer: &FxHashSet<T>, inner: &FxHashSet<T>) -> bool {
    if outer.is_empty() && inner.is_empty() {
        return false;
    }
    inner.iter().all(|x| outer.contains(x))
}

/// Unordered-set inequality.
pub fn sets_differ<T: Eq + Hash>(a: &FxHashSet<T>, b: &FxHashSet<T>) -> bool {
    a.len() != b.len() || a.iter().any(|x| !b.contains(x))
}

/// Flattens a map-of-arrays' values into one array, preserving the
/// per-key insertion order of `entries` and within-key element order.
pub fn concatenate_arrays<K, V: Clone>(entries: impl IntoIterator<Item = (K, Vec<V>)>) -> Vec<V> {
    entries.into_iter().flat_map(|(_, v)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> FxHashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_outer_and_inner_is_false() {
        assert!(!set_includes(&set(&[]), &set(&[])));
    }

    #[test]
    fn nonempty_outer_empty_inner_is_true() {
        assert!(set_includes(&set(&["x"]), &set(&[])));
    }

    #[test]
    fn proper_superset_is_true() {
        assert!(set_includes(&set(&["x", "y"]), &set(&["x"])));
    }

    #[test]
    fn missing_member_is_false() {
        assert!(!set_includes(&set(&["x"]), &set(&["x", "y"])));
    }

    #[test]
    fn sets_differ_detects_size_and_membership() {
        assert!(sets_differ(&set(&["x"]), &set(&["x", "y"])));
        assert!(!sets_differ(&set(&["x", "y"]), &set(&["y", "x"])));
    }

    #[test]
    fn concatenate_preserves_order() {
        let entries = vec![("a", vec![1, 2]), ("b", vec![3])];
        assert_eq!(concatenate_arrays(entries), vec![1, 2, 3]);
    }
}
