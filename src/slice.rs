//! Set-difference primitives over small, unordered id collections.
//!
//! Association sets hold tens of ids, so every operation is a plain nested
//! scan. Inputs are assumed duplicate-free unless noted otherwise.

/// Linear membership test.
pub fn contains<T: PartialEq>(s: &[T], v: &T) -> bool {
    s.iter().any(|x| x == v)
}

/// Elements present in exactly one of `a` and `b`: `a`-only elements first,
/// then `b`-only elements.
pub fn symmetric_difference<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut diff: Vec<T> = a.iter().filter(|x| !contains(b, *x)).cloned().collect();
    diff.extend(b.iter().filter(|x| !contains(a, *x)).cloned());
    diff
}

/// Elements of `b` that are not in `a`, i.e. what `b` adds beyond `a`.
pub fn right_only_difference<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    b.iter().filter(|x| !contains(a, *x)).cloned().collect()
}

/// Elements of `a` not in `to_remove`, keeping `a`'s order.
pub fn subtract<T: PartialEq + Clone>(a: &[T], to_remove: &[T]) -> Vec<T> {
    a.iter().filter(|x| !contains(to_remove, *x)).cloned().collect()
}

/// `a` followed by whatever `b` adds beyond it.
pub fn union<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = a.to_vec();
    out.extend(right_only_difference(a, b));
    out
}

/// True iff `a` and `b` hold the same multiset of elements.
pub fn unordered_equal<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let count = |s: &[T], v: &T| s.iter().filter(|x| *x == v).count();
    a.iter().all(|v| count(a, v) == count(b, v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_contains() {
        let s = ids(&["a", "b"]);
        assert!(contains(&s, &"a".to_string()));
        assert!(!contains(&s, &"c".to_string()));
        assert!(!contains(&[] as &[String], &"a".to_string()));
    }

    #[test]
    fn test_symmetric_difference() {
        let diff = symmetric_difference(&ids(&["r2", "r4"]), &ids(&["r1", "r2", "r3"]));
        assert_eq!(diff, ids(&["r4", "r1", "r3"]));
    }

    #[test]
    fn test_symmetric_difference_identical_is_empty() {
        let a = ids(&["x", "y"]);
        assert!(symmetric_difference(&a, &ids(&["y", "x"])).is_empty());
    }

    #[test]
    fn test_right_only_difference() {
        let remote = ids(&["r1", "r2", "r3"]);
        assert_eq!(
            right_only_difference(&ids(&["r2", "r4"]), &remote),
            ids(&["r1", "r3"])
        );
        assert!(right_only_difference(&remote, &ids(&["r2"])).is_empty());
    }

    #[test]
    fn test_subtract_preserves_order() {
        let a = ids(&["d", "c", "b", "a"]);
        assert_eq!(subtract(&a, &ids(&["c", "z"])), ids(&["d", "b", "a"]));
        assert_eq!(subtract(&a, &[]), a);
    }

    #[test]
    fn test_union_has_no_duplicates() {
        let u = union(&ids(&["r1", "r3"]), &ids(&["r3", "r4"]));
        assert_eq!(u, ids(&["r1", "r3", "r4"]));
    }

    #[test]
    fn test_unordered_equal() {
        assert!(unordered_equal(&ids(&["a", "b"]), &ids(&["b", "a"])));
        assert!(!unordered_equal(&ids(&["a", "b"]), &ids(&["a"])));
        assert!(!unordered_equal(&ids(&["a", "a", "b"]), &ids(&["a", "b", "b"])));
        assert!(unordered_equal::<String>(&[], &[]));
    }

    #[test]
    fn test_unordered_equal_is_symmetric() {
        let cases = [
            (ids(&["a", "b", "c"]), ids(&["c", "a", "b"])),
            (ids(&["a"]), ids(&["a", "a"])),
            (ids(&["a", "a", "b"]), ids(&["a", "b", "b"])),
            (ids(&[]), ids(&["x"])),
        ];
        for (a, b) in &cases {
            assert_eq!(unordered_equal(a, b), unordered_equal(b, a), "{a:?} vs {b:?}");
        }
    }
}
