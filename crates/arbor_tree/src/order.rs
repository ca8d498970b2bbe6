//! Sibling ordering.
//!
//! Children of a mapping node are iterated priority-first, then by key.
//! The order is total and deterministic: re-reading unchanged data always
//! yields the same sequence.

use crate::value::{Node, Priority};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Compares two priorities.
///
/// No-priority sorts before any priority; numeric priorities sort
/// numerically and before string priorities; string priorities sort
/// lexicographically.
pub fn compare_priorities(a: &Priority, b: &Priority) -> Ordering {
    match (a, b) {
        (Priority::None, Priority::None) => Ordering::Equal,
        (Priority::None, _) => Ordering::Less,
        (_, Priority::None) => Ordering::Greater,
        (Priority::Number(x), Priority::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Priority::Number(_), Priority::Name(_)) => Ordering::Less,
        (Priority::Name(_), Priority::Number(_)) => Ordering::Greater,
        (Priority::Name(x), Priority::Name(y)) => x.cmp(y),
    }
}

/// Compares two sibling keys.
///
/// Integer-looking keys sort numerically among themselves and before
/// other keys; remaining keys sort lexicographically. Numeric ties
/// (`"7"` vs `"07"`) fall back to the lexicographic order so the result
/// stays a total order.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (key_as_int(a), key_as_int(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Compares two siblings: priority first, key as tiebreak.
pub fn compare_siblings(a: (&str, &Node), b: (&str, &Node)) -> Ordering {
    compare_priorities(a.1.priority(), b.1.priority()).then_with(|| compare_keys(a.0, b.0))
}

/// Returns the entries of a child map in sibling order.
pub fn sorted_children(map: &BTreeMap<String, Node>) -> Vec<(&String, &Node)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| compare_siblings((a.0, a.1), (b.0, b.1)));
    entries
}

fn key_as_int(key: &str) -> Option<i64> {
    // Leading zeros would alias distinct keys onto one integer; keep them
    // out of the numeric bucket ("07" sorts as a string, "7" as a number).
    if key != "0" && (key.starts_with('0') || key.starts_with("-0") || key.starts_with('+')) {
        return None;
    }
    key.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pri_num(n: i64) -> Priority {
        Priority::number(n)
    }

    #[test]
    fn none_sorts_first() {
        assert_eq!(
            compare_priorities(&Priority::None, &pri_num(0)),
            Ordering::Less
        );
        assert_eq!(
            compare_priorities(&Priority::None, &Priority::name("a")),
            Ordering::Less
        );
    }

    #[test]
    fn numbers_before_names() {
        assert_eq!(
            compare_priorities(&pri_num(999), &Priority::name("0")),
            Ordering::Less
        );
        assert_eq!(compare_priorities(&pri_num(2), &pri_num(10)), Ordering::Less);
        assert_eq!(
            compare_priorities(&Priority::name("apple"), &Priority::name("pear")),
            Ordering::Less
        );
    }

    #[test]
    fn integer_keys_sort_numerically_first() {
        assert_eq!(compare_keys("2", "10"), Ordering::Less);
        assert_eq!(compare_keys("10", "alpha"), Ordering::Less);
        assert_eq!(compare_keys("alpha", "beta"), Ordering::Less);
    }

    #[test]
    fn leading_zero_keys_stay_lexicographic() {
        assert_eq!(compare_keys("07", "7"), Ordering::Greater);
        assert_eq!(compare_keys("07", "07"), Ordering::Equal);
    }

    #[test]
    fn priority_order_from_fixture() {
        // {10: pri 22, 20: pri 52, 30: pri 23} iterates 10, 30, 20.
        let mut map = BTreeMap::new();
        map.insert("10".into(), Node::from(1i64).with_priority(pri_num(22)));
        map.insert("20".into(), Node::from(2i64).with_priority(pri_num(52)));
        map.insert("30".into(), Node::from(3i64).with_priority(pri_num(23)));

        let keys: Vec<_> = sorted_children(&map).iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["10", "30", "20"]);
    }

    #[test]
    fn sorted_children_is_stable_across_reads() {
        let mut map = BTreeMap::new();
        for key in ["b", "a", "10", "2", "z"] {
            map.insert(key.to_string(), Node::from(0i64));
        }
        let first: Vec<_> = sorted_children(&map)
            .iter()
            .map(|(k, _)| k.to_string())
            .collect();
        let second: Vec<_> = sorted_children(&map)
            .iter()
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, ["2", "10", "a", "b", "z"]);
    }
}
