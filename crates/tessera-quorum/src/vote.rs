//! Majority vote ("most common value").
//!
//! The same selector picks trusted key material after the handshake and the
//! representative error after a failed fanout, so both call sites share the
//! exact tie-breaking rule:
//!
//! 1. Count occurrences of every value.
//! 2. Stable-sort the sequence by ascending occurrence count.
//! 3. Return the final element.
//!
//! Equal-count values keep their relative order, so a tie goes to whichever
//! tied value appears last in the input.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

/// Return the most frequent value, ties going to the last one seen.
///
/// ```
/// use tessera_quorum::most_common;
///
/// assert_eq!(most_common(&["a", "b", "a"]), Some("a"));
/// assert_eq!(most_common(&["a", "b"]), Some("b"));
/// assert_eq!(most_common::<&str>(&[]), None);
/// ```
pub fn most_common<T>(values: &[T]) -> Option<T>
where
    T: Eq + Hash + Clone,
{
    most_common_by(values, |v| v.clone())
}

/// Majority vote over a derived key; returns the element whose key wins.
pub fn most_common_by<T, K, F>(values: &[T], key: F) -> Option<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let keys: Vec<K> = values.iter().map(key).collect();

    let mut counts: HashMap<&K, usize> = HashMap::with_capacity(keys.len());
    for k in &keys {
        *counts.entry(k).or_default() += 1;
    }

    // sort_by_key is stable
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by_key(|&i| counts[&keys[i]]);

    order.pop().map(|i| values[i].clone())
}

/// Majority vote over structured values compared by their JSON form.
///
/// Values that fail to serialize all compare equal to each other.
pub fn most_common_serialized<T>(values: &[T]) -> Option<T>
where
    T: Serialize + Clone,
{
    most_common_by(values, |v| serde_json::to_string(v).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn majority_wins() {
        assert_eq!(most_common(&["a", "b", "a"]), Some("a"));
        assert_eq!(most_common(&["x", "y", "y", "x", "y"]), Some("y"));
    }

    #[test]
    fn tie_goes_to_last_after_stable_sort() {
        assert_eq!(most_common(&["a", "b"]), Some("b"));
        assert_eq!(most_common(&["b", "a"]), Some("a"));
        // a and b tie at two; b's last occurrence is later
        assert_eq!(most_common(&["a", "b", "a", "b", "c"]), Some("b"));
        assert_eq!(most_common(&["b", "a", "b", "a", "c"]), Some("a"));
    }

    #[test]
    fn empty_input_has_no_winner() {
        assert_eq!(most_common::<String>(&[]), None);
    }

    #[test]
    fn single_value() {
        assert_eq!(most_common(&["only"]), Some("only"));
    }

    #[test]
    fn structured_values_vote_by_json_form() {
        let errors = vec![
            json!({"errorCode": "not_authorized", "message": "nope"}),
            json!(502),
            json!({"message": "nope", "errorCode": "not_authorized"}),
        ];
        // key order does not matter for serde_json's default map
        assert_eq!(
            most_common_serialized(&errors),
            Some(json!({"errorCode": "not_authorized", "message": "nope"}))
        );
    }

    proptest! {
        #[test]
        fn winner_has_maximal_count(values in proptest::collection::vec(0u8..4, 1..40)) {
            let winner = most_common(&values).unwrap();
            let count = |x: u8| values.iter().filter(|&&v| v == x).count();
            let best = values.iter().map(|&v| count(v)).max().unwrap();
            prop_assert_eq!(count(winner), best);
        }

        #[test]
        fn tie_break_is_latest_occurrence(values in proptest::collection::vec(0u8..4, 1..40)) {
            let winner = most_common(&values).unwrap();
            let count = |x: u8| values.iter().filter(|&&v| v == x).count();
            let best = count(winner);
            let last_of = |x: u8| values.iter().rposition(|&v| v == x).unwrap();
            for &v in &values {
                if count(v) == best {
                    prop_assert!(last_of(v) <= last_of(winner));
                }
            }
        }
    }
}
