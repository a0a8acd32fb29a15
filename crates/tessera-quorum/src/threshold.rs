//! Quorum threshold arithmetic.
//!
//! A node set of `n` endpoints is configured with a minimum agreeing subset
//! `min_node_count`. Every round (handshake or fanout) is judged against it:
//!
//! - `successes >= min_node_count` → the round is trusted
//! - otherwise the round fails with the majority-vote failure reason
//!
//! Key material chosen by majority vote tolerates up to `floor((n-1)/2)`
//! dishonest responders. That is a trust heuristic, not a proof.

/// Check if a success count meets the quorum.
pub const fn meets_quorum(successes: usize, min_node_count: usize) -> bool {
    successes >= min_node_count
}

/// Calculate how many more successes are needed to meet quorum.
pub const fn shortfall(successes: usize, min_node_count: usize) -> usize {
    if successes >= min_node_count {
        0
    } else {
        min_node_count - successes
    }
}

/// Whether quorum can still be reached while `pending` calls are unsettled.
pub const fn quorum_reachable(successes: usize, pending: usize, min_node_count: usize) -> bool {
    successes + pending >= min_node_count
}

/// Maximum number of dishonest responders a majority vote over
/// `responders` values can outvote.
///
/// Formula: floor((n - 1) / 2)
///
/// # Examples
///
/// ```
/// use tessera_quorum::tolerated_dishonest;
///
/// assert_eq!(tolerated_dishonest(0), 0);
/// assert_eq!(tolerated_dishonest(1), 0);
/// assert_eq!(tolerated_dishonest(7), 3);
/// ```
pub const fn tolerated_dishonest(responders: usize) -> usize {
    if responders == 0 {
        return 0;
    }
    (responders - 1) / 2
}
