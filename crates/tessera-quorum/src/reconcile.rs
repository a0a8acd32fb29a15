//! Result reconciliation.
//!
//! Turns the settled outcomes of one fanout round into a single verdict:
//!
//! - successes that actually carry a value are counted against the quorum
//! - on failure the representative error is the majority vote over the
//!   serialized failure reasons, not the first one seen
//! - for signing rounds, shares must agree on the unsigned artifact; a
//!   disagreement is reported, and the majority artifact is still usable

use tracing::{debug, warn};

use crate::share::{Contribution, NodeFailure, NodeResult, Share};
use crate::threshold::{meets_quorum, shortfall};
use crate::vote::{most_common, most_common_serialized};

/// Verdict of one fanout round.
#[derive(Debug, Clone, PartialEq)]
pub enum QuorumOutcome<T> {
    /// At least `min_node_count` nodes produced a value.
    Success { values: Vec<T> },
    /// Too few nodes produced a value.
    Failure {
        /// Majority-vote failure reason, `None` when no node failed outright.
        error: Option<NodeFailure>,
        successes: usize,
        required: usize,
    },
}

impl<T> QuorumOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Decide the round. Pure function of its inputs, so repeating it on the
/// same outcomes gives the same verdict.
pub fn reconcile<T>(outcomes: &[NodeResult<T>], min_node_count: usize) -> QuorumOutcome<T>
where
    T: Contribution + Clone,
{
    let mut values = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    let mut withheld = 0usize;

    for outcome in outcomes {
        match outcome {
            Ok(v) if v.is_produced() => values.push(v.clone()),
            Ok(_) => withheld += 1,
            Err(f) => failures.push(f.clone()),
        }
    }

    debug!(
        settled = outcomes.len(),
        successes = values.len(),
        withheld,
        failures = failures.len(),
        required = min_node_count,
        "Reconciling fanout round"
    );

    if meets_quorum(values.len(), min_node_count) {
        return QuorumOutcome::Success { values };
    }

    let error = most_common_serialized(&failures);
    warn!(
        successes = values.len(),
        required = min_node_count,
        missing = shortfall(values.len(), min_node_count),
        error = ?error,
        "Quorum not met"
    );

    QuorumOutcome::Failure {
        error,
        successes: values.len(),
        required: min_node_count,
    }
}

/// Agreement of the unsigned artifact across a set of signing shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactCheck {
    /// No share carried an artifact.
    Absent,
    /// Every share carried the same artifact.
    Uniform(String),
    /// Shares disagree; `canonical` is the majority-vote artifact.
    Divergent { canonical: String, distinct: usize },
}

impl ArtifactCheck {
    /// The artifact to build the final result from.
    pub fn canonical(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Uniform(a) => Some(a),
            Self::Divergent { canonical, .. } => Some(canonical),
        }
    }

    pub fn is_divergent(&self) -> bool {
        matches!(self, Self::Divergent { .. })
    }
}

/// Compare the unsigned artifacts of `shares`.
///
/// A share missing its artifact counts as disagreeing with one that has it.
pub fn check_artifacts(shares: &[Share]) -> ArtifactCheck {
    let artifacts: Vec<Option<&str>> = shares.iter().map(|s| s.artifact.as_deref()).collect();

    let present: Vec<&str> = artifacts.iter().flatten().copied().collect();
    let Some(canonical) = most_common(&present) else {
        return ArtifactCheck::Absent;
    };

    let mut distinct = artifacts.clone();
    distinct.sort_unstable();
    distinct.dedup();

    if distinct.len() == 1 {
        return ArtifactCheck::Uniform(canonical.to_string());
    }

    warn!(
        distinct = distinct.len(),
        shares = shares.len(),
        "Unsigned artifact differs across nodes; the combined signature will not verify against every node's artifact"
    );

    ArtifactCheck::Divergent {
        canonical: canonical.to_string(),
        distinct: distinct.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn share(index: u32, payload: &str, artifact: &str) -> NodeResult<Share> {
        Ok(Share::new(index, payload).with_artifact(artifact))
    }

    fn denied() -> NodeResult<Share> {
        Err(NodeFailure::Reported(json!({
            "errorCode": "not_authorized",
            "message": "You are not authorized"
        })))
    }

    #[test]
    fn quorum_met_returns_values() {
        let outcomes = vec![share(0, "aa", "jwt"), share(1, "bb", "jwt"), denied()];
        match reconcile(&outcomes, 2) {
            QuorumOutcome::Success { values } => assert_eq!(values.len(), 2),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn quorum_not_met_reports_majority_error() {
        let outcomes = vec![
            share(0, "aa", "jwt"),
            Err(NodeFailure::Status(502)),
            denied(),
            denied(),
        ];
        match reconcile(&outcomes, 3) {
            QuorumOutcome::Failure { error, successes, required } => {
                assert_eq!(successes, 1);
                assert_eq!(required, 3);
                assert_eq!(error.unwrap().error_code(), Some("not_authorized"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn empty_payload_counts_against_quorum() {
        let outcomes = vec![share(0, "aa", "jwt"), share(1, "", "jwt"), share(2, "cc", "jwt")];
        assert!(!reconcile(&outcomes, 3).is_success());

        match reconcile(&outcomes, 2) {
            QuorumOutcome::Success { values } => {
                assert_eq!(values.len(), 2);
                assert!(values.iter().all(|s| !s.payload.is_empty()));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn malformed_share_is_outvoted_by_quorum() {
        let mut outcomes: Vec<NodeResult<Share>> = (0..6u32)
            .map(|i| Share::new(i, format!("{:02x}", i)).with_artifact("jwt").well_formed())
            .collect();
        outcomes.push(Share::new(6, "zz").with_artifact("jwt").well_formed());

        match reconcile(&outcomes, 6) {
            QuorumOutcome::Success { values } => {
                assert_eq!(values.len(), 6);
                assert!(values.iter().all(|s| s.index != 6));
            }
            other => panic!("expected success, got {:?}", other),
        }

        // With too few good shares the malformed one is the reported cause
        let QuorumOutcome::Failure { error, .. } = reconcile(&outcomes[5..], 2) else {
            panic!("one good share cannot meet a quorum of two");
        };
        assert!(matches!(error, Some(NodeFailure::Malformed(_))));
    }

    #[test]
    fn all_withheld_has_no_representative_error() {
        let outcomes = vec![share(0, "", "jwt"), share(1, "", "jwt")];
        assert_eq!(
            reconcile(&outcomes, 1),
            QuorumOutcome::Failure { error: None, successes: 0, required: 1 }
        );
    }

    #[test]
    fn uniform_artifacts() {
        let shares = vec![
            Share::new(0, "aa").with_artifact("h.c"),
            Share::new(1, "bb").with_artifact("h.c"),
        ];
        assert_eq!(check_artifacts(&shares), ArtifactCheck::Uniform("h.c".into()));
    }

    #[test]
    fn divergent_artifacts_use_majority() {
        let mut shares: Vec<Share> = (0..4)
            .map(|i| Share::new(i, "aa").with_artifact("good"))
            .collect();
        shares.push(Share::new(4, "aa").with_artifact("forged"));
        shares.push(Share::new(5, "aa").with_artifact("forged"));

        let check = check_artifacts(&shares);
        assert!(check.is_divergent());
        assert_eq!(check.canonical(), Some("good"));
        assert_eq!(check, ArtifactCheck::Divergent { canonical: "good".into(), distinct: 2 });
    }

    #[test]
    fn missing_artifact_is_divergence() {
        let shares = vec![Share::new(0, "aa").with_artifact("jwt"), Share::new(1, "bb")];
        assert!(check_artifacts(&shares).is_divergent());
    }

    #[test]
    fn decryption_shares_have_no_artifact() {
        let shares = vec![Share::new(0, "aa"), Share::new(1, "bb")];
        assert_eq!(check_artifacts(&shares), ArtifactCheck::Absent);
    }

    fn outcome_strategy() -> impl Strategy<Value = NodeResult<Share>> {
        prop_oneof![
            (0u32..16, "[0-9a-f]{0,4}").prop_map(|(i, p)| -> NodeResult<Share> {
                Ok(Share::new(i, p).with_artifact("jwt"))
            }),
            (400u16..600).prop_map(|c| -> NodeResult<Share> { Err(NodeFailure::Status(c)) }),
            Just::<NodeResult<Share>>(Err(NodeFailure::Unreachable("connection refused".into()))),
        ]
    }

    proptest! {
        #[test]
        fn reconcile_is_idempotent(
            outcomes in proptest::collection::vec(outcome_strategy(), 0..12),
            min in 0usize..12,
        ) {
            prop_assert_eq!(reconcile(&outcomes, min), reconcile(&outcomes, min));
        }

        #[test]
        fn success_iff_enough_produced(
            outcomes in proptest::collection::vec(outcome_strategy(), 0..12),
            min in 0usize..12,
        ) {
            let produced = outcomes
                .iter()
                .filter(|o| matches!(o, Ok(s) if !s.payload.is_empty()))
                .count();
            prop_assert_eq!(reconcile(&outcomes, min).is_success(), produced >= min);
        }
    }
}
