//! Tessera Quorum - deciding what a set of semi-trusted nodes agreed on
//!
//! A Tessera client asks every node in a fixed set for the same thing and
//! only trusts the answer when enough of them agree. This crate holds the
//! I/O-free part of that decision.
//!
//! # Overview
//!
//! - [`most_common`]: majority vote with a fixed tie-break (last value after a
//!   stable ascending-count sort), shared by key selection and error selection
//! - [`reconcile`]: partitions per-node outcomes, enforces the quorum and
//!   picks the representative error
//! - [`check_artifacts`]: detects signing shares that disagree on what they
//!   signed
//! - [`assemble`]: orders shares by index for the external combiner
//!
//! # Example
//!
//! ```
//! use tessera_quorum::{assemble, reconcile, NodeFailure, QuorumOutcome, Share};
//!
//! let outcomes = vec![
//!     Ok(Share::new(2, "0c")),
//!     Err(NodeFailure::Status(503)),
//!     Ok(Share::new(0, "0a")),
//! ];
//!
//! let QuorumOutcome::Success { values } = reconcile(&outcomes, 2) else {
//!     panic!("two nodes answered");
//! };
//! assert_eq!(assemble(values).indices(), vec![0, 2]);
//! ```

mod assemble;
mod error;
mod reconcile;
mod share;
mod threshold;
mod vote;

pub use assemble::{assemble, AssembledShares};
pub use error::{Error, Result};
pub use reconcile::{check_artifacts, reconcile, ArtifactCheck, QuorumOutcome};
pub use share::{Contribution, NodeFailure, NodeResult, Share, ShareInput};
pub use threshold::{meets_quorum, quorum_reachable, shortfall, tolerated_dishonest};
pub use vote::{most_common, most_common_by, most_common_serialized};
