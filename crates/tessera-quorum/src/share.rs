//! Shares and per-node outcomes.

use serde::{Deserialize, Serialize};

/// One node's partial contribution toward a threshold result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Position of the node's key share in the threshold scheme.
    pub index: u32,

    /// Hex-encoded share bytes. Empty when the node withheld its share.
    pub payload: String,

    /// The unsigned artifact the share signs (JWT header and claims).
    /// Absent for decryption shares.
    pub artifact: Option<String>,
}

impl Share {
    /// Create a share without an artifact.
    pub fn new(index: u32, payload: impl Into<String>) -> Self {
        Self {
            index,
            payload: payload.into(),
            artifact: None,
        }
    }

    /// Attach the unsigned artifact this share covers.
    #[must_use]
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// Reject a payload that is not hex as a [`NodeFailure::Malformed`].
    ///
    /// An empty payload is a withheld share, not a malformed one, and passes.
    pub fn well_formed(self) -> NodeResult<Self> {
        if let Err(e) = hex::decode(&self.payload) {
            return Err(NodeFailure::Malformed(format!(
                "share {} payload is not valid hex: {}",
                self.index, e
            )));
        }
        Ok(self)
    }
}

/// Hex-decoded share, ready for the external combiner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareInput {
    pub index: u32,
    pub bytes: Vec<u8>,
}

/// Why a single node call did not yield a value.
///
/// Compared by JSON form when voting for the representative error, so two
/// nodes reporting the same body count as the same failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeFailure {
    /// Non-success status with a JSON error body.
    Reported(serde_json::Value),
    /// Non-success status without a JSON body.
    Status(u16),
    /// The exchange never completed.
    Unreachable(String),
    /// Success status, but the body was not the expected JSON shape.
    Malformed(String),
}

impl NodeFailure {
    /// The node-reported `errorCode`, if the body carried one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Reported(body) => body.get("errorCode").and_then(|c| c.as_str()),
            _ => None,
        }
    }

    /// The node-reported `message`, if the body carried one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Reported(body) => body.get("message").and_then(|m| m.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reported(body) => write!(f, "node reported {}", body),
            Self::Status(code) => write!(f, "node returned status {}", code),
            Self::Unreachable(e) => write!(f, "node unreachable: {}", e),
            Self::Malformed(e) => write!(f, "malformed node response: {}", e),
        }
    }
}

/// Outcome of one node call within a round.
pub type NodeResult<T> = Result<T, NodeFailure>;

/// A value a node returns inside a fanout round.
///
/// Values that report `false` from [`is_produced`](Self::is_produced)
/// settled successfully but carry nothing usable; they are excluded from the
/// quorum numerator.
pub trait Contribution {
    fn is_produced(&self) -> bool {
        true
    }
}

impl Contribution for Share {
    fn is_produced(&self) -> bool {
        !self.payload.is_empty()
    }
}

impl Contribution for serde_json::Value {}

impl Contribution for () {}
