//! Error types for tessera-client.

use tessera_quorum::NodeFailure;
use thiserror::Error;

/// Result type for tessera-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the node quorum client.
///
/// Individual node failures never show up here directly; they are folded
/// into a round and only the reconciled verdict becomes an error.
#[derive(Debug, Error)]
pub enum Error {
    /// A data-plane operation was attempted before quorum was reached.
    #[error("client is not ready; call connect() first")]
    NotReady,

    /// Request parameters were missing or contradictory.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Fewer than the minimum number of nodes succeeded.
    #[error("quorum not met: {successes} of {required} required nodes succeeded: {cause}")]
    QuorumNotMet {
        successes: usize,
        required: usize,
        /// Majority-vote failure reason across the nodes that failed.
        #[source]
        cause: Box<Error>,
    },

    /// Structured error reported by the nodes, with its original code.
    #[error("node error {code}: {message}")]
    Node { code: String, message: String },

    /// No structured cause could be determined.
    #[error("unknown node error: {detail}")]
    Unknown { detail: String },

    /// Shares disagreed on the unsigned artifact under the strict policy.
    #[error("nodes signed {distinct} different artifacts")]
    ArtifactMismatch { distinct: usize },

    /// The external threshold combiner failed.
    #[error("combiner error: {0}")]
    Combiner(String),

    /// Share preparation failed.
    #[error("share error: {0}")]
    Share(#[from] tessera_quorum::Error),

    /// Hex decoding error
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client could not be built.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert the representative failure of a round into a caller error.
    ///
    /// Bodies carrying an `errorCode` become [`Error::Node`]; anything else
    /// is [`Error::Unknown`].
    pub fn from_failure(failure: Option<&NodeFailure>) -> Self {
        match failure {
            Some(f) => match f.error_code() {
                Some(code) => Self::Node {
                    code: code.to_string(),
                    message: f.message().unwrap_or_default().to_string(),
                },
                None => Self::Unknown { detail: f.to_string() },
            },
            None => Self::Unknown {
                detail: "no node produced a result".to_string(),
            },
        }
    }

    /// The node-reported error code, looking through `QuorumNotMet`.
    pub fn node_code(&self) -> Option<&str> {
        match self {
            Self::Node { code, .. } => Some(code),
            Self::QuorumNotMet { cause, .. } => cause.node_code(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_failure_becomes_node_error() {
        let failure = NodeFailure::Reported(json!({
            "errorCode": "not_authorized",
            "message": "You are not authorized"
        }));
        match Error::from_failure(Some(&failure)) {
            Error::Node { code, message } => {
                assert_eq!(code, "not_authorized");
                assert_eq!(message, "You are not authorized");
            }
            other => panic!("expected node error, got {:?}", other),
        }
    }

    #[test]
    fn bare_status_becomes_unknown() {
        let err = Error::from_failure(Some(&NodeFailure::Status(500)));
        assert!(matches!(err, Error::Unknown { .. }));
        assert!(matches!(Error::from_failure(None), Error::Unknown { .. }));
    }

    #[test]
    fn node_code_through_quorum_error() {
        let err = Error::QuorumNotMet {
            successes: 2,
            required: 6,
            cause: Box::new(Error::Node {
                code: "rate_limited".into(),
                message: String::new(),
            }),
        };
        assert_eq!(err.node_code(), Some("rate_limited"));
        assert!(err.to_string().contains("2 of 6"));
    }
}
