//! Error types for tessera-quorum.

use thiserror::Error;

/// Result type for tessera-quorum operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing shares for the combiner.
#[derive(Debug, Error)]
pub enum Error {
    /// A node returned a share payload that is not valid hex.
    #[error("share {index} payload is not valid hex: {source}")]
    InvalidShareHex {
        index: u32,
        #[source]
        source: hex::FromHexError,
    },
}
