//! Share assembly.
//!
//! Responses arrive in whatever order the network delivers them. The
//! combiner needs them ordered by share index, so assembly re-establishes
//! that order with a stable sort. Nothing is dropped or duplicated and
//! index gaps are legal: the combiner is threshold based.

use crate::error::{Error, Result};
use crate::share::{Share, ShareInput};

/// Shares from a successful round, ordered by ascending share index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledShares {
    shares: Vec<Share>,
}

impl AssembledShares {
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    /// Share indices in assembled order.
    pub fn indices(&self) -> Vec<u32> {
        self.shares.iter().map(|s| s.index).collect()
    }

    /// Hex-decode every payload, keeping the assembled order.
    pub fn decode(&self) -> Result<Vec<ShareInput>> {
        self.shares
            .iter()
            .map(|s| {
                hex::decode(&s.payload)
                    .map(|bytes| ShareInput { index: s.index, bytes })
                    .map_err(|source| Error::InvalidShareHex { index: s.index, source })
            })
            .collect()
    }
}

/// Order `shares` for the combiner.
pub fn assemble(mut shares: Vec<Share>) -> AssembledShares {
    shares.sort_by_key(|s| s.index);
    AssembledShares { shares }
}
