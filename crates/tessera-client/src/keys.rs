//! Per-node key material and the majority-selected trusted key set.

use serde::{Deserialize, Serialize};
use tessera_quorum::{most_common, tolerated_dishonest};
use tracing::info;

use crate::protocol::HandshakeResponse;

/// Key material one node reported during its handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerKeyBundle {
    pub server_pub_key: String,
    pub subnet_pub_key: String,
    pub network_pub_key: String,
    pub network_pub_key_set: String,
}

impl From<HandshakeResponse> for ServerKeyBundle {
    fn from(r: HandshakeResponse) -> Self {
        Self {
            server_pub_key: r.server_public_key,
            subnet_pub_key: r.subnet_public_key,
            network_pub_key: r.network_public_key,
            network_pub_key_set: r.network_public_key_set,
        }
    }
}

/// Network keys the client trusts, chosen by majority vote per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedKeySet {
    /// Hex; plain keys are encrypted under it.
    pub subnet_pub_key: String,
    /// Hex.
    pub network_pub_key: String,
    /// Hex; input to share combination.
    pub network_pub_key_set: String,
}

/// Vote each field independently across `bundles` (arrival order).
///
/// A minority of nodes reporting forged or stale keys is outvoted. Returns
/// `None` only for an empty input.
pub fn select_trusted_keys(bundles: &[ServerKeyBundle]) -> Option<TrustedKeySet> {
    let keys = TrustedKeySet {
        subnet_pub_key: vote(bundles, |b| &b.subnet_pub_key)?,
        network_pub_key: vote(bundles, |b| &b.network_pub_key)?,
        network_pub_key_set: vote(bundles, |b| &b.network_pub_key_set)?,
    };

    info!(
        responders = bundles.len(),
        tolerated_dishonest = tolerated_dishonest(bundles.len()),
        "Selected trusted network keys"
    );

    Some(keys)
}

fn vote(bundles: &[ServerKeyBundle], field: impl Fn(&ServerKeyBundle) -> &String) -> Option<String> {
    let values: Vec<&String> = bundles.iter().map(field).collect();
    most_common(&values).cloned()
}
