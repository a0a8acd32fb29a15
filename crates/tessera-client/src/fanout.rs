//! Request fanout: the same command to every connected node, all awaited.

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tessera_quorum::{NodeFailure, NodeResult};
use tracing::{debug, warn};

use crate::endpoint::NodeEndpoint;
use crate::transport::NodeTransport;

/// One exchange with one node, decoded into `R`.
///
/// A body that parses as JSON but not as `R` is a [`NodeFailure::Malformed`].
pub(crate) async fn call<T, R>(
    transport: &T,
    node: &NodeEndpoint,
    path: &str,
    body: &Value,
) -> NodeResult<R>
where
    T: NodeTransport,
    R: DeserializeOwned,
{
    let value = transport.send(node, path, body).await?;
    serde_json::from_value(value).map_err(|e| NodeFailure::Malformed(e.to_string()))
}

/// Send `body` to every node in `nodes` concurrently.
///
/// Barrier semantics: returns only after every call has settled, with one
/// outcome per node in `nodes` order. There is no early return on the first
/// success or the first failure.
pub async fn fan_out<T, R>(
    transport: &T,
    nodes: &[NodeEndpoint],
    path: &str,
    body: &Value,
) -> Vec<NodeResult<R>>
where
    T: NodeTransport,
    R: DeserializeOwned,
{
    debug!(path, nodes = nodes.len(), "Fanning out request");

    let outcomes = join_all(nodes.iter().map(|node| call(transport, node, path, body))).await;

    for (node, outcome) in nodes.iter().zip(&outcomes) {
        if let Err(failure) = outcome {
            warn!(%node, path, %failure, "Node request failed");
        }
    }

    outcomes
}
