//! Handshake coordination.
//!
//! Every configured node gets its own handshake task. Tasks never fail the
//! round; they only report progress through a `watch` channel so waiters are
//! released the moment enough nodes have answered, rather than on a polling
//! interval.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tessera_quorum::{meets_quorum, quorum_reachable, NodeFailure};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::endpoint::NodeEndpoint;
use crate::error::{Error, Result};
use crate::fanout::call;
use crate::keys::ServerKeyBundle;
use crate::protocol::{routes, HandshakeRequest, HandshakeResponse};
use crate::transport::NodeTransport;

/// Progress of the handshake round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandshakeProgress {
    /// Nodes that completed a handshake.
    pub succeeded: usize,
    /// Nodes whose handshake finished either way.
    pub settled: usize,
    /// Nodes contacted.
    pub total: usize,
}

impl HandshakeProgress {
    pub fn pending(&self) -> usize {
        self.total - self.settled
    }

    pub fn is_settled(&self) -> bool {
        self.settled == self.total
    }
}

impl fmt::Display for HandshakeProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} succeeded, {} pending",
            self.succeeded,
            self.total,
            self.pending()
        )
    }
}

#[derive(Default)]
struct Collected {
    /// Arrival order; an endpoint appears at most once.
    bundles: Vec<(NodeEndpoint, ServerKeyBundle)>,
    failures: Vec<NodeFailure>,
}

struct Shared {
    collected: RwLock<Collected>,
    progress: watch::Sender<HandshakeProgress>,
}

/// Contacts every node once and tracks who answered.
pub struct HandshakeCoordinator<T> {
    transport: Arc<T>,
    shared: Arc<Shared>,
    started: AtomicBool,
}

impl<T: NodeTransport> HandshakeCoordinator<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let (progress, _) = watch::channel(HandshakeProgress::default());
        Self {
            transport,
            shared: Arc::new(Shared {
                collected: RwLock::new(Collected::default()),
                progress,
            }),
            started: AtomicBool::new(false),
        }
    }

    /// Spawn one handshake task per endpoint. Only the first call does
    /// anything; later calls join the round already in flight.
    pub fn start(&self, endpoints: &[NodeEndpoint]) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shared.progress.send_modify(|p| p.total = endpoints.len());
        info!(nodes = endpoints.len(), "Starting handshakes");

        let body = serde_json::to_value(HandshakeRequest::default()).unwrap_or(Value::Null);
        for node in endpoints.iter().cloned() {
            let transport = Arc::clone(&self.transport);
            let shared = Arc::clone(&self.shared);
            let body = body.clone();

            tokio::spawn(async move {
                let outcome =
                    call::<_, HandshakeResponse>(transport.as_ref(), &node, routes::HANDSHAKE, &body)
                        .await;

                // Record before publishing so woken waiters see the entry
                let mut collected = shared.collected.write().await;
                match outcome {
                    Ok(response) => {
                        if collected.bundles.iter().any(|(n, _)| *n == node) {
                            warn!(%node, "Duplicate handshake ignored");
                        } else {
                            debug!(%node, "Handshake complete");
                            collected.bundles.push((node, response.into()));
                        }
                        shared.progress.send_modify(|p| {
                            p.succeeded = collected.bundles.len();
                            p.settled += 1;
                        });
                    }
                    Err(failure) => {
                        warn!(%node, %failure, "Handshake failed");
                        collected.failures.push(failure);
                        shared.progress.send_modify(|p| p.settled += 1);
                    }
                }
            });
        }
    }

    /// Current progress.
    pub fn progress(&self) -> HandshakeProgress {
        *self.shared.progress.borrow()
    }

    /// `len(bundles) >= min_node_count`.
    pub fn quorum_reached(&self, min_node_count: usize) -> bool {
        meets_quorum(self.progress().succeeded, min_node_count)
    }

    /// Wait until `min_node_count` nodes have handshaked, or until too many
    /// have failed for quorum to be reachable.
    pub async fn wait_for_quorum(&self, min_node_count: usize) -> Result<HandshakeProgress> {
        let mut rx = self.shared.progress.subscribe();
        let progress = *rx
            .wait_for(|p| {
                meets_quorum(p.succeeded, min_node_count)
                    || !quorum_reachable(p.succeeded, p.pending(), min_node_count)
            })
            .await
            .map_err(|_| Error::Unknown {
                detail: "handshake progress channel closed".to_string(),
            })?;

        debug!(%progress, "Handshake wait released");
        Ok(progress)
    }

    /// Bundles received so far, in arrival order.
    pub async fn bundles(&self) -> Vec<ServerKeyBundle> {
        self.shared
            .collected
            .read()
            .await
            .bundles
            .iter()
            .map(|(_, b)| b.clone())
            .collect()
    }

    /// Bundles keyed by the node that reported them, in arrival order.
    pub async fn server_keys(&self) -> Vec<(NodeEndpoint, ServerKeyBundle)> {
        self.shared.collected.read().await.bundles.clone()
    }

    /// Nodes that completed a handshake, in arrival order.
    pub async fn connected(&self) -> Vec<NodeEndpoint> {
        self.shared
            .collected
            .read()
            .await
            .bundles
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Handshake failures so far.
    pub async fn failures(&self) -> Vec<NodeFailure> {
        self.shared.collected.read().await.failures.clone()
    }
}
