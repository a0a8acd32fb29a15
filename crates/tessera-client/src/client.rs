//! Node quorum client.
//!
//! Owns the node set, the handshake round, the trusted key set and the
//! readiness channel, and exposes the data-plane operations. Lifecycle is
//! one-way: `NotReady` until the first handshake quorum, `Ready` for good.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tessera_quorum::{
    assemble, check_artifacts, most_common_serialized, reconcile, ArtifactCheck, Contribution,
    NodeResult, QuorumOutcome, Share,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::collaborators::{Blake3Canonicalizer, ConditionCanonicalizer, ThresholdCombiner};
use crate::conditions::{AuthSig, CallRequest, ConditionSet, ResourceId, SymmetricKey};
use crate::config::{ArtifactPolicy, ClientConfig};
use crate::endpoint::NodeEndpoint;
use crate::error::{Error, Result};
use crate::fanout::fan_out;
use crate::handshake::HandshakeCoordinator;
use crate::keys::{select_trusted_keys, ServerKeyBundle, TrustedKeySet};
use crate::protocol::{
    routes, ChainDataSigningRequest, DecryptionRequest, DecryptionShareResponse, SigningRequest,
    SigningShareResponse, StoreConditionRequest, TOKEN_LIFETIME_SECS,
};
use crate::transport::{HttpTransport, NodeTransport};

/// Client lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    NotReady,
    Ready,
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadyState::NotReady => write!(f, "NotReady"),
            ReadyState::Ready => write!(f, "Ready"),
        }
    }
}

/// Client for a fixed set of semi-trusted nodes.
///
/// Every result is trusted only when at least `min_node_count` nodes agree.
/// Threshold cryptography and condition hashing are delegated to the
/// injected [`ThresholdCombiner`] and [`ConditionCanonicalizer`].
pub struct NodeQuorumClient<T = HttpTransport> {
    config: ClientConfig,
    transport: Arc<T>,
    handshakes: HandshakeCoordinator<T>,
    trusted: OnceLock<TrustedKeySet>,
    ready: watch::Sender<ReadyState>,
    combiner: Arc<dyn ThresholdCombiner>,
    canonicalizer: Arc<dyn ConditionCanonicalizer>,
    divergent_rounds: AtomicU64,
}

impl NodeQuorumClient<HttpTransport> {
    /// Client speaking HTTP to the configured nodes.
    pub fn new(config: ClientConfig, combiner: Arc<dyn ThresholdCombiner>) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, transport, combiner)
    }
}

impl<T: NodeTransport> NodeQuorumClient<T> {
    /// Client over a custom transport. The configuration is validated here.
    pub fn with_transport(
        config: ClientConfig,
        transport: T,
        combiner: Arc<dyn ThresholdCombiner>,
    ) -> Result<Self> {
        config.validate()?;

        let transport = Arc::new(transport);
        let (ready, _) = watch::channel(ReadyState::NotReady);

        Ok(Self {
            handshakes: HandshakeCoordinator::new(Arc::clone(&transport)),
            config,
            transport,
            trusted: OnceLock::new(),
            ready,
            combiner,
            canonicalizer: Arc::new(Blake3Canonicalizer),
            divergent_rounds: AtomicU64::new(0),
        })
    }

    /// Replace the default condition canonicalizer.
    #[must_use]
    pub fn with_canonicalizer(mut self, canonicalizer: Arc<dyn ConditionCanonicalizer>) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- lifecycle ----

    /// Handshake with every node and become `Ready` once `min_node_count`
    /// have answered.
    ///
    /// Slow nodes only delay this; it fails with [`Error::QuorumNotMet`] only
    /// once enough handshakes have failed that quorum is out of reach. Handshakes
    /// still in flight after quorum keep recording bundles but no longer
    /// affect the trusted key set.
    pub async fn connect(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        let min = self.config.min_node_count;
        self.handshakes.start(&self.config.bootstrap_urls);
        let progress = self.handshakes.wait_for_quorum(min).await?;

        if !self.handshakes.quorum_reached(min) {
            let failures = self.handshakes.failures().await;
            let cause = Error::from_failure(most_common_serialized(&failures).as_ref());
            warn!(%progress, %cause, "Handshake quorum unreachable");
            return Err(Error::QuorumNotMet {
                successes: progress.succeeded,
                required: min,
                cause: Box::new(cause),
            });
        }

        let bundles = self.handshakes.bundles().await;
        let selected = select_trusted_keys(&bundles).ok_or_else(|| Error::Unknown {
            detail: "no key material to select from".to_string(),
        })?;

        // A concurrent connect may have won; the first selection stands
        let keys = self.trusted.get_or_init(|| selected);
        self.ready.send_replace(ReadyState::Ready);

        info!(
            connected = bundles.len(),
            required = min,
            subnet_pub_key = %keys.subnet_pub_key,
            "Client ready"
        );
        Ok(())
    }

    /// Wait for `Ready` without driving the handshakes.
    pub async fn wait_until_ready(&self) -> Result<()> {
        let mut rx = self.ready.subscribe();
        rx.wait_for(|s| *s == ReadyState::Ready)
            .await
            .map_err(|_| Error::Unknown {
                detail: "readiness channel closed".to_string(),
            })?;
        Ok(())
    }

    pub fn ready_state(&self) -> ReadyState {
        *self.ready.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.ready_state() == ReadyState::Ready
    }

    /// Majority-selected keys, once ready.
    pub fn trusted_keys(&self) -> Option<&TrustedKeySet> {
        self.trusted.get()
    }

    /// Nodes that completed a handshake, in arrival order.
    pub async fn connected_nodes(&self) -> Vec<NodeEndpoint> {
        self.handshakes.connected().await
    }

    /// Per-node key material, in arrival order.
    pub async fn server_keys(&self) -> Vec<(NodeEndpoint, ServerKeyBundle)> {
        self.handshakes.server_keys().await
    }

    /// Signing rounds whose shares disagreed on the unsigned token.
    pub fn divergent_rounds(&self) -> u64 {
        self.divergent_rounds.load(Ordering::Relaxed)
    }

    // ---- signing ----

    /// Have the nodes sign the result of `call_requests` and return the
    /// signed token (`{unsigned}.{base64url signature}`).
    pub async fn get_signed_chain_data_token(
        &self,
        call_requests: &[CallRequest],
        chain: &str,
    ) -> Result<String> {
        let keys = self.require_ready()?;
        if call_requests.is_empty() {
            return Err(Error::InvalidArgument("call_requests is empty".into()));
        }

        let (iat, exp) = token_window();
        let body = to_body(&ChainDataSigningRequest {
            call_requests,
            chain,
            iat,
            exp,
        })?;

        self.sign(keys, routes::SIGN_CHAIN_DATA, &body).await
    }

    /// Have the nodes sign a token granting access to `resource_id` if
    /// `auth_sig`'s owner satisfies `conditions`.
    pub async fn get_signed_token(
        &self,
        conditions: &ConditionSet,
        chain: &str,
        auth_sig: &AuthSig,
        resource_id: &ResourceId,
    ) -> Result<String> {
        let keys = self.require_ready()?;
        conditions.ensure_not_empty()?;

        let conditions = self.canonicalizer.canonical_conditions(conditions);
        let resource_id = self.canonicalizer.canonical_resource_id(resource_id);
        let (iat, exp) = token_window();
        let body = to_body(&SigningRequest {
            conditions: &conditions,
            resource_id: &resource_id,
            auth_sig,
            chain,
            iat,
            exp,
        })?;

        self.sign(keys, routes::SIGNING_RETRIEVE, &body).await
    }

    /// Register `conditions` as the gate for signing tokens to `resource_id`.
    pub async fn save_signing_condition(
        &self,
        conditions: &ConditionSet,
        chain: &str,
        auth_sig: &AuthSig,
        resource_id: &ResourceId,
        permanent: bool,
    ) -> Result<()> {
        self.require_ready()?;
        conditions.ensure_not_empty()?;

        let body = to_body(&StoreConditionRequest {
            key: hex::encode(self.canonicalizer.hash_resource_id(resource_id)?),
            val: hex::encode(self.canonicalizer.hash_conditions(conditions)?),
            auth_sig,
            chain,
            permanent: u8::from(permanent),
        })?;

        let outcomes = self.collect::<Value>(routes::SIGNING_STORE, &body).await;
        self.settle(&outcomes)?;
        Ok(())
    }

    // ---- encryption ----

    /// Retrieve the symmetric key encrypted as `to_decrypt` (hex), if
    /// `auth_sig`'s owner satisfies `conditions`.
    pub async fn get_encryption_key(
        &self,
        conditions: &ConditionSet,
        to_decrypt: &str,
        chain: &str,
        auth_sig: &AuthSig,
    ) -> Result<Vec<u8>> {
        let keys = self.require_ready()?;
        conditions.ensure_not_empty()?;
        let ciphertext = hex::decode(to_decrypt)?;

        let conditions = self.canonicalizer.canonical_conditions(conditions);
        let body = to_body(&DecryptionRequest {
            conditions: &conditions,
            to_decrypt,
            auth_sig,
            chain,
        })?;

        let shares = self
            .share_round::<DecryptionShareResponse>(routes::ENCRYPTION_RETRIEVE, &body)
            .await?;

        let assembled = assemble(shares);
        debug!(indices = ?assembled.indices(), "Combining decryption shares");
        let inputs = assembled.decode()?;
        let pk_set = hex::decode(&keys.network_pub_key_set)?;

        self.combiner
            .combine_decryption_shares(&pk_set, &inputs, &ciphertext)
            .map_err(Error::Combiner)
    }

    /// Register `conditions` as the gate for decrypting `key` and return
    /// the encrypted key to store alongside the content.
    pub async fn save_encryption_key(
        &self,
        conditions: &ConditionSet,
        chain: &str,
        auth_sig: &AuthSig,
        key: SymmetricKey,
        permanent: bool,
    ) -> Result<Vec<u8>> {
        let keys = self.require_ready()?;
        conditions.ensure_not_empty()?;
        key.ensure_not_empty()?;

        let encrypted = match key {
            SymmetricKey::Plain(plain) => {
                let subnet_key = hex::decode(&keys.subnet_pub_key)?;
                self.combiner
                    .encrypt_under_network_key(&subnet_key, &plain)
                    .map_err(Error::Combiner)?
            }
            SymmetricKey::Encrypted(encrypted) => encrypted,
        };

        let body = to_body(&StoreConditionRequest {
            key: hex::encode(self.canonicalizer.hash_bytes(&encrypted)),
            val: hex::encode(self.canonicalizer.hash_conditions(conditions)?),
            auth_sig,
            chain,
            permanent: u8::from(permanent),
        })?;

        let outcomes = self.collect::<Value>(routes::ENCRYPTION_STORE, &body).await;
        self.settle(&outcomes)?;
        Ok(encrypted)
    }

    // ---- rounds ----

    fn require_ready(&self) -> Result<&TrustedKeySet> {
        self.trusted.get().ok_or(Error::NotReady)
    }

    /// Fan out to the connected nodes.
    async fn collect<R: DeserializeOwned>(&self, path: &str, body: &Value) -> Vec<NodeResult<R>> {
        let nodes = self.handshakes.connected().await;
        fan_out(self.transport.as_ref(), &nodes, path, body).await
    }

    /// Share round: a share that is not hex counts against its node, so
    /// it neither meets the quorum nor reaches the combiner.
    async fn share_round<R>(&self, path: &str, body: &Value) -> Result<Vec<Share>>
    where
        R: DeserializeOwned,
        Share: From<R>,
    {
        let outcomes: Vec<NodeResult<Share>> = self
            .collect::<R>(path, body)
            .await
            .into_iter()
            .map(|outcome| outcome.and_then(|r| Share::from(r).well_formed()))
            .collect();
        self.settle(&outcomes)
    }

    fn settle<V: Contribution + Clone>(&self, outcomes: &[NodeResult<V>]) -> Result<Vec<V>> {
        match reconcile(outcomes, self.config.min_node_count) {
            QuorumOutcome::Success { values } => Ok(values),
            QuorumOutcome::Failure {
                error,
                successes,
                required,
            } => Err(Error::QuorumNotMet {
                successes,
                required,
                cause: Box::new(Error::from_failure(error.as_ref())),
            }),
        }
    }

    /// Signing round: collect shares, settle on one unsigned token, combine.
    async fn sign(&self, keys: &TrustedKeySet, path: &str, body: &Value) -> Result<String> {
        let shares = self.share_round::<SigningShareResponse>(path, body).await?;

        let unsigned = match check_artifacts(&shares) {
            ArtifactCheck::Uniform(unsigned) => unsigned,
            ArtifactCheck::Divergent { canonical, distinct } => {
                self.divergent_rounds.fetch_add(1, Ordering::Relaxed);
                if self.config.artifact_policy == ArtifactPolicy::Reject {
                    return Err(Error::ArtifactMismatch { distinct });
                }
                warn!(distinct, "Combining with the majority unsigned token");
                canonical
            }
            ArtifactCheck::Absent => {
                return Err(Error::Unknown {
                    detail: "signing shares carried no unsigned token".to_string(),
                })
            }
        };

        let assembled = assemble(shares);
        debug!(indices = ?assembled.indices(), "Combining signature shares");
        let inputs = assembled.decode()?;
        let pk_set = hex::decode(&keys.network_pub_key_set)?;

        let signature = self
            .combiner
            .combine_signature_shares(&pk_set, &inputs)
            .map_err(Error::Combiner)?;

        Ok(format!("{}.{}", unsigned, URL_SAFE_NO_PAD.encode(signature)))
    }
}

/// `(iat, exp)` for a token issued now.
fn token_window() -> (u64, u64) {
    let iat = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    (iat, iat + TOKEN_LIFETIME_SECS)
}

fn to_body(request: &impl Serialize) -> Result<Value> {
    Ok(serde_json::to_value(request)?)
}
