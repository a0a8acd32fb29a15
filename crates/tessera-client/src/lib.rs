//! Tessera Client - threshold shares from a quorum of semi-trusted nodes
//!
//! Connects to a fixed node set, trusts key material only when a majority
//! of a quorum reports it, and turns per-node shares into signed tokens and
//! decryption keys through an injected threshold combiner.
//!
//! # Architecture
//!
//! - **Transport**: one request/response exchange with one node ([`NodeTransport`])
//! - **Handshake**: concurrent handshakes, released on quorum ([`HandshakeCoordinator`])
//! - **Keys**: per-field majority vote over handshake bundles ([`select_trusted_keys`])
//! - **Fanout**: one command to every connected node, all awaited ([`fan_out`])
//! - **Client**: readiness state machine and data-plane operations ([`NodeQuorumClient`])
//!
//! Reconciliation, majority vote and share ordering live in `tessera-quorum`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tessera_client::{ClientConfig, NodeQuorumClient, ThresholdCombiner};
//!
//! async fn run(combiner: Arc<dyn ThresholdCombiner>) -> tessera_client::Result<()> {
//!     let client = NodeQuorumClient::new(ClientConfig::load()?, combiner)?;
//!     client.connect().await?;
//!     println!("{:?}", client.trusted_keys());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod collaborators;
pub mod conditions;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod fanout;
pub mod handshake;
pub mod keys;
pub mod protocol;
pub mod transport;

pub use client::{NodeQuorumClient, ReadyState};
pub use collaborators::{Blake3Canonicalizer, ConditionCanonicalizer, ThresholdCombiner};
pub use conditions::{
    AccessControlCondition, AuthSig, CallRequest, ConditionSet, Entry, EvmContractCondition,
    Operator, ResourceId, ReturnValueTest, SolRpcCondition, SymmetricKey, UnifiedCondition,
};
pub use config::{ArtifactPolicy, ClientConfig, ConfigOverride};
pub use endpoint::NodeEndpoint;
pub use error::{Error, Result};
pub use fanout::fan_out;
pub use handshake::{HandshakeCoordinator, HandshakeProgress};
pub use keys::{select_trusted_keys, ServerKeyBundle, TrustedKeySet};
pub use transport::{HttpTransport, NodeTransport};

pub use tessera_quorum::{NodeFailure, NodeResult, Share, ShareInput};
