//! Node wire protocol: routes and JSON bodies.

use serde::{Deserialize, Serialize};
use tessera_quorum::Share;

use crate::conditions::{AuthSig, CallRequest, ConditionSet, ResourceId};

/// Header identifying the client build to the nodes.
pub const VERSION_HEADER: &str = "tessera-client-version";

/// Value sent in [`VERSION_HEADER`].
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Node routes.
pub mod routes {
    pub const HANDSHAKE: &str = "/web/handshake";
    pub const SIGN_CHAIN_DATA: &str = "/web/signing/sign_chain_data";
    pub const SIGNING_RETRIEVE: &str = "/web/signing/retrieve";
    pub const SIGNING_STORE: &str = "/web/signing/store";
    pub const ENCRYPTION_RETRIEVE: &str = "/web/encryption/retrieve";
    pub const ENCRYPTION_STORE: &str = "/web/encryption/store";
}

/// Lifetime of a signed token, in seconds.
pub const TOKEN_LIFETIME_SECS: u64 = 12 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeRequest {
    pub client_public_key: String,
}

impl Default for HandshakeRequest {
    fn default() -> Self {
        Self {
            client_public_key: "test".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeResponse {
    pub server_public_key: String,
    pub subnet_public_key: String,
    pub network_public_key: String,
    pub network_public_key_set: String,
}

/// Body for sign-chain-data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDataSigningRequest<'a> {
    pub call_requests: &'a [CallRequest],
    pub chain: &'a str,
    pub iat: u64,
    pub exp: u64,
}

/// Body for signing-share retrieval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequest<'a> {
    #[serde(flatten)]
    pub conditions: &'a ConditionSet,
    pub resource_id: &'a ResourceId,
    pub auth_sig: &'a AuthSig,
    pub chain: &'a str,
    pub iat: u64,
    pub exp: u64,
}

/// Body for decryption-share retrieval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionRequest<'a> {
    #[serde(flatten)]
    pub conditions: &'a ConditionSet,
    /// Hex-encoded ciphertext.
    pub to_decrypt: &'a str,
    pub auth_sig: &'a AuthSig,
    pub chain: &'a str,
}

/// Body for both condition-store routes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConditionRequest<'a> {
    /// Hex hash of the resource id or encrypted key.
    pub key: String,
    /// Hex hash of the conditions.
    pub val: String,
    pub auth_sig: &'a AuthSig,
    pub chain: &'a str,
    /// Nodes read this field under its historical spelling.
    #[serde(rename = "permanant")]
    pub permanent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningShareResponse {
    pub share_index: u32,
    /// Empty when the node refused to sign.
    #[serde(default)]
    pub signature_share: String,
    pub unsigned_jwt: String,
}

impl From<SigningShareResponse> for Share {
    fn from(r: SigningShareResponse) -> Self {
        Share::new(r.share_index, r.signature_share).with_artifact(r.unsigned_jwt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionShareResponse {
    pub share_index: u32,
    #[serde(default)]
    pub decryption_share: String,
}

impl From<DecryptionShareResponse> for Share {
    fn from(r: DecryptionShareResponse) -> Self {
        Share::new(r.share_index, r.decryption_share)
    }
}
