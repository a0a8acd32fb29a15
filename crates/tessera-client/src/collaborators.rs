//! External collaborators.
//!
//! The client coordinates nodes; it does not do threshold cryptography or
//! condition canonicalization itself. Both are injected behind these traits
//! and treated as opaque pure functions. The client's obligation is to hand
//! them correctly ordered, correctly decoded inputs.

use tessera_quorum::ShareInput;

use crate::conditions::{ConditionSet, ResourceId};
use crate::error::Result;

/// Threshold cryptography backend (BLS combine / encrypt).
pub trait ThresholdCombiner: Send + Sync {
    /// Combine signature shares (ordered by index) into one signature.
    fn combine_signature_shares(
        &self,
        public_key_set: &[u8],
        shares: &[ShareInput],
    ) -> std::result::Result<Vec<u8>, String>;

    /// Combine decryption shares (ordered by index) and decrypt `ciphertext`.
    fn combine_decryption_shares(
        &self,
        public_key_set: &[u8],
        shares: &[ShareInput],
        ciphertext: &[u8],
    ) -> std::result::Result<Vec<u8>, String>;

    /// Encrypt `plaintext` under the network's public key.
    fn encrypt_under_network_key(
        &self,
        public_key: &[u8],
        plaintext: &[u8],
    ) -> std::result::Result<Vec<u8>, String>;
}

/// Canonical form and hashing of request parameters.
pub trait ConditionCanonicalizer: Send + Sync {
    /// Canonical form sent to the nodes.
    fn canonical_conditions(&self, conditions: &ConditionSet) -> ConditionSet;

    /// Canonical form of a resource id sent to the nodes.
    fn canonical_resource_id(&self, resource_id: &ResourceId) -> ResourceId;

    /// Hash addressing a condition set on the nodes.
    fn hash_conditions(&self, conditions: &ConditionSet) -> Result<Vec<u8>>;

    /// Hash addressing a resource on the nodes.
    fn hash_resource_id(&self, resource_id: &ResourceId) -> Result<Vec<u8>>;

    /// Hash addressing an encrypted key on the nodes.
    fn hash_bytes(&self, bytes: &[u8]) -> Vec<u8>;
}

/// Identity canonical form, BLAKE3 over the canonical JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Canonicalizer;

impl ConditionCanonicalizer for Blake3Canonicalizer {
    fn canonical_conditions(&self, conditions: &ConditionSet) -> ConditionSet {
        conditions.clone()
    }

    fn canonical_resource_id(&self, resource_id: &ResourceId) -> ResourceId {
        resource_id.clone()
    }

    fn hash_conditions(&self, conditions: &ConditionSet) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(&self.canonical_conditions(conditions))?;
        Ok(self.hash_bytes(&json))
    }

    fn hash_resource_id(&self, resource_id: &ResourceId) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(&self.canonical_resource_id(resource_id))?;
        Ok(self.hash_bytes(&json))
    }

    fn hash_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        blake3::hash(bytes).as_bytes().to_vec()
    }
}
