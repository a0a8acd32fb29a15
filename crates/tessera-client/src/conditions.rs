//! Typed request parameters.
//!
//! Every condition-list shape is its own [`ConditionSet`] variant, so "pass
//! exactly one of these lists" is enforced by the type system. The only
//! argument checks left at runtime are empty lists and empty keys.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Boolean operator joining adjacent conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

/// One element of a condition list: a condition or an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry<C> {
    Operator { operator: Operator },
    Condition(C),
}

/// Comparison applied to the value a condition reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnValueTest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub comparator: String,
    pub value: String,
}

/// Basic EVM condition (ERC20 / ERC721 / ERC1155 and similar reads).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlCondition {
    pub contract_address: String,
    pub chain: String,
    pub standard_contract_type: String,
    pub method: String,
    pub parameters: Vec<String>,
    pub return_value_test: ReturnValueTest,
}

/// Arbitrary EVM contract call condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmContractCondition {
    pub contract_address: String,
    pub chain: String,
    pub function_name: String,
    pub function_params: Vec<String>,
    /// ABI of the single function being called.
    pub function_abi: serde_json::Value,
    pub return_value_test: ReturnValueTest,
}

/// Solana RPC condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolRpcCondition {
    pub method: String,
    pub params: Vec<serde_json::Value>,
    pub chain: String,
    pub return_value_test: ReturnValueTest,
}

/// A condition inside a unified list, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "conditionType", rename_all = "camelCase")]
pub enum UnifiedCondition {
    EvmBasic(AccessControlCondition),
    EvmContract(EvmContractCondition),
    SolRpc(SolRpcCondition),
}

/// The conditions a requester must satisfy, in exactly one shape.
///
/// Serializes as a single-key object (`{"accessControlConditions": [...]}`)
/// so it can be flattened into node request bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionSet {
    #[serde(rename = "accessControlConditions")]
    AccessControl(Vec<Entry<AccessControlCondition>>),
    #[serde(rename = "evmContractConditions")]
    EvmContract(Vec<Entry<EvmContractCondition>>),
    #[serde(rename = "solRpcConditions")]
    SolRpc(Vec<Entry<SolRpcCondition>>),
    #[serde(rename = "unifiedAccessControlConditions")]
    Unified(Vec<Entry<UnifiedCondition>>),
}

impl ConditionSet {
    pub fn len(&self) -> usize {
        match self {
            Self::AccessControl(c) => c.len(),
            Self::EvmContract(c) => c.len(),
            Self::SolRpc(c) => c.len(),
            Self::Unified(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wire name of the list.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AccessControl(_) => "accessControlConditions",
            Self::EvmContract(_) => "evmContractConditions",
            Self::SolRpc(_) => "solRpcConditions",
            Self::Unified(_) => "unifiedAccessControlConditions",
        }
    }

    pub(crate) fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidArgument(format!("{} is empty", self.kind())));
        }
        Ok(())
    }
}

/// Wallet signature proving the requester controls an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSig {
    pub sig: String,
    pub derived_via: String,
    pub signed_message: String,
    pub address: String,
}

/// The web resource a signed token grants access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub base_url: String,
    pub path: String,
    pub org_id: String,
    pub role: String,
    pub extra_data: String,
}

/// A contract read whose result the nodes sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Hex-encoded call data.
    pub data: String,
}

/// The key to register with the nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymmetricKey {
    /// Raw key; encrypted under the subnet key before anything is sent.
    Plain(Vec<u8>),
    /// Already encrypted under the subnet key.
    Encrypted(Vec<u8>),
}

impl SymmetricKey {
    pub(crate) fn ensure_not_empty(&self) -> Result<()> {
        let bytes = match self {
            Self::Plain(k) | Self::Encrypted(k) => k,
        };
        if bytes.is_empty() {
            return Err(Error::InvalidArgument("symmetric key is empty".into()));
        }
        Ok(())
    }
}
