//! EIP-712 domain of the exchange contract that settles relayed orders.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

/// Type string of the domain struct.
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// EIP-712 domain separator for order signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    /// Domain name.
    pub name: String,
    /// Domain version.
    pub version: String,
    /// Chain ID.
    #[serde(alias = "chain_id")]
    pub chain_id: u64,
    /// Verifying contract address.
    #[serde(alias = "verifying_contract")]
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// Create domain with custom parameters.
    pub fn custom(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// Compute the EIP-712 domain separator hash.
    ///
    /// Every member is encoded as a full 32-byte word, matching what an
    /// on-chain verifier computes.
    pub fn separator(&self) -> B256 {
        let domain_type_hash = keccak256(EIP712_DOMAIN_TYPE.as_bytes());
        let name_hash = keccak256(self.name.as_bytes());
        let version_hash = keccak256(self.version.as_bytes());

        let encoded = (
            domain_type_hash,
            name_hash,
            version_hash,
            U256::from(self.chain_id),
            self.verifying_contract,
        )
            .abi_encode();

        keccak256(&encoded)
    }
}
