//! JSON-RPC client for the read-only chain calls the relay makes.

use crate::types::TokenMetadata;
use crate::{Error, Result};
use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

/// `isValidSignature(bytes32,bytes)` selector; also the EIP-1271 magic value.
pub const EIP1271_MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// ERC-20 `name()` selector.
const NAME_SELECTOR: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];

/// ERC-20 `symbol()` selector.
const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];

/// ERC-20 `decimals()` selector.
const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// Chain RPC client for contract code and `eth_call` queries.
pub struct ChainClient {
    rpc_url: String,
    http_client: reqwest::Client,
}

impl ChainClient {
    /// Create a new chain client with a custom RPC URL.
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Deployed bytecode at `address` (empty for externally owned accounts).
    pub async fn get_code(&self, address: Address) -> Result<Vec<u8>> {
        let response: JsonRpcResponse<String> = self
            .rpc_call(
                "eth_getCode",
                serde_json::json!([format!("{:#x}", address), "latest"]),
            )
            .await?;
        decode_hex(&response.into_result()?)
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let params = serde_json::json!([
            {
                "to": format!("{:#x}", to),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest"
        ]);
        let response: JsonRpcResponse<String> = self.rpc_call("eth_call", params).await?;
        decode_hex(&response.into_result()?)
    }

    /// Ask a contract wallet whether it accepts `signature` over `digest`.
    ///
    /// Addresses without code are never valid signers here.
    pub async fn is_valid_signature(
        &self,
        contract: Address,
        digest: B256,
        signature: &[u8],
    ) -> Result<bool> {
        if self.get_code(contract).await?.is_empty() {
            return Ok(false);
        }

        let output = self
            .call(contract, &encode_is_valid_signature(digest, signature))
            .await?;

        Ok(output.len() >= 4 && output[..4] == EIP1271_MAGIC_VALUE)
    }

    /// Read `name()`, `symbol()` and `decimals()` from a token contract.
    pub async fn token_metadata(&self, token: Address) -> Result<TokenMetadata> {
        let name = decode_string(&self.call(token, &NAME_SELECTOR).await?)?;
        let symbol = decode_string(&self.call(token, &SYMBOL_SELECTOR).await?)?;
        let decimals = decode_u8(&self.call(token, &DECIMALS_SELECTOR).await?)?;

        Ok(TokenMetadata {
            name,
            symbol,
            decimals,
        })
    }

    async fn rpc_call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<JsonRpcResponse<T>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Rpc {
                message: format!("RPC request failed: {}", response.status()),
            });
        }

        Ok(response.json().await?)
    }
}

/// Calldata for `isValidSignature(bytes32 hash, bytes signature)`.
pub fn encode_is_valid_signature(digest: B256, signature: &[u8]) -> Vec<u8> {
    let mut data = EIP1271_MAGIC_VALUE.to_vec();
    data.extend((digest, Bytes::copy_from_slice(signature)).abi_encode_params());
    data
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    hex::decode(text.trim_start_matches("0x")).map_err(|e| Error::Rpc {
        message: format!("invalid hex in RPC result: {}", e),
    })
}

fn word_as_usize(data: &[u8], at: usize) -> Option<usize> {
    let word = data.get(at..at + 32)?;
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(buf)).ok()
}

/// Decode an ABI-encoded dynamic `string` return value.
fn decode_string(data: &[u8]) -> Result<String> {
    let invalid = || Error::Rpc {
        message: "invalid ABI string".to_string(),
    };
    let offset = word_as_usize(data, 0).ok_or_else(invalid)?;
    let len = word_as_usize(data, offset).ok_or_else(invalid)?;
    let start = offset.checked_add(32).ok_or_else(invalid)?;
    let bytes = data
        .get(start..start.checked_add(len).ok_or_else(invalid)?)
        .ok_or_else(invalid)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| invalid())
}

/// Decode an ABI-encoded `uint8` return value.
fn decode_u8(data: &[u8]) -> Result<u8> {
    word_as_usize(data, 0)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| Error::Rpc {
            message: "invalid ABI uint8".to_string(),
        })
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

impl<T> JsonRpcResponse<T> {
    fn into_result(self) -> Result<T> {
        match (self.result, self.error) {
            (Some(result), _) => Ok(result),
            (None, Some(error)) => Err(Error::Rpc {
                message: format!("{} (code {})", error.message, error.code),
            }),
            (None, None) => Err(Error::Rpc {
                message: "No result in response".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_signature_calldata_layout() {
        let digest = B256::repeat_byte(0xab);
        let signature = [0x11u8; 65];
        let data = encode_is_valid_signature(digest, &signature);

        assert_eq!(&data[..4], &EIP1271_MAGIC_VALUE);
        assert_eq!(&data[4..36], digest.as_slice());
        // offset of the bytes argument
        assert_eq!(data[67], 0x40);
        // length word
        assert_eq!(data[99], 65);
        assert_eq!(&data[100..165], &signature[..]);
        // padded to a whole word
        assert_eq!(data.len(), 4 + 32 * 3 + 96);
    }

    #[test]
    fn test_decode_string() {
        let mut data = vec![0u8; 96];
        data[31] = 0x20;
        data[63] = 4;
        data[64..68].copy_from_slice(b"USDC");
        assert_eq!(decode_string(&data).unwrap(), "USDC");

        assert!(decode_string(&data[..40]).is_err());
    }

    #[test]
    fn test_decode_u8() {
        let mut data = vec![0u8; 32];
        data[31] = 18;
        assert_eq!(decode_u8(&data).unwrap(), 18);

        data[30] = 1;
        assert!(decode_u8(&data).is_err());
    }

    #[test]
    fn test_rpc_error_is_surfaced() {
        let response: JsonRpcResponse<String> = serde_json::from_value(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "execution reverted"}
        }))
        .unwrap();
        let err = response.into_result().unwrap_err();
        assert!(err.to_string().contains("execution reverted"));
    }
}
