use std::sync::Arc;

use alloy_primitives::U256;
use anyhow::Result;
use async_trait::async_trait;
use ethers_core::abi::{decode, ParamType, Token};
use ethers_core::types::{Address, U256 as EthersU256};
use once_cell::sync::Lazy;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use crate::models::errors::ReadError;
use crate::models::token::TokenRecord;
use crate::utilities::calldata::encode_call;
use crate::utilities::config;

static SHARED_CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// One read descriptor: a contract and the calldata to eth_call against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCall {
    pub to: String,
    pub data: Vec<u8>,
}

/// Executes a set of read descriptors as one logical batch, returning the
/// raw return data in request order.
#[async_trait]
pub trait BatchReader: Send + Sync {
    async fn read_batch(&self, calls: &[ReadCall]) -> Result<Vec<Vec<u8>>, ReadError>;
}

/// Production reader: a single JSON-RPC batch request (an array of
/// `eth_call` payloads with sequential ids) against the chain endpoint.
/// The node may answer in any order; results are matched back by id so the
/// caller can destructure positionally.
pub struct JsonRpcBatchReader {
    client: Client,
    rpc_url: String,
}

impl JsonRpcBatchReader {
    pub fn new() -> Self {
        Self::with_url(config::get_rpc_url())
    }

    pub fn with_url(rpc_url: String) -> Self {
        Self {
            client: SHARED_CLIENT.clone(),
            rpc_url,
        }
    }
}

#[async_trait]
impl BatchReader for JsonRpcBatchReader {
    async fn read_batch(&self, calls: &[ReadCall]) -> Result<Vec<Vec<u8>>, ReadError> {
        let payload: Vec<Value> = calls
            .iter()
            .enumerate()
            .map(|(id, call)| {
                json!({
                    "jsonrpc": "2.0",
                    "method": "eth_call",
                    "params": [
                        { "to": call.to, "data": format!("0x{}", hex::encode(&call.data)) },
                        "latest"
                    ],
                    "id": id
                })
            })
            .collect();

        let response = self.client.post(&self.rpc_url).json(&payload).send().await;
        let body = validate_response("eth_call batch", response).await?;
        order_batch_results(&body, calls.len())
    }
}

async fn validate_response(
    endpoint: &str,
    response: std::result::Result<Response, reqwest::Error>,
) -> std::result::Result<Value, ReadError> {
    match response {
        Ok(resp) => {
            let body = resp.text().await.map_err(|e| {
                ReadError::Network(format!("Failed to read {} response: {:?}", endpoint, e))
            })?;
            log::debug!("{} Response: {}", endpoint, body);

            serde_json::from_str(&body).map_err(|e| {
                ReadError::InvalidResponse(format!("{} JSON parse error: {:?}", endpoint, e))
            })
        }
        Err(e) => {
            log::error!("{} request failed: {:?}", endpoint, e);

            Err(ReadError::Network(format!("{} request failed: {:?}", endpoint, e)))
        }
    }
}

fn order_batch_results(body: &Value, expected: usize) -> Result<Vec<Vec<u8>>, ReadError> {
    let entries = body
        .as_array()
        .ok_or_else(|| ReadError::InvalidResponse("batch response is not an array".to_string()))?;

    let mut ordered: Vec<Option<Vec<u8>>> = vec![None; expected];
    for entry in entries {
        let id = entry
            .get("id")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| ReadError::InvalidResponse("entry missing id".to_string()))?;

        if let Some(err) = entry.get("error") {
            return Err(ReadError::InvalidResponse(format!(
                "call {} failed: {}",
                id, err
            )));
        }

        let result = entry
            .get("result")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ReadError::IncompleteResponse(format!("call {} missing result", id))
            })?;

        let bytes = hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| ReadError::InvalidResponse(format!("call {}: {:?}", id, e)))?;

        let slot = ordered
            .get_mut(id as usize)
            .ok_or_else(|| ReadError::InvalidResponse(format!("unexpected id {}", id)))?;
        *slot = Some(bytes);
    }

    ordered
        .into_iter()
        .enumerate()
        .map(|(id, slot)| {
            slot.ok_or_else(|| ReadError::IncompleteResponse(format!("call {} unanswered", id)))
        })
        .collect()
}

/// Loads the dialog's token snapshot: symbol, decimals, the account's
/// balance, and the vault allowance, in one batch.
pub struct TokenInfoLoader {
    reader: Arc<dyn BatchReader>,
}

impl TokenInfoLoader {
    pub fn new(reader: Arc<dyn BatchReader>) -> Self {
        Self { reader }
    }

    pub async fn load(
        &self,
        token_address: &str,
        account: &str,
        spender: &str,
    ) -> Result<TokenRecord, ReadError> {
        token_address
            .parse::<Address>()
            .map_err(|_| ReadError::InvalidAddress(token_address.to_string()))?;
        let account_addr: Address = account
            .parse()
            .map_err(|_| ReadError::InvalidAddress(account.to_string()))?;
        let spender_addr: Address = spender
            .parse()
            .map_err(|_| ReadError::InvalidAddress(spender.to_string()))?;

        let calls = [
            ReadCall {
                to: token_address.to_string(),
                data: encode_call("symbol()", &[]),
            },
            ReadCall {
                to: token_address.to_string(),
                data: encode_call("decimals()", &[]),
            },
            ReadCall {
                to: token_address.to_string(),
                data: encode_call("balanceOf(address)", &[Token::Address(account_addr)]),
            },
            ReadCall {
                to: token_address.to_string(),
                data: encode_call(
                    "allowance(address,address)",
                    &[Token::Address(account_addr), Token::Address(spender_addr)],
                ),
            },
        ];

        let results = self.reader.read_batch(&calls).await?;
        let [symbol_ret, decimals_ret, balance_ret, allowance_ret]: [Vec<u8>; 4] =
            results.try_into().map_err(|_| {
                ReadError::IncompleteResponse("expected four results".to_string())
            })?;

        let symbol = decode_string(&symbol_ret)?;
        let decimals = decode_u8(&decimals_ret)?;
        let balance = to_alloy(decode_uint(&balance_ret)?);
        let allowance = to_alloy(decode_uint(&allowance_ret)?);

        Ok(TokenRecord::new(symbol, decimals, balance, allowance))
    }
}

fn decode_string(data: &[u8]) -> Result<String, ReadError> {
    let tokens = decode(&[ParamType::String], data)?;
    match tokens.into_iter().next() {
        Some(Token::String(s)) => Ok(s),
        _ => Err(ReadError::Decode("expected a string return".to_string())),
    }
}

fn decode_uint(data: &[u8]) -> Result<EthersU256, ReadError> {
    let tokens = decode(&[ParamType::Uint(256)], data)?;
    match tokens.into_iter().next() {
        Some(Token::Uint(u)) => Ok(u),
        _ => Err(ReadError::Decode("expected a uint return".to_string())),
    }
}

fn decode_u8(data: &[u8]) -> Result<u8, ReadError> {
    let value = decode_uint(data)?;
    if value > EthersU256::from(u8::MAX) {
        return Err(ReadError::Decode(format!("decimals out of range: {}", value)));
    }
    Ok(value.as_u64() as u8)
}

fn to_alloy(value: EthersU256) -> U256 {
    U256::from_limbs(value.0)
}
