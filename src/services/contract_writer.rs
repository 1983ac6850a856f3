use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers_core::types::{Bytes, H256};
use ethers_core::utils::keccak256;
use ethers_providers::{Http, Middleware, Provider};
use tracing::{info, warn};

use crate::models::action::InclusionReceipt;
use crate::models::errors::ActionError;
use crate::utilities::config;

/// Handle for a transaction that has been handed to the network. The
/// confirmation wait is unbounded, matching wallet semantics: a submitted
/// transaction is irrevocable, so the wait runs until the chain answers.
#[async_trait]
pub trait PendingInclusion: Send + Sync {
    async fn confirmed(self: Box<Self>) -> Result<InclusionReceipt, ActionError>;
}

/// Submits a signed contract call and returns a pending handle immediately.
#[async_trait]
pub trait ContractWriter: Send + Sync {
    async fn submit(&self, raw_tx: Bytes) -> Result<Box<dyn PendingInclusion>, ActionError>;
}

/// Production writer over an HTTP provider: broadcast the raw transaction,
/// then poll for its receipt.
pub struct RpcWriter {
    provider: Arc<Provider<Http>>,
    poll_interval: Duration,
}

impl RpcWriter {
    pub fn new() -> Result<Self, ActionError> {
        let provider = Provider::<Http>::try_from(config::get_rpc_url())
            .map_err(|e| ActionError::SubmissionRejected(format!("Invalid RPC URL: {}", e)))?;
        Ok(Self::with_provider(
            Arc::new(provider),
            Duration::from_millis(config::get_confirmation_poll_interval_ms()),
        ))
    }

    pub fn with_provider(provider: Arc<Provider<Http>>, poll_interval: Duration) -> Self {
        Self {
            provider,
            poll_interval,
        }
    }
}

#[async_trait]
impl ContractWriter for RpcWriter {
    async fn submit(&self, raw_tx: Bytes) -> Result<Box<dyn PendingInclusion>, ActionError> {
        let tx_hash = H256::from(keccak256(&raw_tx));

        match self.provider.send_raw_transaction(raw_tx).await {
            Ok(pending) => {
                info!("Broadcasted with tx hash: {:#x}", pending.tx_hash());
            }
            Err(e) => {
                warn!("Broadcast failed: {:?}", e);

                // Tolerate a node that already knows the transaction.
                match self.provider.get_transaction(tx_hash).await {
                    Ok(Some(tx)) => {
                        info!("Tx already on-chain: {:#x}", tx.hash);
                    }
                    _ => return Err(ActionError::SubmissionRejected(e.to_string())),
                }
            }
        }

        Ok(Box::new(RpcPendingInclusion {
            provider: Arc::clone(&self.provider),
            tx_hash,
            poll_interval: self.poll_interval,
        }))
    }
}

struct RpcPendingInclusion {
    provider: Arc<Provider<Http>>,
    tx_hash: H256,
    poll_interval: Duration,
}

#[async_trait]
impl PendingInclusion for RpcPendingInclusion {
    async fn confirmed(self: Box<Self>) -> Result<InclusionReceipt, ActionError> {
        loop {
            match self.provider.get_transaction_receipt(self.tx_hash).await {
                Ok(Some(receipt)) => {
                    let succeeded = receipt.status.map(|s| s.as_u64() == 1).unwrap_or(false);
                    return Ok(InclusionReceipt {
                        tx_hash: format!("{:#x}", self.tx_hash),
                        block_number: receipt.block_number.map(|b| b.as_u64()),
                        succeeded,
                    });
                }
                Ok(None) => {
                    // Still pending, keep waiting.
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    return Err(ActionError::InclusionFailed(format!(
                        "Error fetching tx receipt: {e}"
                    )));
                }
            }
        }
    }
}
