use std::fmt;
use std::fmt::Formatter;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::types::Bytes;
use serde::{Deserialize, Serialize};

use crate::models::action::WriteCall;
use crate::models::errors::ActionError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    OptimismMainnet,
    OptimismSepolia,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::OptimismMainnet => 10,
            Network::OptimismSepolia => 11155420,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Network::OptimismMainnet => "OptimismMainnet",
            Network::OptimismSepolia => "OptimismSepolia",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "optimismmainnet" | "mainnet" => Ok(Network::OptimismMainnet),
            "optimismsepolia" | "testnet" => Ok(Network::OptimismSepolia),
            _ => Err(format!("Invalid network: {}", s)),
        }
    }
}

/// Signs a prepared contract call into raw transaction bytes. Supplied by
/// the embedding wallet; the flow never sees key material.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_call(&self, call: &WriteCall) -> Result<Bytes, ActionError>;
}

/// Explicit wallet session threaded into the loader and the action flow.
/// Acquired when the wallet connects, dropped on disconnect; nothing here
/// is process-global.
#[derive(Clone)]
pub struct WalletSession {
    pub account: String,
    pub network: Network,
    pub signer: Arc<dyn TransactionSigner>,
}

impl WalletSession {
    pub fn new(account: String, network: Network, signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            account,
            network,
            signer,
        }
    }
}
