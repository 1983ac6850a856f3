use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use ethers_core::abi::Token;
use ethers_core::types::U256 as EthersU256;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::models::errors::ActionError;
use crate::models::token::VaultDescriptor;
use crate::utilities::amounts::parse_units;
use crate::utilities::calldata::encode_call;

/// The two state-changing dialog actions. Mint targets the test token
/// itself; deposit targets the vault.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Mint,
    Deposit,
}

impl ActionKind {
    pub fn method_signature(&self) -> &'static str {
        match self {
            ActionKind::Mint => "mint(uint256)",
            ActionKind::Deposit => "deposit(uint256)",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Mint => "Mint",
            ActionKind::Deposit => "Deposit",
        }
    }

    pub fn progress_label(&self) -> &'static str {
        match self {
            ActionKind::Mint => "Minting",
            ActionKind::Deposit => "Depositing",
        }
    }

    pub fn past_label(&self) -> &'static str {
        match self {
            ActionKind::Mint => "Minted",
            ActionKind::Deposit => "Deposited",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Ephemeral input to one submission: the target contract and the amount in
/// smallest units, with the user's pre-scaling input echoed for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub target: String,
    pub amount: U256,
    pub amount_formatted: String,
}

impl ActionRequest {
    pub fn from_input(target: &str, input: &str, decimals: u8) -> Result<Self, ActionError> {
        let amount = parse_units(input, decimals)?;
        if amount.is_zero() {
            return Err(ActionError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            target: target.to_string(),
            amount,
            amount_formatted: input.trim().to_string(),
        })
    }
}

/// A prepared contract call, ready for the session signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCall {
    pub to: String,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl WriteCall {
    pub fn for_request(kind: ActionKind, request: &ActionRequest, chain_id: u64) -> Self {
        let amount = EthersU256(*request.amount.as_limbs());
        Self {
            to: request.target.clone(),
            data: encode_call(kind.method_signature(), &[Token::Uint(amount)]),
            chain_id,
        }
    }
}

/// Chain-level result of the inclusion wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub succeeded: bool,
}

/// What the dialog keeps after a settled attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub succeeded: bool,
    pub explorer_url: String,
    pub confirmed_at: DateTime<Utc>,
}

/// Transient outcome of one submission attempt. A confirmed transaction
/// whose post-action callback failed is reported separately rather than
/// collapsed into `Failure`: the funds already moved.
#[derive(Debug)]
pub enum ActionOutcome {
    Success(ActionReceipt),
    SuccessWithCallbackFailure {
        receipt: ActionReceipt,
        error: String,
    },
    Failure(ActionError),
    Cancelled,
}

pub type CallbackFuture = BoxFuture<'static, Result<(), String>>;

/// Optional per-vault follow-up invoked after a confirmed deposit.
pub type PostActionCallback = Arc<dyn Fn(VaultDescriptor) -> CallbackFuture + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_request_scales_by_decimals() {
        let request = ActionRequest::from_input("0xvault", "10", 18).unwrap();
        assert_eq!(
            request.amount,
            U256::from_str("10000000000000000000").unwrap()
        );
        assert_eq!(request.amount_formatted, "10");
        assert_eq!(request.target, "0xvault");
    }

    #[test]
    fn test_request_rejects_zero_and_garbage() {
        assert!(matches!(
            ActionRequest::from_input("0xvault", "0", 18),
            Err(ActionError::InvalidAmount(_))
        ));
        assert!(ActionRequest::from_input("0xvault", "ten", 18).is_err());
        assert!(ActionRequest::from_input("0xvault", "", 18).is_err());
    }

    #[test]
    fn test_write_call_encodes_method_and_amount() {
        let request = ActionRequest::from_input("0xvault", "1", 0).unwrap();
        let call = WriteCall::for_request(ActionKind::Deposit, &request, 10);
        assert_eq!(call.chain_id, 10);
        assert_eq!(hex::encode(&call.data[..4]), "b6b55f25");
        assert_eq!(call.data.len(), 36);
        assert_eq!(*call.data.last().unwrap(), 1);

        let call = WriteCall::for_request(ActionKind::Mint, &request, 10);
        assert_eq!(hex::encode(&call.data[..4]), "a0712d68");
    }
}
