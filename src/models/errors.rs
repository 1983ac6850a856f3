use ethers_core::abi::Error as AbiError;
use ethers_providers::ProviderError;
use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Failures of the batched metadata read. Recovered locally: the dialog
/// keeps its placeholders and the submit path stays guarded.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Incomplete RPC response: {0}")]
    IncompleteResponse(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to decode call result: {0}")]
    Decode(String),
}

impl From<ReqwestError> for ReadError {
    fn from(err: ReqwestError) -> Self {
        ReadError::Network(err.to_string())
    }
}

impl From<SerdeJsonError> for ReadError {
    fn from(err: SerdeJsonError) -> Self {
        ReadError::InvalidResponse(err.to_string())
    }
}

impl From<AbiError> for ReadError {
    fn from(err: AbiError) -> Self {
        ReadError::Decode(err.to_string())
    }
}

/// Failures of a submission attempt. All of these are caught at the
/// submission boundary and converted to notices; none escape as panics.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("No token data loaded")]
    NotReady,

    #[error("A submission is already in flight")]
    AlreadyInFlight,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Confirmation wait failed: {0}")]
    InclusionFailed(String),

    #[error("Post-action callback failed: {0}")]
    Callback(String),

    #[error("Invalid transition from event '{event}' in phase '{phase}'")]
    InvalidStateTransition { event: String, phase: String },
}

impl From<ProviderError> for ActionError {
    fn from(err: ProviderError) -> Self {
        ActionError::InclusionFailed(err.to_string())
    }
}
