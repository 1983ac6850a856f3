//! Approval-aware mint/deposit action flows for a vault dapp.
//!
//! The crate models the non-rendering half of the mint and deposit dialogs:
//! loading token metadata in one batched read, deriving the button state
//! from balance/allowance, submitting a single state-changing transaction
//! through the connected signer, and refreshing after confirmation.

pub mod models;
pub mod services;
pub mod state_machine;
pub mod utilities;
