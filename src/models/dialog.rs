use rust_decimal::prelude::FromStr;
use rust_decimal::Decimal;

use crate::models::action::{ActionKind, ActionReceipt};
use crate::models::token::TokenRecord;
use crate::utilities::amounts::to_decimal;

/// Placeholder shown for balance/allowance before a record is loaded.
pub const PLACEHOLDER: &str = "-";

fn parse_positive_decimal(input: &str) -> Option<Decimal> {
    Decimal::from_str(input.trim())
        .ok()
        .filter(|d| d.is_sign_positive() && !d.is_zero())
}

/// True iff the requested amount strictly exceeds the current allowance,
/// compared in decimal space. Equality passes. Unparseable input never
/// flags (the button is disabled for other reasons).
pub fn needs_approval(input: &str, record: &TokenRecord) -> bool {
    match parse_positive_decimal(input) {
        Some(amount) => amount > to_decimal(&record.allowance_formatted),
        None => false,
    }
}

/// True iff the requested amount strictly exceeds the current balance.
pub fn insufficient_balance(input: &str, record: &TokenRecord) -> bool {
    match parse_positive_decimal(input) {
        Some(amount) => amount > to_decimal(&record.balance_formatted),
        None => false,
    }
}

/// Derived state of the dialog's action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    ConnectWallet,
    AwaitingData,
    AmountMissing,
    NeedApproveMore,
    InsufficientBalance,
    InFlight,
    Ready,
}

impl ButtonState {
    pub fn enabled(&self) -> bool {
        matches!(self, ButtonState::Ready)
    }
}

/// Local, per-instance dialog state. Owned exclusively by one dialog;
/// nothing here is shared or cached across instances.
#[derive(Debug, Clone)]
pub struct DialogSession {
    kind: ActionKind,
    open: bool,
    input_value: String,
    token: Option<TokenRecord>,
    receipt: Option<ActionReceipt>,
}

impl DialogSession {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            open: false,
            input_value: String::new(),
            token: None,
            receipt: None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closing resets local UI state. It does not cancel an in-flight
    /// confirmation wait: the transaction is irrevocable once submitted.
    pub fn close(&mut self) {
        self.open = false;
        self.input_value.clear();
        self.token = None;
        self.receipt = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_input(&mut self, value: &str) {
        self.input_value = value.to_string();
    }

    pub fn clear_input(&mut self) {
        self.input_value.clear();
    }

    pub fn input_value(&self) -> &str {
        &self.input_value
    }

    pub fn token(&self) -> Option<&TokenRecord> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, record: Option<TokenRecord>) {
        self.token = record;
    }

    pub fn receipt(&self) -> Option<&ActionReceipt> {
        self.receipt.as_ref()
    }

    pub fn set_receipt(&mut self, receipt: Option<ActionReceipt>) {
        self.receipt = receipt;
    }

    pub fn balance_display(&self) -> String {
        match &self.token {
            Some(record) => format!("{} {}", record.balance_formatted, record.symbol),
            None => PLACEHOLDER.to_string(),
        }
    }

    pub fn allowance_display(&self) -> String {
        match &self.token {
            Some(record) => format!("{} {}", record.allowance_formatted, record.symbol),
            None => PLACEHOLDER.to_string(),
        }
    }

    pub fn button_state(&self, connected: bool, in_flight: bool) -> ButtonState {
        if !connected {
            return ButtonState::ConnectWallet;
        }
        let record = match &self.token {
            Some(record) => record,
            None => return ButtonState::AwaitingData,
        };
        if in_flight {
            return ButtonState::InFlight;
        }
        if parse_positive_decimal(&self.input_value).is_none() {
            return ButtonState::AmountMissing;
        }
        if needs_approval(&self.input_value, record) {
            return ButtonState::NeedApproveMore;
        }
        if insufficient_balance(&self.input_value, record) {
            return ButtonState::InsufficientBalance;
        }
        ButtonState::Ready
    }

    pub fn button_label(&self, state: ButtonState) -> &'static str {
        match state {
            ButtonState::ConnectWallet => "Connect Wallet",
            ButtonState::NeedApproveMore => "Need Approve More",
            ButtonState::InsufficientBalance => "Insufficient Balance",
            ButtonState::InFlight => "Waiting for Confirmation",
            ButtonState::AwaitingData | ButtonState::AmountMissing | ButtonState::Ready => {
                self.kind.label()
            }
        }
    }
}
