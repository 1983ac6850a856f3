use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::models::action::{
    ActionKind, ActionOutcome, ActionReceipt, ActionRequest, PostActionCallback, WriteCall,
};
use crate::models::dialog::{insufficient_balance, needs_approval, ButtonState, DialogSession};
use crate::models::errors::{ActionError, ReadError};
use crate::models::notifications::FlowNotice;
use crate::models::session::WalletSession;
use crate::models::token::{TokenRecord, VaultDescriptor};
use crate::services::contract_writer::ContractWriter;
use crate::services::notification_services::NotificationSink;
use crate::services::token_info::TokenInfoLoader;
use crate::state_machine::submission::{SubmissionEvent, SubmissionMachine, SubmissionPhase, Transition};
use crate::utilities::explorer::transaction_url;
use crate::utilities::id_generator::generate_attempt_id;

/// Drives one dialog's action: read-before-write via [`TokenInfoLoader`],
/// a single submission through the session signer, refresh afterwards.
///
/// Admission control is an atomic flag checked and set before the first
/// await point, so rapid re-clicks on stale render state collapse to one
/// submission.
pub struct ActionFlow {
    kind: ActionKind,
    vault: VaultDescriptor,
    loader: TokenInfoLoader,
    writer: Arc<dyn ContractWriter>,
    sink: Arc<dyn NotificationSink>,
    callback: Option<PostActionCallback>,
    in_flight: AtomicBool,
}

impl ActionFlow {
    pub fn new(
        kind: ActionKind,
        vault: VaultDescriptor,
        loader: TokenInfoLoader,
        writer: Arc<dyn ContractWriter>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            kind,
            vault,
            loader,
            writer,
            sink,
            callback: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Per-vault follow-up to run after a confirmed deposit.
    pub fn with_callback(mut self, callback: PostActionCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Mint targets the token contract, deposit the vault.
    fn target(&self) -> &str {
        match self.kind {
            ActionKind::Mint => &self.vault.token_address,
            ActionKind::Deposit => &self.vault.address,
        }
    }

    pub fn button_state(
        &self,
        session: Option<&WalletSession>,
        dialog: &DialogSession,
    ) -> ButtonState {
        dialog.button_state(session.is_some(), self.is_in_flight())
    }

    /// Re-reads the token snapshot into the dialog. Lazy activation: a
    /// closed dialog or an absent wallet session issues no reads at all.
    /// A failed load leaves the dialog on placeholders; there is no retry.
    pub async fn refresh(
        &self,
        session: Option<&WalletSession>,
        dialog: &mut DialogSession,
    ) -> Result<(), ReadError> {
        let session = match session {
            Some(session) if dialog.is_open() => session,
            _ => return Ok(()),
        };

        match self
            .loader
            .load(&self.vault.token_address, &session.account, &self.vault.address)
            .await
        {
            Ok(record) => {
                dialog.set_token(Some(record));
                Ok(())
            }
            Err(e) => {
                warn!("Token metadata load failed: {}", e);
                dialog.set_token(None);
                Err(e)
            }
        }
    }

    /// Runs one submission attempt end to end. Failures never escape: they
    /// come back as an [`ActionOutcome`] and a notice.
    pub async fn submit(
        &self,
        session: &WalletSession,
        dialog: &mut DialogSession,
    ) -> ActionOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Submission already in flight, ignoring re-entrant submit");
            return ActionOutcome::Cancelled;
        }

        let outcome = self.run_attempt(session, dialog).await;
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run_attempt(
        &self,
        session: &WalletSession,
        dialog: &mut DialogSession,
    ) -> ActionOutcome {
        // The submit path is a no-op without loaded data or with a failing
        // validation flag; the button was disabled anyway.
        let record = match dialog.token() {
            Some(record) => record.clone(),
            None => {
                warn!("Submit with no token record loaded, ignoring");
                return ActionOutcome::Cancelled;
            }
        };
        let input = dialog.input_value().to_string();
        if needs_approval(&input, &record) || insufficient_balance(&input, &record) {
            warn!("Submit while validation flags are set, ignoring");
            return ActionOutcome::Cancelled;
        }

        let mut machine = SubmissionMachine::new(generate_attempt_id());

        let request = match ActionRequest::from_input(self.target(), &input, record.decimals) {
            Ok(request) => request,
            Err(e) => {
                // Attempt never started; fire-and-forget error notice.
                self.sink
                    .notify(FlowNotice::error(machine.attempt_id(), e.to_string()));
                return ActionOutcome::Failure(e);
            }
        };

        if let Ok(t) = machine.advance(SubmissionEvent::SubmitRequested) {
            self.observe(&t, &request, &record, None, None);
        }

        let call = WriteCall::for_request(self.kind, &request, session.network.chain_id());
        let raw_tx = match session.signer.sign_call(&call).await {
            Ok(raw_tx) => raw_tx,
            Err(e) => return self.fail(&mut machine, &request, &record, e),
        };

        let pending = match self.writer.submit(raw_tx).await {
            Ok(pending) => pending,
            Err(e) => return self.fail(&mut machine, &request, &record, e),
        };

        if let Ok(t) = machine.advance(SubmissionEvent::Broadcasted) {
            self.observe(&t, &request, &record, None, None);
        }

        let inclusion = match pending.confirmed().await {
            Ok(inclusion) => inclusion,
            Err(e) => return self.fail(&mut machine, &request, &record, e),
        };

        let receipt = ActionReceipt {
            tx_hash: inclusion.tx_hash.clone(),
            block_number: inclusion.block_number,
            succeeded: inclusion.succeeded,
            explorer_url: transaction_url(&session.network, &inclusion.tx_hash),
            confirmed_at: Utc::now(),
        };

        if !inclusion.succeeded {
            // Mined but reverted. Keep the receipt around for inspection.
            dialog.set_receipt(Some(receipt));
            return self.fail(
                &mut machine,
                &request,
                &record,
                ActionError::TransactionReverted(inclusion.tx_hash),
            );
        }

        // Read-after-write: balances changed, re-fetch. A failed refresh is
        // not a submission failure.
        if self.refresh(Some(session), dialog).await.is_err() {
            warn!("Post-submission refresh failed");
        }

        let callback_error = match (&self.kind, &self.callback) {
            (ActionKind::Deposit, Some(callback)) => {
                callback(self.vault.clone()).await.err()
            }
            _ => None,
        };

        if let Ok(t) = machine.advance(SubmissionEvent::Confirmed) {
            self.observe(&t, &request, &record, Some(&receipt.explorer_url), None);
        }

        info!(
            "{} {} {} confirmed in tx {}",
            self.kind.past_label(),
            request.amount_formatted,
            record.symbol,
            receipt.tx_hash
        );

        dialog.clear_input();
        dialog.close();

        match callback_error {
            Some(error) => {
                // The transaction itself succeeded; report the follow-up
                // failure separately instead of folding it into Failure.
                self.sink.notify(FlowNotice::error(
                    machine.attempt_id(),
                    format!("{} confirmed, but follow-up failed: {}", self.kind.label(), error),
                ));
                ActionOutcome::SuccessWithCallbackFailure { receipt, error }
            }
            None => ActionOutcome::Success(receipt),
        }
    }

    fn fail(
        &self,
        machine: &mut SubmissionMachine,
        request: &ActionRequest,
        record: &TokenRecord,
        error: ActionError,
    ) -> ActionOutcome {
        let message = error.to_string();
        if let Ok(t) = machine.advance(SubmissionEvent::Errored) {
            self.observe(&t, request, record, None, Some(&message));
        }
        ActionOutcome::Failure(error)
    }

    /// Notification emission observes state transitions; the machine stays
    /// pure and side-effect free.
    fn observe(
        &self,
        transition: &Transition,
        request: &ActionRequest,
        record: &TokenRecord,
        explorer_url: Option<&str>,
        error: Option<&str>,
    ) {
        let notice = match transition.to {
            SubmissionPhase::Submitting => Some(FlowNotice::loading(
                &transition.attempt_id,
                format!(
                    "{} {} {}",
                    self.kind.progress_label(),
                    request.amount_formatted,
                    record.symbol
                ),
            )),
            SubmissionPhase::Confirming => Some(FlowNotice::loading(
                &transition.attempt_id,
                format!(
                    "Waiting for confirmation of {} {}",
                    request.amount_formatted, record.symbol
                ),
            )),
            SubmissionPhase::Settled => Some(FlowNotice::success(
                &transition.attempt_id,
                format!(
                    "{} {} {}",
                    self.kind.past_label(),
                    request.amount_formatted,
                    record.symbol
                ),
                explorer_url.unwrap_or_default().to_string(),
            )),
            SubmissionPhase::Failed => Some(FlowNotice::error(
                &transition.attempt_id,
                error.unwrap_or("submission failed").to_string(),
            )),
            SubmissionPhase::Idle => None,
        };

        if let Some(notice) = notice {
            self.sink.notify(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::action::InclusionReceipt;
    use crate::models::errors::ReadError;
    use crate::models::notifications::NoticePhase;
    use crate::models::session::{Network, TransactionSigner};
    use crate::services::contract_writer::PendingInclusion;
    use crate::services::notification_services::test_support::RecordingSink;
    use crate::services::token_info::{BatchReader, ReadCall};
    use async_trait::async_trait;
    use ethers_core::abi::{encode, Token};
    use futures::FutureExt;
    use ethers_core::types::{Bytes, U256 as EthersU256};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    const TOKEN: &str = "0x1000000000000000000000000000000000000001";
    const VAULT: &str = "0x3000000000000000000000000000000000000003";
    const ACCOUNT: &str = "0x2000000000000000000000000000000000000002";

    struct StubReader {
        batches: AtomicUsize,
        balance: u128,
        allowance: u128,
    }

    #[async_trait]
    impl BatchReader for StubReader {
        async fn read_batch(&self, _calls: &[ReadCall]) -> Result<Vec<Vec<u8>>, ReadError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                encode(&[Token::String("USDT".to_string())]),
                encode(&[Token::Uint(EthersU256::from(18u64))]),
                encode(&[Token::Uint(EthersU256::from(self.balance))]),
                encode(&[Token::Uint(EthersU256::from(self.allowance))]),
            ])
        }
    }

    struct RecordingSigner {
        calls: Mutex<Vec<WriteCall>>,
    }

    #[async_trait]
    impl TransactionSigner for RecordingSigner {
        async fn sign_call(&self, call: &WriteCall) -> Result<Bytes, ActionError> {
            self.calls.lock().unwrap().push(call.clone());
            Ok(Bytes::from(call.data.clone()))
        }
    }

    #[derive(Clone, Copy)]
    enum WriterMode {
        Confirm,
        Reject,
        Revert,
        SlowConfirm,
    }

    struct StubWriter {
        mode: WriterMode,
        submissions: AtomicUsize,
    }

    struct StubPending {
        mode: WriterMode,
    }

    #[async_trait]
    impl PendingInclusion for StubPending {
        async fn confirmed(self: Box<Self>) -> Result<InclusionReceipt, ActionError> {
            if let WriterMode::SlowConfirm = self.mode {
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
            Ok(InclusionReceipt {
                tx_hash: "0xabc123".to_string(),
                block_number: Some(42),
                succeeded: !matches!(self.mode, WriterMode::Revert),
            })
        }
    }

    #[async_trait]
    impl ContractWriter for StubWriter {
        async fn submit(&self, _raw_tx: Bytes) -> Result<Box<dyn PendingInclusion>, ActionError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                WriterMode::Reject => Err(ActionError::SubmissionRejected(
                    "user rejected transaction".to_string(),
                )),
                mode => Ok(Box::new(StubPending { mode })),
            }
        }
    }

    struct Harness {
        flow: ActionFlow,
        session: WalletSession,
        dialog: DialogSession,
        sink: Arc<RecordingSink>,
        reader: Arc<StubReader>,
        writer: Arc<StubWriter>,
        signer: Arc<RecordingSigner>,
    }

    fn harness(kind: ActionKind, balance: u128, allowance: u128, mode: WriterMode) -> Harness {
        let reader = Arc::new(StubReader {
            batches: AtomicUsize::new(0),
            balance,
            allowance,
        });
        let writer = Arc::new(StubWriter {
            mode,
            submissions: AtomicUsize::new(0),
        });
        let sink = Arc::new(RecordingSink::default());
        let signer = Arc::new(RecordingSigner {
            calls: Mutex::new(Vec::new()),
        });

        let vault = VaultDescriptor {
            name: "Test Vault".to_string(),
            address: VAULT.to_string(),
            token_address: TOKEN.to_string(),
        };
        let flow = ActionFlow::new(
            kind,
            vault,
            TokenInfoLoader::new(reader.clone()),
            writer.clone(),
            sink.clone(),
        );
        let session = WalletSession::new(
            ACCOUNT.to_string(),
            Network::OptimismMainnet,
            signer.clone(),
        );
        let mut dialog = DialogSession::new(kind);
        dialog.open();

        Harness {
            flow,
            session,
            dialog,
            sink,
            reader,
            writer,
            signer,
        }
    }

    const THOUSAND_E18: u128 = 1_000_000_000_000_000_000_000;
    const FIVE_E18: u128 = 5_000_000_000_000_000_000;

    #[tokio::test]
    async fn test_happy_path_deposit() {
        let _ = tracing_subscriber::fmt::try_init();
        let mut h = harness(ActionKind::Deposit, THOUSAND_E18, THOUSAND_E18, WriterMode::Confirm);

        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        assert_eq!(h.reader.batches.load(Ordering::SeqCst), 1);
        h.dialog.set_input("10");
        assert_eq!(h.flow.button_state(Some(&h.session), &h.dialog), ButtonState::Ready);

        let outcome = h.flow.submit(&h.session, &mut h.dialog).await;

        let receipt = match outcome {
            ActionOutcome::Success(receipt) => receipt,
            other => panic!("expected success, got {:?}", other),
        };
        assert!(receipt.succeeded);
        assert_eq!(receipt.tx_hash, "0xabc123");
        assert_eq!(
            receipt.explorer_url,
            "https://optimistic.etherscan.io/tx/0xabc123"
        );

        // the signed call targets the vault with deposit(10e18) on chain 10
        let calls = h.signer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to, VAULT);
        assert_eq!(calls[0].chain_id, 10);
        assert_eq!(hex::encode(&calls[0].data[..4]), "b6b55f25");
        let amount = EthersU256::from_big_endian(&calls[0].data[4..36]);
        assert_eq!(
            amount,
            EthersU256::from_dec_str("10000000000000000000").unwrap()
        );

        // refreshed after the write, input cleared, dialog closed
        assert_eq!(h.reader.batches.load(Ordering::SeqCst), 2);
        assert_eq!(h.dialog.input_value(), "");
        assert!(!h.dialog.is_open());
        assert!(!h.flow.is_in_flight());

        assert_eq!(
            h.sink.phases(),
            vec![NoticePhase::Loading, NoticePhase::Loading, NoticePhase::Success]
        );
        let last = h.sink.last_message().unwrap();
        assert!(last.contains("Deposited 10 USDT"), "got: {}", last);
    }

    #[tokio::test]
    async fn test_mint_targets_the_token_contract() {
        let mut h = harness(ActionKind::Mint, THOUSAND_E18, THOUSAND_E18, WriterMode::Confirm);
        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        h.dialog.set_input("1");

        let outcome = h.flow.submit(&h.session, &mut h.dialog).await;
        assert!(matches!(outcome, ActionOutcome::Success(_)));

        let calls = h.signer.calls.lock().unwrap();
        assert_eq!(calls[0].to, TOKEN);
        assert_eq!(hex::encode(&calls[0].data[..4]), "a0712d68");
    }

    #[tokio::test]
    async fn test_insufficient_allowance_blocks_submit() {
        let mut h = harness(ActionKind::Deposit, THOUSAND_E18, FIVE_E18, WriterMode::Confirm);
        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        h.dialog.set_input("10");

        let state = h.flow.button_state(Some(&h.session), &h.dialog);
        assert_eq!(state, ButtonState::NeedApproveMore);
        assert!(!state.enabled());
        assert_eq!(h.dialog.button_label(state), "Need Approve More");

        let outcome = h.flow.submit(&h.session, &mut h.dialog).await;
        assert!(matches!(outcome, ActionOutcome::Cancelled));
        assert_eq!(h.writer.submissions.load(Ordering::SeqCst), 0);
        assert!(h.sink.phases().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_submission_keeps_dialog_open() {
        let mut h = harness(ActionKind::Deposit, THOUSAND_E18, THOUSAND_E18, WriterMode::Reject);
        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        h.dialog.set_input("10");

        let outcome = h.flow.submit(&h.session, &mut h.dialog).await;

        assert!(matches!(
            outcome,
            ActionOutcome::Failure(ActionError::SubmissionRejected(_))
        ));
        assert!(h.dialog.is_open());
        assert_eq!(h.dialog.input_value(), "10");
        assert!(!h.flow.is_in_flight());

        let last = h.sink.last_message().unwrap();
        assert!(last.contains("user rejected transaction"), "got: {}", last);
        assert_eq!(h.sink.phases().last(), Some(&NoticePhase::Error));
        // no refresh happened beyond the initial load
        assert_eq!(h.reader.batches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reverted_transaction_is_a_failure_with_receipt() {
        let mut h = harness(ActionKind::Deposit, THOUSAND_E18, THOUSAND_E18, WriterMode::Revert);
        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        h.dialog.set_input("10");

        let outcome = h.flow.submit(&h.session, &mut h.dialog).await;

        assert!(matches!(
            outcome,
            ActionOutcome::Failure(ActionError::TransactionReverted(_))
        ));
        assert!(h.dialog.is_open());
        let receipt = h.dialog.receipt().unwrap();
        assert!(!receipt.succeeded);
        assert_eq!(receipt.tx_hash, "0xabc123");
    }

    #[tokio::test]
    async fn test_no_wallet_session_issues_no_reads() {
        let mut h = harness(ActionKind::Deposit, THOUSAND_E18, THOUSAND_E18, WriterMode::Confirm);

        h.flow.refresh(None, &mut h.dialog).await.unwrap();
        assert_eq!(h.reader.batches.load(Ordering::SeqCst), 0);
        assert!(h.dialog.token().is_none());
        assert_eq!(h.flow.button_state(None, &h.dialog), ButtonState::ConnectWallet);

        // same for a closed dialog
        h.dialog.close();
        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        assert_eq!(h.reader.batches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_double_submit_admits_exactly_one() {
        let mut h = harness(
            ActionKind::Deposit,
            THOUSAND_E18,
            THOUSAND_E18,
            WriterMode::SlowConfirm,
        );
        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        h.dialog.set_input("10");

        // a rapid second click acts on a stale clone of the render state
        let mut stale = h.dialog.clone();

        let (first, second) = tokio::join!(
            h.flow.submit(&h.session, &mut h.dialog),
            h.flow.submit(&h.session, &mut stale),
        );

        let outcomes = [first, second];
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, ActionOutcome::Success(_)))
                .count(),
            1
        );
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, ActionOutcome::Cancelled))
                .count(),
            1
        );
        assert_eq!(h.writer.submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deposit_callback_runs_after_confirmation() {
        let mut h = harness(ActionKind::Deposit, THOUSAND_E18, THOUSAND_E18, WriterMode::Confirm);
        let invocations = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&invocations);
        h.flow = h.flow.with_callback(Arc::new(move |vault: VaultDescriptor| {
            let seen = Arc::clone(&seen);
            async move {
                assert_eq!(vault.address, VAULT);
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            .boxed()
        }));

        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        h.dialog.set_input("10");

        let outcome = h.flow.submit(&h.session, &mut h.dialog).await;
        assert!(matches!(outcome, ActionOutcome::Success(_)));
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_callback_failure_is_reported_separately() {
        let mut h = harness(ActionKind::Deposit, THOUSAND_E18, THOUSAND_E18, WriterMode::Confirm);
        h.flow = h.flow.with_callback(Arc::new(|_vault: VaultDescriptor| {
            async { Err("vault hook exploded".to_string()) }.boxed()
        }));

        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        h.dialog.set_input("10");

        let outcome = h.flow.submit(&h.session, &mut h.dialog).await;

        match outcome {
            ActionOutcome::SuccessWithCallbackFailure { receipt, error } => {
                assert!(receipt.succeeded);
                assert!(error.contains("vault hook exploded"));
            }
            other => panic!("expected SuccessWithCallbackFailure, got {:?}", other),
        }

        // the transaction succeeded and the follow-up failure is its own notice
        let phases = h.sink.phases();
        assert!(phases.contains(&NoticePhase::Success));
        assert_eq!(phases.last(), Some(&NoticePhase::Error));
        let last = h.sink.last_message().unwrap();
        assert!(last.contains("vault hook exploded"));
    }

    #[tokio::test]
    async fn test_mint_never_runs_the_callback() {
        let mut h = harness(ActionKind::Mint, THOUSAND_E18, THOUSAND_E18, WriterMode::Confirm);
        let invocations = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&invocations);
        h.flow = h.flow.with_callback(Arc::new(move |_vault: VaultDescriptor| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            .boxed()
        }));

        h.flow.refresh(Some(&h.session), &mut h.dialog).await.unwrap();
        h.dialog.set_input("10");

        let outcome = h.flow.submit(&h.session, &mut h.dialog).await;
        assert!(matches!(outcome, ActionOutcome::Success(_)));
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }
}
