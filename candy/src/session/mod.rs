//! Session reconciler.
//!
//! Owns the mapping from wallet lifecycle events to local state: bound
//! account, active chain, contract handle and token view. Every mutation
//! goes through `&mut self`, so whoever owns the reconciler (normally the
//! control loop in [`run`]) serializes all handlers without locks.

pub mod run;
pub mod state;

use std::sync::Arc;

use alloy_primitives::Address;
use futures_util::FutureExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::CandyConfig;
use crate::contract::TokenContract;
use crate::error::{CandyError, ErrorKind, Result};
use crate::provider::{TxReceipt, WalletEvent, WalletProvider};
use crate::units::{parse_address, parse_amount};

pub use run::Command;
pub use state::{
    Banner, BannerLevel, InFlight, OperationKind, OperationOutcome, OperationRequest,
    PendingOperation, Phase, Session, SessionSnapshot, TokenView,
};

const PROVIDER_MISSING_MESSAGE: &str = "Please install a wallet provider to use this dashboard";
const TOKEN_READ_FAILED_MESSAGE: &str = "Failed to connect to the token contract";
const SELF_TRANSFER_MESSAGE: &str = "You cannot transfer tokens to your own wallet address";

pub struct SessionReconciler<P> {
    provider: Arc<P>,
    config: CandyConfig,
    phase: Phase,
    session: Session,
    contract: Option<TokenContract<P>>,
    token: Option<TokenView>,
    pending: Option<PendingOperation>,
    banner: Option<Banner>,
    network_notice: Option<String>,
    provider_missing: bool,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<P: WalletProvider> SessionReconciler<P> {
    pub fn new(provider: Arc<P>, config: CandyConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::initial(
            config.chain.chain_id,
            config.contract_address,
        ));
        Self {
            provider,
            config,
            phase: Phase::Uninitialized,
            session: Session::default(),
            contract: None,
            token: None,
            pending: None,
            banner: None,
            network_notice: None,
            provider_missing: false,
            snapshot_tx,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn contract(&self) -> Option<&TokenContract<P>> {
        self.contract.as_ref()
    }

    pub fn token(&self) -> Option<&TokenView> {
        self.token.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingOperation> {
        self.pending.as_ref()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn network_notice(&self) -> Option<&str> {
        self.network_notice.as_deref()
    }

    pub fn config(&self) -> &CandyConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            session: self.session.clone(),
            required_chain_id: self.config.chain.chain_id,
            contract_address: self.config.contract_address,
            contract_signer: self.contract.as_ref().map(TokenContract::signer),
            token: self.token.clone(),
            pending: self.pending.clone(),
            banner: self.banner.clone(),
            network_notice: self.network_notice.clone(),
        }
    }

    /// Receiver that sees a fresh snapshot after every reconciler step.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Detect the wallet and adopt any already-authorized account.
    ///
    /// Only runs from `Uninitialized`; no prompt is shown to the user.
    pub async fn probe(&mut self) {
        if self.phase != Phase::Uninitialized {
            debug!(phase = %self.phase, "probe skipped");
            return;
        }

        self.phase = Phase::Probing;
        self.publish();

        if !self.provider.is_available().await {
            warn!("no wallet provider detected");
            self.provider_missing = true;
            self.phase = Phase::Disconnected;
            self.banner = Some(Banner::error(
                ErrorKind::ProviderMissing,
                PROVIDER_MISSING_MESSAGE,
            ));
            self.publish();
            return;
        }

        match self.provider.chain_id().await {
            Ok(chain_id) => self.session.chain_id = Some(chain_id),
            Err(e) => warn!(error = %e, "failed to read chain id"),
        }

        match self.provider.accounts().await {
            Ok(accounts) => {
                info!(
                    accounts = accounts.len(),
                    chain_id = ?self.session.chain_id,
                    "wallet detected"
                );
                self.apply_accounts(accounts).await;
            }
            Err(e) => {
                warn!(error = %e, "failed to list authorized accounts");
                self.phase = Phase::Disconnected;
                self.set_error(&e, format!("Failed to connect wallet: {}", e.user_message()));
            }
        }

        self.publish();
    }

    /// Ask the wallet to authorize an account.
    pub async fn connect(&mut self) -> Result<()> {
        if self.phase == Phase::Uninitialized {
            self.probe().await;
        }

        if self.provider_missing {
            self.banner = Some(Banner::error(
                ErrorKind::ProviderMissing,
                PROVIDER_MISSING_MESSAGE,
            ));
            self.publish();
            return Err(CandyError::ProviderMissing);
        }

        if self.session.account.is_some() {
            debug!("connect ignored: account already bound");
            return Ok(());
        }

        let result = match self.provider.request_accounts().await {
            Ok(accounts) if accounts.is_empty() => Err(CandyError::UserRejected(
                "wallet returned no accounts".into(),
            )),
            other => other,
        };

        let outcome = match result {
            Ok(accounts) => {
                self.banner = None;
                self.apply_accounts(accounts).await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "connect failed");
                self.set_error(&e, format!("Failed to connect wallet: {}", e.user_message()));
                Err(e)
            }
        };

        self.publish();
        outcome
    }

    /// Apply one wallet notification, including any chain negotiation it
    /// triggers, before returning.
    pub async fn handle_event(&mut self, event: WalletEvent) {
        if self.provider_missing {
            debug!(?event, "event ignored: no provider");
            return;
        }

        match event {
            WalletEvent::AccountsChanged { accounts } => {
                info!(accounts = accounts.len(), "accounts changed");
                self.apply_accounts(accounts).await;
            }
            WalletEvent::ChainChanged { chain_id } => {
                let previous = self.session.chain_id.replace(chain_id);
                info!(chain_id, previous = ?previous, "chain changed");
                self.apply_chain_change(chain_id).await;
            }
        }

        self.publish();
    }

    /// Re-read the token view for the bound account.
    pub async fn refresh(&mut self) {
        match self.phase {
            Phase::ConnectedReady => {
                self.banner = None;
                self.load_token().await;
            }
            Phase::ConnectedWrongChain => {
                self.banner = Some(Banner::info(format!(
                    "Switch to {} to view token details",
                    self.config.chain.chain_name
                )));
            }
            _ => {
                self.banner = Some(Banner::info("Connect your wallet first"));
            }
        }
        self.publish();
    }

    /// Validate a request and mark it pending.
    ///
    /// Returns the settlement future; feed its output to [`Self::settle`].
    /// Rejected requests never reach the provider.
    pub fn submit(&mut self, request: OperationRequest) -> Result<InFlight> {
        let kind = request.kind();
        match self.prepare(request) {
            Ok((operation, in_flight)) => {
                info!(
                    kind = operation.kind.verb(),
                    amount = %operation.amount,
                    recipient = ?operation.recipient,
                    "operation submitted"
                );
                self.pending = Some(operation);
                self.banner = None;
                self.publish();
                Ok(in_flight)
            }
            Err(e) => {
                warn!(kind = kind.verb(), error = %e, "operation rejected");
                let message = match e.kind() {
                    ErrorKind::Validation | ErrorKind::Busy | ErrorKind::WrongChain => {
                        e.user_message()
                    }
                    _ => failure_message(kind, &e),
                };
                self.set_error(&e, message);
                self.publish();
                Err(e)
            }
        }
    }

    /// Apply a settled operation and clear the in-flight marker.
    ///
    /// The balance is re-read only while the session is ready and the
    /// operation's account is still the bound one.
    pub async fn settle(&mut self, outcome: OperationOutcome) -> Result<TxReceipt> {
        let OperationOutcome { operation, result } = outcome;
        if self.pending.as_ref() == Some(&operation) {
            self.pending = None;
        } else {
            warn!(kind = operation.kind.verb(), "settled operation was not pending");
        }

        let settled = match result {
            Ok(receipt) => {
                let refresh_error = self.refresh_balance(operation.account).await;

                let symbol = self
                    .token
                    .as_ref()
                    .map(|t| format!("{} ", t.symbol))
                    .unwrap_or_default();
                let message = match (operation.kind, operation.recipient) {
                    (OperationKind::Transfer, Some(recipient)) => format!(
                        "Successfully transferred {} {symbol}tokens to {recipient}!",
                        operation.amount
                    ),
                    _ => format!("Successfully minted {} {symbol}tokens!", operation.amount),
                };
                info!(
                    kind = operation.kind.verb(),
                    amount = %operation.amount,
                    tx = %receipt.transaction_hash,
                    "operation settled"
                );
                self.banner = Some(match refresh_error {
                    None => Banner::success(message),
                    Some(e) => Banner::error(
                        e.kind(),
                        format!("{message} Failed to refresh balance: {}", e.user_message()),
                    ),
                });
                Ok(receipt)
            }
            Err(e) => {
                error!(kind = operation.kind.verb(), error = %e, "operation failed");
                self.set_error(&e, failure_message(operation.kind, &e));
                Err(e)
            }
        };

        self.publish();
        settled
    }

    /// Mint `amount` display units to the bound account and wait for it.
    pub async fn mint(&mut self, amount: &str) -> Result<TxReceipt> {
        let in_flight = self.submit(OperationRequest::Mint {
            amount: amount.to_string(),
        })?;
        let outcome = in_flight.await;
        self.settle(outcome).await
    }

    /// Transfer `amount` display units to `recipient` and wait for it.
    pub async fn transfer(&mut self, recipient: &str, amount: &str) -> Result<TxReceipt> {
        let in_flight = self.submit(OperationRequest::Transfer {
            recipient: recipient.to_string(),
            amount: amount.to_string(),
        })?;
        let outcome = in_flight.await;
        self.settle(outcome).await
    }

    /// Re-read accounts and chain after missed notifications.
    pub async fn resync(&mut self) {
        if self.provider_missing {
            return;
        }

        match self.provider.chain_id().await {
            Ok(chain_id) => self.session.chain_id = Some(chain_id),
            Err(e) => warn!(error = %e, "resync: failed to read chain id"),
        }
        match self.provider.accounts().await {
            Ok(accounts) => self.apply_accounts(accounts).await,
            Err(e) => warn!(error = %e, "resync: failed to list accounts"),
        }

        self.publish();
    }

    // -- transitions --

    async fn apply_accounts(&mut self, accounts: Vec<Address>) {
        match accounts.first().copied() {
            Some(account) => self.bind_account(account).await,
            None => self.disconnect(),
        }
    }

    async fn bind_account(&mut self, account: Address) {
        if self.session.account != Some(account) {
            info!(account = %account, "account bound");
        }
        self.session.account = Some(account);
        self.contract = Some(TokenContract::new(
            self.config.contract_address,
            account,
            Arc::clone(&self.provider),
        ));
        self.token = None;
        self.reconcile_chain().await;
    }

    fn disconnect(&mut self) {
        if self.session.account.is_some() {
            info!("wallet disconnected");
        }
        self.session.account = None;
        self.contract = None;
        self.token = None;
        self.network_notice = None;
        self.phase = Phase::Disconnected;
    }

    async fn reconcile_chain(&mut self) {
        if self.session.chain_id.is_none() {
            match self.provider.chain_id().await {
                Ok(chain_id) => self.session.chain_id = Some(chain_id),
                Err(e) => warn!(error = %e, "failed to read chain id"),
            }
        }

        if self.session.chain_id == Some(self.config.chain.chain_id) {
            self.enter_ready().await;
        } else {
            self.enter_wrong_chain().await;
        }
    }

    async fn apply_chain_change(&mut self, chain_id: u64) {
        let required = self.config.chain.chain_id;
        match self.phase {
            Phase::ConnectedReady if chain_id != required => self.enter_wrong_chain().await,
            Phase::ConnectedWrongChain if chain_id == required => self.enter_ready().await,
            Phase::ConnectedWrongChain => {
                // Negotiation already happened on entry; only the notice changes.
                self.network_notice = Some(self.switch_notice());
            }
            _ => {}
        }
    }

    async fn enter_ready(&mut self) {
        info!(chain_id = self.config.chain.chain_id, "on required chain");
        self.phase = Phase::ConnectedReady;
        self.network_notice = None;
        self.load_token().await;
    }

    /// Negotiate onto the required chain: switch, then add if unknown.
    /// Failures leave a standing notice; nothing is retried.
    async fn enter_wrong_chain(&mut self) {
        let required = self.config.chain.chain_id;
        warn!(
            current = ?self.session.chain_id,
            required,
            "wallet on wrong chain"
        );
        self.phase = Phase::ConnectedWrongChain;
        self.token = None;
        self.network_notice = Some(self.switch_notice());
        self.publish();

        match self.provider.switch_chain(required).await {
            Ok(()) => info!(chain_id = required, "wallet switched chain"),
            Err(CandyError::UnrecognizedChain(_)) => {
                info!(chain_id = required, "chain unknown to wallet, requesting add");
                if let Err(e) = self.provider.add_chain(&self.config.chain).await {
                    warn!(error = %e, "add chain failed");
                    self.network_notice = Some(format!(
                        "Please manually add {} network to your wallet",
                        self.config.chain.chain_name
                    ));
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "chain switch declined");
                return;
            }
        }

        match self.provider.chain_id().await {
            Ok(chain_id) => {
                self.session.chain_id = Some(chain_id);
                if chain_id == required {
                    self.enter_ready().await;
                } else {
                    self.network_notice = Some(self.switch_notice());
                }
            }
            Err(e) => warn!(error = %e, "failed to re-read chain id after switch"),
        }
    }

    /// Re-read the bound account's balance after an operation settled.
    ///
    /// Returns the read error, if any; a missing TokenView is reloaded whole.
    async fn refresh_balance(&mut self, account: Address) -> Option<CandyError> {
        let contract = match (&self.contract, self.phase) {
            (Some(contract), Phase::ConnectedReady) if self.session.account == Some(account) => {
                contract.clone()
            }
            _ => {
                debug!(
                    account = %account,
                    phase = %self.phase,
                    "session moved on while operation was in flight, balance not applied"
                );
                return None;
            }
        };
        if self.token.is_none() {
            self.load_token().await;
            return None;
        }
        match contract.balance_of(account).await {
            Ok(balance) => {
                if let Some(token) = self.token.as_mut() {
                    token.set_balance(balance, self.config.token_decimals);
                }
                None
            }
            Err(e) => {
                warn!(account = %account, error = %e, "balance re-read failed");
                Some(e)
            }
        }
    }

    async fn load_token(&mut self) {
        let Some(contract) = self.contract.clone() else {
            return;
        };

        let read = tokio::try_join!(
            contract.name(),
            contract.symbol(),
            contract.balance_of(contract.signer()),
        );

        match read {
            Ok((name, symbol, balance)) => {
                debug!(%name, %symbol, %balance, "token view loaded");
                self.token = Some(TokenView::new(
                    name,
                    symbol,
                    balance,
                    self.config.token_decimals,
                ));
            }
            Err(e) => {
                error!(contract = %contract.address(), error = %e, "token read failed");
                self.token = None;
                self.set_error(&e, TOKEN_READ_FAILED_MESSAGE);
            }
        }
    }

    fn prepare(&self, request: OperationRequest) -> Result<(PendingOperation, InFlight)> {
        if self.pending.is_some() {
            return Err(CandyError::OperationInFlight);
        }
        let contract = match (&self.contract, self.phase) {
            (Some(contract), Phase::ConnectedReady) => contract.clone(),
            (None, _) => {
                return Err(CandyError::NotReady(
                    "Please connect your wallet first".into(),
                ))
            }
            (Some(_), _) => {
                return Err(match self.session.chain_id {
                    Some(current) => CandyError::WrongChain {
                        current,
                        required: self.config.chain.chain_id,
                    },
                    None => CandyError::NotReady(format!(
                        "Please switch to {} network first",
                        self.config.chain.chain_name
                    )),
                })
            }
        };
        let decimals = self.config.token_decimals;
        let account = contract.signer();

        match request {
            OperationRequest::Mint { amount } => {
                let value = parse_amount(&amount, decimals)?;
                let operation = PendingOperation {
                    kind: OperationKind::Mint,
                    amount: amount.trim().to_string(),
                    recipient: None,
                    account,
                };
                let settled = operation.clone();
                let in_flight = async move {
                    let result = contract.mint(value).await;
                    OperationOutcome {
                        operation: settled,
                        result,
                    }
                }
                .boxed();
                Ok((operation, in_flight))
            }
            OperationRequest::Transfer { recipient, amount } => {
                let to = parse_address(&recipient)?;
                if to == account {
                    return Err(CandyError::Validation(SELF_TRANSFER_MESSAGE.into()));
                }
                let value = parse_amount(&amount, decimals)?;
                let operation = PendingOperation {
                    kind: OperationKind::Transfer,
                    amount: amount.trim().to_string(),
                    recipient: Some(to),
                    account,
                };
                let settled = operation.clone();
                let in_flight = async move {
                    let result = contract.transfer(to, value).await;
                    OperationOutcome {
                        operation: settled,
                        result,
                    }
                }
                .boxed();
                Ok((operation, in_flight))
            }
        }
    }

    fn switch_notice(&self) -> String {
        let current = self
            .session
            .chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".into());
        format!(
            "Please switch to {} network in your wallet. Current network ID: {current}",
            self.config.chain.chain_name
        )
    }

    fn set_error(&mut self, e: &CandyError, message: impl Into<String>) {
        self.banner = Some(Banner::error(e.kind(), message));
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

fn failure_message(kind: OperationKind, e: &CandyError) -> String {
    format!("Failed to {} tokens: {}", kind.verb(), e.user_message())
}
