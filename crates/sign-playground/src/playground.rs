//! The playground controller.
//!
//! All state changes are synchronous and happen on the task driving the playground. Provider
//! requests are split into a `begin_*` step that validates and marks the work as in flight, the
//! request itself, which borrows nothing from the playground, and a `finish_*` step applying the
//! answer. [`Playground::run`] drives several requests at once this way.

use crate::{
    config::PlaygroundConfig,
    display::{Control, ControlLabel, DisplaySurface, DisplayUpdate, WalletInfo},
    error::{PlaygroundError, SignError},
    presentation::{Clipboard, ResultPanel, Verification, render_result},
    preview::{Editor, EditorId},
    provider::{ProviderError, ProviderEvent, RpcRequest, WalletProvider},
    session::{
        AccountsChange, Connection, SessionState, WalletSession, query_chain_id,
        request_connection,
    },
    signing::{
        OperationStatus, SignOperation, SignOptions, SigningResult, SigningSlots, build_request,
    },
    verify::recover_signer,
};
use alloy_primitives::Address;
use futures::{StreamExt, future::BoxFuture, stream::FuturesUnordered};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, mpsc};

/// A user action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaygroundCommand {
    Connect,
    Edit { editor: EditorId, text: String },
    Sign(SignOperation),
    Copy(SignOperation),
    /// Re-renders everything.
    Refresh,
}

/// A signing request that passed validation and waits to be sent.
#[derive(Debug)]
pub struct PendingSign {
    pub operation: SignOperation,
    pub request: RpcRequest,
    /// The editor text the request was built from.
    pub payload: String,
    provider: Arc<dyn WalletProvider>,
}

impl PendingSign {
    /// Sends the request and waits for the wallet.
    pub async fn send(self) -> SignResponse {
        let Self { operation, request, payload, provider } = self;
        trace!(%operation, method = %request.method, "sending signing request");
        let response = provider.request(request).await;
        SignResponse { operation, payload, response }
    }
}

/// The wallet's answer to a [`PendingSign`].
#[derive(Debug)]
pub struct SignResponse {
    pub operation: SignOperation,
    pub payload: String,
    pub response: Result<Value, ProviderError>,
}

enum Completion {
    Connect(Result<Option<Connection>, PlaygroundError>),
    Sign(SignResponse),
    CopyFeedback(SignOperation),
    /// The chain id of an account handed over by `accountsChanged`.
    AccountChain { account: Address, chain_id: u64 },
}

/// Owns the wallet session, the editors and the results, and keeps the display in sync.
pub struct Playground {
    config: PlaygroundConfig,
    options: SignOptions,
    session: WalletSession,
    /// Indexed by [`EditorId`].
    editors: [Editor; 4],
    slots: SigningSlots,
    /// Indexed by [`SignOperation`].
    panels: [ResultPanel; 4],
    connecting: bool,
    surface: Box<dyn DisplaySurface>,
    clipboard: Box<dyn Clipboard>,
}

impl std::fmt::Debug for Playground {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playground")
            .field("session", &self.session)
            .field("slots", &self.slots)
            .field("connecting", &self.connecting)
            .finish_non_exhaustive()
    }
}

impl Playground {
    /// Creates a playground for the detected provider, if any.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        config: PlaygroundConfig,
        surface: impl DisplaySurface + 'static,
        clipboard: impl Clipboard + 'static,
    ) -> Self {
        let session =
            WalletSession::new(provider).with_fallback_chain_id(config.fallback_chain_id);
        Self {
            options: config.sign_options(),
            config,
            session,
            editors: EditorId::ALL.map(Editor::with_default),
            slots: SigningSlots::default(),
            panels: SignOperation::ALL.map(ResultPanel::new),
            connecting: false,
            surface: Box::new(surface),
            clipboard: Box::new(clipboard),
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn editor(&self, id: EditorId) -> &Editor {
        &self.editors[id as usize]
    }

    pub fn status(&self, operation: SignOperation) -> &OperationStatus {
        self.slots.status(operation)
    }

    pub fn panel(&self, operation: SignOperation) -> &ResultPanel {
        &self.panels[operation as usize]
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    /// Renders the initial page and adopts already authorized accounts.
    pub async fn start(&mut self) {
        self.render_all();
        match self.session.restore().await {
            Ok(SessionState::Connected) => self.sync_chain_id(),
            Ok(state) => debug!(%state, "no authorized account"),
            Err(err) => warn!(%err, "failed to query authorized accounts"),
        }
        self.render_session();
    }

    /// Starts a connection attempt.
    ///
    /// Returns the provider to send `eth_requestAccounts` to, or `None` if there is nothing to
    /// do. Raises an alert when no wallet is installed.
    pub fn begin_connect(&mut self) -> Option<Arc<dyn WalletProvider>> {
        let Some(provider) = self.session.provider().cloned() else {
            let link = self.config.install_url.clone();
            self.alert(format!("No wallet detected, please install one first: {link}"), Some(link));
            return None;
        };
        if self.connecting || self.session.is_connected() {
            return None;
        }
        self.connecting = true;
        self.set_control(Control::Connect, false, ControlLabel::Pending);
        Some(provider)
    }

    /// Applies the result of a connection attempt.
    pub fn finish_connect(&mut self, result: Result<Option<Connection>, PlaygroundError>) {
        self.connecting = false;
        match result {
            Ok(connection) => {
                if self.session.apply_connection(connection) == SessionState::Connected {
                    self.sync_chain_id();
                }
            }
            Err(err) => {
                warn!(%err, "failed to connect wallet");
                self.alert(format!("Failed to connect wallet: {}", err.description()), None);
            }
        }
        self.render_session();
    }

    /// Connects the wallet, prompting the user.
    pub async fn connect(&mut self) {
        let Some(provider) = self.begin_connect() else { return };
        let result = request_connection(provider, self.session.fallback_chain_id()).await;
        self.finish_connect(result);
    }

    /// Replaces the text of an editor.
    pub fn edit(&mut self, editor: EditorId, text: impl Into<String>) {
        let buffer = &mut self.editors[editor as usize];
        buffer.set_text(text);
        show_preview(self.surface.as_mut(), buffer);
    }

    /// Validates and marks `operation` as in flight.
    ///
    /// Returns `None` when nothing must be sent: the wallet is not connected, the operation is
    /// already waiting for the wallet, or the payload does not parse, in which case the parse
    /// error becomes the operation's outcome.
    pub fn begin_sign(&mut self, operation: SignOperation) -> Option<PendingSign> {
        let (Some(provider), Some(account)) =
            (self.session.provider().cloned(), self.session.account())
        else {
            self.alert(SignError::NotConnected.to_string(), None);
            return None;
        };
        if self.slots.is_pending(operation) {
            debug!(%operation, "already waiting for the wallet");
            return None;
        }
        let payload = self.editor(operation.editor()).text().to_string();
        let request = match build_request(operation, account, &payload, &self.options) {
            Ok(request) => request,
            Err(err) => {
                self.resolve(operation, SigningResult::Failure(err.to_string()), None);
                return None;
            }
        };
        self.slots.begin(operation).ok()?;
        self.set_control(Control::Sign(operation), false, ControlLabel::Pending);
        Some(PendingSign { operation, request, payload, provider })
    }

    /// Records the wallet's answer. The operation's control is released whatever the outcome.
    pub fn finish_sign(&mut self, response: SignResponse) {
        let SignResponse { operation, payload, response } = response;
        let result = SigningResult::from_response(response);
        match &result {
            SigningResult::Signature(signature) => debug!(%operation, %signature, "signed"),
            SigningResult::Failure(reason) => debug!(%operation, %reason, "signing failed"),
        }
        let verification = self.verify(operation, &payload, &result);
        self.resolve(operation, result, verification);
    }

    /// Runs a signing operation to completion.
    pub async fn sign(&mut self, operation: SignOperation) {
        if let Some(pending) = self.begin_sign(operation) {
            let response = pending.send().await;
            self.finish_sign(response);
        }
    }

    /// Copies the signature shown for `operation`.
    ///
    /// Returns how long the confirmation should stay, or `None` if nothing was copied.
    pub fn copy_result(&mut self, operation: SignOperation) -> Option<Duration> {
        let panel = &mut self.panels[operation as usize];
        match panel.copy(self.clipboard.as_mut()) {
            Ok(true) => {
                self.set_control(Control::Copy(operation), true, ControlLabel::Copied);
                Some(self.config.copy_feedback())
            }
            Ok(false) => None,
            Err(err) => {
                warn!(%err, %operation, "failed to copy signature");
                None
            }
        }
    }

    /// Ends the copy confirmation of `operation`.
    pub fn reset_copy_feedback(&mut self, operation: SignOperation) {
        let panel = &mut self.panels[operation as usize];
        if panel.is_copied() {
            panel.reset_copied();
            self.set_control(Control::Copy(operation), true, ControlLabel::Normal);
        }
    }

    /// Applies a provider event.
    pub async fn handle_event(&mut self, event: ProviderEvent) {
        if let Some(work) = self.begin_event(event) {
            let completion = work.await;
            self.complete(completion);
        }
    }

    /// Applies the synchronous part of a provider event.
    ///
    /// Returns the chain id query still owed when a disconnected session was handed an account.
    fn begin_event(&mut self, event: ProviderEvent) -> Option<BoxFuture<'static, Completion>> {
        trace!(?event, "provider event");
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                let work = match self.session.begin_accounts_changed(&accounts) {
                    Ok(AccountsChange::Applied(_)) => None,
                    Ok(AccountsChange::Adopt { account, provider }) => {
                        let fallback = self.session.fallback_chain_id();
                        let work: BoxFuture<'static, Completion> = Box::pin(async move {
                            let chain_id = query_chain_id(provider.as_ref(), fallback).await;
                            Completion::AccountChain { account, chain_id }
                        });
                        Some(work)
                    }
                    Err(err) => {
                        warn!(%err, "ignoring accounts change");
                        None
                    }
                };
                self.render_session();
                work
            }
            ProviderEvent::ChainChanged(chain_id) => {
                if self.session.on_chain_changed(&chain_id).is_some() {
                    self.sync_chain_id();
                    self.render_wallet();
                }
                None
            }
        }
    }

    fn finish_account_chain(&mut self, account: Address, chain_id: u64) {
        if self.session.adopt_account(account, chain_id) {
            self.sync_chain_id();
            self.render_session();
        }
    }

    /// Runs the playground until `commands` is closed.
    ///
    /// Commands, provider events and answers are handled one at a time; different operations may
    /// wait for the wallet concurrently.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<PlaygroundCommand>) -> Self {
        let mut events = self.session.provider().map(|provider| provider.subscribe());
        self.start().await;

        let mut in_flight = FuturesUnordered::<BoxFuture<'static, Completion>>::new();
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if let Some(work) = self.dispatch(command) {
                        in_flight.push(work);
                    }
                }
                event = next_event(&mut events) => match event {
                    Some(event) => {
                        if let Some(work) = self.begin_event(event) {
                            in_flight.push(work);
                        }
                    }
                    None => events = None,
                },
                Some(completion) = in_flight.next(), if !in_flight.is_empty() => {
                    self.complete(completion);
                }
            }
        }
        self
    }

    fn dispatch(&mut self, command: PlaygroundCommand) -> Option<BoxFuture<'static, Completion>> {
        match command {
            PlaygroundCommand::Connect => {
                let provider = self.begin_connect()?;
                let fallback = self.session.fallback_chain_id();
                Some(Box::pin(async move {
                    Completion::Connect(request_connection(provider, fallback).await)
                }))
            }
            PlaygroundCommand::Edit { editor, text } => {
                self.edit(editor, text);
                None
            }
            PlaygroundCommand::Sign(operation) => {
                let pending = self.begin_sign(operation)?;
                Some(Box::pin(async move { Completion::Sign(pending.send().await) }))
            }
            PlaygroundCommand::Copy(operation) => {
                let feedback = self.copy_result(operation)?;
                Some(Box::pin(async move {
                    tokio::time::sleep(feedback).await;
                    Completion::CopyFeedback(operation)
                }))
            }
            PlaygroundCommand::Refresh => {
                self.render_all();
                None
            }
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Connect(result) => self.finish_connect(result),
            Completion::Sign(response) => self.finish_sign(response),
            Completion::CopyFeedback(operation) => self.reset_copy_feedback(operation),
            Completion::AccountChain { account, chain_id } => {
                self.finish_account_chain(account, chain_id)
            }
        }
    }

    fn resolve(
        &mut self,
        operation: SignOperation,
        result: SigningResult,
        verification: Option<Verification>,
    ) {
        let outcome = self.slots.resolve(operation, result);
        let text = render_result(&outcome.result);
        let error = !outcome.result.is_success();
        self.panels[operation as usize].show(outcome, verification);
        self.surface.apply(DisplayUpdate::Outcome { operation, text, error, verification });
        self.set_control(Control::Copy(operation), !error, ControlLabel::Normal);
        self.render_sign_control(operation);
    }

    fn verify(
        &self,
        operation: SignOperation,
        payload: &str,
        result: &SigningResult,
    ) -> Option<Verification> {
        let signature = result.signature()?;
        let account = self.session.account()?;
        match recover_signer(operation, payload, signature) {
            Ok(recovered) => {
                recovered.map(|recovered| Verification { recovered, matches: recovered == account })
            }
            Err(err) => {
                debug!(%err, %operation, "could not recover signer");
                None
            }
        }
    }

    /// Rewrites `domain.chainId` of the EIP-712 payloads to the active chain.
    fn sync_chain_id(&mut self) {
        let Some(chain_id) = self.session.chain_id() else { return };
        for editor in &mut self.editors {
            if editor.sync_chain_id(chain_id) {
                let id = editor.id();
                let text = editor.text().to_string();
                self.surface.apply(DisplayUpdate::EditorText { editor: id, text });
                show_preview(self.surface.as_mut(), editor);
            }
        }
    }

    fn alert(&mut self, message: String, link: Option<String>) {
        self.surface.apply(DisplayUpdate::Alert { message, link });
    }

    fn set_control(&mut self, control: Control, enabled: bool, label: ControlLabel) {
        self.surface.apply(DisplayUpdate::Control { control, enabled, label });
    }

    fn render_sign_control(&mut self, operation: SignOperation) {
        let pending = self.slots.is_pending(operation);
        let label = if pending { ControlLabel::Pending } else { ControlLabel::Normal };
        self.set_control(Control::Sign(operation), self.session.is_connected() && !pending, label);
    }

    fn render_wallet(&mut self) {
        let info = self.session.connection().map(WalletInfo::from);
        self.surface.apply(DisplayUpdate::Wallet(info));
    }

    fn render_session(&mut self) {
        let state = self.session.state();
        self.surface.apply(DisplayUpdate::Status(state));
        self.render_wallet();
        let label = if self.connecting { ControlLabel::Pending } else { ControlLabel::Normal };
        let enabled = state != SessionState::Connected && !self.connecting;
        self.set_control(Control::Connect, enabled, label);
        for operation in SignOperation::ALL {
            self.render_sign_control(operation);
        }
    }

    fn render_all(&mut self) {
        for editor in &self.editors {
            let text = editor.text().to_string();
            self.surface.apply(DisplayUpdate::EditorText { editor: editor.id(), text });
            show_preview(self.surface.as_mut(), editor);
        }
        for panel in &self.panels {
            let operation = panel.operation();
            let copied = panel.is_copied();
            let label = if copied { ControlLabel::Copied } else { ControlLabel::Normal };
            let enabled = panel.outcome().is_some_and(|o| o.result.is_success());
            if let Some(text) = panel.text() {
                self.surface.apply(DisplayUpdate::Outcome {
                    operation,
                    text,
                    error: panel.is_error(),
                    verification: panel.verification(),
                });
            }
            self.surface.apply(DisplayUpdate::Control {
                control: Control::Copy(operation),
                enabled,
                label,
            });
        }
        self.render_session();
    }
}

/// Shows the preview and, for EIP-712 buffers, the signing hash of `editor`.
fn show_preview(surface: &mut dyn DisplaySurface, editor: &Editor) {
    if let Some(preview) = editor.preview().cloned() {
        surface.apply(DisplayUpdate::Preview { editor: editor.id(), preview });
    }
    if let Some(digest) = editor.digest() {
        surface.apply(DisplayUpdate::Digest { editor: editor.id(), digest });
    }
}

/// Waits for the next provider event. Never resolves without a subscription.
async fn next_event(
    events: &mut Option<broadcast::Receiver<ProviderEvent>>,
) -> Option<ProviderEvent> {
    let Some(receiver) = events else { return futures::future::pending().await };
    loop {
        match receiver.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "dropped provider events");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
