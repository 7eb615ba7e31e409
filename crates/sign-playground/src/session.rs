//! The wallet session state machine.

use crate::{
    error::PlaygroundError,
    networks::{parse_chain_id, parse_chain_id_str},
    provider::{ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS, RpcRequest, WalletProvider},
};
use alloy_primitives::Address;
use serde_json::Value;
use std::{fmt, str::FromStr, sync::Arc};

/// Chain id assumed when the wallet fails to report one.
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Coarse state of a [`WalletSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No wallet provider was detected.
    Unavailable,
    /// A provider is present but no account is authorized.
    Disconnected,
    /// An account is authorized and the active chain is known.
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unavailable => "unavailable",
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
        })
    }
}

/// The active account and chain of a connected wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    pub account: Address,
    pub chain_id: u64,
}

impl Connection {
    pub fn new(account: Address, chain_id: u64) -> Self {
        Self { account, chain_id }
    }
}

/// What remains to do after an `accountsChanged` event.
#[derive(Debug)]
pub enum AccountsChange {
    /// The event was fully applied.
    Applied(SessionState),
    /// A disconnected session was handed `account`. It connects through
    /// [`WalletSession::adopt_account`] once the chain id is known.
    Adopt { account: Address, provider: Arc<dyn WalletProvider> },
}

/// Tracks the provider, the connected account and the active chain.
///
/// The account is set if and only if the session is [`SessionState::Connected`], and a connected
/// session always knows its chain id.
#[derive(Debug)]
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    connection: Option<Connection>,
    /// Account waiting for its chain id after an `accountsChanged` event.
    adopting: Option<Address>,
    fallback_chain_id: u64,
}

impl WalletSession {
    /// Creates a session for the detected provider, if any.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { provider, connection: None, adopting: None, fallback_chain_id: DEFAULT_CHAIN_ID }
    }

    /// Sets the chain id adopted when `eth_chainId` fails.
    pub fn with_fallback_chain_id(mut self, chain_id: u64) -> Self {
        self.fallback_chain_id = chain_id;
        self
    }

    pub fn state(&self) -> SessionState {
        match (&self.provider, &self.connection) {
            (None, _) => SessionState::Unavailable,
            (Some(_), None) => SessionState::Disconnected,
            (Some(_), Some(_)) => SessionState::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    pub fn provider(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.provider.as_ref()
    }

    pub fn connection(&self) -> Option<Connection> {
        self.connection
    }

    pub fn account(&self) -> Option<Address> {
        self.connection.map(|c| c.account)
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.connection.map(|c| c.chain_id)
    }

    pub fn fallback_chain_id(&self) -> u64 {
        self.fallback_chain_id
    }

    /// Adopts already authorized accounts without prompting the user.
    ///
    /// Called once at startup. Leaves the session disconnected when the wallet has not authorized
    /// this page yet.
    pub async fn restore(&mut self) -> Result<SessionState, PlaygroundError> {
        let Some(provider) = self.provider.clone() else {
            return Ok(SessionState::Unavailable);
        };
        let connection =
            resolve_connection(provider.as_ref(), ETH_ACCOUNTS, self.fallback_chain_id).await?;
        if connection.is_some() {
            self.apply_connection(connection);
        }
        Ok(self.state())
    }

    /// Asks the wallet to authorize an account, prompting the user.
    pub async fn connect(&mut self) -> Result<SessionState, PlaygroundError> {
        let provider = self.provider.clone().ok_or(PlaygroundError::ProviderUnavailable)?;
        let connection = request_connection(provider, self.fallback_chain_id).await?;
        Ok(self.apply_connection(connection))
    }

    /// Applies the result of [`request_connection`].
    ///
    /// `None` means the wallet authorized no account, which leaves the session disconnected.
    pub fn apply_connection(&mut self, connection: Option<Connection>) -> SessionState {
        if self.provider.is_none() {
            return SessionState::Unavailable;
        }
        match connection {
            Some(connection) => {
                debug!(
                    account = %connection.account,
                    chain_id = connection.chain_id,
                    "wallet connected"
                );
            }
            None if self.connection.is_some() => debug!("wallet disconnected"),
            None => {}
        }
        self.connection = connection;
        self.state()
    }

    /// Handles an `accountsChanged` event.
    ///
    /// An empty list disconnects. Otherwise the first account becomes the active one; the chain id
    /// is only queried when the session was not connected before.
    pub async fn on_accounts_changed(
        &mut self,
        accounts: &[String],
    ) -> Result<SessionState, PlaygroundError> {
        match self.begin_accounts_changed(accounts)? {
            AccountsChange::Applied(state) => Ok(state),
            AccountsChange::Adopt { account, provider } => {
                let chain_id = query_chain_id(provider.as_ref(), self.fallback_chain_id).await;
                self.adopt_account(account, chain_id);
                Ok(self.state())
            }
        }
    }

    /// Applies the part of an `accountsChanged` event that needs no wallet round trip.
    pub fn begin_accounts_changed(
        &mut self,
        accounts: &[String],
    ) -> Result<AccountsChange, PlaygroundError> {
        let Some(provider) = self.provider.clone() else {
            return Ok(AccountsChange::Applied(SessionState::Unavailable));
        };
        let Some(first) = accounts.first() else {
            self.adopting = None;
            return Ok(AccountsChange::Applied(self.apply_connection(None)));
        };
        let account = parse_account(first)?;
        if let Some(connection) = self.connection.as_mut() {
            debug!(%account, "active account changed");
            connection.account = account;
            return Ok(AccountsChange::Applied(SessionState::Connected));
        }
        self.adopting = Some(account);
        Ok(AccountsChange::Adopt { account, provider })
    }

    /// Connects to an account handed over by `accountsChanged`, now that its chain is known.
    ///
    /// Returns `false` when the session connected otherwise in the meantime, or a later event
    /// replaced or revoked the account.
    pub fn adopt_account(&mut self, account: Address, chain_id: u64) -> bool {
        if self.connection.is_some() || self.adopting != Some(account) {
            trace!(%account, "dropping stale account adoption");
            return false;
        }
        self.adopting = None;
        self.apply_connection(Some(Connection::new(account, chain_id)));
        true
    }

    /// Handles a `chainChanged` event.
    ///
    /// Returns the new chain id when it was adopted. Events received while not connected and
    /// unparseable chain ids are ignored.
    pub fn on_chain_changed(&mut self, raw: &str) -> Option<u64> {
        let Some(chain_id) = parse_chain_id_str(raw) else {
            warn!(%raw, "ignoring unparseable chain id");
            return None;
        };
        let Some(connection) = &mut self.connection else {
            trace!(chain_id, "ignoring chain change while disconnected");
            return None;
        };
        debug!(from = connection.chain_id, to = chain_id, "active chain changed");
        connection.chain_id = chain_id;
        Some(chain_id)
    }
}

/// Requests account authorization (`eth_requestAccounts`) and, when an account is granted, the
/// active chain id.
///
/// Holds no borrow of the session so the prompt can stay open while other events are handled.
pub async fn request_connection(
    provider: Arc<dyn WalletProvider>,
    fallback_chain_id: u64,
) -> Result<Option<Connection>, PlaygroundError> {
    resolve_connection(provider.as_ref(), ETH_REQUEST_ACCOUNTS, fallback_chain_id).await
}

async fn resolve_connection(
    provider: &dyn WalletProvider,
    method: &'static str,
    fallback_chain_id: u64,
) -> Result<Option<Connection>, PlaygroundError> {
    let accounts = provider.request(RpcRequest::new(method)).await?;
    let Some(first) = first_account(method, accounts)? else {
        return Ok(None);
    };
    let account = parse_account(&first)?;
    let chain_id = query_chain_id(provider, fallback_chain_id).await;
    Ok(Some(Connection::new(account, chain_id)))
}

/// Queries `eth_chainId`, falling back to `fallback` if the wallet fails to answer.
pub async fn query_chain_id(provider: &dyn WalletProvider, fallback: u64) -> u64 {
    match provider.request(RpcRequest::new(ETH_CHAIN_ID)).await {
        Ok(value) => parse_chain_id(&value).unwrap_or_else(|| {
            warn!(%value, fallback, "unparseable chain id, using fallback");
            fallback
        }),
        Err(err) => {
            debug!(%err, fallback, "eth_chainId failed, using fallback");
            fallback
        }
    }
}

fn first_account(method: &'static str, accounts: Value) -> Result<Option<String>, PlaygroundError> {
    match accounts {
        Value::Array(accounts) => match accounts.into_iter().next() {
            Some(Value::String(account)) => Ok(Some(account)),
            Some(other) => Err(PlaygroundError::InvalidAccount(other.to_string())),
            None => Ok(None),
        },
        value => Err(PlaygroundError::MalformedResponse { method, value }),
    }
}

/// Parses an account as returned by the wallet. The checksum is not validated.
pub fn parse_account(account: &str) -> Result<Address, PlaygroundError> {
    Address::from_str(account.trim())
        .map_err(|_| PlaygroundError::InvalidAccount(account.to_string()))
}
