//! Abstraction over an injected wallet provider.
//!
//! Reference: <https://eips.ethereum.org/EIPS/eip-1193>

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tokio::sync::broadcast;

pub mod mock;

pub use mock::MockProvider;

/// Returns the currently authorized accounts without prompting the user.
pub const ETH_ACCOUNTS: &str = "eth_accounts";
/// Prompts the user to authorize accounts.
pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
/// Returns the active chain id as a hex string.
pub const ETH_CHAIN_ID: &str = "eth_chainId";
pub const PERSONAL_SIGN: &str = "personal_sign";
pub const ETH_SIGN_TYPED_DATA_V4: &str = "eth_signTypedData_v4";
pub const ETH_SIGN_TYPED_DATA_V3: &str = "eth_signTypedData_v3";
pub const ETH_SIGN_TYPED_DATA: &str = "eth_signTypedData";

/// EIP-1193 error code for a request the user rejected.
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// EIP-1193 error code for a method the provider does not support.
pub const UNSUPPORTED_METHOD: i64 = 4200;

/// Number of provider events buffered per subscriber before the oldest are dropped.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The argument of the provider's `request` method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl RpcRequest {
    /// Creates a request without parameters.
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into(), params: Vec::new() }
    }

    /// Creates a request with the given positional parameters.
    pub fn with_params(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self { method: method.into(), params }
    }
}

/// Events emitted by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ProviderEvent {
    /// The authorized accounts changed. An empty list means the wallet disconnected.
    AccountsChanged(Vec<String>),
    /// The active chain changed. Carries the chain id as a hex string.
    ChainChanged(String),
}

/// An error returned by the provider's `request` method.
///
/// Wallets are not consistent about the shape of their errors, so every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{}", self.description())]
pub struct ProviderError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderError {
    /// Creates an error carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), ..Default::default() }
    }

    /// Creates an error with an EIP-1193 code and message.
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: Some(message.into()), data: None }
    }

    /// The error a wallet returns when the user dismisses the prompt.
    pub fn user_rejected() -> Self {
        Self::with_code(USER_REJECTED_REQUEST, "User rejected the request.")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED_REQUEST)
    }

    /// The message if there is one, otherwise the serialized error.
    pub fn description(&self) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}")),
        }
    }
}

/// A wallet provider, as injected into the page by a browser extension.
#[async_trait]
pub trait WalletProvider: Send + Sync + fmt::Debug {
    /// Sends a single request and waits for the wallet to answer.
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError>;

    /// Subscribes to `accountsChanged` and `chainChanged` events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
