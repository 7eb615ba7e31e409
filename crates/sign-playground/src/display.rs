//! Signals sent to whatever renders the playground.

use crate::{
    networks::network_name,
    presentation::Verification,
    preview::{EditorId, Preview},
    session::{Connection, SessionState},
    signing::SignOperation,
};
use alloy_primitives::{Address, B256};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shortens an address to `0x1234...abcd`.
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// What is shown about the connected wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletInfo {
    pub address: String,
    pub chain_id: u64,
    pub network: &'static str,
}

impl From<Connection> for WalletInfo {
    fn from(connection: Connection) -> Self {
        Self {
            address: short_address(&connection.account),
            chain_id: connection.chain_id,
            network: network_name(connection.chain_id),
        }
    }
}

/// An interactive control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    Connect,
    Sign(SignOperation),
    Copy(SignOperation),
}

/// The label a control shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlLabel {
    Normal,
    /// Waiting for the wallet.
    Pending,
    /// Copy confirmation.
    Copied,
}

/// A single visible change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayUpdate {
    Status(SessionState),
    /// Wallet details, `None` when disconnected.
    Wallet(Option<WalletInfo>),
    Control { control: Control, enabled: bool, label: ControlLabel },
    EditorText { editor: EditorId, text: String },
    Preview { editor: EditorId, preview: Preview },
    /// The EIP-712 hash of a typed data buffer, or why it cannot be computed.
    Digest { editor: EditorId, digest: Result<B256, String> },
    Outcome {
        operation: SignOperation,
        text: String,
        error: bool,
        verification: Option<Verification>,
    },
    /// A blocking notice, optionally pointing somewhere.
    Alert { message: String, link: Option<String> },
}

/// Renders [`DisplayUpdate`]s.
pub trait DisplaySurface: Send {
    fn apply(&mut self, update: DisplayUpdate);
}

/// Keeps every update, for tests.
///
/// Clones share the recorded updates.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    updates: Arc<Mutex<Vec<DisplayUpdate>>>,
}

impl RecordingSurface {
    pub fn updates(&self) -> Vec<DisplayUpdate> {
        self.updates.lock().clone()
    }

    pub fn clear(&self) {
        self.updates.lock().clear();
    }

    /// Alert messages in order.
    pub fn alerts(&self) -> Vec<String> {
        self.updates
            .lock()
            .iter()
            .filter_map(|update| match update {
                DisplayUpdate::Alert { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// The latest `(enabled, label)` of `control`.
    pub fn control(&self, control: Control) -> Option<(bool, ControlLabel)> {
        self.updates.lock().iter().rev().find_map(|update| match update {
            DisplayUpdate::Control { control: c, enabled, label } if *c == control => {
                Some((*enabled, *label))
            }
            _ => None,
        })
    }

    /// The latest `(text, error)` shown for `operation`.
    pub fn outcome(&self, operation: SignOperation) -> Option<(String, bool)> {
        self.updates.lock().iter().rev().find_map(|update| match update {
            DisplayUpdate::Outcome { operation: op, text, error, .. } if *op == operation => {
                Some((text.clone(), *error))
            }
            _ => None,
        })
    }

    /// The latest text pushed to `editor`.
    pub fn editor_text(&self, editor: EditorId) -> Option<String> {
        self.updates.lock().iter().rev().find_map(|update| match update {
            DisplayUpdate::EditorText { editor: e, text } if *e == editor => Some(text.clone()),
            _ => None,
        })
    }

    /// The latest signing hash shown for `editor`.
    pub fn digest(&self, editor: EditorId) -> Option<Result<B256, String>> {
        self.updates.lock().iter().rev().find_map(|update| match update {
            DisplayUpdate::Digest { editor: e, digest } if *e == editor => Some(digest.clone()),
            _ => None,
        })
    }

    pub fn status(&self) -> Option<SessionState> {
        self.updates.lock().iter().rev().find_map(|update| match update {
            DisplayUpdate::Status(state) => Some(*state),
            _ => None,
        })
    }

    pub fn wallet(&self) -> Option<Option<WalletInfo>> {
        self.updates.lock().iter().rev().find_map(|update| match update {
            DisplayUpdate::Wallet(info) => Some(info.clone()),
            _ => None,
        })
    }
}

impl DisplaySurface for RecordingSurface {
    fn apply(&mut self, update: DisplayUpdate) {
        self.updates.lock().push(update);
    }
}
