use crate::{preview::EditorId, provider::ProviderError, signing::SignOperation};

/// Errors raised by the wallet session.
#[derive(Debug, thiserror::Error)]
pub enum PlaygroundError {
    #[error("no injected wallet provider was detected")]
    ProviderUnavailable,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("wallet returned an invalid account: {0:?}")]
    InvalidAccount(String),
    #[error("wallet returned a malformed `{method}` response: {value}")]
    MalformedResponse { method: &'static str, value: serde_json::Value },
}

impl PlaygroundError {
    /// Human readable description shown to the user.
    ///
    /// Provider errors are reduced to their message, as the wallet reported it.
    pub fn description(&self) -> String {
        match self {
            Self::Provider(err) => err.description(),
            other => other.to_string(),
        }
    }
}

/// Errors that prevent a signing request from being sent.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("connect a wallet first")]
    NotConnected,
    #[error("{0} is already waiting for the wallet")]
    AlreadyPending(SignOperation),
    #[error("invalid {editor} payload: {source}")]
    Payload {
        editor: EditorId,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("failed to write to the clipboard: {0}")]
pub struct ClipboardError(#[from] pub std::io::Error);
