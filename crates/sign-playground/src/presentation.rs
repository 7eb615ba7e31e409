//! Rendering of signing outcomes and the copy-to-clipboard action.

use crate::{
    error::ClipboardError,
    signing::{SignOperation, SigningOutcome, SigningResult},
};
use alloy_primitives::Address;
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};

/// How long the copy control shows its confirmation.
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Prefix of the text shown for failed operations.
pub const FAILURE_PREFIX: &str = "Signing failed: ";

/// Destination of the copy action.
pub trait Clipboard: Send {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// A clipboard that keeps the copied text in memory.
///
/// Clones share their contents.
#[derive(Clone, Debug, Default)]
pub struct MemoryClipboard {
    writes: Arc<Mutex<Vec<String>>>,
}

impl MemoryClipboard {
    /// The most recently copied text.
    pub fn contents(&self) -> Option<String> {
        self.writes.lock().last().cloned()
    }

    /// Every text copied so far.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.writes.lock().push(text.to_string());
        Ok(())
    }
}

/// Result of recovering the signer of a signature locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verification {
    pub recovered: Address,
    /// Whether `recovered` is the connected account.
    pub matches: bool,
}

/// The result area of one operation.
#[derive(Clone, Debug)]
pub struct ResultPanel {
    operation: SignOperation,
    outcome: Option<SigningOutcome>,
    verification: Option<Verification>,
    copied: bool,
}

impl ResultPanel {
    pub fn new(operation: SignOperation) -> Self {
        Self { operation, outcome: None, verification: None, copied: false }
    }

    pub fn operation(&self) -> SignOperation {
        self.operation
    }

    /// Replaces the displayed outcome.
    pub fn show(&mut self, outcome: SigningOutcome, verification: Option<Verification>) {
        debug_assert_eq!(outcome.operation, self.operation);
        self.outcome = Some(outcome);
        self.verification = verification;
        self.copied = false;
    }

    pub fn outcome(&self) -> Option<&SigningOutcome> {
        self.outcome.as_ref()
    }

    pub fn verification(&self) -> Option<Verification> {
        self.verification
    }

    /// The text displayed in the panel, if any.
    pub fn text(&self) -> Option<String> {
        self.outcome.as_ref().map(|outcome| render_result(&outcome.result))
    }

    pub fn is_error(&self) -> bool {
        self.outcome.as_ref().is_some_and(|outcome| !outcome.result.is_success())
    }

    /// Whether the copy control currently shows its confirmation.
    pub fn is_copied(&self) -> bool {
        self.copied
    }

    /// Copies a successful signature to `clipboard`.
    ///
    /// Returns `false` without writing anything when there is no signature to copy.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard) -> Result<bool, ClipboardError> {
        let Some(signature) = self.outcome.as_ref().and_then(|outcome| outcome.result.signature())
        else {
            return Ok(false);
        };
        clipboard.write_text(signature)?;
        self.copied = true;
        Ok(true)
    }

    /// Ends the copy confirmation.
    pub fn reset_copied(&mut self) {
        self.copied = false;
    }
}

/// Text shown for a signing result.
pub fn render_result(result: &SigningResult) -> String {
    match result {
        SigningResult::Signature(signature) => signature.clone(),
        SigningResult::Failure(description) => format!("{FAILURE_PREFIX}{description}"),
    }
}
