//! The four signing operations and their per-operation status.

use crate::{
    error::SignError,
    preview::EditorId,
    provider::{
        ETH_SIGN_TYPED_DATA, ETH_SIGN_TYPED_DATA_V3, ETH_SIGN_TYPED_DATA_V4, PERSONAL_SIGN,
        ProviderError, RpcRequest,
    },
};
use alloy_primitives::{Address, hex};
use serde_json::{Value, json};
use std::{fmt, str::FromStr};

/// A signing method exposed by the wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignOperation {
    PersonalSign,
    TypedDataV4,
    TypedDataV3,
    TypedDataLegacy,
}

impl SignOperation {
    pub const ALL: [Self; 4] =
        [Self::PersonalSign, Self::TypedDataV4, Self::TypedDataV3, Self::TypedDataLegacy];

    /// The provider method this operation calls.
    pub fn method(self) -> &'static str {
        match self {
            Self::PersonalSign => PERSONAL_SIGN,
            Self::TypedDataV4 => ETH_SIGN_TYPED_DATA_V4,
            Self::TypedDataV3 => ETH_SIGN_TYPED_DATA_V3,
            Self::TypedDataLegacy => ETH_SIGN_TYPED_DATA,
        }
    }

    /// The editor holding this operation's payload.
    pub fn editor(self) -> EditorId {
        match self {
            Self::PersonalSign => EditorId::Message,
            Self::TypedDataV4 => EditorId::TypedDataV4,
            Self::TypedDataV3 => EditorId::TypedDataV3,
            Self::TypedDataLegacy => EditorId::TypedDataLegacy,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SignOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PersonalSign => "Personal Sign",
            Self::TypedDataV4 => "SignTypedData V4",
            Self::TypedDataV3 => "SignTypedData V3",
            Self::TypedDataLegacy => "SignTypedData",
        })
    }
}

impl FromStr for SignOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "personal" | "personal_sign" | "message" => Ok(Self::PersonalSign),
            "v4" | "eth_signtypeddata_v4" => Ok(Self::TypedDataV4),
            "v3" | "eth_signtypeddata_v3" => Ok(Self::TypedDataV3),
            "legacy" | "v1" | "eth_signtypeddata" => Ok(Self::TypedDataLegacy),
            _ => Err(format!("unknown operation `{s}`, expected one of: personal, v4, v3, legacy")),
        }
    }
}

/// Options appended to every signing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignOptions {
    /// Passed through to the wallet as `{ "silentSignPass": true }`. Its effect is wallet
    /// specific.
    pub silent_sign_pass: bool,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self { silent_sign_pass: true }
    }
}

impl SignOptions {
    fn to_param(&self) -> Option<Value> {
        self.silent_sign_pass.then(|| json!({ "silentSignPass": true }))
    }
}

/// Builds the provider request for `operation` from the editor text.
///
/// - `personal_sign`: `[hex(utf8(text)), account, options]`
/// - `eth_signTypedData_v4`/`_v3`: `[account, json_string(text), options]`
/// - `eth_signTypedData`: `[json(text), account, options]`
pub fn build_request(
    operation: SignOperation,
    account: Address,
    text: &str,
    options: &SignOptions,
) -> Result<RpcRequest, SignError> {
    let account = Value::String(account.to_string());
    let parse = || {
        serde_json::from_str::<Value>(text)
            .map_err(|source| SignError::Payload { editor: operation.editor(), source })
    };
    let mut params = match operation {
        SignOperation::PersonalSign => {
            vec![Value::String(hex::encode_prefixed(text.as_bytes())), account]
        }
        SignOperation::TypedDataV4 | SignOperation::TypedDataV3 => {
            vec![account, Value::String(parse()?.to_string())]
        }
        SignOperation::TypedDataLegacy => vec![parse()?, account],
    };
    params.extend(options.to_param());
    Ok(RpcRequest::with_params(operation.method(), params))
}

/// What the wallet answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SigningResult {
    /// The signature, exactly as returned.
    Signature(String),
    /// Description of the error.
    Failure(String),
}

impl SigningResult {
    /// Classifies a provider response.
    pub fn from_response(response: Result<Value, ProviderError>) -> Self {
        match response {
            Ok(Value::String(signature)) => Self::Signature(signature),
            Ok(other) => Self::Signature(other.to_string()),
            Err(err) => Self::Failure(err.description()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Signature(_))
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            Self::Signature(signature) => Some(signature),
            Self::Failure(_) => None,
        }
    }
}

/// The latest result of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningOutcome {
    pub operation: SignOperation,
    pub result: SigningResult,
}

/// Status of a single operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OperationStatus {
    #[default]
    Idle,
    /// A request was sent and the wallet has not answered yet.
    Pending,
    Resolved(SigningOutcome),
}

/// Status of every operation. At most one request per operation is in flight.
#[derive(Clone, Debug, Default)]
pub struct SigningSlots {
    slots: [OperationStatus; 4],
}

impl SigningSlots {
    pub fn status(&self, operation: SignOperation) -> &OperationStatus {
        &self.slots[operation.index()]
    }

    pub fn is_pending(&self, operation: SignOperation) -> bool {
        matches!(self.status(operation), OperationStatus::Pending)
    }

    /// Marks `operation` as pending.
    pub fn begin(&mut self, operation: SignOperation) -> Result<(), SignError> {
        if self.is_pending(operation) {
            return Err(SignError::AlreadyPending(operation));
        }
        self.slots[operation.index()] = OperationStatus::Pending;
        Ok(())
    }

    /// Records the result of `operation`, replacing any previous one.
    pub fn resolve(&mut self, operation: SignOperation, result: SigningResult) -> SigningOutcome {
        let outcome = SigningOutcome { operation, result };
        self.slots[operation.index()] = OperationStatus::Resolved(outcome.clone());
        outcome
    }
}
