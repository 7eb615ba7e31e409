use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::provider::{ProviderError, RpcRequest};

/// A provider request waiting to be picked up by the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRequest {
    pub id: Uuid,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl BridgeRequest {
    pub fn new(request: RpcRequest) -> Self {
        Self { id: Uuid::new_v4(), method: request.method, params: request.params }
    }
}

/// The page's answer to a [`BridgeRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
}

impl BridgeResponse {
    pub fn ok(id: Uuid, result: Value) -> Self {
        Self { id, result: Some(result), error: None }
    }

    pub fn err(id: Uuid, error: ProviderError) -> Self {
        Self { id, result: None, error: Some(error) }
    }

    /// A missing result is `null`, as `request` resolved with `undefined`.
    pub fn into_result(self) -> Result<Value, ProviderError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Whether the page found an injected provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub available: bool,
    /// The global the provider was found under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum BridgeApiResponse<T> {
    Ok(T),
    Error { message: String },
}

impl<T> BridgeApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}
