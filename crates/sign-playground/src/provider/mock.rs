//! A scripted [`WalletProvider`] for tests and offline runs.

use super::{
    ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS, ETH_SIGN_TYPED_DATA,
    ETH_SIGN_TYPED_DATA_V3, ETH_SIGN_TYPED_DATA_V4, EVENT_CHANNEL_CAPACITY, PERSONAL_SIGN,
    ProviderError, ProviderEvent, RpcRequest, UNSUPPORTED_METHOD, WalletProvider,
};
use alloy_primitives::{hex, keccak256};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use tokio::sync::broadcast;

#[derive(Clone, Debug)]
enum Scripted {
    Reply(Result<Value, ProviderError>),
    /// Never answers.
    Hang,
}

/// The pending responses of one method and the last one served.
#[derive(Debug, Default)]
struct MethodScript {
    queue: VecDeque<Scripted>,
    last: Option<Scripted>,
}

/// A provider that answers from a script.
///
/// Responses are queued per method. The last queued response of a method is reused once the
/// queue is drained, so a single `respond` call answers every request. Unscripted methods fail
/// with [`UNSUPPORTED_METHOD`], unless deterministic signatures are enabled and the method is a
/// signing method.
#[derive(Debug)]
pub struct MockProvider {
    script: Mutex<HashMap<String, MethodScript>>,
    calls: Mutex<Vec<RpcRequest>>,
    events: broadcast::Sender<ProviderEvent>,
    deterministic_signatures: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            events,
            deterministic_signatures: false,
        }
    }

    /// A provider that authorizes `account` on connect and signs every payload with a
    /// deterministic placeholder signature. Nothing is actually signed.
    pub fn offline(account: &str, chain_id: u64) -> Self {
        let mut provider = Self::new();
        provider.deterministic_signatures = true;
        provider
            .respond(ETH_ACCOUNTS, Ok(json!([])))
            .respond(ETH_REQUEST_ACCOUNTS, Ok(json!([account])))
            .respond(ETH_CHAIN_ID, Ok(json!(format!("{chain_id:#x}"))));
        provider
    }

    /// Queues a response for `method`.
    pub fn respond(&self, method: &str, response: Result<Value, ProviderError>) -> &Self {
        self.push(method, Scripted::Reply(response));
        self
    }

    /// Makes the next request for `method` wait forever.
    pub fn hang(&self, method: &str) -> &Self {
        self.push(method, Scripted::Hang);
        self
    }

    /// Emits a provider event to all subscribers.
    pub fn emit(&self, event: ProviderEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// All requests received so far, in order.
    pub fn calls(&self) -> Vec<RpcRequest> {
        self.calls.lock().clone()
    }

    /// Requests received for `method`.
    pub fn calls_to(&self, method: &str) -> Vec<RpcRequest> {
        self.calls.lock().iter().filter(|req| req.method == method).cloned().collect()
    }

    fn push(&self, method: &str, scripted: Scripted) {
        self.script.lock().entry(method.to_string()).or_default().queue.push_back(scripted);
    }

    fn next(&self, method: &str) -> Option<Scripted> {
        let mut script = self.script.lock();
        let entry = script.get_mut(method)?;
        match entry.queue.pop_front() {
            Some(scripted) => Some(entry.last.insert(scripted).clone()),
            None => entry.last.clone(),
        }
    }

    fn deterministic_signature(request: &RpcRequest) -> Value {
        let mut seed = request.method.as_bytes().to_vec();
        seed.extend_from_slice(Value::Array(request.params.clone()).to_string().as_bytes());
        let hash = keccak256(seed);
        let mut sig = Vec::with_capacity(65);
        sig.extend_from_slice(hash.as_slice());
        sig.extend_from_slice(hash.as_slice());
        sig.push(27);
        Value::String(hex::encode_prefixed(sig))
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        trace!(target: "mock", method = %request.method, "request");
        self.calls.lock().push(request.clone());

        match self.next(&request.method) {
            Some(Scripted::Reply(reply)) => reply,
            Some(Scripted::Hang) => futures::future::pending().await,
            None if self.deterministic_signatures
                && matches!(
                    request.method.as_str(),
                    PERSONAL_SIGN
                        | ETH_SIGN_TYPED_DATA_V4
                        | ETH_SIGN_TYPED_DATA_V3
                        | ETH_SIGN_TYPED_DATA
                ) =>
            {
                Ok(Self::deterministic_signature(&request))
            }
            None => Err(ProviderError::with_code(
                UNSUPPORTED_METHOD,
                format!("The requested method is not supported: {}", request.method),
            )),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
