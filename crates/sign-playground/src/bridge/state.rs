use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, oneshot, watch};
use uuid::Uuid;

use crate::{
    bridge::{
        queue::RequestQueue,
        types::{BridgeRequest, BridgeResponse, ProviderStatus},
    },
    provider::{EVENT_CHANNEL_CAPACITY, ProviderError, ProviderEvent},
};

#[derive(Debug, Clone)]
pub(crate) struct BridgeState {
    /// Token the page must send with every API call.
    session_token: Arc<String>,
    /// Global the page looks up the provider under.
    provider_global: Arc<String>,
    /// Request/response queue for provider requests.
    requests: Arc<Mutex<RequestQueue>>,
    /// Events relayed from the page.
    events: broadcast::Sender<ProviderEvent>,
    /// What the page reported about the injected provider, `None` until it loaded.
    provider: Arc<watch::Sender<Option<ProviderStatus>>>,
}

impl BridgeState {
    /// Create a new bridge state.
    pub fn new(provider_global: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session_token: Arc::new(Uuid::new_v4().to_string()),
            provider_global: Arc::new(provider_global.into()),
            requests: Arc::new(Mutex::new(RequestQueue::new())),
            events,
            provider: Arc::new(watch::Sender::new(None)),
        }
    }

    pub fn session_token(&self) -> Arc<String> {
        self.session_token.clone()
    }

    pub fn provider_global(&self) -> &str {
        &self.provider_global
    }

    /// Queue a request and return the receiver of its answer.
    pub fn add_request(
        &self,
        request: BridgeRequest,
    ) -> oneshot::Receiver<Result<Value, ProviderError>> {
        let (tx, rx) = oneshot::channel();
        self.requests.lock().add_request(request, tx);
        rx
    }

    /// Take the next request for the page.
    pub fn take_next_request(&self) -> Option<BridgeRequest> {
        self.requests.lock().take_request()
    }

    /// Check if a request is still awaited.
    pub fn has_request(&self, id: &Uuid) -> bool {
        self.requests.lock().has_request(id)
    }

    /// Remove a request.
    pub fn remove_request(&self, id: &Uuid) {
        self.requests.lock().remove_request(id);
    }

    /// Deliver the page's answer. Returns `false` if nobody waits for it.
    pub fn add_response(&self, response: BridgeResponse) -> bool {
        let id = response.id;
        self.requests.lock().resolve(&id, response.into_result())
    }

    pub fn num_pending_requests(&self) -> usize {
        self.requests.lock().num_waiting()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    /// Relay a provider event to all subscribers.
    pub fn publish_event(&self, event: ProviderEvent) {
        if self.events.send(event).is_err() {
            trace!(target: "bridge", "no event subscribers");
        }
    }

    pub fn set_provider_status(&self, status: ProviderStatus) {
        self.provider.send_replace(Some(status));
    }

    pub fn provider_status(&self) -> Option<ProviderStatus> {
        self.provider.borrow().clone()
    }

    pub fn watch_provider(&self) -> watch::Receiver<Option<ProviderStatus>> {
        self.provider.subscribe()
    }
}
