use std::collections::{HashMap, VecDeque};

use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::{bridge::types::BridgeRequest, provider::ProviderError};

pub(crate) type Responder = oneshot::Sender<Result<Value, ProviderError>>;

/// Requests not yet picked up by the page, and the callers waiting for an answer.
#[derive(Debug, Default)]
pub(crate) struct RequestQueue {
    /// Requests in the order they were made.
    pending: VecDeque<BridgeRequest>,
    /// Callers keyed by request id, kept until the page answers or the caller gives up.
    waiting: HashMap<Uuid, Responder>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a request for the page.
    pub fn add_request(&mut self, request: BridgeRequest, responder: Responder) {
        self.waiting.insert(request.id, responder);
        self.pending.push_back(request);
    }

    /// Takes the oldest request that was not picked up yet.
    pub fn take_request(&mut self) -> Option<BridgeRequest> {
        self.pending.pop_front()
    }

    /// Whether someone still waits for an answer to `id`.
    pub fn has_request(&self, id: &Uuid) -> bool {
        self.waiting.contains_key(id)
    }

    /// Drops the request `id` whether or not it was picked up.
    pub fn remove_request(&mut self, id: &Uuid) {
        self.pending.retain(|request| request.id != *id);
        self.waiting.remove(id);
    }

    /// Hands the answer to `id` to its caller. Returns `false` if the id is unknown.
    pub fn resolve(&mut self, id: &Uuid, result: Result<Value, ProviderError>) -> bool {
        self.pending.retain(|request| request.id != *id);
        match self.waiting.remove(id) {
            // the caller may have timed out in the meantime
            Some(responder) => responder.send(result).is_ok(),
            None => false,
        }
    }

    pub fn num_waiting(&self) -> usize {
        self.waiting.len()
    }
}
