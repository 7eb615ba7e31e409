use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::{
    bridge::{state::BridgeState, types::BridgeRequest},
    provider::{ProviderError, ProviderEvent, RpcRequest, WalletProvider},
};

/// A [`WalletProvider`] relaying requests to the wallet injected into the bridge page.
#[derive(Debug, Clone)]
pub struct BridgeProvider {
    state: Arc<BridgeState>,
    timeout: Duration,
}

impl BridgeProvider {
    pub(crate) fn new(state: Arc<BridgeState>, timeout: Duration) -> Self {
        Self { state, timeout }
    }
}

#[async_trait]
impl WalletProvider for BridgeProvider {
    async fn request(&self, request: RpcRequest) -> Result<Value, ProviderError> {
        let request = BridgeRequest::new(request);
        let id = request.id;
        let method = request.method.clone();
        trace!(target: "bridge", %id, %method, "queueing request");

        let response = self.state.add_request(request);
        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ProviderError::message("the bridge dropped the request")),
            Err(_) => {
                self.state.remove_request(&id);
                warn!(target: "bridge", %id, %method, "request timed out");
                Err(ProviderError::message(format!(
                    "the wallet did not answer `{method}` within {:?}",
                    self.timeout
                )))
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.state.subscribe()
    }
}
