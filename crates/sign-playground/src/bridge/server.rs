use std::{net::Ipv4Addr, sync::Arc, time::Duration};

use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

use crate::bridge::{
    error::BridgeError, provider::BridgeProvider, router::build_router, state::BridgeState,
};

/// Serves the bridge page and its API on localhost.
#[derive(Debug)]
pub struct BridgeServer {
    port: u16,
    timeout: Duration,
    state: Arc<BridgeState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl BridgeServer {
    /// Create a server for `port`, `0` picking a free one once started.
    ///
    /// `timeout` bounds how long a request waits for the wallet.
    pub fn new(port: u16, provider_global: impl Into<String>, timeout: Duration) -> Self {
        Self {
            port,
            timeout,
            state: Arc::new(BridgeState::new(provider_global)),
            shutdown: None,
            task: None,
        }
    }

    /// The port the server listens on, once started.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL of the bridge page.
    pub fn url(&self) -> String {
        format!("http://{}:{}", Ipv4Addr::LOCALHOST, self.port)
    }

    /// Token the page sends with every API call.
    pub fn session_token(&self) -> String {
        self.state.session_token().to_string()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Number of requests still waiting for the wallet.
    pub fn pending_requests(&self) -> usize {
        self.state.num_pending_requests()
    }

    /// Start serving in the background.
    pub async fn start(&mut self) -> Result<(), BridgeError> {
        if self.is_running() {
            return Err(BridgeError::AlreadyRunning(self.port));
        }

        let listener =
            TcpListener::bind((Ipv4Addr::LOCALHOST, self.port)).await.map_err(BridgeError::Bind)?;
        self.port = listener.local_addr().map_err(BridgeError::Bind)?.port();

        let router = build_router(self.state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = server.await {
                error!(target: "bridge", %err, "bridge server failed");
            }
        });

        self.shutdown = Some(shutdown_tx);
        self.task = Some(task);
        info!(target: "bridge", url = %self.url(), "bridge server listening");
        Ok(())
    }

    /// Stop serving and wait for the server task to exit.
    pub async fn stop(&mut self) -> Result<(), BridgeError> {
        let (Some(shutdown), Some(task)) = (self.shutdown.take(), self.task.take()) else {
            return Err(BridgeError::NotRunning);
        };
        let _ = shutdown.send(());
        if let Err(err) = task.await {
            warn!(target: "bridge", %err, "bridge server task panicked");
        }
        debug!(target: "bridge", "bridge server stopped");
        Ok(())
    }

    /// A provider sending its requests through the page.
    pub fn provider(&self) -> BridgeProvider {
        BridgeProvider::new(self.state.clone(), self.timeout)
    }

    /// Wait for the page to report whether a wallet is injected.
    ///
    /// Returns the provider if the page found one, `None` if it did not.
    pub async fn wait_for_detection(
        &self,
        timeout: Duration,
    ) -> Result<Option<BridgeProvider>, BridgeError> {
        let mut status = self.state.watch_provider();
        let available = match tokio::time::timeout(timeout, status.wait_for(Option::is_some)).await
        {
            Ok(Ok(status)) => status.as_ref().is_some_and(|status| status.available),
            // the state owns the sender
            Ok(Err(_)) => return Err(BridgeError::NotRunning),
            Err(_) => return Err(BridgeError::DetectionTimeout(timeout)),
        };
        Ok(available.then(|| self.provider()))
    }

    /// What the page reported so far.
    pub fn provider_available(&self) -> Option<bool> {
        self.state.provider_status().map(|status| status.available)
    }
}
