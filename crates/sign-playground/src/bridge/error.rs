use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to bind the bridge server: {0}")]
    Bind(#[source] std::io::Error),
    #[error("the bridge server is not running")]
    NotRunning,
    #[error("the bridge server is already running on port {0}")]
    AlreadyRunning(u16),
    #[error("the bridge page was not opened within {}s", .0.as_secs())]
    DetectionTimeout(Duration),
}
