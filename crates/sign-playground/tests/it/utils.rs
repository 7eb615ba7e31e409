use alloy_primitives::{Address, address};
use foundry_sign_playground::{
    MemoryClipboard, Playground, PlaygroundConfig, RecordingSurface, WalletProvider,
};
use std::{sync::Arc, time::Duration};

pub const ALICE: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const BOB: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

/// A playground recording everything it displays and copies.
pub struct TestPlayground {
    pub playground: Playground,
    pub surface: RecordingSurface,
    pub clipboard: MemoryClipboard,
}

impl TestPlayground {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self::with_config(provider, PlaygroundConfig::default())
    }

    pub fn with_config(
        provider: Option<Arc<dyn WalletProvider>>,
        config: PlaygroundConfig,
    ) -> Self {
        let surface = RecordingSurface::default();
        let clipboard = MemoryClipboard::default();
        let playground = Playground::new(provider, config, surface.clone(), clipboard.clone());
        Self { playground, surface, clipboard }
    }
}

/// Polls `condition` until it holds, panicking after a few seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
