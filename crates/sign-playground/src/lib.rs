//! # foundry-sign-playground
//!
//! Connects to an injected browser wallet and exercises its signing methods against editable
//! sample payloads:
//! - `personal_sign` ([EIP-191](https://eips.ethereum.org/EIPS/eip-191))
//! - `eth_signTypedData_v4` and `eth_signTypedData_v3`
//!   ([EIP-712](https://eips.ethereum.org/EIPS/eip-712))
//! - `eth_signTypedData`, the legacy array-of-fields variant
//!
//! ## Architecture
//!
//! The wallet is reached through the [`WalletProvider`] trait, which mirrors the
//! [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193) `request` method and its
//! `accountsChanged`/`chainChanged` events. The [`Playground`] owns the [`WalletSession`], one
//! [`Editor`] per payload, the per-operation signing status and the result panels, and pushes
//! every visible change to a [`DisplaySurface`].
//!
//! The `bridge` module serves a small page on localhost that relays requests to the wallet
//! injected into the browser, so the whole core runs natively.

#[macro_use]
extern crate tracing;

pub mod bridge;
pub mod config;
pub mod display;
pub mod error;
pub mod networks;
pub mod playground;
pub mod presentation;
pub mod preview;
pub mod provider;
pub mod samples;
pub mod session;
pub mod signing;
pub mod verify;

pub use bridge::{BridgeProvider, BridgeServer};
pub use config::PlaygroundConfig;
pub use display::{DisplaySurface, DisplayUpdate, RecordingSurface};
pub use error::{PlaygroundError, SignError};
pub use playground::{Playground, PlaygroundCommand};
pub use presentation::{Clipboard, MemoryClipboard};
pub use preview::{Editor, EditorId, Preview};
pub use provider::{ProviderError, ProviderEvent, RpcRequest, WalletProvider};
pub use session::{SessionState, WalletSession};
pub use signing::{OperationStatus, SignOperation, SigningOutcome, SigningResult};
