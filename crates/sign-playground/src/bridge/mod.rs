//! Reaches a wallet injected into a browser from native code.
//!
//! The [`BridgeServer`] serves a page on localhost that looks up the injected provider, polls the
//! server for queued requests, forwards them to the provider and posts the answers back. Provider
//! events are posted as they happen. Every API call must carry the session token embedded in the
//! page.

pub mod error;
pub mod server;
pub mod types;

mod app;
mod handlers;
mod provider;
mod queue;
mod router;
mod state;

pub use error::BridgeError;
pub use provider::BridgeProvider;
pub use router::SESSION_TOKEN_HEADER;
pub use server::BridgeServer;
