//! Playground configuration.
//!
//! Values are merged from, in increasing priority: the defaults, `sign-playground.toml` in the
//! working directory, and `SIGN_PLAYGROUND_*` environment variables.

use crate::{presentation::COPY_FEEDBACK, session::DEFAULT_CHAIN_ID, signing::SignOptions};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "sign-playground.toml";

/// Prefix of the environment variables overriding the configuration.
pub const ENV_PREFIX: &str = "SIGN_PLAYGROUND_";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Name of the global the wallet extension injects into the page, e.g. `okxwallet`.
    ///
    /// The page falls back to `ethereum` when it is missing.
    pub provider_global: String,
    /// Where to point users without a wallet.
    pub install_url: String,
    /// Whether signing requests carry `{ "silentSignPass": true }`.
    pub silent_sign_pass: bool,
    /// How long the copy confirmation is shown, in milliseconds.
    pub copy_feedback_ms: u64,
    /// Chain id adopted when the wallet fails to report one.
    pub fallback_chain_id: u64,
    /// Port of the local bridge server. `0` picks a free port.
    pub bridge_port: u16,
    /// How long to wait for the wallet to answer a request, in seconds.
    pub request_timeout_secs: u64,
    /// How long to wait for the page to report whether a wallet is injected, in seconds.
    pub detection_timeout_secs: u64,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            provider_global: "okxwallet".to_string(),
            install_url: "https://www.okx.com/web3".to_string(),
            silent_sign_pass: true,
            copy_feedback_ms: COPY_FEEDBACK.as_millis() as u64,
            fallback_chain_id: DEFAULT_CHAIN_ID,
            bridge_port: 9545,
            request_timeout_secs: 300,
            detection_timeout_secs: 60,
        }
    }
}

impl PlaygroundConfig {
    /// Loads the configuration from the working directory and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Loads the configuration from `path` instead of [`CONFIG_FILE_NAME`].
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment_with_file(path).extract()
    }

    /// The default [`Figment`].
    pub fn figment() -> Figment {
        Self::figment_with_file(CONFIG_FILE_NAME)
    }

    /// Like [`figment`](Self::figment), reading the file at `path`.
    ///
    /// A missing file is not an error.
    pub fn figment_with_file(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_secs(self.detection_timeout_secs)
    }

    pub fn sign_options(&self) -> SignOptions {
        SignOptions { silent_sign_pass: self.silent_sign_pass }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figment_is_default() {
        figment::Jail::expect_with(|_| {
            let config = PlaygroundConfig::load()?;
            assert_eq!(config, PlaygroundConfig::default());
            assert_eq!(config.copy_feedback(), Duration::from_secs(2));
            Ok(())
        });
    }

    #[test]
    fn file_then_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                r#"
                provider_global = "ethereum"
                silent_sign_pass = false
                bridge_port = 1234
            "#,
            )?;
            let config = PlaygroundConfig::load()?;
            assert_eq!(config.provider_global, "ethereum");
            assert!(!config.sign_options().silent_sign_pass);
            assert_eq!(config.bridge_port, 1234);

            jail.set_env("SIGN_PLAYGROUND_BRIDGE_PORT", "4321");
            jail.set_env("SIGN_PLAYGROUND_FALLBACK_CHAIN_ID", "137");
            let config = PlaygroundConfig::load()?;
            assert_eq!(config.bridge_port, 4321);
            assert_eq!(config.fallback_chain_id, 137);
            assert_eq!(config.provider_global, "ethereum");
            Ok(())
        });
    }

    #[test]
    fn explicit_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "copy_feedback_ms = 500")?;
            let config = PlaygroundConfig::load_from("custom.toml")?;
            assert_eq!(config.copy_feedback(), Duration::from_millis(500));
            Ok(())
        });
    }
}
