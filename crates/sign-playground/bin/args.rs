use clap::Parser;
use foundry_sign_playground::PlaygroundConfig;
use std::path::PathBuf;

/// Connect to a browser wallet and try out its signing methods.
///
/// Open the printed URL in the browser where the wallet extension is installed, then type
/// commands on the terminal. Type `help` to list them.
#[derive(Clone, Debug, Parser)]
#[command(name = "sign-playground", version, next_display_order = None)]
pub struct PlaygroundArgs {
    /// Port of the local bridge server. `0` picks a free port.
    #[arg(long, short, value_name = "PORT")]
    pub port: Option<u16>,

    /// How long to wait for the wallet to answer a request, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Name of the global the wallet injects into the page.
    ///
    /// The page falls back to `window.ethereum` when it is missing.
    #[arg(long, value_name = "NAME")]
    pub provider_global: Option<String>,

    /// Do not ask the wallet to skip its confirmation prompt.
    #[arg(long)]
    pub no_silent_sign_pass: bool,

    /// Path to the configuration file.
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use a built-in wallet returning placeholder signatures instead of a browser wallet.
    #[arg(long)]
    pub offline: bool,
}

impl PlaygroundArgs {
    /// Loads the configuration and applies the command line overrides.
    pub fn load_config(&self) -> Result<PlaygroundConfig, figment::Error> {
        let config = match &self.config {
            Some(path) => PlaygroundConfig::load_from(path)?,
            None => PlaygroundConfig::load()?,
        };
        Ok(self.apply(config))
    }

    fn apply(&self, mut config: PlaygroundConfig) -> PlaygroundConfig {
        if let Some(port) = self.port {
            config.bridge_port = port;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(global) = &self.provider_global {
            config.provider_global.clone_from(global);
        }
        if self.no_silent_sign_pass {
            config.silent_sign_pass = false;
        }
        config
    }
}
