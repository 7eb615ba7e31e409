#[macro_use]
extern crate tracing;

use clap::Parser;
use eyre::Result;
use foundry_sign_playground::{
    BridgeServer, Playground, PlaygroundConfig, WalletProvider, provider::MockProvider,
};
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use yansi::Paint;

mod args;
mod handler;
mod terminal;

use args::PlaygroundArgs;
use terminal::{HELP, Input, OscClipboard, TerminalSurface, parse_input};

/// Account used by `--offline`.
const OFFLINE_ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

fn main() -> Result<()> {
    handler::install();
    subscriber();
    let args = PlaygroundArgs::parse();
    main_args(args)
}

/// Initializes a tracing subscriber for logging, filtered by `RUST_LOG`.
fn subscriber() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main_args(args: PlaygroundArgs) -> Result<()> {
    let config = args.load_config()?;
    debug!(?config, "loaded configuration");

    let mut bridge = None;
    let provider = if args.offline {
        println!("{}", "offline mode: signatures are placeholders".yellow());
        let provider = MockProvider::offline(OFFLINE_ACCOUNT, config.fallback_chain_id);
        Some(Arc::new(provider) as Arc<dyn WalletProvider>)
    } else {
        let server = bridge.insert(BridgeServer::new(
            config.bridge_port,
            config.provider_global.clone(),
            config.request_timeout(),
        ));
        server.start().await?;
        println!("Open {} in the browser where your wallet is installed.", server.url().cyan());
        let provider = server.wait_for_detection(config.detection_timeout()).await?;
        provider.map(|provider| Arc::new(provider) as Arc<dyn WalletProvider>)
    };

    run(provider, config).await?;

    if let Some(mut server) = bridge {
        server.stop().await?;
    }
    Ok(())
}

async fn run(provider: Option<Arc<dyn WalletProvider>>, config: PlaygroundConfig) -> Result<()> {
    let playground = Playground::new(provider, config, TerminalSurface, OscClipboard);
    let (commands, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(playground.run(rx));

    println!("Type `help` for the list of commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Ok(Input::Command(command)) => {
                if commands.send(command).is_err() {
                    break;
                }
            }
            Ok(Input::Help) => println!("{HELP}"),
            Ok(Input::Quit) => break,
            Ok(Input::Empty) => {}
            Err(err) => println!("{}", err.red()),
        }
    }

    drop(commands);
    task.await?;
    Ok(())
}
