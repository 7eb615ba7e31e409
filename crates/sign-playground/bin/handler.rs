//! Error reports of the `sign-playground` binary.

use eyre::EyreHandler;
use foundry_sign_playground::bridge::BridgeError;
use itertools::Itertools;
use std::{error::Error, fmt};

/// Switches to the verbose `color-eyre` reports when set.
const DEBUG_ENV: &str = "SIGN_PLAYGROUND_DEBUG";

enum Handler {
    /// The message, its distinct causes and a hint for common setup mistakes.
    Concise,
    /// `color-eyre` report with backtrace and span trace.
    Verbose(Box<dyn EyreHandler>),
}

impl EyreHandler for Handler {
    fn display(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&dedup_chain(error).iter().format(": "), f)
    }

    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verbose(handler) => handler.debug(error, f),
            Self::Concise if f.alternate() => fmt::Debug::fmt(error, f),
            Self::Concise => write_report(error, f),
        }
    }

    fn track_caller(&mut self, location: &'static std::panic::Location<'static>) {
        if let Self::Verbose(handler) = self {
            handler.track_caller(location);
        }
    }
}

fn write_report(error: &(dyn Error + 'static), f: &mut impl fmt::Write) -> fmt::Result {
    let chain = dedup_chain(error);
    let Some((message, causes)) = chain.split_first() else { return Ok(()) };
    write!(f, "{message}")?;
    for cause in causes {
        write!(f, "\n  caused by: {cause}")?;
    }
    if let Some(hint) = hint(error) {
        write!(f, "\n\nhint: {hint}")?;
    }
    Ok(())
}

/// Advice for bridge failures the user can fix from the command line.
fn hint(error: &(dyn Error + 'static)) -> Option<&'static str> {
    eyre::Chain::new(error).find_map(|cause| match cause.downcast_ref::<BridgeError>()? {
        BridgeError::Bind(_) => Some("the port is taken, pick another one with `--port`"),
        BridgeError::DetectionTimeout(_) => Some(
            "open the printed URL in the browser holding the wallet, or run with `--offline`",
        ),
        _ => None,
    })
}

/// Collects the messages of an error chain, dropping those already contained in their parent.
fn dedup_chain(error: &(dyn Error + 'static)) -> Vec<String> {
    let mut causes: Vec<String> =
        eyre::Chain::new(error).map(|cause| cause.to_string().trim().to_string()).collect();
    causes.dedup_by(|b, a| a.contains(b.as_str()));
    causes
}

/// Installs the [`eyre`] and [`panic`](mod@std::panic) hooks as the global ones.
///
/// Errors get the concise report unless `SIGN_PLAYGROUND_DEBUG` is set. Panics always get the
/// verbose one.
pub fn install() {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .panic_section("This is a bug in sign-playground, please report it.")
        .into_hooks();
    panic_hook.install();
    let eyre_hook = eyre_hook.into_eyre_hook();
    let verbose = std::env::var_os(DEBUG_ENV).is_some();
    let installed = eyre::set_hook(Box::new(move |error| {
        Box::new(if verbose { Handler::Verbose(eyre_hook(error)) } else { Handler::Concise })
    }));
    if let Err(err) = installed {
        debug!(%err, "failed to install eyre error hook");
    }
}
