//! Terminal rendering of the playground and parsing of typed commands.

use base64::{Engine, engine::general_purpose::STANDARD};
use foundry_sign_playground::{
    Clipboard, DisplaySurface, DisplayUpdate, EditorId, PlaygroundCommand, Preview, SessionState,
    display::{Control, ControlLabel},
    error::ClipboardError,
    presentation::Verification,
};
use std::{
    io::{self, Write},
    path::Path,
};
use yansi::Paint;

pub const HELP: &str = "\
Commands:
  connect                  connect the wallet
  message <text>           replace the personal_sign message
  load <editor> <file>     load a payload from a file (editor: message, v4, v3, legacy)
  sign <operation>         sign with personal, v4, v3 or legacy
  copy <operation>         copy the last signature of an operation
  show                     print every payload and result
  help                     print this message
  quit                     exit";

/// A line typed by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Command(PlaygroundCommand),
    Help,
    Quit,
    Empty,
}

/// Parses a typed line. Files named by `load` are read right away.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let input = match command {
        "" => Input::Empty,
        "connect" => Input::Command(PlaygroundCommand::Connect),
        "message" | "msg" => Input::Command(PlaygroundCommand::Edit {
            editor: EditorId::Message,
            text: rest.to_string(),
        }),
        "load" => {
            let (editor, path) =
                rest.split_once(char::is_whitespace).ok_or("usage: load <editor> <file>")?;
            let editor = editor.parse::<EditorId>()?;
            let path = Path::new(path.trim());
            let text = std::fs::read_to_string(path)
                .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
            Input::Command(PlaygroundCommand::Edit { editor, text })
        }
        "sign" => Input::Command(PlaygroundCommand::Sign(rest.parse()?)),
        "copy" => Input::Command(PlaygroundCommand::Copy(rest.parse()?)),
        "show" => Input::Command(PlaygroundCommand::Refresh),
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(format!("unknown command `{other}`, type `help`")),
    };
    Ok(input)
}

/// Prints display updates to stdout.
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl DisplaySurface for TerminalSurface {
    fn apply(&mut self, update: DisplayUpdate) {
        match update {
            DisplayUpdate::Status(state) => {
                let state = match state {
                    SessionState::Connected => state.green().to_string(),
                    SessionState::Disconnected => state.yellow().to_string(),
                    SessionState::Unavailable => state.red().to_string(),
                };
                println!("wallet: {state}");
            }
            DisplayUpdate::Wallet(Some(info)) => {
                let network = format!("{} ({})", info.network, info.chain_id);
                println!("  account {} on {network}", info.address.cyan());
            }
            DisplayUpdate::Wallet(None) => {}
            DisplayUpdate::Control { control, label, .. } => match (control, label) {
                (Control::Connect, ControlLabel::Pending) => {
                    println!("{}", "connecting, confirm in the wallet...".dim());
                }
                (Control::Sign(operation), ControlLabel::Pending) => {
                    println!("{}", format!("{operation}: waiting for the wallet...").dim());
                }
                (Control::Copy(operation), ControlLabel::Copied) => {
                    println!("{}", format!("{operation}: signature copied").green());
                }
                _ => {}
            },
            DisplayUpdate::EditorText { editor, text } => {
                println!("{}", format!("--- {editor} ---").bold());
                println!("{text}");
            }
            DisplayUpdate::Preview { editor, preview: Preview::Invalid(err) } => {
                println!("{}", format!("{editor}: {err}").red());
            }
            DisplayUpdate::Preview { .. } => {}
            DisplayUpdate::Digest { editor, digest: Ok(hash) } => {
                println!("  {}", format!("{editor} hash: {hash}").dim());
            }
            DisplayUpdate::Digest { .. } => {}
            DisplayUpdate::Outcome { operation, text, error, verification } => {
                let text = if error { text.red().to_string() } else { text };
                println!("{}: {text}", operation.bold());
                match verification {
                    Some(Verification { recovered, matches: true }) => {
                        println!("  {}", format!("signed by {recovered}").green());
                    }
                    Some(Verification { recovered, matches: false }) => {
                        let line = format!("signed by {recovered}, not the connected account");
                        println!("  {}", line.yellow());
                    }
                    None => {}
                }
            }
            DisplayUpdate::Alert { message, link } => {
                println!("{} {message}", "!".yellow().bold());
                if let Some(link) = link {
                    println!("  {}", link.underline());
                }
            }
        }
    }
}

/// Copies through the terminal with an OSC 52 escape sequence.
///
/// Terminals without OSC 52 support silently ignore it.
#[derive(Debug, Default)]
pub struct OscClipboard;

impl Clipboard for OscClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "\x1b]52;c;{}\x07", STANDARD.encode(text))?;
        stdout.flush()?;
        Ok(())
    }
}
