//! Operator console
//!
//! Line-oriented commands over any async reader/writer pair. The binary wires it to
//! stdin and stdout.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::registry::ListenerRegistry;

pub const SHOW_HTTP_HANDLERS_USAGE: &str = "Usage: show http-handlers";

const COMMANDS: &[(&str, &str)] = &[
    ("show http-handlers", "Show all registered http handlers"),
    ("help", "List console commands"),
    ("quit", "Stop every listener and exit"),
];

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("console i/o failed")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOutcome {
    Output(String),
    Empty,
    Quit,
}

pub async fn execute(
    registry: &ListenerRegistry,
    line: &str,
) -> Result<ConsoleOutcome, ConsoleError> {
    let args: Vec<&str> = line.split_whitespace().collect();

    match args.as_slice() {
        [] => Ok(ConsoleOutcome::Empty),
        ["show", "http-handlers", ..] => {
            debug!(args = args.len(), "show http-handlers called");
            if args.len() != 2 {
                return Ok(ConsoleOutcome::Output(SHOW_HTTP_HANDLERS_USAGE.to_string()));
            }
            Ok(ConsoleOutcome::Output(registry.format_handler_report().await))
        }
        ["help"] => Ok(ConsoleOutcome::Output(help_text())),
        ["quit"] | ["shutdown"] => Ok(ConsoleOutcome::Quit),
        _ => Err(ConsoleError::UnknownCommand(args.join(" "))),
    }
}

fn help_text() -> String {
    COMMANDS
        .iter()
        .map(|(command, description)| format!("{command} - {description}\n"))
        .collect()
}

/// How [`run_console`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// The operator asked to shut the process down.
    Quit,
    /// Input closed; the listeners should keep serving.
    Eof,
}

/// Runs commands read from `reader` until EOF or `quit`.
pub async fn run_console<R, W>(
    registry: &ListenerRegistry,
    reader: R,
    mut writer: W,
) -> Result<ConsoleExit, ConsoleError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let output = match execute(registry, &line).await {
            Ok(ConsoleOutcome::Output(output)) => output,
            Ok(ConsoleOutcome::Empty) => continue,
            Ok(ConsoleOutcome::Quit) => return Ok(ConsoleExit::Quit),
            Err(ConsoleError::UnknownCommand(command)) => {
                format!("Unknown command: {command}. Type `help` for a list of commands.")
            }
            Err(err) => return Err(err),
        };

        writer.write_all(output.as_bytes()).await?;
        if !output.ends_with('\n') {
            writer.write_all(b"\n").await?;
        }
        writer.flush().await?;
    }

    Ok(ConsoleExit::Eof)
}
