//! Implementation of the `focusflow run` command.

use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use ff_api::{Client, HttpTelemetry};
use ff_tracker::{Collaborators, SessionHandle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::shell::ConsoleShell;
use crate::{Config, RunArgs, bootstrap, platform};

use super::login;

const HELP: &str = "Commands: start, stop, status, help, quit";

/// A line typed at the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Status,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(other.to_string()),
        }
    }
}

/// Logs in, then tracks until `quit`, end of input, or Ctrl-C.
pub async fn run(config: &Config, args: &RunArgs) -> Result<()> {
    let credentials = login::credentials(&args.login, config)?;
    let client = Client::new(config.endpoints().context("invalid server URL")?)?;
    let session = bootstrap::establish_session(&client, &credentials).await?;

    let sampler = platform::connect().context("failed to open the desktop session")?;
    let telemetry = HttpTelemetry::new(client)?;
    let shell = Arc::new(ConsoleShell::new(io::stdout()));

    shell.print(format_args!(
        "Logged in as {} (user {}). {HELP}",
        session.user.username, session.user.id
    ));

    let handle = SessionHandle::spawn(
        session,
        Collaborators {
            focus: sampler.clone(),
            idle: sampler,
            telemetry: Arc::new(telemetry),
            shell: shell.clone(),
        },
    );

    if args.start {
        press_start(&handle, &shell);
    }

    let result = drive(&handle, &shell, BufReader::new(tokio::io::stdin())).await;
    handle.shutdown().await;
    shell.print("Tracking stopped. Goodbye.");
    result
}

/// Feeds console lines to the session until quit or end of input.
async fn drive<R, W>(handle: &SessionHandle, shell: &ConsoleShell<W>, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read console input")?,
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                tracing::info!("interrupted");
                return Ok(());
            }
        };
        let Some(line) = line else {
            tracing::debug!("console input closed");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Start) => press_start(handle, shell),
            Ok(ConsoleCommand::Stop) => {
                if shell.press_stop() {
                    handle.stop_tracking();
                } else {
                    shell.print("Stop is disabled right now.");
                }
            }
            Ok(ConsoleCommand::Status) => shell.print(format_args!(
                "User: {} | {}",
                handle.session().user.username,
                shell.panel()
            )),
            Ok(ConsoleCommand::Help) => shell.print(HELP),
            Ok(ConsoleCommand::Quit) => return Ok(()),
            Err(unknown) => shell.print(format_args!("Unknown command '{unknown}'. {HELP}")),
        }
    }
}

fn press_start<W: Write + Send>(handle: &SessionHandle, shell: &ConsoleShell<W>) {
    if shell.press_start() {
        handle.start_tracking();
    } else {
        shell.print("Start is disabled right now.");
    }
}
