//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Desktop activity agent.
///
/// Logs in to a FocusFlow server, then reports the focused application
/// and idle periods until you quit.
#[derive(Debug, Parser)]
#[command(name = "focusflow", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in and track activity until `quit`, end of input, or Ctrl-C.
    Run(RunArgs),

    /// Log in, print the resolved session settings, and exit.
    Login(LoginArgs),

    /// Print the effective configuration.
    Config,
}

/// Credentials for the login service.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account name. Falls back to `username` in the config file.
    #[arg(short, long)]
    pub username: Option<String>,

    /// Account password.
    #[arg(long, env = "FOCUSFLOW_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Options for a tracking session.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub login: LoginArgs,

    /// Start tracking right after login instead of waiting for `start`.
    #[arg(long)]
    pub start: bool,
}
