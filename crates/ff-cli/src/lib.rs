//! FocusFlow agent CLI library.
//!
//! Wires the backend client, the desktop samplers, and the console shell
//! around the tracking coordinator.

pub mod bootstrap;
mod cli;
pub mod commands;
mod config;
pub mod platform;
pub mod shell;

pub use cli::{Cli, Commands, LoginArgs, RunArgs};
pub use config::Config;
