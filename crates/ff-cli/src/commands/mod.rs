//! CLI subcommand implementations.

pub mod config;
pub mod login;
pub mod run;
