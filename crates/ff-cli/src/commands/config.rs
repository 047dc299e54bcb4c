//! Implementation of the `focusflow config` command.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Config;

/// Prints the resolved endpoints and configured account.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let endpoints = config.endpoints().context("invalid server URL")?;
    writeln!(writer, "Login:     {}", endpoints.login)?;
    writeln!(writer, "Settings:  {}", endpoints.settings)?;
    writeln!(writer, "Telemetry: {}", endpoints.track)?;
    writeln!(
        writer,
        "Username:  {}",
        config.username.as_deref().unwrap_or("(not set)")
    )?;
    Ok(())
}
