use std::future::Future;
use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use ff_api::Client;
use tracing_subscriber::EnvFilter;

use ff_cli::commands::{config, login, run};
use ff_cli::{Cli, Commands, Config};

/// How long exit waits on a desktop query that is still blocked.
const BLOCKING_GRACE: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so they stay out of the console session on stdout
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Run(args)) => {
            block_on(run::run(&config, args))?;
        }
        Some(Commands::Login(args)) => {
            let credentials = login::credentials(args, &config)?;
            block_on(async {
                let client = Client::new(config.endpoints().context("invalid server URL")?)?;
                login::run(&mut io::stdout(), &client, &credentials).await
            })?;
        }
        Some(Commands::Config) => {
            config::run(&mut io::stdout(), &config)?;
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

/// Runs `future` on a fresh runtime without waiting out a hung X11 call at exit.
fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let result = runtime.block_on(future);
    runtime.shutdown_timeout(BLOCKING_GRACE);
    result
}
