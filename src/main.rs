//! Serena - semantic code navigation CLI
//!
#![doc = "Serena - semantic code navigation CLI"]
#![doc = "Main entry point for the serena binary."]

use std::io::IsTerminal;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use serena_client::cli::Cli;
use serena_client::commands;
use serena_client::config::Config;
use serena_client::error::Result;
use serena_client::format::OutputFormatter;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let command = cli.command.clone();
    match run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            tracing::debug!("command failed: {:?}", e);
            let fmt = OutputFormatter::new(commands::json_mode(&command));
            let hint = commands::hint_for(&command, &e);
            eprintln!("{}", fmt.error(&e.to_string(), hint.as_deref()));
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    // Load configuration
    let config = Config::load(cli.config.as_deref(), &cli)?;

    // Validate configuration
    config.validate()?;

    commands::run(cli, config).await
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "serena_client=debug"
    } else {
        "serena_client=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
