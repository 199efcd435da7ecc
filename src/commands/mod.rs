//! Command handlers for the CLI
//!
//! [`run`] is the entry point used by `main`. Commands that need the
//! server open a client, run one operation through [`execute`] and close the
//! client again, which writes the refreshed session back to the store.
//! Rendering goes through [`OutputFormatter`]; handlers return the rendered
//! text and `main` decides where it goes.

use std::io::Read;
use std::ops::Deref;

use crate::cli::{Cli, Commands, EditCommand, MemoryCommand, SessionCommand, STDIN_ARG};
use crate::config::Config;
use crate::error::{hint_of, Result, SerenaError};
use crate::format::OutputFormatter;
use crate::mcp::client::SerenaClient;
use crate::ops::recipes;

pub mod edit;
pub mod memory;
pub mod navigate;
pub mod session;

/// Hint shown when `refs` fails.
pub const REFS_HINT: &str = "Verify symbol exists with 'serena find'";

/// Hint shown when `status` fails.
pub const STATUS_HINT: &str = "Is Serena server running?";

/// A connected client that is closed when dropped.
pub struct ClientGuard(SerenaClient);

impl ClientGuard {
    /// Build a client from `config` and connect it.
    pub async fn open(config: &Config) -> Result<Self> {
        let client = SerenaClient::new(config.server.clone(), config.session.store());
        let guard = Self(client);
        guard.0.connect().await?;
        Ok(guard)
    }
}

impl Deref for ClientGuard {
    type Target = SerenaClient;

    fn deref(&self) -> &SerenaClient {
        &self.0
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Run the parsed command line and return what should go to stdout.
///
/// # Errors
///
/// Any failure of the underlying operation. `main` renders it with
/// [`hint_for`] and exits with status 1.
pub async fn run(cli: Cli, config: Config) -> Result<String> {
    let command = resolve_stdin(cli.command)?;
    let fmt = OutputFormatter::new(json_mode(&command));

    match command {
        Commands::Version => Ok(format!("serena-cli {}", env!("CARGO_PKG_VERSION"))),
        Commands::Recipe { ref name, .. } if name == "list" => {
            Ok(fmt.recipes(&recipes::categories()))
        }
        Commands::Session { command } => session::handle(&command, &config, &fmt),
        Commands::Serve { host, port } => serve(config, host, port).await,
        command => {
            if let Commands::Recipe { ref name, .. } = command {
                recipes::find_recipe(name)?;
            }
            let client = ClientGuard::open(&config).await?;
            execute(&command, &client, &fmt).await
        }
    }
}

/// Run one server-backed command against a connected client.
pub async fn execute(
    command: &Commands,
    client: &SerenaClient,
    fmt: &OutputFormatter,
) -> Result<String> {
    match command {
        Commands::Memory { command } => memory::handle(command, client, fmt).await,
        Commands::Edit { command } => edit::handle(command, client, fmt).await,
        Commands::Onboarding { command } => edit::onboarding(command, client, fmt).await,
        other => navigate::handle(other, client, fmt).await,
    }
}

#[cfg(feature = "server")]
async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<String> {
    if let Some(host) = host {
        config.proxy.host = host;
    }
    if let Some(port) = port {
        config.proxy.port = port;
    }
    crate::server::serve(config).await?;
    Ok(String::new())
}

#[cfg(not(feature = "server"))]
async fn serve(_config: Config, _host: Option<String>, _port: Option<u16>) -> Result<String> {
    Err(SerenaError::Config("built without the 'server' feature".to_string()).into())
}

/// Whether the command asked for JSON output.
pub fn json_mode(command: &Commands) -> bool {
    match command {
        Commands::Find { json, .. }
        | Commands::Refs { json, .. }
        | Commands::Overview { json, .. }
        | Commands::Search { json, .. }
        | Commands::Status { json, .. }
        | Commands::Recipe { json, .. }
        | Commands::Tools { json, .. } => *json,
        Commands::Memory { command } => match command {
            MemoryCommand::List { json, .. }
            | MemoryCommand::Search { json, .. }
            | MemoryCommand::Stats { json } => *json,
            _ => false,
        },
        Commands::Session {
            command: SessionCommand::Show { json },
        } => *json,
        _ => false,
    }
}

/// The hint to print under a failed command's error: the error's own hint
/// if it carries one, otherwise a per-command default.
pub fn hint_for(command: &Commands, err: &anyhow::Error) -> Option<String> {
    if let Some(hint) = hint_of(err) {
        return Some(hint.to_string());
    }
    match command {
        Commands::Refs { .. } => Some(REFS_HINT.to_string()),
        Commands::Status { .. } => Some(STATUS_HINT.to_string()),
        Commands::Recipe { .. }
            if matches!(
                err.downcast_ref::<SerenaError>(),
                Some(SerenaError::InvalidArgument(_))
            ) =>
        {
            Some(format!("Available: {}", recipes::recipe_names()))
        }
        _ => None,
    }
}

/// Replace `-` content arguments with stdin.
fn resolve_stdin(command: Commands) -> Result<Commands> {
    resolve_stdin_with(command, || {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    })
}

fn resolve_stdin_with(
    command: Commands,
    read: impl FnOnce() -> Result<String>,
) -> Result<Commands> {
    let mut read = Some(read);
    let mut resolve = |value: String| -> Result<String> {
        match read.take() {
            Some(read) if value == STDIN_ARG => read(),
            _ => Ok(value),
        }
    };

    Ok(match command {
        Commands::Memory {
            command: MemoryCommand::Write { name, content },
        } => Commands::Memory {
            command: MemoryCommand::Write {
                name,
                content: resolve(content)?,
            },
        },
        Commands::Edit { command } => Commands::Edit {
            command: match command {
                EditCommand::Replace { symbol, file, body } => EditCommand::Replace {
                    symbol,
                    file,
                    body: resolve(body)?,
                },
                EditCommand::After { symbol, file, code } => EditCommand::After {
                    symbol,
                    file,
                    code: resolve(code)?,
                },
                EditCommand::Before { symbol, file, code } => EditCommand::Before {
                    symbol,
                    file,
                    code: resolve(code)?,
                },
                rename @ EditCommand::Rename { .. } => rename,
            },
        },
        other => other,
    })
}
