//! `serena session ...`: local session store maintenance, no server needed.

use crate::cli::SessionCommand;
use crate::config::Config;
use crate::error::Result;
use crate::format::OutputFormatter;

pub fn handle(command: &SessionCommand, config: &Config, fmt: &OutputFormatter) -> Result<String> {
    let store = config.session.store();
    match command {
        SessionCommand::Show { .. } => Ok(fmt.sessions(&store.list())),
        SessionCommand::Clear { all: true } => {
            store.clear_all()?;
            Ok(fmt.success("Cleared all sessions"))
        }
        SessionCommand::Clear { all: false } => {
            store.clear(&config.server.url)?;
            Ok(fmt.success(&format!("Cleared session for {}", config.server.url)))
        }
    }
}
