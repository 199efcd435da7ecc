//! `serena edit ...` and `serena onboarding ...`

use crate::cli::{EditCommand, OnboardingCommand};
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::mcp::client::SerenaClient;

pub async fn handle(
    command: &EditCommand,
    client: &SerenaClient,
    fmt: &OutputFormatter,
) -> Result<String> {
    let result = match command {
        EditCommand::Replace { symbol, file, body } => {
            client.edit_replace(symbol, file, body).await?
        }
        EditCommand::After { symbol, file, code } => client.edit_after(symbol, file, code).await?,
        EditCommand::Before { symbol, file, code } => {
            client.edit_before(symbol, file, code).await?
        }
        EditCommand::Rename {
            symbol,
            file,
            new_name,
        } => client.edit_rename(symbol, file, new_name).await?,
    };
    Ok(fmt.success(&result))
}

pub async fn onboarding(
    command: &OnboardingCommand,
    client: &SerenaClient,
    fmt: &OutputFormatter,
) -> Result<String> {
    match command {
        OnboardingCommand::Check => client.check_onboarding().await,
        OnboardingCommand::Show => client.onboarding().await,
        OnboardingCommand::Init { no_templates } => {
            let result = client.init_memories(!no_templates).await?;
            Ok(fmt.success(&result))
        }
    }
}
