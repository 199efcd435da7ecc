//! Navigation and project commands: find, refs, overview, search, recipe,
//! status, activate and tools.

use serde_json::Value;

use crate::cli::Commands;
use crate::error::{Result, SerenaError};
use crate::format::OutputFormatter;
use crate::mcp::client::SerenaClient;
use crate::ops::recipes::find_recipe;
use crate::ops::{FindSymbolOptions, RecipeOutput};
use crate::symbols::SymbolKind;

pub async fn handle(
    command: &Commands,
    client: &SerenaClient,
    fmt: &OutputFormatter,
) -> Result<String> {
    match command {
        Commands::Find {
            pattern,
            kind,
            path,
            body,
            depth,
            exact,
            ..
        } => {
            let opts = FindSymbolOptions {
                kind: kind.as_deref().map(str::parse::<SymbolKind>).transpose()?,
                path: path.clone(),
                body: *body,
                depth: *depth,
                exact: *exact,
            };
            let symbols = client.find_symbol(pattern, &opts).await?;
            Ok(fmt.symbols(&symbols, *body))
        }
        Commands::Refs {
            symbol, file, all, ..
        } => {
            let refs = client.find_refs(symbol, file, *all).await?;
            Ok(fmt.refs(&refs, symbol, *all))
        }
        Commands::Overview { file, .. } => {
            let symbols = client.get_overview(file).await?;
            Ok(fmt.overview(&symbols, file))
        }
        Commands::Search {
            pattern,
            glob,
            path,
            ..
        } => {
            let results = client
                .search(pattern, glob.as_deref(), path.as_deref())
                .await?;
            Ok(fmt.search(&results, pattern))
        }
        Commands::Recipe { name, .. } => {
            let recipe = find_recipe(name)?;
            Ok(match client.run_recipe(recipe.name).await? {
                RecipeOutput::Matches(matches) => fmt.search(&matches, recipe.description),
                RecipeOutput::Symbols(symbols) => fmt.symbols(&symbols, false),
            })
        }
        Commands::Status { .. } => {
            let status = client.get_status().await?;
            Ok(fmt.status(&Value::String(status)))
        }
        Commands::Activate { project } => {
            let result = client.activate_project(project.as_deref()).await?;
            Ok(fmt.success(&result))
        }
        Commands::Tools { .. } => {
            let tools = client.get_tools().await?;
            Ok(fmt.tools(&tools))
        }
        other => Err(SerenaError::InvalidArgument(format!(
            "command does not talk to the server: {:?}",
            other
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::mcp::client::tests::connected_client;
    use clap::Parser;
    use serde_json::json;

    fn parse(argv: &[&str]) -> Commands {
        Cli::try_parse_from(argv).unwrap().command
    }

    #[tokio::test]
    async fn test_find_parses_kind() {
        let (client, transport, mut handle, _dir) = connected_client().await;
        transport.inject_structured(json!([]));

        let out = handle_plain(&parse(&["serena", "find", "Customer", "-k", "class"]), &client).await;
        assert!(out.unwrap().contains("No symbols found"));
        let args = &handle.drain()[0].body["params"]["arguments"];
        assert_eq!(args["include_kinds"], json!([5]));
    }

    #[tokio::test]
    async fn test_find_unknown_kind_is_invalid_argument() {
        let (client, _transport, mut handle, _dir) = connected_client().await;
        let err = handle_plain(&parse(&["serena", "find", "X", "-k", "widget"]), &client)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SerenaError>(),
            Some(SerenaError::InvalidArgument(_))
        ));
        assert!(handle.drain().is_empty());
    }

    #[tokio::test]
    async fn test_status_renders_header() {
        let (client, transport, _handle, _dir) = connected_client().await;
        transport.inject_text("Active project: shop");
        let out = handle_plain(&parse(&["serena", "status"]), &client).await.unwrap();
        assert!(out.contains("Serena Status"));
        assert!(out.contains("  Active project: shop"));
    }

    #[tokio::test]
    async fn test_search_json_output() {
        let (client, transport, _handle, _dir) = connected_client().await;
        transport.inject_structured(json!({"src/A.php": ["1: x"]}));
        let out = handle(
            &parse(&["serena", "search", "x", "--json"]),
            &client,
            &OutputFormatter::new(true),
        )
        .await
        .unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["src/A.php"][0], "1: x");
    }

    async fn handle_plain(command: &Commands, client: &SerenaClient) -> Result<String> {
        colored::control::set_override(false);
        handle(command, client, &OutputFormatter::new(false)).await
    }
}
