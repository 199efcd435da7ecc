//! `serena memory ...`

use crate::cli::MemoryCommand;
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::mcp::client::SerenaClient;

pub async fn handle(
    command: &MemoryCommand,
    client: &SerenaClient,
    fmt: &OutputFormatter,
) -> Result<String> {
    match command {
        MemoryCommand::List { folder, .. } => {
            let memories = client.memory_list(folder.as_deref()).await?;
            Ok(fmt.memory_list(&memories))
        }
        MemoryCommand::Read { name } => client.memory_read(name).await,
        MemoryCommand::Write { name, content } => {
            let result = client.memory_write(name, content).await?;
            Ok(fmt.success(&result))
        }
        MemoryCommand::Delete { name } => {
            let result = client.memory_delete(name).await?;
            Ok(fmt.success(&result))
        }
        MemoryCommand::Tree { folder } => client.memory_tree(folder.as_deref()).await,
        MemoryCommand::Search {
            pattern, folder, ..
        } => {
            let results = client.memory_search(pattern, folder.as_deref()).await?;
            Ok(fmt.memory_search(&results))
        }
        MemoryCommand::Archive { name, category } => {
            let result = client.memory_archive(name, category.as_deref()).await?;
            Ok(fmt.success(&result))
        }
        MemoryCommand::Move { source, dest } => {
            let result = client.memory_move(source, dest).await?;
            Ok(fmt.success(&result))
        }
        MemoryCommand::Stats { .. } => {
            let stats = client.memory_stats().await?;
            Ok(fmt.memory_stats(&stats))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::client::tests::connected_client;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_prints_raw_content() {
        let (client, transport, _handle, _dir) = connected_client().await;
        transport.inject_text("# Notes\n- one");
        let out = handle(
            &MemoryCommand::Read {
                name: "notes".to_string(),
            },
            &client,
            &OutputFormatter::new(false),
        )
        .await
        .unwrap();
        assert_eq!(out, "# Notes\n- one");
    }

    #[tokio::test]
    async fn test_move_sends_source_and_dest() {
        colored::control::set_override(false);
        let (client, transport, mut handle_rx, _dir) = connected_client().await;
        transport.inject_text("Moved a to b");
        let out = handle(
            &MemoryCommand::Move {
                source: "a".to_string(),
                dest: "b".to_string(),
            },
            &client,
            &OutputFormatter::new(false),
        )
        .await
        .unwrap();
        assert_eq!(out, "✓ Moved a to b");
        let args = &handle_rx.drain()[0].body["params"]["arguments"];
        assert_eq!(args, &json!({"source": "a", "dest": "b"}));
    }
}
