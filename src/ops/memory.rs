//! Memory notes, stored and managed by the remote service.

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::mcp::client::SerenaClient;
use crate::ops::{list_or_empty, put_opt, text_of};

impl SerenaClient {
    /// Memory names, optionally under `folder` (e.g. `active/tasks`).
    pub async fn memory_list(&self, folder: Option<&str>) -> Result<Vec<String>> {
        let mut args = Map::new();
        put_opt(&mut args, "folder", folder);
        let result = self.call_tool("list_memories", Value::Object(args)).await?;
        Ok(list_or_empty(result.data).iter().map(text_of).collect())
    }

    pub async fn memory_read(&self, name: &str) -> Result<String> {
        let result = self
            .call_tool("read_memory", json!({"memory_file_name": name}))
            .await?;
        Ok(text_of(&result.data))
    }

    /// Write `content` to memory `name`; folders are created remotely.
    pub async fn memory_write(&self, name: &str, content: &str) -> Result<String> {
        let result = self
            .call_tool(
                "write_memory",
                json!({"memory_file_name": name, "content": content}),
            )
            .await?;
        Ok(text_of(&result.data))
    }

    pub async fn memory_delete(&self, name: &str) -> Result<String> {
        let result = self
            .call_tool("delete_memory", json!({"memory_file_name": name}))
            .await?;
        Ok(text_of(&result.data))
    }

    /// Folder tree rendering, optionally rooted at `folder`.
    pub async fn memory_tree(&self, folder: Option<&str>) -> Result<String> {
        let mut args = Map::new();
        put_opt(&mut args, "folder", folder);
        let result = self.call_tool("tree_memories", Value::Object(args)).await?;
        Ok(text_of(&result.data))
    }

    /// Regex search over memory contents. Each hit carries `memory`,
    /// `match_count` and `snippets`.
    pub async fn memory_search(&self, pattern: &str, folder: Option<&str>) -> Result<Vec<Value>> {
        let mut args = Map::new();
        args.insert("pattern".into(), json!(pattern));
        put_opt(&mut args, "folder", folder);
        let result = self.call_tool("search_memories", Value::Object(args)).await?;
        Ok(list_or_empty(result.data))
    }

    /// Move a memory under `archive/`, optionally into `category`.
    pub async fn memory_archive(&self, name: &str, category: Option<&str>) -> Result<String> {
        let mut args = Map::new();
        args.insert("memory_file_name".into(), json!(name));
        put_opt(&mut args, "category", category);
        let result = self.call_tool("archive_memory", Value::Object(args)).await?;
        Ok(text_of(&result.data))
    }

    /// Rename or move memory `source` to `dest`.
    pub async fn memory_move(&self, source: &str, dest: &str) -> Result<String> {
        let result = self
            .call_tool("move_memory", json!({"source": source, "dest": dest}))
            .await?;
        Ok(text_of(&result.data))
    }

    /// Memory statistics. A non-object answer is wrapped as `{"raw": text}`.
    pub async fn memory_stats(&self) -> Result<Map<String, Value>> {
        let result = self.call_tool("memory_stats", json!({})).await?;
        Ok(match result.data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("raw".into(), Value::String(text_of(&other)));
                map
            }
        })
    }
}
