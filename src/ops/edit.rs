//! Symbol-addressed code edits.

use serde_json::json;

use crate::error::Result;
use crate::mcp::client::SerenaClient;
use crate::ops::text_of;

impl SerenaClient {
    /// Replace the body of `symbol` in `file`.
    pub async fn edit_replace(&self, symbol: &str, file: &str, body: &str) -> Result<String> {
        self.edit("replace_symbol_body", symbol, file, body).await
    }

    /// Insert `code` after `symbol`.
    pub async fn edit_after(&self, symbol: &str, file: &str, code: &str) -> Result<String> {
        self.edit("insert_after_symbol", symbol, file, code).await
    }

    /// Insert `code` before `symbol`.
    pub async fn edit_before(&self, symbol: &str, file: &str, code: &str) -> Result<String> {
        self.edit("insert_before_symbol", symbol, file, code).await
    }

    /// Rename `symbol` throughout the project.
    pub async fn edit_rename(&self, symbol: &str, file: &str, new_name: &str) -> Result<String> {
        let result = self
            .call_tool(
                "rename_symbol",
                json!({"name_path": symbol, "relative_path": file, "new_name": new_name}),
            )
            .await?;
        Ok(text_of(&result.data))
    }

    async fn edit(&self, tool: &str, symbol: &str, file: &str, body: &str) -> Result<String> {
        let result = self
            .call_tool(
                tool,
                json!({"name_path": symbol, "relative_path": file, "body": body}),
            )
            .await?;
        Ok(text_of(&result.data))
    }
}
