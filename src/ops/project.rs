//! Project status, activation and tool discovery.

use serde_json::json;

use crate::error::Result;
use crate::mcp::client::SerenaClient;
use crate::mcp::types::ToolInfo;
use crate::ops::text_of;

impl SerenaClient {
    /// Serena's current configuration (active project, languages, tools)
    /// as text.
    pub async fn get_status(&self) -> Result<String> {
        let result = self.call_tool("get_current_config", json!({})).await?;
        Ok(text_of(&result.data))
    }

    /// Activate `project` (a path or a registered name). Defaults to the
    /// current working directory.
    pub async fn activate_project(&self, project: Option<&str>) -> Result<String> {
        let project = match project {
            Some(p) => p.to_string(),
            None => std::env::current_dir()?.display().to_string(),
        };
        let result = self
            .call_tool("activate_project", json!({"project": project}))
            .await?;
        Ok(text_of(&result.data))
    }

    /// Tools the server exposes.
    pub async fn get_tools(&self) -> Result<Vec<ToolInfo>> {
        self.list_tools().await
    }
}
