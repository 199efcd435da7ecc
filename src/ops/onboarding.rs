//! Project onboarding.

use serde_json::json;

use crate::error::Result;
use crate::mcp::client::SerenaClient;
use crate::ops::text_of;

impl SerenaClient {
    /// Whether onboarding already ran, or which memories exist.
    pub async fn check_onboarding(&self) -> Result<String> {
        let result = self.call_tool("check_onboarding_performed", json!({})).await?;
        Ok(text_of(&result.data))
    }

    /// Instructions for onboarding a new project.
    pub async fn onboarding(&self) -> Result<String> {
        let result = self.call_tool("onboarding", json!({})).await?;
        Ok(text_of(&result.data))
    }

    /// Create the recommended memory folder layout (`active/`,
    /// `reference/`, `learnings/`, `archive/`), with starter templates when
    /// `include_templates` is set.
    pub async fn init_memories(&self, include_templates: bool) -> Result<String> {
        let result = self
            .call_tool(
                "init_memories",
                json!({"include_templates": include_templates}),
            )
            .await?;
        Ok(text_of(&result.data))
    }
}
