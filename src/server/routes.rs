//! Route handlers
//!
//! Every handler except `/help` and `/health` first obtains the client
//! through [`client`], which answers 503 while the connector is unhealthy or
//! its circuit is open. Parameters arrive as query strings, for POST routes
//! too.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::response::{success, ApiError, ApiResult};
use super::AppState;
use crate::error::SerenaError;
use crate::mcp::client::SerenaClient;
use crate::ops::recipes::{self, find_recipe};
use crate::ops::FindSymbolOptions;
use crate::symbols::SymbolKind;

/// Plain-text command reference served at `/help`.
pub const HELP_TEXT: &str = "\
Serena CLI - Semantic Code Navigation
========================================

serena status                     Get project status
serena activate [PROJECT]         Activate a project

serena find PATTERN               Find symbols by pattern
  --kind CLASS|METHOD|...         Filter by symbol kind
  --path PATH                     Filter by path
  --body                          Include symbol body
  --depth N                       Include nested symbols
  --exact                         Exact match only

serena refs SYMBOL FILE           Find references to symbol
  --all                           Include all references

serena overview FILE              Get file structure overview
serena search PATTERN             Regex search in code
  --path PATH                     Filter by path
  --glob GLOB                     Filter by glob pattern

serena recipe NAME                Run pre-built search recipes
  list                            List available recipes

serena tools                      List available Serena MCP tools

Memory commands:
  serena memory list [FOLDER]     List memories
  serena memory read NAME         Read a memory
  serena memory write NAME [-]    Write a memory (content via stdin)
  serena memory delete NAME       Delete a memory
  serena memory tree              Show memory folder structure
  serena memory search PATTERN    Search memories
  serena memory archive NAME      Archive a memory
  serena memory move SRC DEST     Move/rename a memory
  serena memory stats             Show memory statistics

Edit commands:
  serena edit replace SYMBOL FILE Replace symbol body
  serena edit after SYMBOL FILE   Insert after symbol
  serena edit before SYMBOL FILE  Insert before symbol
  serena edit rename SYMBOL FILE NEW_NAME
                                  Rename symbol

Onboarding:
  serena onboarding check         Check if onboarding was performed
  serena onboarding show          Show onboarding instructions
  serena onboarding init          Create the memory folder structure

Session:
  serena session show             Show stored sessions
  serena session clear [--all]    Forget stored sessions

serena serve                      Run this HTTP proxy
";

/// The connected client, or 503 naming the circuit state.
pub fn client(state: &AppState) -> Result<Arc<SerenaClient>, ApiError> {
    let connector = &state.connector;
    if !connector.healthy() {
        return Err(ApiError::unavailable(format!(
            "Serena not connected (circuit: {})",
            connector.circuit_state()
        )));
    }
    Ok(connector.client()?)
}

pub async fn help() -> &'static str {
    HELP_TEXT
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let status = state.connector.status();
    Json(json!({
        "status": if status.healthy { "healthy" } else { "unhealthy" },
        "name": status.name,
        "base_url": status.base_url,
        "circuit_state": status.circuit_state,
        "failure_count": status.failure_count,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn status(State(state): State<AppState>) -> ApiResult {
    Ok(success(client(&state)?.get_status().await?))
}

#[derive(Debug, Deserialize)]
pub struct ActivateParams {
    pub project: Option<String>,
}

pub async fn activate(
    State(state): State<AppState>,
    Query(params): Query<ActivateParams>,
) -> ApiResult {
    let client = client(&state)?;
    Ok(success(client.activate_project(params.project.as_deref()).await?))
}

#[derive(Debug, Deserialize)]
pub struct FindParams {
    pub pattern: String,
    pub kind: Option<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub body: bool,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub exact: bool,
}

pub async fn find(State(state): State<AppState>, Query(params): Query<FindParams>) -> ApiResult {
    let kind = params
        .kind
        .as_deref()
        .map(str::parse::<SymbolKind>)
        .transpose()?;
    let client = client(&state)?;
    let opts = FindSymbolOptions {
        kind,
        path: params.path,
        body: params.body,
        depth: params.depth,
        exact: params.exact,
    };
    Ok(success(client.find_symbol(&params.pattern, &opts).await?))
}

#[derive(Debug, Deserialize)]
pub struct RefsParams {
    pub symbol: String,
    pub file: String,
    #[serde(default)]
    pub all: bool,
}

pub async fn refs(State(state): State<AppState>, Query(params): Query<RefsParams>) -> ApiResult {
    let client = client(&state)?;
    Ok(success(
        client
            .find_refs(&params.symbol, &params.file, params.all)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct FileParams {
    pub file: String,
}

pub async fn overview(
    State(state): State<AppState>,
    Query(params): Query<FileParams>,
) -> ApiResult {
    Ok(success(client(&state)?.get_overview(&params.file).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub pattern: String,
    pub path: Option<String>,
    pub glob: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let client = client(&state)?;
    Ok(success(
        client
            .search(&params.pattern, params.glob.as_deref(), params.path.as_deref())
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct RecipeParams {
    pub name: Option<String>,
}

/// `GET /recipe?name=...`; without a name, or with `list`, the recipes by
/// category. The catalogue needs no server.
pub async fn recipe(
    State(state): State<AppState>,
    Query(params): Query<RecipeParams>,
) -> ApiResult {
    let name = params.name.as_deref().unwrap_or("list");
    if name == "list" {
        let categorized: serde_json::Map<String, Value> = recipes::categories()
            .into_iter()
            .map(|(category, names)| (category.to_string(), json!(names)))
            .collect();
        return Ok(success(json!({"recipes": categorized})));
    }

    let recipe = find_recipe(name).map_err(|e| {
        ApiError::from(e).with_hint(format!("Available: {}", recipes::recipe_names()))
    })?;
    Ok(success(client(&state)?.run_recipe(recipe.name).await?))
}

pub async fn tools(State(state): State<AppState>) -> ApiResult {
    Ok(success(client(&state)?.get_tools().await?))
}

#[derive(Debug, Deserialize)]
pub struct MemoryParams {
    pub name: Option<String>,
    pub folder: Option<String>,
    pub content: Option<String>,
    pub new_name: Option<String>,
    pub pattern: Option<String>,
    pub category: Option<String>,
}

/// An optional query parameter some routes require; 400 when absent.
fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApiError> {
    value.as_deref().ok_or_else(|| {
        SerenaError::InvalidArgument(format!("missing query parameter '{}'", field)).into()
    })
}

impl MemoryParams {
    fn name(&self) -> Result<&str, ApiError> {
        required(&self.name, "name")
    }
}

pub async fn memory_list(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> ApiResult {
    Ok(success(
        client(&state)?.memory_list(params.folder.as_deref()).await?,
    ))
}

pub async fn memory_read(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> ApiResult {
    let name = params.name()?;
    Ok(success(client(&state)?.memory_read(name).await?))
}

pub async fn memory_write(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> ApiResult {
    let name = params.name()?;
    let content = required(&params.content, "content")?;
    Ok(success(client(&state)?.memory_write(name, content).await?))
}

pub async fn memory_delete(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> ApiResult {
    let name = params.name()?;
    Ok(success(client(&state)?.memory_delete(name).await?))
}

pub async fn memory_move(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> ApiResult {
    let name = params.name()?;
    let new_name = required(&params.new_name, "new_name")?;
    Ok(success(client(&state)?.memory_move(name, new_name).await?))
}

pub async fn memory_archive(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> ApiResult {
    let name = params.name()?;
    Ok(success(
        client(&state)?
            .memory_archive(name, params.category.as_deref())
            .await?,
    ))
}

pub async fn memory_tree(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> ApiResult {
    Ok(success(
        client(&state)?.memory_tree(params.folder.as_deref()).await?,
    ))
}

pub async fn memory_search(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> ApiResult {
    let pattern = required(&params.pattern, "pattern")?;
    Ok(success(
        client(&state)?
            .memory_search(pattern, params.folder.as_deref())
            .await?,
    ))
}

pub async fn memory_stats(State(state): State<AppState>) -> ApiResult {
    Ok(success(client(&state)?.memory_stats().await?))
}

#[derive(Debug, Deserialize)]
pub struct EditParams {
    pub symbol: String,
    pub file: String,
    pub body: Option<String>,
    pub code: Option<String>,
    pub new_name: Option<String>,
}

pub async fn edit_replace(
    State(state): State<AppState>,
    Query(params): Query<EditParams>,
) -> ApiResult {
    let body = required(&params.body, "body")?;
    Ok(success(
        client(&state)?
            .edit_replace(&params.symbol, &params.file, body)
            .await?,
    ))
}

pub async fn edit_after(
    State(state): State<AppState>,
    Query(params): Query<EditParams>,
) -> ApiResult {
    let code = required(&params.code, "code")?;
    Ok(success(
        client(&state)?
            .edit_after(&params.symbol, &params.file, code)
            .await?,
    ))
}

pub async fn edit_before(
    State(state): State<AppState>,
    Query(params): Query<EditParams>,
) -> ApiResult {
    let code = required(&params.code, "code")?;
    Ok(success(
        client(&state)?
            .edit_before(&params.symbol, &params.file, code)
            .await?,
    ))
}

pub async fn edit_rename(
    State(state): State<AppState>,
    Query(params): Query<EditParams>,
) -> ApiResult {
    let new_name = required(&params.new_name, "new_name")?;
    Ok(success(
        client(&state)?
            .edit_rename(&params.symbol, &params.file, new_name)
            .await?,
    ))
}

pub async fn check_onboarding(State(state): State<AppState>) -> ApiResult {
    Ok(success(client(&state)?.check_onboarding().await?))
}

pub async fn onboarding(State(state): State<AppState>) -> ApiResult {
    Ok(success(client(&state)?.onboarding().await?))
}

#[derive(Debug, Deserialize)]
pub struct InitParams {
    #[serde(default = "default_include_templates")]
    pub include_templates: bool,
}

fn default_include_templates() -> bool {
    true
}

pub async fn init_memories(
    State(state): State<AppState>,
    Query(params): Query<InitParams>,
) -> ApiResult {
    Ok(success(
        client(&state)?
            .init_memories(params.include_templates)
            .await?,
    ))
}
