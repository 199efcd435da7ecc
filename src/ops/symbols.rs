//! Symbol lookup, references, file overviews and pattern search.

use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::mcp::client::SerenaClient;
use crate::ops::{list_or_empty, object_or_empty, put_opt};
use crate::symbols::SymbolKind;

/// Reference lookups return at most this many distinct files unless asked
/// for all of them.
pub const REFS_FILE_LIMIT: usize = 10;

/// Filters for [`SerenaClient::find_symbol`].
#[derive(Debug, Clone, Default)]
pub struct FindSymbolOptions {
    /// Restrict to one symbol kind.
    pub kind: Option<SymbolKind>,
    /// Restrict to a file or directory, relative to the project root.
    pub path: Option<String>,
    /// Include symbol bodies.
    pub body: bool,
    /// Child depth to include (0 = the symbol only).
    pub depth: u32,
    /// Match the name exactly instead of as a substring.
    pub exact: bool,
}

impl SerenaClient {
    /// Find symbols whose name path matches `pattern`.
    ///
    /// `pattern` may use Serena's wildcard syntax (`get*`).
    pub async fn find_symbol(&self, pattern: &str, opts: &FindSymbolOptions) -> Result<Vec<Value>> {
        let mut args = Map::new();
        args.insert("name_path_pattern".into(), json!(pattern));
        args.insert("substring_matching".into(), json!(!opts.exact));
        args.insert("include_body".into(), json!(opts.body));
        args.insert("depth".into(), json!(opts.depth));
        if let Some(kind) = opts.kind {
            args.insert("include_kinds".into(), json!([kind.code()]));
        }
        put_opt(&mut args, "relative_path", opts.path.as_deref());

        let result = self.call_tool("find_symbol", Value::Object(args)).await?;
        Ok(list_or_empty(result.data))
    }

    /// References to `symbol` (a name path such as `Customer/getName`)
    /// defined in `file`.
    ///
    /// Unless `all` is set, only references in the first
    /// [`REFS_FILE_LIMIT`] distinct files are kept.
    pub async fn find_refs(&self, symbol: &str, file: &str, all: bool) -> Result<Vec<Value>> {
        let result = self
            .call_tool(
                "find_referencing_symbols",
                json!({"name_path": symbol, "relative_path": file}),
            )
            .await?;
        let refs = list_or_empty(result.data);
        Ok(if all {
            refs
        } else {
            limit_files(refs, REFS_FILE_LIMIT)
        })
    }

    /// Top-level symbols of `file`.
    pub async fn get_overview(&self, file: &str) -> Result<Vec<Value>> {
        let result = self
            .call_tool("get_symbols_overview", json!({"relative_path": file}))
            .await?;
        Ok(list_or_empty(result.data))
    }

    /// Regex search over project files, as `file -> matching lines`.
    pub async fn search(
        &self,
        pattern: &str,
        glob: Option<&str>,
        path: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let mut args = Map::new();
        args.insert("substring_pattern".into(), json!(pattern));
        put_opt(&mut args, "file_pattern", glob);
        put_opt(&mut args, "relative_path", path);

        let result = self.call_tool("search_for_pattern", Value::Object(args)).await?;
        Ok(object_or_empty(result.data)
            .into_iter()
            .map(|(file, lines)| {
                let lines = list_or_empty(lines)
                    .into_iter()
                    .map(|line| match line {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect();
                (file, lines)
            })
            .collect())
    }
}

/// Keep references whose `relative_path` is among the first `max_files`
/// distinct paths, preserving order.
fn limit_files(refs: Vec<Value>, max_files: usize) -> Vec<Value> {
    let mut seen: HashSet<String> = HashSet::new();
    refs.into_iter()
        .filter(|r| {
            let path = r
                .get("relative_path")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            if seen.contains(&path) {
                return true;
            }
            if seen.len() < max_files {
                seen.insert(path);
                return true;
            }
            false
        })
        .collect()
}
