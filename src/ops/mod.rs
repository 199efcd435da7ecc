//! Typed Serena operations
//!
//! Each submodule adds an `impl SerenaClient` block of thin wrappers over
//! [`SerenaClient::call_tool`](crate::mcp::client::SerenaClient::call_tool):
//! arguments are shaped into the tool's parameter names and the result is
//! coerced to a fixed Rust type. A payload of the wrong shape becomes an
//! empty collection rather than an error.

pub mod edit;
pub mod memory;
pub mod onboarding;
pub mod project;
pub mod recipes;
pub mod symbols;

pub use recipes::{Recipe, RecipeAction, RecipeOutput, RECIPES};
pub use symbols::FindSymbolOptions;

use serde_json::{Map, Value};

/// The payload as a list, or empty.
pub(crate) fn list_or_empty(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

/// The payload as an object, or empty.
pub(crate) fn object_or_empty(data: Value) -> Map<String, Value> {
    match data {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// The payload rendered as text: strings verbatim, `null` as empty, anything
/// else as compact JSON.
pub(crate) fn text_of(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Insert `value` under `key` only when present.
pub(crate) fn put_opt(args: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        args.insert(key.to_string(), Value::String(v.to_string()));
    }
}
