//! Terminal and JSON rendering of operation results
//!
//! [`OutputFormatter`] turns the values returned by the typed operations
//! into either human-readable text or pretty-printed JSON. Colors come from
//! `colored`; `main` switches them off when stdout is not a terminal, so
//! the renderers never check for a TTY themselves.

use std::collections::{BTreeMap, HashMap};

use colored::Colorize;
use prettytable::{format, row, Table};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::mcp::session::Session;
use crate::mcp::types::ToolInfo;
use crate::symbols::SymbolKind;

/// Symbols shown per bundle in [`OutputFormatter::symbols`].
const SYMBOLS_PER_BUNDLE: usize = 12;
/// References shown per file.
const REFS_PER_FILE: usize = 3;
/// Files shown by [`OutputFormatter::refs`] without `--all`.
const REFS_FILES: usize = 10;
/// Symbols shown per kind in an overview.
const OVERVIEW_PER_KIND: usize = 10;
/// Files and lines shown by [`OutputFormatter::search`].
const SEARCH_FILES: usize = 15;
const SEARCH_LINES: usize = 5;

/// Overview sections, in display order.
const OVERVIEW_KINDS: [SymbolKind; 6] = [
    SymbolKind::Class,
    SymbolKind::Interface,
    SymbolKind::Function,
    SymbolKind::Method,
    SymbolKind::Property,
    SymbolKind::Constant,
];

/// Renders results for the terminal, or as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter {
    pub json_mode: bool,
}

impl OutputFormatter {
    pub fn new(json_mode: bool) -> Self {
        Self { json_mode }
    }

    /// Pretty JSON for any serializable value.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    }

    /// Symbol search results, grouped into `src` and `vendor`, then by
    /// bundle (the second and third path components).
    pub fn symbols(&self, symbols: &[Value], show_body: bool) -> String {
        if self.json_mode {
            return self.json(symbols);
        }
        if symbols.is_empty() {
            return "No symbols found".dimmed().to_string();
        }

        let (vendor, src): (Vec<&Value>, Vec<&Value>) = symbols
            .iter()
            .partition(|s| relative_path(s).starts_with("vendor/"));

        let mut lines = Vec::new();
        for (group, members) in [("src", src), ("vendor", vendor)] {
            if members.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(format!("=== {} ===", group).cyan().to_string());

            let mut bundles: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
            for sym in members {
                bundles.entry(bundle_of(relative_path(sym))).or_default().push(sym);
            }

            for (bundle, entries) in bundles {
                lines.push(format!("{}/", bundle).yellow().to_string());
                for sym in entries.iter().take(SYMBOLS_PER_BUNDLE) {
                    let kind = SymbolKind::of(sym).short_label();
                    let name = clip(str_field(sym, "name_path").unwrap_or("?"), 35);
                    let location = format!("{}:{}", short_path(relative_path(sym)), start_line(sym));
                    lines.push(format!("  {:<8} {:<35} {}", kind, name, location.dimmed()));

                    if show_body {
                        if let Some(body) = str_field(sym, "body").filter(|b| !b.is_empty()) {
                            for body_line in body.trim().lines().take(3) {
                                lines.push(format!("    {}", clip(body_line, 80).dimmed()));
                            }
                        }
                    }
                }
                if entries.len() > SYMBOLS_PER_BUNDLE {
                    lines.push(
                        format!("    ... +{} more", entries.len() - SYMBOLS_PER_BUNDLE)
                            .dimmed()
                            .to_string(),
                    );
                }
            }
        }
        lines.join("\n")
    }

    /// References to `symbol`, grouped by file in first-seen order.
    pub fn refs(&self, refs: &[Value], symbol: &str, show_all: bool) -> String {
        if self.json_mode {
            return self.json(refs);
        }
        if refs.is_empty() {
            return format!("No references found for '{}'", symbol)
                .dimmed()
                .to_string();
        }

        let mut order: Vec<&str> = Vec::new();
        let mut by_file: HashMap<&str, Vec<&Value>> = HashMap::new();
        for reference in refs {
            let path = str_field(reference, "relative_path").unwrap_or("unknown");
            if !by_file.contains_key(path) {
                order.push(path);
            }
            by_file.entry(path).or_default().push(reference);
        }

        let mut lines = vec![
            format!("{} references to '{}'", refs.len(), symbol.bold()),
            String::new(),
        ];
        let max_files = if show_all { order.len() } else { REFS_FILES };

        for path in order.iter().take(max_files) {
            let entries = &by_file[path];
            lines.push(format!("  {}:", path.cyan()));
            for reference in entries.iter().take(REFS_PER_FILE) {
                let context = reference_context(
                    str_field(reference, "content_around_reference").unwrap_or(""),
                );
                if context.is_empty() {
                    lines.push(format!("    :{}", start_line(reference)));
                } else {
                    lines.push(format!("    :{}  {}", start_line(reference), context));
                }
            }
            if entries.len() > REFS_PER_FILE {
                lines.push(
                    format!("    ... +{} more in this file", entries.len() - REFS_PER_FILE)
                        .dimmed()
                        .to_string(),
                );
            }
        }

        if order.len() > max_files {
            lines.push(String::new());
            lines.push(
                format!(
                    "  ... +{} more files (use --all to show all)",
                    order.len() - max_files
                )
                .dimmed()
                .to_string(),
            );
        }
        lines.join("\n")
    }

    /// Top-level symbols of `file`, grouped by kind.
    ///
    /// Only classes, interfaces, functions, methods, properties and
    /// constants are listed; the header counts every symbol.
    pub fn overview(&self, symbols: &[Value], file: &str) -> String {
        if self.json_mode {
            return self.json(symbols);
        }
        if symbols.is_empty() {
            return format!("No symbols found in '{}'", file).dimmed().to_string();
        }

        let mut lines = vec![
            format!("{} ({} symbols)", file.bold(), symbols.len()),
            String::new(),
        ];
        for kind in OVERVIEW_KINDS {
            let members: Vec<&Value> = symbols
                .iter()
                .filter(|s| SymbolKind::of(s) == kind)
                .collect();
            if members.is_empty() {
                continue;
            }

            lines.push(format!("  {}:", kind.label().to_uppercase().yellow()));
            for sym in members.iter().take(OVERVIEW_PER_KIND) {
                let name = str_field(sym, "name_path")
                    .or_else(|| str_field(sym, "name"))
                    .unwrap_or("?");
                let start = start_line(sym);
                let span = match end_line(sym) {
                    Some(end) if end != start => format!(":{}-{}", start, end),
                    _ => format!(":{}", start),
                };
                lines.push(format!("    {}{}", name, span.dimmed()));
            }
            if members.len() > OVERVIEW_PER_KIND {
                lines.push(
                    format!("    ... +{} more", members.len() - OVERVIEW_PER_KIND)
                        .dimmed()
                        .to_string(),
                );
            }
        }
        lines.join("\n")
    }

    /// Pattern search results.
    pub fn search(&self, results: &BTreeMap<String, Vec<String>>, pattern: &str) -> String {
        if self.json_mode {
            return self.json(results);
        }
        if results.is_empty() {
            return format!("No matches for '{}'", pattern).dimmed().to_string();
        }

        let total: usize = results.values().map(Vec::len).sum();
        let mut lines = vec![
            format!("Pattern: '{}'", pattern.bold()),
            format!("Found {} matches in {} files", total, results.len()),
            String::new(),
        ];

        for (path, matches) in results.iter().take(SEARCH_FILES) {
            lines.push(format!("  {}:", path.cyan()));
            for line in matches.iter().take(SEARCH_LINES) {
                lines.push(format!("    {}", clip(line.trim(), 80)));
            }
            if matches.len() > SEARCH_LINES {
                lines.push(
                    format!("    ... +{} more matches", matches.len() - SEARCH_LINES)
                        .dimmed()
                        .to_string(),
                );
            }
        }
        if results.len() > SEARCH_FILES {
            lines.push(String::new());
            lines.push(
                format!("  ... +{} more files", results.len() - SEARCH_FILES)
                    .dimmed()
                    .to_string(),
            );
        }
        lines.join("\n")
    }

    /// Server status, as text or as a mapping.
    pub fn status(&self, status: &Value) -> String {
        let header = ["Serena Status".bold().to_string(), "─".repeat(30)];
        match status {
            Value::String(text) => {
                if self.json_mode {
                    return self.json(&json!({"status": text}));
                }
                let mut lines = header.to_vec();
                lines.extend(
                    text.lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(|l| format!("  {}", l)),
                );
                lines.join("\n")
            }
            mapping => {
                if self.json_mode {
                    return self.json(mapping);
                }
                let mut lines = header.to_vec();
                lines.push(format!(
                    "Project: {}",
                    str_field(mapping, "project").unwrap_or("not activated")
                ));
                lines.push(format!("Root: {}", str_field(mapping, "root").unwrap_or("N/A")));
                if let Some(languages) = mapping.get("languages").and_then(Value::as_array) {
                    let names: Vec<String> = languages.iter().map(plain).collect();
                    lines.push(format!("Languages: {}", names.join(", ")));
                }
                if let Some(indexed) = mapping.get("indexed_files") {
                    lines.push(format!("Indexed files: {}", plain(indexed)));
                }
                lines.join("\n")
            }
        }
    }

    pub fn memory_list(&self, memories: &[String]) -> String {
        if self.json_mode {
            return self.json(memories);
        }
        if memories.is_empty() {
            return "No memories found".dimmed().to_string();
        }
        memories
            .iter()
            .map(|m| format!("  {}", m))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Memory search hits: `{memory, match_count, snippets}` records.
    pub fn memory_search(&self, results: &[Value]) -> String {
        if self.json_mode {
            return self.json(results);
        }
        if results.is_empty() {
            return "No matches found.".to_string();
        }

        let mut lines = vec![
            format!("Found matches in {} memories:", results.len()),
            String::new(),
        ];
        for hit in results {
            let count = hit.get("match_count").and_then(Value::as_u64).unwrap_or(0);
            lines.push(format!(
                "  {} ({} matches)",
                str_field(hit, "memory").unwrap_or("?"),
                count
            ));
            let snippets = hit.get("snippets").and_then(Value::as_array);
            for snippet in snippets.into_iter().flatten().take(2) {
                lines.push(format!("    ...{}...", clip(plain(snippet).trim(), 60)));
            }
            lines.push(String::new());
        }
        lines.join("\n")
    }

    /// Memory statistics as a two-column table.
    pub fn memory_stats(&self, stats: &Map<String, Value>) -> String {
        if self.json_mode {
            return self.json(stats);
        }
        if stats.is_empty() {
            return "No statistics available".dimmed().to_string();
        }
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_CLEAN);
        table.set_titles(row!["Metric".bold(), "Value".bold()]);
        for (key, value) in stats {
            table.add_row(row![key, plain(value)]);
        }
        table.to_string()
    }

    /// Tools exposed by the server.
    pub fn tools(&self, tools: &[ToolInfo]) -> String {
        if self.json_mode {
            return self.json(tools);
        }
        if tools.is_empty() {
            return "No tools reported".dimmed().to_string();
        }
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
        table.set_titles(row!["Tool".bold(), "Description".bold()]);
        for tool in tools {
            let summary = tool.description.lines().next().unwrap_or("");
            table.add_row(row![tool.name.cyan(), clip(summary, 70)]);
        }
        format!("{}\n{} tools", table, tools.len())
    }

    /// Recipe names per category.
    pub fn recipes(&self, categories: &[(&str, Vec<&str>)]) -> String {
        if self.json_mode {
            let map: Map<String, Value> = categories
                .iter()
                .map(|(category, names)| (category.to_string(), json!(names)))
                .collect();
            return self.json(&map);
        }
        let mut lines = vec!["Available recipes:".to_string()];
        for (category, names) in categories {
            lines.push(format!("  {}:", category.yellow()));
            lines.extend(names.iter().map(|n| format!("    {}", n)));
        }
        lines.join("\n")
    }

    /// Stored sessions keyed by server URL.
    pub fn sessions(&self, sessions: &BTreeMap<String, Session>) -> String {
        if self.json_mode {
            return self.json(sessions);
        }
        if sessions.is_empty() {
            return "No stored sessions".dimmed().to_string();
        }
        let now = crate::mcp::session::now_epoch();
        let mut lines = Vec::new();
        for (url, session) in sessions {
            lines.push(format!("{}", url.cyan()));
            lines.push(format!("  session: {}", session.session_id));
            lines.push(format!("  created: {}", timestamp(session.created_at)));
            lines.push(format!(
                "  idle:    {}s",
                (now - session.last_used).max(0.0).round() as u64
            ));
        }
        lines.join("\n")
    }

    /// Free text as returned by a tool (memory contents, trees).
    pub fn text(&self, text: &str) -> String {
        if self.json_mode {
            return self.json(&json!({"result": text}));
        }
        text.to_string()
    }

    pub fn error(&self, message: &str, hint: Option<&str>) -> String {
        if self.json_mode {
            return self.json(&json!({"error": message, "hint": hint}));
        }
        let mut lines = vec![format!("Error: {}", message).red().to_string()];
        if let Some(hint) = hint {
            lines.push(format!("Hint: {}", hint).dimmed().to_string());
        }
        lines.join("\n")
    }

    pub fn success(&self, message: &str) -> String {
        if self.json_mode {
            return self.json(&json!({"success": message}));
        }
        format!("✓ {}", message).green().to_string()
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn relative_path(symbol: &Value) -> &str {
    str_field(symbol, "relative_path").unwrap_or("")
}

/// Strings without quotes, anything else as compact JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn start_line(symbol: &Value) -> String {
    symbol
        .get("body_location")
        .and_then(|loc| loc.get("start_line"))
        .map(plain)
        .unwrap_or_else(|| "?".to_string())
}

fn end_line(symbol: &Value) -> Option<String> {
    symbol
        .get("body_location")
        .and_then(|loc| loc.get("end_line"))
        .filter(|v| !v.is_null())
        .map(plain)
}

/// First `max` characters of `s`.
fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// `src/Meyer/Shop/Entity/X.php` -> `Meyer/Shop`; shorter paths use their
/// first component.
fn bundle_of(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() >= 3 {
        parts[1..3].join("/")
    } else {
        parts.first().copied().unwrap_or("unknown").to_string()
    }
}

/// Last two path components.
fn short_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    parts[parts.len().saturating_sub(2)..].join("/")
}

/// The highlighted line of a reference context (marked with `>` in its
/// first five characters), without its gutter, up to 60 characters.
fn reference_context(context: &str) -> String {
    context
        .lines()
        .find(|line| line.chars().take(5).any(|c| c == '>'))
        .map(|line| line.trim().chars().skip(4).take(60).collect())
        .unwrap_or_default()
}

fn timestamp(epoch: f64) -> String {
    chrono::DateTime::from_timestamp(epoch as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{}", epoch))
}
