//! Pre-built queries
//!
//! A recipe is a named `find_symbol` or `search` call with fixed arguments.
//! The same table backs `serena recipe` and the proxy's `GET /recipe`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SerenaError};
use crate::mcp::client::SerenaClient;
use crate::ops::FindSymbolOptions;
use crate::symbols::SymbolKind;

/// What a recipe runs.
#[derive(Debug, Clone, Copy)]
pub enum RecipeAction {
    /// Regex search restricted by glob.
    Search {
        pattern: &'static str,
        glob: &'static str,
    },
    /// Symbol lookup; with `suffix`, only names ending in it are kept.
    Find {
        pattern: &'static str,
        kind: SymbolKind,
        path: &'static str,
        suffix: Option<&'static str>,
    },
}

/// A named query.
#[derive(Debug, Clone, Copy)]
pub struct Recipe {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub action: RecipeAction,
}

const fn find(
    name: &'static str,
    category: &'static str,
    description: &'static str,
    pattern: &'static str,
    kind: SymbolKind,
    path: &'static str,
) -> Recipe {
    Recipe {
        name,
        category,
        description,
        action: RecipeAction::Find {
            pattern,
            kind,
            path,
            suffix: None,
        },
    }
}

/// Every recipe, grouped by category in display order.
pub static RECIPES: &[Recipe] = &[
    Recipe {
        name: "entities",
        category: "project",
        description: "Doctrine entities (#[ORM\\Entity])",
        action: RecipeAction::Search {
            pattern: r"#\[ORM\\Entity",
            glob: "src/**/*.php",
        },
    },
    Recipe {
        name: "controllers",
        category: "project",
        description: "*Controller classes",
        action: RecipeAction::Find {
            pattern: "Controller",
            kind: SymbolKind::Class,
            path: "src/",
            suffix: Some("Controller"),
        },
    },
    find("services", "project", "*Service classes", "Service", SymbolKind::Class, "src/"),
    find("interfaces", "project", "Interfaces", "Interface", SymbolKind::Interface, "src/"),
    Recipe {
        name: "tests",
        category: "project",
        description: "*Test classes",
        action: RecipeAction::Find {
            pattern: "Test",
            kind: SymbolKind::Class,
            path: "src/",
            suffix: Some("Test"),
        },
    },
    find("oro-payment", "oro-framework", "Oro payment classes", "Payment", SymbolKind::Class, "vendor/oro"),
    find("oro-checkout", "oro-framework", "Oro checkout classes", "Checkout", SymbolKind::Class, "vendor/oro"),
    find("oro-order", "oro-framework", "Oro order classes", "Order", SymbolKind::Class, "vendor/oro"),
    find("oro-product", "oro-framework", "Oro product classes", "Product", SymbolKind::Class, "vendor/oro"),
    find("oro-customer", "oro-framework", "Oro customer classes", "Customer", SymbolKind::Class, "vendor/oro"),
    find("oro-shipping", "oro-framework", "Oro shipping classes", "Shipping", SymbolKind::Class, "vendor/oro"),
    find(
        "oro-events",
        "oro-framework",
        "Oro commerce event classes",
        "Event",
        SymbolKind::Class,
        "vendor/oro/commerce/src/Oro/Bundle",
    ),
    find("mollie", "third-party", "Mollie classes", "Mollie", SymbolKind::Class, "vendor/mollie"),
    find(
        "netresearch-payment",
        "third-party",
        "Netresearch payment classes",
        "Payment",
        SymbolKind::Class,
        "vendor/netresearch",
    ),
    find("payment-methods", "payment-all-vendors", "PaymentMethod classes", "PaymentMethod", SymbolKind::Class, "vendor/"),
    find("payment-providers", "payment-all-vendors", "PaymentProvider classes", "PaymentProvider", SymbolKind::Class, "vendor/"),
    find("payment-factories", "payment-all-vendors", "PaymentFactory classes", "PaymentFactory", SymbolKind::Class, "vendor/"),
    find(
        "payment-interfaces",
        "payment-all-vendors",
        "Payment interfaces",
        "PaymentInterface",
        SymbolKind::Interface,
        "vendor/",
    ),
];

/// Look a recipe up by name.
///
/// # Errors
///
/// [`SerenaError::InvalidArgument`] for an unknown name.
pub fn find_recipe(name: &str) -> std::result::Result<&'static Recipe, SerenaError> {
    RECIPES
        .iter()
        .find(|r| r.name == name)
        .ok_or_else(|| SerenaError::InvalidArgument(format!("Unknown recipe: {}", name)))
}

/// Comma-separated recipe names, for hints.
pub fn recipe_names() -> String {
    RECIPES.iter().map(|r| r.name).collect::<Vec<_>>().join(", ")
}

/// Recipe names keyed by category, categories in table order.
pub fn categories() -> Vec<(&'static str, Vec<&'static str>)> {
    let mut grouped: Vec<(&'static str, Vec<&'static str>)> = Vec::new();
    for recipe in RECIPES {
        match grouped.iter_mut().find(|(c, _)| *c == recipe.category) {
            Some((_, names)) => names.push(recipe.name),
            None => grouped.push((recipe.category, vec![recipe.name])),
        }
    }
    grouped
}

/// What a recipe produced.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RecipeOutput {
    Matches(BTreeMap<String, Vec<String>>),
    Symbols(Vec<Value>),
}

impl SerenaClient {
    /// Run the recipe called `name`.
    pub async fn run_recipe(&self, name: &str) -> Result<RecipeOutput> {
        let recipe = find_recipe(name)?;
        tracing::debug!(recipe = recipe.name, "running recipe");
        match recipe.action {
            RecipeAction::Search { pattern, glob } => {
                let matches = self.search(pattern, Some(glob), None).await?;
                Ok(RecipeOutput::Matches(matches))
            }
            RecipeAction::Find {
                pattern,
                kind,
                path,
                suffix,
            } => {
                let opts = FindSymbolOptions {
                    kind: Some(kind),
                    path: Some(path.to_string()),
                    ..Default::default()
                };
                let mut symbols = self.find_symbol(pattern, &opts).await?;
                if let Some(suffix) = suffix {
                    symbols.retain(|s| {
                        s.get("name_path")
                            .and_then(Value::as_str)
                            .is_some_and(|n| n.ends_with(suffix))
                    });
                }
                Ok(RecipeOutput::Symbols(symbols))
            }
        }
    }
}
