//! LSP symbol kinds
//!
//! Serena reports symbol kinds as LSP `SymbolKind` numbers. This module maps
//! the subset the client filters and displays on to names; any other number
//! is carried through as [`SymbolKind::Other`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SerenaError;

/// An LSP symbol kind.
///
/// Serializes as its numeric code.
///
/// # Examples
///
/// ```
/// use serena_client::symbols::SymbolKind;
///
/// let kind: SymbolKind = "Class".parse().unwrap();
/// assert_eq!(kind.code(), 5);
/// assert_eq!(SymbolKind::from_code(11).short_label(), "iface");
/// assert_eq!(SymbolKind::from_code(26).label(), "26");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    File,
    Module,
    Namespace,
    Package,
    Class,
    Method,
    Property,
    Field,
    Constructor,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    /// A kind outside the table above.
    Other(u32),
}

static TABLE: [(SymbolKind, u32, &str, &str); 14] = [
    (SymbolKind::File, 1, "File", "file"),
    (SymbolKind::Module, 2, "Module", "module"),
    (SymbolKind::Namespace, 3, "Namespace", "ns"),
    (SymbolKind::Package, 4, "Package", "pkg"),
    (SymbolKind::Class, 5, "Class", "class"),
    (SymbolKind::Method, 6, "Method", "method"),
    (SymbolKind::Property, 7, "Property", "prop"),
    (SymbolKind::Field, 8, "Field", "field"),
    (SymbolKind::Constructor, 9, "Constructor", "ctor"),
    (SymbolKind::Enum, 10, "Enum", "enum"),
    (SymbolKind::Interface, 11, "Interface", "iface"),
    (SymbolKind::Function, 12, "Function", "func"),
    (SymbolKind::Variable, 13, "Variable", "var"),
    (SymbolKind::Constant, 14, "Constant", "const"),
];

impl SymbolKind {
    /// Kind for an LSP numeric code.
    pub fn from_code(code: u32) -> Self {
        TABLE
            .iter()
            .find(|(_, c, _, _)| *c == code)
            .map(|(kind, _, _, _)| *kind)
            .unwrap_or(SymbolKind::Other(code))
    }

    /// LSP numeric code.
    pub fn code(self) -> u32 {
        match self {
            SymbolKind::Other(code) => code,
            known => Self::entry(known).map(|(_, c, _, _)| *c).unwrap_or(0),
        }
    }

    /// Human label, e.g. `"Interface"`.
    pub fn label(self) -> String {
        match Self::entry(self) {
            Some((_, _, label, _)) => (*label).to_string(),
            None => self.code().to_string(),
        }
    }

    /// Compact label used in listings, e.g. `"iface"`.
    pub fn short_label(self) -> String {
        match Self::entry(self) {
            Some((_, _, _, short)) => (*short).to_string(),
            None => self.code().to_string(),
        }
    }

    /// Kind from a JSON symbol record's `kind` member; absent reads as 0.
    pub fn of(symbol: &serde_json::Value) -> Self {
        let code = symbol
            .get("kind")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        Self::from_code(u32::try_from(code).unwrap_or(0))
    }

    fn entry(kind: SymbolKind) -> Option<&'static (SymbolKind, u32, &'static str, &'static str)> {
        TABLE.iter().find(|(k, _, _, _)| *k == kind)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for SymbolKind {
    type Err = SerenaError;

    /// Parse a human name case-insensitively. Short labels are accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TABLE
            .iter()
            .find(|(_, _, label, short)| label.to_ascii_lowercase() == wanted || *short == wanted)
            .map(|(kind, _, _, _)| *kind)
            .ok_or_else(|| {
                SerenaError::InvalidArgument(format!(
                    "unknown symbol kind '{}' (expected one of: {})",
                    s,
                    TABLE
                        .iter()
                        .map(|(_, _, label, _)| label.to_ascii_lowercase())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl Serialize for SymbolKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

impl<'de> Deserialize<'de> for SymbolKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(SymbolKind::from_code(u32::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_codes_round_trip() {
        for code in 1..=14 {
            let kind = SymbolKind::from_code(code);
            assert!(!matches!(kind, SymbolKind::Other(_)));
            assert_eq!(kind.code(), code);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(SymbolKind::Class.label(), "Class");
        assert_eq!(SymbolKind::Namespace.short_label(), "ns");
        assert_eq!(SymbolKind::Property.short_label(), "prop");
        assert_eq!(SymbolKind::Function.short_label(), "func");
        assert_eq!(SymbolKind::Constant.short_label(), "const");
    }

    #[test]
    fn test_unknown_code_passes_through() {
        let kind = SymbolKind::from_code(23);
        assert_eq!(kind, SymbolKind::Other(23));
        assert_eq!(kind.code(), 23);
        assert_eq!(kind.label(), "23");
        assert_eq!(kind.short_label(), "23");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("class".parse::<SymbolKind>().unwrap(), SymbolKind::Class);
        assert_eq!("INTERFACE".parse::<SymbolKind>().unwrap(), SymbolKind::Interface);
        assert_eq!("iface".parse::<SymbolKind>().unwrap(), SymbolKind::Interface);
    }

    #[test]
    fn test_parse_unknown_is_invalid_argument() {
        let err = "widget".parse::<SymbolKind>().unwrap_err();
        assert!(matches!(err, SerenaError::InvalidArgument(_)));
        assert!(err.to_string().contains("widget"));
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_value(SymbolKind::Method).unwrap(), json!(6));
        let kind: SymbolKind = serde_json::from_value(json!(99)).unwrap();
        assert_eq!(kind, SymbolKind::Other(99));
    }

    #[test]
    fn test_of_reads_kind_member() {
        assert_eq!(SymbolKind::of(&json!({"kind": 12})), SymbolKind::Function);
        assert_eq!(SymbolKind::of(&json!({})), SymbolKind::Other(0));
    }
}
