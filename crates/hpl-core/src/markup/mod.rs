//! Markup codec.
//!
//! Converts between XML text and an in-memory [`Value`] tree made of text
//! leaves, ordered maps and ordered sequences.
//!
//! ## Conventions
//!
//! - Attributes are map entries whose key starts with [`ATTRIBUTE_PREFIX`].
//! - Element text that sits next to attributes or child elements is stored
//!   under [`TEXT_KEY`].
//! - Leaf text is opaque: `"007"` stays `"007"` and `"true"` stays a string.
//! - Paths listed in [`CodecConfig`] always parse as sequences, even when the
//!   markup holds zero or one matching element.

mod build;
mod parse;
mod value;

pub use build::{build, BuildOptions};
pub use parse::{parse, parse_at};
pub use value::{Map, Value};

/// Prefix that marks a map key as an XML attribute.
pub const ATTRIBUTE_PREFIX: char = '_';

/// Map key holding an element's own text when it also has attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Paths that always deserialize as ordered sequences.
pub const DEFAULT_SEQUENCE_PATHS: [&str; 6] = [
    "root.head.options.column_alias.col",
    "root.head.options.column_order.col",
    "root.head.options.invisible_columns.col",
    "root.body.sequence.table",
    "root.body.tables.table",
    "root.body.tables.table.tbody.ac",
];

/// Parser configuration: the fixed set of always-sequence paths.
///
/// Paths are dot-separated element names from the document root; sequence
/// positions are not part of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    sequence_paths: Vec<String>,
}

impl CodecConfig {
    pub fn new<I, S>(sequence_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sequence_paths: sequence_paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sequence_paths(&self) -> &[String] {
        &self.sequence_paths
    }

    /// Whether the element at `path` must always be collected into a sequence.
    pub fn is_sequence(&self, path: &str) -> bool {
        self.sequence_paths.iter().any(|p| p == path)
    }

    /// Name of the always-sequence child directly below `path`, if any.
    pub fn sequence_child(&self, path: &str) -> Option<&str> {
        self.sequence_paths.iter().find_map(|p| {
            p.strip_prefix(path)
                .and_then(|rest| rest.strip_prefix('.'))
                .filter(|child| !child.contains('.'))
        })
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SEQUENCE_PATHS)
    }
}

pub(crate) fn is_attribute_key(key: &str) -> bool {
    key.starts_with(ATTRIBUTE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_lookup() {
        let config = CodecConfig::default();
        assert!(config.is_sequence("root.body.tables.table"));
        assert!(!config.is_sequence("root.body.tables"));
        assert_eq!(config.sequence_child("root.body.tables"), Some("table"));
        assert_eq!(config.sequence_child("root.body.tables.table.tbody"), Some("ac"));
        assert_eq!(config.sequence_child("root.body"), None);
        assert_eq!(config.sequence_child("root.body.tables.table"), None);
    }
}
