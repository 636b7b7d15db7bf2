//! Reader/writer configuration.
use std::env;

use dndxml_core::vocab::parse_bool;

/// Options shared by the document reader and writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Spaces per nesting level when writing; zero writes a single line.
    pub indent: usize,
    /// Reject documents with the wrong root or namespace instead of reading
    /// them as empty.
    pub strict_namespace: bool,
    /// Re-read every written document and fail if it does not match.
    pub test_mode: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            strict_namespace: false,
            test_mode: false,
        }
    }
}

impl DocumentConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `DNDXML_INDENT` - Indentation width when writing (default: 2)
    /// - `DNDXML_STRICT_NAMESPACE` - Reject foreign documents (default: false)
    /// - `DNDXML_TEST_MODE` - Verify written documents by re-reading them (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Values that fail to parse leave the default in place.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(indent) = lookup("DNDXML_INDENT").and_then(|v| v.trim().parse().ok()) {
            config.indent = indent;
        }
        if let Some(strict) = lookup("DNDXML_STRICT_NAMESPACE").and_then(|v| parse_bool(&v)) {
            config.strict_namespace = strict;
        }
        if let Some(test_mode) = lookup("DNDXML_TEST_MODE").and_then(|v| parse_bool(&v)) {
            config.test_mode = test_mode;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(DocumentConfig::from_lookup(|_| None), DocumentConfig::default());
    }

    #[test]
    fn reads_variables() {
        let config = DocumentConfig::from_lookup(lookup_from(&[
            ("DNDXML_INDENT", "4"),
            ("DNDXML_STRICT_NAMESPACE", "yes"),
            ("DNDXML_TEST_MODE", "T"),
        ]));
        assert_eq!(config.indent, 4);
        assert!(config.strict_namespace);
        assert!(config.test_mode);
    }

    #[test]
    fn ignores_unparseable_values() {
        let config = DocumentConfig::from_lookup(lookup_from(&[
            ("DNDXML_INDENT", "wide"),
            ("DNDXML_TEST_MODE", "sometimes"),
        ]));
        assert_eq!(config, DocumentConfig::default());
    }
}
