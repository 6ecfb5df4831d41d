//! Literal text substitution applied to generated output.
//!
//! An [`OverrideTable`] renames legacy runtime namespaces in finished text.
//! Matching is plain substring matching. The pass is single and left to
//! right: at each position the first entry (in insertion order) whose literal
//! starts there is replaced, and scanning resumes after the matched literal.
//! Replacement text is never re-scanned, so no substitution nests.

use serde::Serialize;
use tracing::debug;

/// Ordered legacy-literal to replacement mapping.
///
/// # Examples
///
/// ```
/// use cmdlet_synth::OverrideTable;
///
/// let table = OverrideTable::new().with("Foo.Bar", "Baz.Qux");
/// assert_eq!(table.apply("using Foo.Bar;"), "using Baz.Qux;");
///
/// // replacements are not re-scanned
/// let table = OverrideTable::new().with("a", "ab").with("b", "c");
/// assert_eq!(table.apply("ab"), "abc");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverrideTable {
    entries: Vec<(String, String)>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitutions that move the legacy shared runtime into the generated
    /// module's own namespace.
    pub fn legacy_runtime(project_namespace: &str) -> Self {
        let json = format!("{project_namespace}.Runtime.Json");
        let runtime = format!("{project_namespace}.Runtime");
        Self::new()
            .with("Carbon.Json.Converters", &json)
            .with("Carbon.Internal.Extensions", &json)
            .with("Carbon.Internal", &json)
            .with("Carbon.Data", &json)
            .with("using Data;", "")
            .with("using Parser;", "")
            .with("using Converters;", "")
            .with("using Internal.Extensions;", "")
            .with("Carbon.Json.Parser", &json)
            .with("Carbon.Json", &json)
            .with("Microsoft.Rest.ClientRuntime", &runtime)
            .with("Microsoft.Rest", project_namespace)
    }

    /// Appends an entry. Empty literals and literals already present are
    /// ignored; returns whether the entry was added.
    pub fn insert(&mut self, legacy: &str, replacement: &str) -> bool {
        if legacy.is_empty() || self.entries.iter().any(|(l, _)| l == legacy) {
            return false;
        }
        self.entries.push((legacy.to_string(), replacement.to_string()));
        true
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, legacy: &str, replacement: &str) -> Self {
        self.insert(legacy, replacement);
        self
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, r)| (l.as_str(), r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites `text` in one pass.
    pub fn apply(&self, text: &str) -> String {
        if self.entries.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        let mut replaced = 0usize;
        'scan: while !rest.is_empty() {
            for (legacy, replacement) in &self.entries {
                if let Some(after) = rest.strip_prefix(legacy.as_str()) {
                    out.push_str(replacement);
                    rest = after;
                    replaced += 1;
                    continue 'scan;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }

        if replaced > 0 {
            debug!(replaced, "overrides applied");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_exactly_once() {
        let table = OverrideTable::new().with("Foo.Bar", "Baz.Qux");
        let out = table.apply("using Foo.Bar;");
        assert_eq!(out, "using Baz.Qux;");
        assert_eq!(out.matches("Baz.Qux").count(), 1);
    }

    #[test]
    fn test_replacement_containing_literal_is_not_rescanned() {
        let table = OverrideTable::new().with("Foo", "Foo.Foo");
        assert_eq!(table.apply("Foo"), "Foo.Foo");
    }

    #[test]
    fn test_insertion_order_decides_overlaps() {
        let table = OverrideTable::legacy_runtime("Contoso");
        assert_eq!(
            table.apply("using Carbon.Json.Converters;"),
            "using Contoso.Runtime.Json;"
        );
        // `Carbon.Json` is listed after `Carbon.Json.Parser`, so the longer one wins
        assert_eq!(table.apply("Carbon.Json.Parser.Parse"), "Contoso.Runtime.Json.Parse");
        assert_eq!(
            table.apply("Microsoft.Rest.ClientRuntime.IEventListener"),
            "Contoso.Runtime.IEventListener"
        );
        assert_eq!(table.apply("Microsoft.Rest.Foo"), "Contoso.Foo");
        assert_eq!(table.apply("using Data;\nusing System;"), "\nusing System;");
    }

    #[test]
    fn test_earlier_entry_shadows_longer_later_entry() {
        let table = OverrideTable::new().with("Foo", "X").with("Foo.Bar", "Y");
        assert_eq!(table.apply("Foo.Bar"), "X.Bar");
    }

    #[test]
    fn test_substring_matches_inside_identifiers() {
        let table = OverrideTable::new().with("Data", "Info");
        assert_eq!(table.apply("MetaData"), "MetaInfo");
    }

    #[test]
    fn test_rejects_empty_and_duplicate_literals() {
        let mut table = OverrideTable::new();
        assert!(!table.insert("", "x"));
        assert!(table.insert("a", "b"));
        assert!(!table.insert("a", "c"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.apply("aaa"), "bbb");
    }

    #[test]
    fn test_multibyte_text_passes_through() {
        let table = OverrideTable::new().with("Ünï", "U");
        assert_eq!(table.apply("→Ünï←"), "→U←");
    }
}
