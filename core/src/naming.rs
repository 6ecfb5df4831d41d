//! Identifier deconstruction and casing.
//!
//! [`deconstruct`] splits any identifier into lowercase word tokens;
//! [`pascal_case`], [`camel_case`], [`snake_case`], and [`kebab_case`]
//! recompose them. Both directions are pure, so the same input always yields
//! the same name.
//!
//! # Example
//!
//! ```
//! use cmdlet_synth_core::naming::{deconstruct, pascal_case};
//!
//! let tokens = deconstruct("HTTPServerName");
//! assert_eq!(tokens, vec!["http", "server", "name"]);
//! assert_eq!(pascal_case(&tokens), "HttpServerName");
//! ```

use std::collections::HashSet;

/// Splits an identifier into lowercase word tokens.
///
/// Word boundaries are:
/// - any non-alphanumeric character (dropped, never kept in a token),
/// - a lowercase letter or digit followed by an uppercase letter
///   (`camelCase`, `base64Encode`),
/// - the last capital of an acronym when a lowercase letter follows
///   (`HTTPServer` splits as `HTTP` + `Server`).
///
/// Digits stay attached to the word they follow. An empty identifier, or one
/// made only of separators, yields an empty sequence.
///
/// # Examples
///
/// ```
/// use cmdlet_synth_core::naming::deconstruct;
///
/// assert_eq!(deconstruct("listWidgets"), vec!["list", "widgets"]);
/// assert_eq!(deconstruct("api-version"), vec!["api", "version"]);
/// assert_eq!(deconstruct("__resource_group__"), vec!["resource", "group"]);
/// assert_eq!(deconstruct("base64Encode"), vec!["base64", "encode"]);
/// assert!(deconstruct("").is_empty());
/// ```
pub fn deconstruct(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            flush(&mut current, &mut tokens);
            continue;
        }

        if !current.is_empty() && c.is_uppercase() {
            // `current` is non-empty, so the previous char was alphanumeric.
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let starts_word = prev.is_lowercase()
                || prev.is_numeric()
                || (prev.is_uppercase() && next_is_lower);
            if starts_word {
                flush(&mut current, &mut tokens);
            }
        }

        current.extend(c.to_lowercase());
    }

    flush(&mut current, &mut tokens);
    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Joins tokens as `PascalCase`.
///
/// # Examples
///
/// ```
/// use cmdlet_synth_core::naming::pascal_case;
///
/// assert_eq!(pascal_case(&["list", "widgets"]), "ListWidgets");
/// assert_eq!(pascal_case::<&str>(&[]), "");
/// ```
pub fn pascal_case<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens.iter().map(|t| capitalize(t.as_ref())).collect()
}

/// Joins tokens as `camelCase`.
///
/// # Examples
///
/// ```
/// use cmdlet_synth_core::naming::camel_case;
///
/// assert_eq!(camel_case(&["resource", "group", "name"]), "resourceGroupName");
/// ```
pub fn camel_case<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i == 0 {
            out.push_str(&token.as_ref().to_lowercase());
        } else {
            out.push_str(&capitalize(token.as_ref()));
        }
    }
    out
}

/// Joins tokens as `snake_case`.
pub fn snake_case<S: AsRef<str>>(tokens: &[S]) -> String {
    join_lower(tokens, "_")
}

/// Joins tokens as `kebab-case`.
pub fn kebab_case<S: AsRef<str>>(tokens: &[S]) -> String {
    join_lower(tokens, "-")
}

fn join_lower<S: AsRef<str>>(tokens: &[S], separator: &str) -> String {
    tokens
        .iter()
        .map(|t| t.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Shorthand for `pascal_case(&deconstruct(identifier))`.
pub fn to_pascal_case(identifier: &str) -> String {
    pascal_case(&deconstruct(identifier))
}

/// Returns `candidate` if unused, else the first free `{candidate}{n}`
/// counting from 1.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use cmdlet_synth_core::naming::unique_name;
///
/// let mut taken = HashSet::new();
/// taken.insert("Widget".to_string());
/// taken.insert("Widget1".to_string());
/// assert_eq!(unique_name(&taken, "Widget"), "Widget2");
/// assert_eq!(unique_name(&taken, "Gadget"), "Gadget");
/// ```
pub fn unique_name(taken: &HashSet<String>, candidate: &str) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    (1..)
        .map(|n| format!("{candidate}{n}"))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| candidate.to_string())
}
