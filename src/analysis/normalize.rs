//! Turns free-text display names into identifier-safe names.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SEPARATOR_RE: Regex = Regex::new(r"[\s,_]+").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalizes a display name: trims it, collapses every run of whitespace,
/// commas and underscores into a single `_`, and drops separators at either
/// end. Total and idempotent; `""` maps to `""`.
pub fn normalize(name: &str) -> String {
    let collapsed = SEPARATOR_RE.replace_all(name, "_");
    collapsed.trim_matches('_').to_string()
}

/// Replaces each whitespace run with `_` and nothing else. The evaluator
/// registers calculations under this alias as well as the normalized name.
pub fn underscore_alias(name: &str) -> String {
    WHITESPACE_RE.replace_all(name, "_").into_owned()
}
