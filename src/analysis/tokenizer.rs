//! Extracts candidate reference names from formula text.
//!
//! Display names are used verbatim in formulas, spaces included, so a
//! candidate is a run of words separated by whitespace: `Total Cost * 2`
//! yields `Total Cost`. The output is deliberately loose (duplicates, noise
//! such as the `e5` in `2e5`); resolution downstream tolerates misses.

use lazy_static::lazy_static;
use regex::Regex;

/// Math functions, constants and guard words that are never references.
pub const RESERVED_TOKENS: &[&str] = &[
    "sin", "cos", "tan", "log", "exp", "sqrt", "abs", "round", "floor", "ceil", "max", "min", "pi",
    "e", "Math", "self", "this", "conditional",
];

lazy_static! {
    static ref CANDIDATE_RE: Regex =
        Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(?:\s+[A-Za-z0-9_]+)*").unwrap();
}

/// Candidate reference names in order of appearance, denylist removed.
pub fn extract_candidate_names(formula: &str) -> Vec<String> {
    extract_candidate_names_with(formula, &[])
}

/// Like [`extract_candidate_names`], with extra reserved tokens.
pub fn extract_candidate_names_with(formula: &str, extra_reserved: &[String]) -> Vec<String> {
    CANDIDATE_RE
        .find_iter(formula)
        .map(|m| m.as_str().trim())
        .filter(|token| !token.is_empty())
        .filter(|token| !is_reserved(token, extra_reserved))
        .map(str::to_string)
        .collect()
}

fn is_reserved(token: &str, extra: &[String]) -> bool {
    RESERVED_TOKENS.contains(&token) || extra.iter().any(|r| r == token)
}

/// Identifier character for whole-word matching.
#[inline]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True when `word` occurs in `text` as a whole word, i.e. not glued to
/// identifier characters on either side.
pub fn contains_whole_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let check_start = word.chars().next().map_or(false, is_word_char);
    let check_end = word.chars().last().map_or(false, is_word_char);

    text.match_indices(word).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = !check_start || !text[..start].chars().next_back().map_or(false, is_word_char);
        let after_ok = !check_end || !text[end..].chars().next().map_or(false, is_word_char);
        before_ok && after_ok
    })
}
