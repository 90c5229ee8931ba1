//! Whole-word, longest-first name substitution over formula text.
//!
//! All names are compiled into one alternation, longest first, and replaced
//! in a single left-to-right pass. A shorter name can therefore never eat
//! into a longer one (`Cost` inside `Total Cost of Ownership`), and a
//! replacement is never re-scanned for further matches.

use crate::store::NameMap;
use log::warn;
use regex::{Captures, Regex};
use std::collections::HashMap;

use super::tokenizer::is_word_char;

#[derive(Debug, Clone)]
pub struct Substitution {
    pattern: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl Substitution {
    /// First replacement wins for a repeated name. Blank names are ignored.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut replacements = HashMap::new();
        for (name, replacement) in pairs {
            let name = name.into();
            if name.trim().is_empty() {
                continue;
            }
            replacements.entry(name).or_insert_with(|| replacement.into());
        }

        let mut names: Vec<&String> = replacements.keys().collect();
        // Longest first; ties broken lexicographically so the pattern is stable.
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let pattern = if names.is_empty() {
            None
        } else {
            let alternation = names.iter().map(|n| word_pattern(n)).collect::<Vec<_>>().join("|");
            match Regex::new(&alternation) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Could not compile substitution pattern for {} names: {}", names.len(), e);
                    None
                }
            }
        };

        Self { pattern, replacements }
    }

    /// Original -> normalized for every entry of the map.
    pub fn from_name_map(map: &NameMap) -> Self {
        Self::new(map.iter())
    }

    pub fn is_empty(&self) -> bool { self.replacements.is_empty() }

    pub fn apply(&self, text: &str) -> String {
        let Some(re) = &self.pattern else {
            return text.to_string();
        };
        re.replace_all(text, |caps: &Captures| {
            let matched = &caps[0];
            self.replacements.get(matched).cloned().unwrap_or_else(|| matched.to_string())
        })
        .into_owned()
    }
}

/// Escaped name with `\b` on each side whose edge character is a word
/// character. A boundary next to `(` or `%` would never match.
fn word_pattern(name: &str) -> String {
    let starts_word = name.chars().next().map_or(false, is_word_char);
    let ends_word = name.chars().last().map_or(false, is_word_char);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(name),
        if ends_word { r"\b" } else { "" }
    )
}

/// Rewrites every known original name in `formula` to its normalized form.
pub fn rewrite(formula: &str, names: &NameMap) -> String {
    Substitution::from_name_map(names).apply(formula)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map(names: &[&str]) -> NameMap {
        let mut m = NameMap::new();
        for n in names {
            m.insert_declared(n);
        }
        m
    }

    #[test]
    fn test_longest_name_first() {
        // Registration order puts the short name first on purpose.
        let names = map(&["Cost", "Total Cost of Ownership"]);
        assert_eq!(
            rewrite("Total Cost of Ownership / Cost + Cost", &names),
            "Total_Cost_of_Ownership / Cost + Cost"
        );
    }

    #[test]
    fn test_only_whole_words_are_replaced() {
        let subst = Substitution::new([("Rate", "R")]);
        assert_eq!(subst.apply("Rates * Rate + CRate + Rate_2"), "Rates * R + CRate + Rate_2");
    }

    #[test]
    fn test_names_with_symbols_at_the_edges() {
        let names = map(&["Cost ($)", "Growth %"]);
        assert_eq!(rewrite("(Cost ($) * Growth %)/100", &names), "(Cost_($) * Growth_%)/100");
    }

    #[test]
    fn test_replacements_are_not_rescanned() {
        let subst = Substitution::new([("A", "B"), ("B", "C")]);
        assert_eq!(subst.apply("A + B"), "B + C");
    }

    #[test]
    fn test_no_original_name_survives() {
        let names = map(&["Energy Price", "Hours Per Year", "Discount Rate"]);
        let out = rewrite("Energy Price * Hours Per Year * (1 - Discount Rate)", &names);
        assert_eq!(out, "Energy_Price * Hours_Per_Year * (1 - Discount_Rate)");
        for (original, _) in names.iter() {
            assert!(!out.contains(original));
        }
    }

    #[test]
    fn test_empty_map_is_identity() {
        assert_eq!(rewrite("A + 1", &NameMap::new()), "A + 1");
        assert!(Substitution::new(Vec::<(String, String)>::new()).is_empty());
    }
}
