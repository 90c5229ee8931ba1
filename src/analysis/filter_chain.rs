//! Structural lookup between a filter parameter (the selector) and a
//! dropdown parameter whose options form a table keyed by selector values.
//!
//! `Country = UK` plus a dropdown `Grid Factor` with options
//! `[{key: "UK: 181", value: 0.181}, {key: "USA, CAN", value: 0.4}]`
//! resolves `Grid Factor` to `0.181`. None of this is visible in formula
//! text, so it is resolved here rather than by the name resolver.

use crate::config::EngineConfig;
use crate::store::{DisplayType, DropdownOption, Overrides, Parameter};

/// How an option key matched the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    /// `"UK"` == `"uk"`
    Exact,
    /// `"UK: 181"` for selection `"UK"`
    ColonPrefix,
    /// `"UK, USA, UAE"` for selection `"USA"`
    ListMember,
    /// Substring either way.
    Contains,
}

/// Tests an option key against a selection, loosest rule last. Both sides
/// are compared lower-cased.
pub fn key_matches(key: &str, selection: &str) -> Option<KeyMatch> {
    let key = key.to_lowercase();
    let selection = selection.to_lowercase();

    if key == selection {
        return Some(KeyMatch::Exact);
    }
    if let Some((head, _)) = key.split_once(':') {
        if head.trim() == selection {
            return Some(KeyMatch::ColonPrefix);
        }
    }
    if key.contains(',') && key.split(',').any(|part| part.trim() == selection) {
        return Some(KeyMatch::ListMember);
    }
    if key.contains(&selection) || selection.contains(&key) {
        return Some(KeyMatch::Contains);
    }
    None
}

/// The filter parameter acting as selector: the first filter whose name
/// contains the configured keyword. A selector without options disables the
/// chain; later filters are never consulted.
pub fn find_selector<'a>(all: &'a [Parameter], config: &EngineConfig) -> Option<&'a Parameter> {
    let keyword = config.filter_selector_keyword.to_lowercase();
    all.iter()
        .find(|p| p.is_filter() && p.name.to_lowercase().contains(&keyword))
        .filter(|p| !p.dropdown_options.is_empty())
}

/// Resolves a dropdown parameter through the active filter selection.
/// `None` whenever the chain does not apply or nothing matches; the caller
/// then falls back to the next value source.
pub fn resolve_filter_value(
    target: &Parameter,
    all: &[Parameter],
    selections: &Overrides,
    config: &EngineConfig,
) -> Option<f64> {
    if target.display_type != DisplayType::Dropdown || target.dropdown_options.is_empty() {
        return None;
    }

    let selector = find_selector(all, config)?;
    let selection = selections.get(&selector.id).filter(|s| !s.is_blank())?.to_string();

    let option = matching_option(&target.dropdown_options, &selection)?;
    option.value.as_ref().and_then(|v| v.as_f64())
}

/// First option whose key matches under any rule. Options without a key
/// never match.
fn matching_option<'a>(options: &'a [DropdownOption], selection: &str) -> Option<&'a DropdownOption> {
    options.iter().find(|o| {
        o.key
            .as_deref()
            .map_or(false, |key| key_matches(key, selection).is_some())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NumberLike;
    use rstest::rstest;

    fn option(key: &str, value: f64) -> DropdownOption {
        DropdownOption { key: Some(key.to_string()), value: Some(NumberLike::Number(value)) }
    }

    fn country(options: &[&str]) -> Parameter {
        let mut p = Parameter::new("country", "Country");
        p.display_type = DisplayType::Filter;
        p.dropdown_options = options.iter().map(|k| option(k, 0.0)).collect();
        p
    }

    fn dropdown(options: Vec<DropdownOption>) -> Parameter {
        let mut p = Parameter::new("grid", "Grid Factor");
        p.display_type = DisplayType::Dropdown;
        p.dropdown_options = options;
        p
    }

    fn select(value: &str) -> Overrides {
        Overrides::from([("country".to_string(), NumberLike::from(value))])
    }

    #[rstest]
    #[case("UK", "uk", Some(KeyMatch::Exact))]
    #[case("UK: 181", "UK", Some(KeyMatch::ColonPrefix))]
    #[case("UK, USA, UAE", "usa", Some(KeyMatch::ListMember))]
    #[case("United Kingdom", "kingdom", Some(KeyMatch::Contains))]
    #[case("FR", "France", Some(KeyMatch::Contains))]
    #[case("DE", "France", None)]
    fn test_key_matches(#[case] key: &str, #[case] selection: &str, #[case] expected: Option<KeyMatch>) {
        assert_eq!(key_matches(key, selection), expected);
    }

    #[test]
    fn test_resolves_through_selector() {
        let target = dropdown(vec![option("USA, CAN", 0.4), option("UK: 181", 0.181)]);
        let all = vec![country(&["UK", "USA"]), target.clone()];
        let config = EngineConfig::default();

        assert_eq!(resolve_filter_value(&target, &all, &select("UK"), &config), Some(0.181));
        assert_eq!(resolve_filter_value(&target, &all, &select("CAN"), &config), Some(0.4));
    }

    #[test]
    fn test_first_matching_option_wins() {
        // "USA" contains "us"; the earlier option wins even though a later one is exact.
        let target = dropdown(vec![option("USA", 1.0), option("US", 2.0)]);
        let all = vec![country(&["US"]), target.clone()];
        let value = resolve_filter_value(&target, &all, &select("US"), &EngineConfig::default());
        assert_eq!(value, Some(1.0));
    }

    #[test]
    fn test_chain_does_not_apply() {
        let config = EngineConfig::default();
        let target = dropdown(vec![option("UK", 1.0)]);

        // No selection
        let all = vec![country(&["UK"]), target.clone()];
        assert_eq!(resolve_filter_value(&target, &all, &Overrides::new(), &config), None);

        // No selector parameter
        assert_eq!(resolve_filter_value(&target, &[target.clone()], &select("UK"), &config), None);

        // Target is not a dropdown
        let mut simple = target.clone();
        simple.display_type = DisplayType::Simple;
        assert_eq!(resolve_filter_value(&simple, &all, &select("UK"), &config), None);

        // Nothing matches
        assert_eq!(resolve_filter_value(&target, &all, &select("FR"), &config), None);
    }

    #[test]
    fn test_first_keyword_filter_is_the_selector() {
        let mut legacy = Parameter::new("c1", "Country (legacy)");
        legacy.display_type = DisplayType::Filter;
        let mut current = country(&["UK"]);
        current.id = "c2".to_string();
        let target = dropdown(vec![option("UK", 0.2)]);
        let all = vec![legacy, current, target.clone()];
        let selections = Overrides::from([("c2".to_string(), NumberLike::from("UK"))]);

        assert!(find_selector(&all, &EngineConfig::default()).is_none());
        assert_eq!(resolve_filter_value(&target, &all, &selections, &EngineConfig::default()), None);
    }

    #[test]
    fn test_non_numeric_option_value() {
        let target = dropdown(vec![DropdownOption {
            key: Some("UK".to_string()),
            value: Some(NumberLike::from("n/a")),
        }]);
        let all = vec![country(&["UK"]), target.clone()];
        assert_eq!(resolve_filter_value(&target, &all, &select("UK"), &EngineConfig::default()), None);
    }

    #[test]
    fn test_selector_keyword_is_configurable() {
        let mut region = country(&["EU"]);
        region.name = "Region".to_string();
        region.id = "country".to_string();
        let target = dropdown(vec![option("EU", 7.0)]);
        let all = vec![region, target.clone()];

        assert_eq!(resolve_filter_value(&target, &all, &select("EU"), &EngineConfig::default()), None);
        let config = EngineConfig { filter_selector_keyword: "region".to_string(), ..Default::default() };
        assert_eq!(resolve_filter_value(&target, &all, &select("EU"), &config), Some(7.0));
    }
}
