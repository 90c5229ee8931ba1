//! Maps a formula token back to the parameter or calculation records it
//! names.
//!
//! Display names are user-authored free text, so the formula text and the
//! authoritative name drift in casing, punctuation and spacing. Matching is
//! tried tier by tier, from strict to loose. Value substitution only trusts
//! the highest non-empty exact tier; the "is this referenced anywhere" check
//! unions every tier, partial containment included, so that a dependency is
//! over-reported rather than silently dropped.

use crate::store::Named;
use lazy_static::lazy_static;
use regex::Regex;
use smallvec::SmallVec;

pub type Matches<'a, T> = SmallVec<[&'a T; 2]>;

/// Matching strategies, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchTier {
    /// Case-insensitive equality.
    Exact,
    /// Equality after dropping everything but ASCII letters, digits, `_` and whitespace.
    Cleaned,
    /// Equality after collapsing whitespace/underscore runs into one `_`.
    Normalized,
    /// Equality after trimming.
    Trimmed,
    /// Containment in either direction at any of the levels above. Never
    /// used for value substitution.
    Partial,
}

impl MatchTier {
    /// Tiers safe for value substitution.
    pub const EXACT_TIERS: [MatchTier; 4] =
        [MatchTier::Exact, MatchTier::Cleaned, MatchTier::Normalized, MatchTier::Trimmed];

    pub const ALL: [MatchTier; 5] = [
        MatchTier::Exact,
        MatchTier::Cleaned,
        MatchTier::Normalized,
        MatchTier::Trimmed,
        MatchTier::Partial,
    ];
}

/// The four comparison forms of a name, all lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NameForms {
    lower: String,
    cleaned: String,
    normalized: String,
    trimmed: String,
}

impl NameForms {
    fn of(name: &str) -> Self {
        let lower = name.to_lowercase();
        let cleaned = UNCLEAN_RE.replace_all(&lower, "").into_owned();
        let normalized = SEPARATOR_RUN_RE.replace_all(&lower, "_").into_owned();
        let trimmed = lower.trim().to_string();
        Self { lower, cleaned, normalized, trimmed }
    }

    fn levels(&self) -> [&str; 4] {
        [&self.lower, &self.cleaned, &self.normalized, &self.trimmed]
    }
}

lazy_static! {
    static ref SEPARATOR_RUN_RE: Regex = Regex::new(r"[\s_]+").unwrap();
    static ref UNCLEAN_RE: Regex = Regex::new(r"[^A-Za-z0-9_\s]").unwrap();
}

fn contains_either(a: &str, b: &str) -> bool {
    // An empty form would contain-match everything.
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Does `name` match `token` at the given tier?
pub fn matches_at(tier: MatchTier, token: &str, name: &str) -> bool {
    let t = NameForms::of(token);
    let n = NameForms::of(name);
    forms_match(tier, &t, &n)
}

fn forms_match(tier: MatchTier, t: &NameForms, n: &NameForms) -> bool {
    match tier {
        MatchTier::Exact => t.lower == n.lower,
        MatchTier::Cleaned => !t.cleaned.is_empty() && t.cleaned == n.cleaned,
        MatchTier::Normalized => t.normalized == n.normalized,
        MatchTier::Trimmed => t.trimmed == n.trimmed,
        MatchTier::Partial => t
            .levels()
            .iter()
            .zip(n.levels().iter())
            .any(|(a, b)| contains_either(a, b)),
    }
}

/// Every candidate matching `token` at exactly `tier`, in array order.
pub fn resolve_tier<'a, T: Named>(token: &str, candidates: &'a [T], tier: MatchTier) -> Matches<'a, T> {
    let t = NameForms::of(token);
    candidates
        .iter()
        .filter(|c| forms_match(tier, &t, &NameForms::of(c.name())))
        .collect()
}

/// The highest exact tier with at least one match, and its matches.
/// Partial containment is never consulted here.
pub fn resolve<'a, T: Named>(token: &str, candidates: &'a [T]) -> Option<(MatchTier, Matches<'a, T>)> {
    MatchTier::EXACT_TIERS.iter().find_map(|&tier| {
        let found = resolve_tier(token, candidates, tier);
        (!found.is_empty()).then_some((tier, found))
    })
}

/// Single-match discipline for substitution: the first candidate (by array
/// order) of the highest matching exact tier.
pub fn resolve_best<'a, T: Named>(token: &str, candidates: &'a [T]) -> Option<&'a T> {
    resolve(token, candidates).and_then(|(_, found)| found.first().copied())
}

/// Union of every tier, partial included, deduplicated by id and kept in
/// array order. Used only to decide whether a record is referenced.
pub fn resolve_all<'a, T: Named>(token: &str, candidates: &'a [T]) -> Matches<'a, T> {
    let t = NameForms::of(token);
    candidates
        .iter()
        .filter(|c| {
            let n = NameForms::of(c.name());
            MatchTier::ALL.iter().any(|&tier| forms_match(tier, &t, &n))
        })
        .fold(Matches::new(), |mut acc, c| {
            if !acc.iter().any(|seen| seen.id() == c.id()) {
                acc.push(c);
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Parameter;
    use rstest::rstest;

    fn params(names: &[&str]) -> Vec<Parameter> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Parameter::new(&format!("p{}", i), n))
            .collect()
    }

    fn ids<T: Named>(found: &[&T]) -> Vec<String> {
        found.iter().map(|p| p.id().to_string()).collect()
    }

    #[rstest]
    #[case(MatchTier::Exact, "energy price", "Energy Price", true)]
    #[case(MatchTier::Exact, "Energy_Price", "Energy Price", false)]
    #[case(MatchTier::Cleaned, "Energy Price", "Energy Price ($)", false)]
    #[case(MatchTier::Cleaned, "Energy Price ", "Energy Price (!)", true)]
    #[case(MatchTier::Cleaned, "CO2 factor", "CO2-factor", false)]
    #[case(MatchTier::Cleaned, "CO2factor", "CO2-factor", true)]
    #[case(MatchTier::Normalized, "Energy_Price", "energy  price", true)]
    #[case(MatchTier::Trimmed, "Rate", " rate ", true)]
    #[case(MatchTier::Partial, "Cost", "Total Cost", true)]
    #[case(MatchTier::Partial, "Total Cost of Ownership", "Cost", true)]
    #[case(MatchTier::Partial, "Hours", "Rate", false)]
    fn test_tiers(#[case] tier: MatchTier, #[case] token: &str, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(matches_at(tier, token, name), expected);
    }

    #[test]
    fn test_resolve_picks_highest_tier() {
        let ps = params(&["Energy_Price", "energy price"]);
        let (tier, found) = resolve("Energy Price", &ps).unwrap();
        assert_eq!(tier, MatchTier::Exact);
        assert_eq!(ids(&found), vec!["p1"]);
    }

    #[test]
    fn test_resolve_returns_every_duplicate() {
        let ps = params(&["Rate", "Hours", "rate"]);
        let (_, found) = resolve("RATE", &ps).unwrap();
        assert_eq!(ids(&found), vec!["p0", "p2"]);
        assert_eq!(resolve_best("RATE", &ps).map(|p| p.id.as_str()), Some("p0"));
    }

    #[test]
    fn test_resolve_never_uses_partial() {
        let ps = params(&["Total Cost"]);
        assert!(resolve("Cost", &ps).is_none());
        assert!(resolve_best("Cost", &ps).is_none());
    }

    #[test]
    fn test_resolve_all_unions_tiers() {
        let ps = params(&["Cost", "Total Cost", "Hours", "cost"]);
        let found = resolve_all("Cost", &ps);
        assert_eq!(ids(&found), vec!["p0", "p1", "p3"]);
    }

    #[test]
    fn test_symbol_only_names_do_not_match_everything() {
        let ps = params(&["%", "Rate"]);
        assert_eq!(ids(&resolve_all("Rate", &ps)), vec!["p1"]);
    }
}
