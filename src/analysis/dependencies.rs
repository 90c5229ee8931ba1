//! Which parameters are consumed by the solution.
//!
//! The answer is a superset by construction: every resolver tier, partial
//! containment included, counts as a reference. A parameter outside the set
//! is one the authoring UI can safely flag as unused.

use super::resolver::resolve_all;
use super::tokenizer::extract_candidate_names;
use crate::store::{Calculation, DisplayType, Parameter};
use std::collections::BTreeSet;

/// Ids of every parameter referenced by some calculation, used by a
/// conditional parameter, or conditional itself. Empty when there are no
/// calculations.
pub fn compute_used_parameter_ids(parameters: &[Parameter], calculations: &[Calculation]) -> BTreeSet<String> {
    let mut used = BTreeSet::new();
    if calculations.is_empty() {
        return used;
    }

    // 1. Textual references from calculation formulas
    for calc in calculations {
        for token in extract_candidate_names(&calc.formula) {
            used.extend(resolve_all(&token, parameters).iter().map(|p| p.id.clone()));
        }
    }

    // 2. Filters feeding a conditional parameter's rules
    let conditionals: Vec<&Parameter> = parameters
        .iter()
        .filter(|p| p.display_type == DisplayType::Conditional)
        .collect();

    for filter in parameters.iter().filter(|p| p.is_filter()) {
        if conditionals.iter().any(|c| feeds_conditional(filter, c)) {
            used.insert(filter.id.clone());
        }
    }

    // 3. Conditionals are structural
    used.extend(conditionals.iter().map(|c| c.id.clone()));
    used
}

/// Does any of the conditional's rules name one of the filter's options?
fn feeds_conditional(filter: &Parameter, conditional: &Parameter) -> bool {
    let identities: Vec<String> = filter.dropdown_options.iter().filter_map(|o| o.identity()).collect();

    conditional.conditional_rules.iter().any(|rule| {
        let rule_value = rule.value.as_ref().map(|v| v.to_string());
        identities
            .iter()
            .any(|id| rule.condition == *id || rule_value.as_deref() == Some(id.as_str()))
    })
}

/// Parameters outside the used set, in array order.
pub fn unused_parameter_ids(parameters: &[Parameter], calculations: &[Calculation]) -> Vec<String> {
    let used = compute_used_parameter_ids(parameters, calculations);
    parameters
        .iter()
        .filter(|p| !used.contains(&p.id))
        .map(|p| p.id.clone())
        .collect()
}
