//! Authoring rules for calculation formulas.

use crate::analysis::resolver::resolve;
use crate::analysis::rewrite::Substitution;
use crate::analysis::tokenizer::{contains_whole_word, extract_candidate_names_with};
use crate::analysis::topology::calculation_order;
use crate::compute::expr;
use crate::store::{Calculation, Parameter};
use crate::validation::error::{ValidationError, ValidationErrorType};

/// Formulas must parse once display names are rewritten to identifiers.
pub(crate) fn validate_syntax(calc: &Calculation, rewriter: &Substitution) -> Option<ValidationError> {
    let Some(formula) = calc.formula_text() else {
        return Some(ValidationError::new(&calc.id, ValidationErrorType::InvalidFormula, "Formula is empty."));
    };
    expr::parse(&rewriter.apply(formula)).err().map(|e| {
        ValidationError::new(&calc.id, ValidationErrorType::InvalidFormula, format!("Invalid formula: {}", e))
    })
}

/// Every candidate name must resolve to a parameter or a calculation.
pub(crate) fn validate_references(
    calc: &Calculation,
    parameters: &[Parameter],
    calculations: &[Calculation],
    reserved: &[String],
) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = Vec::new();
    for token in extract_candidate_names_with(&calc.formula, reserved) {
        let known = resolve(&token, parameters).is_some() || resolve(&token, calculations).is_some();
        let reported = errors.iter().any(|e| e.message.contains(&format!("'{}'", token)));
        if !known && !reported {
            errors.push(ValidationError::new(
                &calc.id,
                ValidationErrorType::UnresolvedReference,
                format!("'{}' does not match any parameter or calculation.", token),
            ));
        }
    }
    errors
}

/// `self`/`this`, a calculation naming itself, and reference loops.
pub(crate) fn validate_cycles(parameters: &[Parameter], calculations: &[Calculation]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for calc in calculations {
        if contains_whole_word(&calc.formula, "self") || contains_whole_word(&calc.formula, "this") {
            errors.push(ValidationError::new(
                &calc.id,
                ValidationErrorType::SelfReference,
                "Formula cannot reference itself (self/this).",
            ));
        }
    }

    for cycle in calculation_order(parameters, calculations).cycles {
        if let [only] = cycle.as_slice() {
            let calc = &calculations[*only];
            errors.push(ValidationError::new(
                &calc.id,
                ValidationErrorType::SelfReference,
                format!("'{}' references itself.", calc.name),
            ));
            continue;
        }
        let names: Vec<&str> = cycle.iter().map(|&i| calculations[i].name.as_str()).collect();
        for &i in &cycle {
            errors.push(ValidationError::new(
                &calculations[i].id,
                ValidationErrorType::CircularReference,
                format!("Circular reference between {}.", names.join(", ")),
            ));
        }
    }
    errors
}
