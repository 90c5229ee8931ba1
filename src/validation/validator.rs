//! The central validator that orchestrates the execution of all validation rules.
use super::error::ValidationError;
use super::rules::{formula, parameters};
use crate::analysis::rewrite::Substitution;
use crate::config::EngineConfig;
use crate::store::{NameMap, Parameter, Solution};

/// Authoring-time checks over a whole solution.
///
/// Like a linter, it runs every rule and collects everything it finds
/// instead of stopping at the first problem.
pub struct Validator<'a> {
    solution: &'a Solution,
    config: &'a EngineConfig,
}

impl<'a> Validator<'a> {
    pub fn new(solution: &'a Solution, config: &'a EngineConfig) -> Self {
        Self { solution, config }
    }

    /// # Returns
    /// - `Ok(())` if no validation errors are found.
    /// - `Err(Vec<ValidationError>)` with every error, parameters first.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let params = &self.solution.parameters;
        let calcs = &self.solution.calculations;

        // 1. Parameters, each checked against the ones before it
        for (i, param) in params.iter().enumerate() {
            errors.extend(check_parameter(param, &params[..i]));
        }

        // 2. Formulas
        let names = NameMap::for_solution(self.solution, &self.config.reserved_tokens);
        let rewriter = Substitution::from_name_map(&names);
        for calc in calcs {
            match formula::validate_syntax(calc, &rewriter) {
                Some(err) => errors.push(err),
                None => errors.extend(formula::validate_references(calc, params, calcs, &self.config.reserved_tokens)),
            }
        }

        // 3. Reference structure
        errors.extend(formula::validate_cycles(params, calcs));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_parameter(candidate: &Parameter, existing: &[Parameter]) -> Vec<ValidationError> {
    [
        parameters::validate_required(candidate),
        parameters::validate_unique_name(candidate, existing),
        parameters::validate_static_value(candidate),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Checks a parameter about to be added to (or edited in) `existing`.
pub fn validate_parameter(candidate: &Parameter, existing: &[Parameter]) -> Result<(), Vec<ValidationError>> {
    let errors = check_parameter(candidate, existing);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Calculation, DisplayType, UiType, UserInterface};
    use crate::validation::error::ValidationErrorType;

    fn param(id: &str, name: &str) -> Parameter {
        let mut p = Parameter::new(id, name);
        p.unit = Some("EUR".to_string());
        p
    }

    #[test]
    fn test_valid_solution() {
        let solution = Solution::new(
            vec![param("p1", "Energy Price"), param("p2", "Hours")],
            vec![
                Calculation::new("c1", "Annual Cost", "Energy Price * Hours"),
                Calculation::new("c2", "Monthly Cost", "Annual_Cost / 12"),
            ],
        );
        assert_eq!(Validator::new(&solution, &EngineConfig::default()).validate(), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut fee = param("p3", "Fee");
        fee.user_interface = UserInterface::Kind(UiType::Static);
        fee.display_type = DisplayType::Simple;

        let solution = Solution::new(
            vec![param("p1", "Rate"), param("p2", "rate"), fee],
            vec![
                Calculation::new("c1", "Total", "Rate * Missing"),
                Calculation::new("c2", "Broken", "Rate *"),
                Calculation::new("c3", "Again", "Again + 1"),
            ],
        );
        let errors = Validator::new(&solution, &EngineConfig::default()).validate().unwrap_err();
        let kinds: Vec<(&str, ValidationErrorType)> =
            errors.iter().map(|e| (e.subject.as_str(), e.error_type)).collect();

        assert_eq!(
            kinds,
            vec![
                ("p2", ValidationErrorType::DuplicateName),
                ("p3", ValidationErrorType::MissingValue),
                ("c1", ValidationErrorType::UnresolvedReference),
                ("c2", ValidationErrorType::InvalidFormula),
                ("c3", ValidationErrorType::SelfReference),
            ]
        );
    }

    #[test]
    fn test_validate_parameter() {
        let existing = vec![param("p1", "Rate")];
        assert!(validate_parameter(&param("p2", "Hours"), &existing).is_ok());

        let errors = validate_parameter(&Parameter::new("p2", "RATE"), &existing).unwrap_err();
        let kinds: Vec<ValidationErrorType> = errors.iter().map(|e| e.error_type).collect();
        assert_eq!(kinds, vec![ValidationErrorType::MissingField, ValidationErrorType::DuplicateName]);
        assert_eq!(errors[0].to_string(), "Name and unit are required fields.");
    }

    #[test]
    fn test_reserved_tokens_from_config() {
        let solution = Solution::new(vec![param("p1", "Rate")], vec![Calculation::new("c1", "Out", "Rate * k")]);
        assert!(Validator::new(&solution, &EngineConfig::default()).validate().is_err());

        let config = EngineConfig { reserved_tokens: vec!["k".to_string()], ..Default::default() };
        // Reserved tokens are not treated as references
        assert_eq!(Validator::new(&solution, &config).validate(), Ok(()));
    }
}
