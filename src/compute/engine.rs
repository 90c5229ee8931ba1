use super::expr;
use super::ledger::{ComputationError, Ledger};
use crate::analysis::rewrite::Substitution;
use crate::analysis::tokenizer::contains_whole_word;
use crate::analysis::topology::calculation_order;
use crate::config::EngineConfig;
use crate::store::{Calculation, CalculationStatus, EvalOutcome, Overrides, Parameter};
use log::debug;
use serde::{Deserialize, Serialize};

/// Outcome of checking a formula in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaValidation {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormulaValidation {
    pub fn valid() -> Self { Self { is_valid: true, error: None } }
    pub fn invalid(error: impl ToString) -> Self { Self { is_valid: false, error: Some(error.to_string()) } }
}

/// Local formula evaluator. Stateless apart from its configuration, so a
/// single instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self { Self { config } }

    pub fn config(&self) -> &EngineConfig { &self.config }

    /// Evaluates `formula` against a prepared value context.
    ///
    /// 1. Refuse `self` / `this`.
    /// 2. Substitute every known name, longest first, with its value.
    /// 3. Parse and evaluate what is left.
    /// 4. Accept finite results only, rounded to the configured precision.
    pub fn try_evaluate(&self, formula: &str, ledger: &Ledger) -> Result<f64, ComputationError> {
        if contains_whole_word(formula, "self") || contains_whole_word(formula, "this") {
            return Err(ComputationError::SelfReference);
        }

        let substituted = substitute_values(formula, ledger);
        let tree = expr::parse(&substituted)?;
        let value = tree.eval(&|name: &str| ledger.get(name))?;

        if !value.is_finite() {
            return Err(ComputationError::NonFinite);
        }
        Ok(round_to(value, self.config.result_decimals))
    }

    pub fn evaluate(&self, formula: &str, parameters: &[Parameter], calculations: &[Calculation]) -> EvalOutcome {
        self.evaluate_with(formula, parameters, calculations, &Overrides::new())
    }

    /// Like [`Engine::evaluate`], with user overrides applied to parameters.
    pub fn evaluate_with(
        &self,
        formula: &str,
        parameters: &[Parameter],
        calculations: &[Calculation],
        overrides: &Overrides,
    ) -> EvalOutcome {
        let ledger = Ledger::from_solution(parameters, calculations, overrides);
        match self.try_evaluate(formula, &ledger) {
            Ok(v) => EvalOutcome::Value(v),
            Err(e) => {
                debug!("Formula '{}' did not evaluate: {}", formula, e);
                EvalOutcome::Error
            }
        }
    }

    pub fn validate(&self, formula: &str, parameters: &[Parameter], calculations: &[Calculation]) -> FormulaValidation {
        if formula.trim().is_empty() {
            return FormulaValidation::invalid("Formula is empty");
        }
        let ledger = Ledger::from_solution(parameters, calculations, &Overrides::new());
        match self.try_evaluate(formula, &ledger) {
            Ok(_) => FormulaValidation::valid(),
            Err(ComputationError::SelfReference) => {
                FormulaValidation::invalid("Formula cannot reference itself (self/this)")
            }
            Err(e) => FormulaValidation::invalid(format!("Invalid formula: {}", e)),
        }
    }

    /// Re-evaluates every calculation against the current parameter values.
    ///
    /// Calculations run in dependency order, each seeing the fresh results of
    /// the ones it references. Members of a reference cycle, a calculation
    /// naming itself included, are marked as errors without being evaluated.
    /// The output keeps the input order.
    pub fn recalculate(
        &self,
        parameters: &[Parameter],
        calculations: &[Calculation],
        overrides: &Overrides,
    ) -> Vec<Calculation> {
        let order = calculation_order(parameters, calculations);
        let mut ledger = Ledger::from_solution(parameters, &[], overrides);
        let mut outcomes = vec![EvalOutcome::Error; calculations.len()];

        for &i in &order.order {
            let calc = &calculations[i];
            match self.try_evaluate(&calc.formula, &ledger) {
                Ok(v) => {
                    ledger.insert_calculation(&calc.name, v);
                    outcomes[i] = EvalOutcome::Value(v);
                }
                Err(e) => debug!("Calculation '{}' failed: {}", calc.name, e),
            }
        }
        if !order.is_acyclic() {
            debug!("{} calculation(s) are part of a reference cycle", order.cyclic().len());
        }

        calculations
            .iter()
            .zip(outcomes)
            .map(|(calc, outcome)| Calculation {
                status: Some(if outcome.is_error() { CalculationStatus::Error } else { CalculationStatus::Valid }),
                result: Some(outcome),
                ..calc.clone()
            })
            .collect()
    }
}

/// Replaces every context key in `formula` with its value as a literal.
/// Negative values are parenthesised so `x^2` stays `(-3)^2`.
fn substitute_values(formula: &str, ledger: &Ledger) -> String {
    let literals = ledger.entries_longest_first().into_iter().map(|(name, value)| {
        let literal = if value < 0.0 { format!("({})", value) } else { format!("{}", value) };
        (name, literal)
    });
    Substitution::new(literals).apply(formula)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Very large values overflow the scaled form; keep them as they are.
    if rounded.is_finite() { rounded } else { value }
}

// --- Default-config entry points ---

pub fn evaluate(formula: &str, parameters: &[Parameter], calculations: &[Calculation]) -> EvalOutcome {
    Engine::default().evaluate(formula, parameters, calculations)
}

pub fn validate(formula: &str, parameters: &[Parameter], calculations: &[Calculation]) -> FormulaValidation {
    Engine::default().validate(formula, parameters, calculations)
}

pub fn recalculate(parameters: &[Parameter], calculations: &[Calculation], overrides: &Overrides) -> Vec<Calculation> {
    Engine::default().recalculate(parameters, calculations, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NumberLike;
    use rstest::rstest;

    fn param(id: &str, name: &str, value: f64) -> Parameter {
        let mut p = Parameter::new(id, name);
        p.test_value = Some(NumberLike::Number(value));
        p
    }

    fn sample() -> Vec<Parameter> {
        vec![
            param("a", "A", 2.0),
            param("b", "B", 3.0),
            param("energy-price", "Energy Price", 0.25),
            param("hours", "Hours Per Year", 8760.0),
            param("loss", "Loss", -4.0),
        ]
    }

    #[rstest]
    #[case("A + B", EvalOutcome::Value(5.0))]
    #[case("A / 3", EvalOutcome::Value(0.67))]
    #[case("Energy Price * Hours Per Year", EvalOutcome::Value(2190.0))]
    #[case("Energy_Price * 4", EvalOutcome::Value(1.0))]
    #[case("energy_price * 8", EvalOutcome::Value(2.0))]
    #[case("Loss ^ 2", EvalOutcome::Value(16.0))]
    #[case("A / 0", EvalOutcome::Error)]
    #[case("0 / 0", EvalOutcome::Error)]
    #[case("Unknown + 1", EvalOutcome::Error)]
    #[case("A +", EvalOutcome::Error)]
    #[case("self + 1", EvalOutcome::Error)]
    fn test_evaluate(#[case] formula: &str, #[case] expected: EvalOutcome) {
        assert_eq!(evaluate(formula, &sample(), &[]), expected);
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate("A * B", &sample(), &[]), FormulaValidation::valid());

        let own = validate("this * 2", &sample(), &[]);
        assert!(!own.is_valid);
        assert!(own.error.unwrap().contains("itself"));

        assert!(!validate("A / 0", &sample(), &[]).is_valid);
        assert!(!validate("   ", &sample(), &[]).is_valid);
    }

    #[test]
    fn test_deeply_nested_formula_is_an_error() {
        let nested = format!("{}A{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(evaluate(&nested, &sample(), &[]), EvalOutcome::Error);
        assert!(!validate(&nested, &sample(), &[]).is_valid);
        assert_eq!(evaluate(&format!("{}1", "-".repeat(100_000)), &[], &[]), EvalOutcome::Error);
    }

    #[test]
    fn test_prior_results_are_in_context() {
        let mut net = Calculation::new("c1", "Net Savings", "A * B");
        net.result = Some(EvalOutcome::Value(6.0));
        assert_eq!(evaluate("Net_Savings + 1", &sample(), &[net.clone()]), EvalOutcome::Value(7.0));
        assert_eq!(evaluate("Net Savings + 1", &sample(), &[net]), EvalOutcome::Value(7.0));
    }

    #[test]
    fn test_overrides() {
        let overrides = Overrides::from([("a".to_string(), NumberLike::from("10"))]);
        let outcome = Engine::default().evaluate_with("A + B", &sample(), &[], &overrides);
        assert_eq!(outcome, EvalOutcome::Value(13.0));
    }

    #[test]
    fn test_configured_precision() {
        let engine = Engine::new(EngineConfig { result_decimals: 4, ..Default::default() });
        assert_eq!(engine.evaluate("A / 3", &sample(), &[]), EvalOutcome::Value(0.6667));
    }

    #[test]
    fn test_recalculate_in_dependency_order() {
        let calcs = vec![
            Calculation::new("c1", "Payback", "Cost / Savings"),
            Calculation::new("c2", "Savings", "A * B"),
            Calculation::new("c3", "Cost", "Savings * 4"),
            Calculation::new("c4", "Loop", "Loop + 1"),
            Calculation::new("c5", "Broken", "A / 0"),
        ];
        let out = recalculate(&sample(), &calcs, &Overrides::new());

        let results: Vec<EvalOutcome> = out.iter().filter_map(|c| c.result).collect();
        assert_eq!(
            results,
            vec![
                EvalOutcome::Value(4.0),
                EvalOutcome::Value(6.0),
                EvalOutcome::Value(24.0),
                EvalOutcome::Error,
                EvalOutcome::Error,
            ]
        );
        assert_eq!(out[0].status, Some(CalculationStatus::Valid));
        assert_eq!(out[3].status, Some(CalculationStatus::Error));
        assert_eq!(out.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["c1", "c2", "c3", "c4", "c5"]);
    }

    #[test]
    fn test_recalculate_ignores_stale_results() {
        let mut savings = Calculation::new("c1", "Savings", "A * B");
        savings.result = Some(EvalOutcome::Value(100.0));
        let calcs = vec![Calculation::new("c2", "Double", "Savings * 2"), savings];

        let out = recalculate(&sample(), &calcs, &Overrides::new());
        assert_eq!(out[0].result, Some(EvalOutcome::Value(12.0)));
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = Engine::default();
        let params = sample();
        let values: Vec<EvalOutcome> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let (engine, params) = (&engine, &params);
                    s.spawn(move || engine.evaluate(&format!("A * {}", i), params, &[]))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(values[3], EvalOutcome::Value(6.0));
    }
}
