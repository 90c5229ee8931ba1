//! Turns a solution plus user overrides into a solver request.
//!
//! Every name leaving this module is normalized, and every formula is
//! rewritten against the full name map (parameters, calculations and every
//! token found in any formula) so the solver only ever sees identifiers.

use super::problem::{EvaluationRequest, NodeType, RequestNode};
use crate::analysis::filter_chain::resolve_filter_value;
use crate::analysis::normalize::normalize;
use crate::analysis::rewrite::Substitution;
use crate::config::{CollisionPolicy, EngineConfig};
use crate::error::EngineError;
use crate::store::{Calculation, Category, NameMap, NumberLike, Overrides, Parameter, Solution};
use log::{debug, info, warn};
use serde::Deserialize;

#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    config: EngineConfig,
}

impl RequestBuilder {
    pub fn new(config: EngineConfig) -> Self { Self { config } }

    /// Builds the request for every calculation flagged for display.
    ///
    /// Missing values never fail the build: the node simply goes out without
    /// a value and the solver reports it. The only error is a name collision
    /// under the `error` collision policy.
    pub fn build(&self, solution: &Solution, overrides: &Overrides) -> Result<EvaluationRequest, EngineError> {
        // 1. Name map + rewriter
        let names = NameMap::for_solution(solution, &self.config.reserved_tokens);
        self.check_collisions(&names)?;
        let rewriter = Substitution::from_name_map(&names);

        let mut request = EvaluationRequest::default();

        // 2. Parameters
        for param in &solution.parameters {
            self.push_parameter(&mut request, param, solution, overrides, &rewriter);
        }

        // 3. Calculations
        for calc in &solution.calculations {
            if let Some(formula) = calc.formula_text() {
                request.parameters.push(calculation_node(calc, rewriter.apply(formula)));
            }
        }

        // 4. Target, in array order
        request.target = solution
            .calculations
            .iter()
            .filter(|c| c.is_displayed())
            .map(|c| normalize(&c.name))
            .collect();

        debug!(
            "Built solver request: {} input(s), {} node(s), target {:?}",
            request.inputs.len(),
            request.parameters.len(),
            request.target
        );
        Ok(request)
    }

    /// Request for checking a single calculation: the candidate is added to
    /// the solution unless a calculation with its id already exists, and it
    /// is the only target.
    pub fn build_for_target(
        &self,
        solution: &Solution,
        overrides: &Overrides,
        candidate: &Calculation,
    ) -> Result<EvaluationRequest, EngineError> {
        let mut scoped = solution.clone();
        if !scoped.calculations.iter().any(|c| c.id == candidate.id) {
            scoped.calculations.push(candidate.clone());
        }
        let mut request = self.build(&scoped, overrides)?;
        request.target = vec![normalize(&candidate.name)];
        Ok(request)
    }

    /// Builds from raw JSON. A payload that is not a solution (for example
    /// one without a `parameters` array) yields `None`, as does any build
    /// error; both are logged.
    pub fn build_json(&self, payload: &serde_json::Value, overrides: &Overrides) -> Option<EvaluationRequest> {
        let built = parse_solution(payload).and_then(|solution| self.build(&solution, overrides));
        match built {
            Ok(request) => Some(request),
            Err(e) => {
                warn!("Solver request not built: {}", e);
                None
            }
        }
    }

    /// Value sent for a parameter: filter chain, then the user's override,
    /// then the value stored on the parameter.
    pub fn resolve_value(&self, param: &Parameter, all: &[Parameter], overrides: &Overrides) -> Option<f64> {
        resolve_filter_value(param, all, overrides, &self.config)
            .or_else(|| overrides.get(&param.id).and_then(NumberLike::as_f64))
            .or_else(|| param.stored_value())
    }

    fn push_parameter(
        &self,
        request: &mut EvaluationRequest,
        param: &Parameter,
        solution: &Solution,
        overrides: &Overrides,
        rewriter: &Substitution,
    ) {
        let name = normalize(&param.name);
        let company = param.ui_kind().is_company();
        let value = self.resolve_value(param, &solution.parameters, overrides);

        match value {
            // First parameter wins when two share a normalized name.
            Some(v) => {
                request.inputs.entry(name.clone()).or_insert(v);
            }
            None if company => warn!("Company parameter '{}' has no valid value", param.name),
            None => {}
        }

        if param.is_filter() {
            info!(
                "Filter parameter '{}' excluded from the node list; it stays available to formulas",
                param.name
            );
            return;
        }

        let node_type = if company { NodeType::Company } else { NodeType::User };
        request.parameters.push(RequestNode::new(name.clone(), node_type).with_value(value));

        if let Some(formula) = param.formula_text() {
            request
                .parameters
                .push(RequestNode::new(name, NodeType::Calculation).with_formula(rewriter.apply(formula)));
        }
    }

    fn check_collisions(&self, names: &NameMap) -> Result<(), EngineError> {
        let collisions = names.collisions();
        match self.config.collision_policy {
            CollisionPolicy::Ignore => Ok(()),
            CollisionPolicy::Warn => {
                for c in &collisions {
                    warn!("Names {:?} all normalize to '{}'; keeping '{}'", c.names, c.normalized, c.names[0]);
                }
                Ok(())
            }
            CollisionPolicy::Error => match collisions.into_iter().next() {
                Some(c) => Err(EngineError::NameCollision { normalized: c.normalized, names: c.names }),
                None => Ok(()),
            },
        }
    }
}

/// Solver node for a calculation. Optional attributes are only sent when
/// they carry something: non-empty text, `output == true`, a non-zero level.
fn calculation_node(calc: &Calculation, formula: String) -> RequestNode {
    let mut node = RequestNode::new(normalize(&calc.name), NodeType::Calculation).with_formula(formula);
    node.unit = calc.units.clone().filter(|u| !u.is_empty());
    node.description = calc.description.clone().filter(|d| !d.is_empty());
    node.output = calc.output.filter(|&o| o);
    node.level = calc.level.as_ref().and_then(NumberLike::as_f64).filter(|&l| l != 0.0);
    node.category = calc
        .category
        .clone()
        .filter(|c| !matches!(c, Category::Named(n) if n.is_empty()));
    node
}

/// Reads a solution out of arbitrary JSON.
pub fn parse_solution(payload: &serde_json::Value) -> Result<Solution, EngineError> {
    if !payload.get("parameters").map_or(false, |p| p.is_array()) {
        return Err(EngineError::MalformedSolution("missing 'parameters' array".to_string()));
    }
    Ok(Solution::deserialize(payload)?)
}

/// [`RequestBuilder::build`] with the default configuration.
pub fn build_request(solution: &Solution, overrides: &Overrides) -> Result<EvaluationRequest, EngineError> {
    RequestBuilder::default().build(solution, overrides)
}
