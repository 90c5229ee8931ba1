//! Solver responses are positional: element `i` is the value of `target[i]`.

use super::problem::EvaluationRequest;
use crate::error::EngineError;
use log::warn;
use serde_json::Value;
use std::collections::BTreeMap;

/// Target name -> value as returned by the solver (numbers, or whatever the
/// solver chose to send for a failed branch).
pub type ResultMap = BTreeMap<String, Value>;

/// Pairs a solver response with the target list it answers.
///
/// Accepts `{"result": [...]}`, a bare array, or a single value (treated as
/// a one-element array). Elements past the end of `target` are dropped;
/// targets without an element are absent from the map.
pub fn zip_results(target: &[String], response: &Value) -> ResultMap {
    let payload = match response.get("result") {
        Some(result) if !result.is_null() => result,
        _ => response,
    };
    let values: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    if values.len() < target.len() {
        warn!(
            "Solver returned {} value(s) for {} target(s); missing: {:?}",
            values.len(),
            target.len(),
            &target[values.len()..]
        );
    }

    target
        .iter()
        .zip(values)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Parses a raw response body.
pub fn parse_response(target: &[String], body: &str) -> Result<ResultMap, EngineError> {
    let response: Value = serde_json::from_str(body)?;
    Ok(zip_results(target, &response))
}

impl EvaluationRequest {
    pub fn zip_response(&self, response: &Value) -> ResultMap { zip_results(&self.target, response) }
}
