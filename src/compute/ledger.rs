use crate::analysis::normalize::{normalize, underscore_alias};
use crate::store::{Calculation, Overrides, Parameter};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputationError {
    #[error("Formula references itself")]
    SelfReference,
    #[error("Syntax error at {position}: {message}")]
    Parse { position: usize, message: String },
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),
    #[error("Result is not a finite number")]
    NonFinite,
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("{function}() takes {expected} argument(s), got {found}")]
    Arity { function: String, expected: usize, found: usize },
}

/// Name -> value context for local evaluation. Only finite values are kept.
/// Parameter keys are fixed once registered (first wins) and shadow any
/// calculation answering to the same key.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    values: HashMap<String, f64>,
    parameter_keys: HashSet<String>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Context for evaluating formulas over a solution: parameters first,
    /// then calculations with a finite prior result.
    pub fn from_solution(parameters: &[Parameter], calculations: &[Calculation], overrides: &Overrides) -> Self {
        let mut ledger = Self::new();
        for p in parameters {
            ledger.insert_parameter(p, overrides);
        }
        for c in calculations {
            if let Some(v) = c.prior_result() {
                ledger.insert_calculation(&c.name, v);
            }
        }
        ledger
    }

    pub fn get(&self, key: &str) -> Option<f64> { self.values.get(key).copied() }

    pub fn insert(&mut self, key: &str, value: f64) {
        if key.is_empty() || !value.is_finite() {
            return;
        }
        self.values.entry(key.to_string()).or_insert(value);
        self.parameter_keys.insert(key.to_string());
    }

    /// Registers the parameter's value (override first, then its stored
    /// value) under its name, normalized name and, when the id can be
    /// written as an identifier, its id with `-` turned into `_`.
    pub fn insert_parameter(&mut self, p: &Parameter, overrides: &Overrides) {
        let value = overrides
            .get(&p.id)
            .and_then(|v| v.as_f64())
            .or_else(|| p.stored_value());
        let Some(value) = value else { return };

        self.insert(&p.name, value);
        self.insert(&normalize(&p.name), value);
        if p.id.starts_with(|c: char| c.is_alphabetic() || c == '_') {
            self.insert(&p.id, value);
            self.insert(&p.id.replace('-', "_"), value);
        }
    }

    /// Registers a calculation result under its name, normalized name and
    /// whitespace-to-underscore alias. Newer results replace older ones.
    pub fn insert_calculation(&mut self, name: &str, value: f64) {
        if !value.is_finite() {
            return;
        }
        for key in [name.to_string(), normalize(name), underscore_alias(name)] {
            if !key.is_empty() && !self.parameter_keys.contains(&key) {
                self.values.insert(key, value);
            }
        }
    }

    /// Drops a calculation's keys, e.g. after its result turned into an error.
    pub fn remove_calculation(&mut self, name: &str) {
        for key in [name.to_string(), normalize(name), underscore_alias(name)] {
            if !self.parameter_keys.contains(&key) {
                self.values.remove(&key);
            }
        }
    }

    /// Keys and values, longest key first.
    pub fn entries_longest_first(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self.values.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        entries
    }
}
