use super::types::Solution;
use crate::analysis::normalize::normalize;
use crate::analysis::tokenizer::extract_candidate_names_with;
use std::collections::HashMap;

/// Two or more distinct declared names that normalize to one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub normalized: String,
    pub names: Vec<String>,
}

/// Original name -> normalized name, in registration order.
///
/// Declared names (parameters, calculations) are tracked per normalized form
/// so that collisions can be reported; names discovered by scanning formula
/// text are mapped but never counted as colliding.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,

    // Distinct declared originals per normalized name, first-seen order.
    declared: Vec<(String, Vec<String>)>,
    declared_index: HashMap<String, usize>,
}

impl NameMap {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Builds the full map for a solution: parameter names, calculation
    /// names, then every candidate token found in parameter and calculation
    /// formulas.
    pub fn for_solution(solution: &Solution, extra_reserved: &[String]) -> Self {
        let mut map = Self::new();

        // 1. Declared names
        for p in &solution.parameters {
            map.insert_declared(&p.name);
        }
        for c in &solution.calculations {
            map.insert_declared(&c.name);
        }

        // 2. Names only known from formula text
        let formulas = solution
            .parameters
            .iter()
            .filter_map(|p| p.formula_text())
            .chain(solution.calculations.iter().filter_map(|c| c.formula_text()));
        for formula in formulas {
            for token in extract_candidate_names_with(formula, extra_reserved) {
                map.insert_discovered(&token);
            }
        }
        map
    }

    /// Registers a parameter or calculation name.
    pub fn insert_declared(&mut self, name: &str) {
        if !self.insert(name) {
            return;
        }
        let normalized = normalize(name);
        match self.declared_index.get(&normalized) {
            Some(&i) => {
                let names = &mut self.declared[i].1;
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            None => {
                self.declared_index.insert(normalized.clone(), self.declared.len());
                self.declared.push((normalized, vec![name.to_string()]));
            }
        }
    }

    /// Registers a token discovered in formula text.
    pub fn insert_discovered(&mut self, token: &str) {
        self.insert(token);
    }

    /// Returns false for names that cannot be mapped (blank, or nothing left
    /// after normalization).
    fn insert(&mut self, name: &str) -> bool {
        let normalized = normalize(name);
        if name.trim().is_empty() || normalized.is_empty() {
            return false;
        }
        if !self.index.contains_key(name) {
            self.index.insert(name.to_string(), self.entries.len());
            self.entries.push((name.to_string(), normalized));
        }
        true
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.index.get(original).map(|&i| self.entries[i].1.as_str())
    }

    /// `(original, normalized)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(o, n)| (o.as_str(), n.as_str()))
    }

    /// Declared names sharing a normalized form, in first-seen order.
    pub fn collisions(&self) -> Vec<NameCollision> {
        self.declared
            .iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(normalized, names)| NameCollision { normalized: normalized.clone(), names: names.clone() })
            .collect()
    }
}
