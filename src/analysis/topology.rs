use super::normalize::{normalize, underscore_alias};
use super::tokenizer::contains_whole_word;
use crate::error::EngineError;
use crate::store::{Calculation, Parameter};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashSet};

/// Evaluation order over a solution's calculations, as indices into the
/// calculation slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationOrder {
    /// Acyclic calculations, every dependency before its consumer.
    pub order: Vec<usize>,
    /// Strongly connected groups of size > 1, plus self-referencing calculations.
    pub cycles: Vec<Vec<usize>>,
}

impl CalculationOrder {
    pub fn cyclic(&self) -> BTreeSet<usize> {
        self.cycles.iter().flatten().copied().collect()
    }

    pub fn is_acyclic(&self) -> bool { self.cycles.is_empty() }
}

/// Builds the calculation dependency graph and orders it.
///
/// Calculation `i` depends on `j` when `j`'s name, or one of its aliases,
/// occurs as a whole word in `i`'s formula. Aliases that a parameter also
/// answers to bind to the parameter and create no edge.
pub fn calculation_order(parameters: &[Parameter], calculations: &[Calculation]) -> CalculationOrder {
    let shadowed: HashSet<String> = parameters
        .iter()
        .flat_map(|p| [p.name.clone(), normalize(&p.name)])
        .collect();

    // Edges point consumer -> dependency, so Tarjan's post-order emits
    // dependencies first.
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(calculations.len(), 0);
    let nodes: Vec<NodeIndex> = (0..calculations.len()).map(|i| graph.add_node(i)).collect();
    let mut self_referencing = BTreeSet::new();

    for (i, consumer) in calculations.iter().enumerate() {
        let formula = consumer.formula.as_str();
        for (j, dependency) in calculations.iter().enumerate() {
            if references(formula, &dependency.name, &shadowed) {
                if i == j {
                    self_referencing.insert(i);
                } else {
                    graph.update_edge(nodes[i], nodes[j], ());
                }
            }
        }
    }

    let mut result = CalculationOrder::default();
    for scc in tarjan_scc(&graph) {
        let mut members: Vec<usize> = scc.iter().map(|&n| graph[n]).collect();
        members.sort_unstable();
        if members.len() > 1 || self_referencing.contains(&members[0]) {
            result.cycles.push(members);
        } else {
            result.order.push(members[0]);
        }
    }
    result.cycles.sort();
    result
}

fn references(formula: &str, name: &str, shadowed: &HashSet<String>) -> bool {
    if name.trim().is_empty() {
        return false;
    }
    let mut aliases = vec![name.to_string(), normalize(name), underscore_alias(name)];
    aliases.dedup();
    aliases
        .iter()
        .filter(|alias| !alias.is_empty() && !shadowed.contains(alias.as_str()))
        .any(|alias| contains_whole_word(formula, alias))
}

/// Strict ordering: fails on the first cycle found.
pub fn sort(parameters: &[Parameter], calculations: &[Calculation]) -> Result<Vec<usize>, EngineError> {
    let order = calculation_order(parameters, calculations);
    match order.cycles.first() {
        None => Ok(order.order),
        Some(cycle) => Err(EngineError::CycleDetected {
            names: cycle.iter().map(|&i| calculations[i].name.clone()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn calc(id: &str, name: &str, formula: &str) -> Calculation {
        Calculation::new(id, name, formula)
    }

    fn position(order: &[usize], idx: usize) -> usize {
        order.iter().position(|&i| i == idx).unwrap()
    }

    #[test]
    fn test_dependencies_come_first() {
        let calcs = vec![
            calc("c0", "Net Savings", "Gross Savings - Cost"),
            calc("c1", "Gross Savings", "Rate * 12"),
            calc("c2", "Payback", "Cost / Net_Savings"),
        ];
        let order = calculation_order(&[Parameter::new("p", "Cost")], &calcs);

        assert!(order.is_acyclic());
        assert_eq!(order.order.len(), 3);
        assert!(position(&order.order, 1) < position(&order.order, 0));
        assert!(position(&order.order, 0) < position(&order.order, 2));
    }

    #[test]
    fn test_cycles_and_self_references() {
        let calcs = vec![
            calc("c0", "A", "B + 1"),
            calc("c1", "B", "A * 2"),
            calc("c2", "Loop", "Loop + 1"),
            calc("c3", "Free", "3"),
        ];
        let order = calculation_order(&[], &calcs);

        assert_eq!(order.order, vec![3]);
        assert_eq!(order.cyclic(), BTreeSet::from([0, 1, 2]));
        assert!(matches!(sort(&[], &calcs), Err(EngineError::CycleDetected { .. })));
    }

    #[test]
    fn test_parameter_names_shadow_calculations() {
        // "Rate" binds to the parameter, so this is not a self-reference.
        let calcs = vec![calc("c0", "Rate", "Rate * 2")];
        let order = calculation_order(&[Parameter::new("p", "Rate")], &calcs);
        assert!(order.is_acyclic());
        assert_eq!(sort(&[Parameter::new("p", "Rate")], &calcs).unwrap(), vec![0]);
    }

    #[test]
    fn test_partial_words_are_not_references() {
        let calcs = vec![calc("c0", "Cost", "Costs * 2"), calc("c1", "Costs", "4")];
        let order = calculation_order(&[], &calcs);
        assert!(order.is_acyclic());
        assert!(position(&order.order, 1) < position(&order.order, 0));
    }
}
