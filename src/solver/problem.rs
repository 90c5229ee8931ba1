//! Wire types exchanged with the external numeric solver.

use crate::store::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// A value entered by the end user.
    User,
    /// A fixed, company-owned value.
    Company,
    /// A formula the solver evaluates.
    Calculation,
}

/// One entry of the solver's node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl RequestNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            value: None,
            formula: None,
            unit: None,
            description: None,
            output: None,
            level: None,
            category: None,
        }
    }

    pub fn with_value(mut self, value: Option<f64>) -> Self {
        self.value = value;
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }
}

/// Request body for one solver run. `target` order is the order the solver
/// returns results in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub inputs: BTreeMap<String, f64>,
    pub parameters: Vec<RequestNode>,
    pub target: Vec<String>,
}

impl EvaluationRequest {
    pub fn node(&self, name: &str, node_type: NodeType) -> Option<&RequestNode> {
        self.parameters.iter().find(|n| n.name == name && n.node_type == node_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let mut calc = RequestNode::new("Total_Cost", NodeType::Calculation).with_formula("Price * Hours");
        calc.output = Some(true);
        calc.category = Some(Category::Detailed { name: "financial".into(), color: "green".into() });

        let request = EvaluationRequest {
            inputs: BTreeMap::from([("Price".to_string(), 0.2)]),
            parameters: vec![
                RequestNode::new("Price", NodeType::User).with_value(Some(0.2)),
                RequestNode::new("Fee", NodeType::Company),
                calc,
            ],
            target: vec!["Total_Cost".to_string()],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "inputs": {"Price": 0.2},
                "parameters": [
                    {"name": "Price", "type": "USER", "value": 0.2},
                    {"name": "Fee", "type": "COMPANY"},
                    {
                        "name": "Total_Cost",
                        "type": "CALCULATION",
                        "formula": "Price * Hours",
                        "output": true,
                        "category": {"name": "financial", "color": "green"}
                    }
                ],
                "target": ["Total_Cost"]
            })
        );
    }
}
