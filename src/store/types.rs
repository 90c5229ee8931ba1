//! The solution model: parameters, calculations and the loose value shapes
//! they arrive in from the authoring side.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// User-entered values keyed by parameter id. Filter selections ("UK") and
/// numeric overrides share the same map.
pub type Overrides = HashMap<String, NumberLike>;

/// Anything that can be looked up by name and identified by id.
pub trait Named {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

// --- Values ---

/// A value stored either as a JSON number or as numeric text ("12.5").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(f64),
    Text(String),
}

impl NumberLike {
    /// Numeric reading of the value. Text is read like a float-prefix parser,
    /// so `"181 kWh"` yields `181.0` and `"n/a"` yields `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumberLike::Number(n) => Some(*n).filter(|v| v.is_finite()),
            NumberLike::Text(s) => parse_float_prefix(s),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, NumberLike::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for NumberLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberLike::Number(n) => write!(f, "{}", n),
            NumberLike::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for NumberLike {
    fn from(v: f64) -> Self { NumberLike::Number(v) }
}

impl From<&str> for NumberLike {
    fn from(s: &str) -> Self { NumberLike::Text(s.to_string()) }
}

/// Parses the longest leading float literal of `s` (after leading whitespace).
/// Returns `None` when no digits are present or the result is not finite.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

// --- Parameters ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Range,
    Dropdown,
    /// A selector whose chosen value indexes into a dropdown's option table.
    Filter,
    /// Carries `conditional_rules`; structural, never formula-referenced.
    Conditional,
    /// Also the fallback for display types this crate does not know.
    #[default]
    #[serde(other)]
    Simple,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiType {
    #[default]
    Input,
    Static,
    NotViewable,
}

impl UiType {
    /// Static and not-viewable parameters are company-owned constants.
    pub fn is_company(self) -> bool {
        matches!(self, UiType::Static | UiType::NotViewable)
    }
}

/// Older records store the interface type as a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserInterface {
    Kind(UiType),
    Detailed {
        #[serde(rename = "type", default)]
        kind: UiType,
        #[serde(default)]
        category: String,
        #[serde(default)]
        is_advanced: bool,
    },
}

impl Default for UserInterface {
    fn default() -> Self { UserInterface::Kind(UiType::Input) }
}

impl UserInterface {
    pub fn kind(&self) -> UiType {
        match self {
            UserInterface::Kind(kind) => *kind,
            UserInterface::Detailed { kind, .. } => *kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Named(String),
    Detailed {
        name: String,
        #[serde(default)]
        color: String,
    },
}

impl Category {
    pub fn name(&self) -> &str {
        match self {
            Category::Named(name) => name,
            Category::Detailed { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropdownOption {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<NumberLike>,
}

impl DropdownOption {
    /// The option's identity for conditional-rule matching: its value when
    /// present and non-empty, its key otherwise.
    pub fn identity(&self) -> Option<String> {
        match &self.value {
            Some(v) if !v.is_blank() => Some(v.to_string()),
            _ => self.key.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub value: Option<NumberLike>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_type: DisplayType,
    #[serde(default)]
    pub user_interface: UserInterface,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_value: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_min: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_max: Option<NumberLike>,
    #[serde(default)]
    pub dropdown_options: Vec<DropdownOption>,
    #[serde(default)]
    pub conditional_rules: Vec<ConditionalRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Parameter {
    pub fn new(id: &str, name: &str) -> Self {
        Self { id: id.to_string(), name: name.to_string(), ..Default::default() }
    }

    pub fn ui_kind(&self) -> UiType { self.user_interface.kind() }

    pub fn is_filter(&self) -> bool { self.display_type == DisplayType::Filter }

    /// The trimmed formula, if the parameter is derived.
    pub fn formula_text(&self) -> Option<&str> {
        self.formula.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }

    /// The value recorded on the parameter itself, ignoring overrides and
    /// filter chains. Inputs prefer their test value; company parameters
    /// prefer their authored value.
    pub fn stored_value(&self) -> Option<f64> {
        let order = if self.ui_kind().is_company() {
            [&self.value, &self.test_value, &self.default_value]
        } else {
            [&self.test_value, &self.default_value, &self.value]
        };
        order.into_iter().flatten().find_map(NumberLike::as_f64)
    }
}

impl Named for Parameter {
    fn id(&self) -> &str { &self.id }
    fn name(&self) -> &str { &self.name }
}

// --- Calculations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationStatus {
    Valid,
    Error,
    Pending,
}

/// Result of evaluating one formula locally: a finite number, or the
/// `"Error"` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOutcome", into = "RawOutcome")]
pub enum EvalOutcome {
    Value(f64),
    Error,
}

impl EvalOutcome {
    pub fn value(self) -> Option<f64> {
        match self {
            EvalOutcome::Value(v) if v.is_finite() => Some(v),
            _ => None,
        }
    }

    pub fn is_error(self) -> bool { self.value().is_none() }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawOutcome {
    Number(f64),
    Text(String),
}

impl From<RawOutcome> for EvalOutcome {
    fn from(raw: RawOutcome) -> Self {
        match raw {
            RawOutcome::Number(v) if v.is_finite() => EvalOutcome::Value(v),
            _ => EvalOutcome::Error,
        }
    }
}

impl From<EvalOutcome> for RawOutcome {
    fn from(outcome: EvalOutcome) -> Self {
        match outcome {
            EvalOutcome::Value(v) => RawOutcome::Number(v),
            EvalOutcome::Error => RawOutcome::Text("Error".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CalculationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_result: Option<bool>,
    /// Last locally evaluated result, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EvalOutcome>,
}

impl Calculation {
    pub fn new(id: &str, name: &str, formula: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            formula: formula.to_string(),
            ..Default::default()
        }
    }

    pub fn formula_text(&self) -> Option<&str> {
        Some(self.formula.trim()).filter(|f| !f.is_empty())
    }

    pub fn is_displayed(&self) -> bool { self.display_result == Some(true) }

    /// The prior result, when it is a finite number.
    pub fn prior_result(&self) -> Option<f64> { self.result.and_then(EvalOutcome::value) }
}

impl Named for Calculation {
    fn id(&self) -> &str { &self.id }
    fn name(&self) -> &str { &self.name }
}

/// Default palette for calculations stored before categories carried colours.
fn default_category_color(name: &str) -> &'static str {
    match name.to_lowercase().as_str() {
        "financial" => "green",
        "performance" => "blue",
        "efficiency" => "yellow",
        "operational" => "purple",
        _ => "gray",
    }
}

/// Upgrades calculations saved in the older format: bare-string categories
/// become `{name, color}` and a missing `display_result` becomes `false`.
/// Calculations already in the current format are returned untouched.
pub fn migrate_calculations(calculations: &[Calculation]) -> Vec<Calculation> {
    calculations
        .iter()
        .map(|calc| {
            let current = matches!(calc.category, Some(Category::Detailed { ref name, .. }) if !name.is_empty())
                && calc.display_result.is_some();
            if current {
                return calc.clone();
            }

            let name = match &calc.category {
                Some(Category::Named(name)) => name.clone(),
                Some(Category::Detailed { name, .. }) if !name.is_empty() => name.clone(),
                _ => "financial".to_string(),
            };
            let color = match &calc.category {
                Some(Category::Detailed { color, .. }) if !color.is_empty() => color.clone(),
                _ => default_category_color(&name).to_string(),
            };

            Calculation {
                category: Some(Category::Detailed { name, color }),
                display_result: Some(calc.display_result.unwrap_or(false)),
                ..calc.clone()
            }
        })
        .collect()
}

// --- Solution ---

/// A complete parameter/calculation set. `parameters` is required; a payload
/// without it is a malformed solution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub calculations: Vec<Calculation>,
}

impl Solution {
    pub fn new(parameters: Vec<Parameter>, calculations: Vec<Calculation>) -> Self {
        Self { parameters, calculations }
    }
}
