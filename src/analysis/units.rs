// Percentage <-> fraction conversion for parameters whose unit marks them as
// percentages. Users type `12.5` into a `%` field; formulas want `0.125`.

use crate::config::EngineConfig;
use crate::store::types::parse_float_prefix;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentConverter {
    unit: String,
    decimals: usize,
}

impl Default for PercentConverter {
    fn default() -> Self { Self::from_config(&EngineConfig::default()) }
}

impl PercentConverter {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self { unit: config.percent_unit.clone(), decimals: config.percent_decimals as usize }
    }

    pub fn applies_to(&self, unit: Option<&str>) -> bool { unit == Some(self.unit.as_str()) }

    /// `"12.5"` with a percent unit becomes `"0.1250"`. Anything else, including
    /// text with no leading number, is returned unchanged.
    pub fn to_decimal(&self, value: &str, unit: Option<&str>) -> String {
        match (self.applies_to(unit), parse_float_prefix(value)) {
            (true, Some(v)) => format!("{:.*}", self.decimals, v / 100.0),
            _ => value.to_string(),
        }
    }

    /// `"0.125"` with a percent unit becomes `"13"`: whole percent, halves
    /// rounded up.
    pub fn to_percentage(&self, value: &str, unit: Option<&str>) -> String {
        match (self.applies_to(unit), parse_float_prefix(value)) {
            (true, Some(v)) => format!("{}", (v * 100.0 + 0.5).floor()),
            _ => value.to_string(),
        }
    }
}

pub fn convert_percentage_to_decimal(value: &str, unit: Option<&str>) -> String {
    PercentConverter::default().to_decimal(value, unit)
}

pub fn convert_decimal_to_percentage(value: &str, unit: Option<&str>) -> String {
    PercentConverter::default().to_percentage(value, unit)
}
