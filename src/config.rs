use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables shared by the request builder, the evaluator and the converters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name fragment that marks the filter parameter acting as the selector
    /// for filter chains.
    pub filter_selector_keyword: String,

    /// Decimal places kept on locally evaluated results
    pub result_decimals: u32,

    /// Unit string identifying percentage parameters
    pub percent_unit: String,

    /// Decimal places kept when converting a percentage to a fraction
    pub percent_decimals: u32,

    /// Extra tokens never treated as references, on top of the built-in list
    pub reserved_tokens: Vec<String>,

    /// What to do when two declared names normalize to the same identifier
    pub collision_policy: CollisionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            filter_selector_keyword: "country".to_string(),
            result_decimals: 2,
            percent_unit: "%".to_string(),
            percent_decimals: 4,
            reserved_tokens: vec![],
            collision_policy: CollisionPolicy::Warn,
        }
    }
}

impl EngineConfig {
    /// Refuse to build requests that would silently merge two names.
    pub fn strict() -> Self {
        Self { collision_policy: CollisionPolicy::Error, ..Default::default() }
    }

    /// Keep full float precision on local results.
    pub fn unrounded() -> Self {
        Self { result_decimals: 15, ..Default::default() }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(source).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.filter_selector_keyword.trim().is_empty() {
            return Err(EngineError::Config("filter_selector_keyword must not be empty".to_string()));
        }
        // f64 carries ~15 significant decimal digits.
        if self.result_decimals > 15 || self.percent_decimals > 15 {
            return Err(EngineError::Config(format!(
                "decimal places must be <= 15 (result_decimals = {}, percent_decimals = {})",
                self.result_decimals, self.percent_decimals
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Log the collision and keep the first name registered.
    #[default]
    Warn,
    /// Fail request building with `EngineError::NameCollision`.
    Error,
    /// Keep the first name without logging.
    Ignore,
}
