//! Formula resolution core.
//!
//! Turns a solution (user parameters plus calculations whose formulas refer
//! to them by display name) into a request an external numeric solver can
//! evaluate, and evaluates single formulas locally for authoring feedback.

pub mod analysis;
pub mod compute;
pub mod config;
pub mod error;
pub mod solver;
pub mod store;
pub mod validation;

// --- Public surface ---
pub use analysis::{compute_used_parameter_ids, normalize, resolve_filter_value};
pub use compute::{evaluate, recalculate, validate, Engine, FormulaValidation};
pub use config::{CollisionPolicy, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use solver::{build_request, compare_solutions, zip_results, EvaluationRequest, RequestBuilder};
pub use store::{Calculation, Overrides, Parameter, Solution};
pub use validation::{validate_parameter, ValidationError, Validator};
