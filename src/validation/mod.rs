//! Authoring-time checks for a solution.
//!
//! The `Validator` runs every rule over parameters and calculation formulas
//! and reports all problems at once, so an editor can show them side by side
//! before anything is evaluated or sent to the solver.

pub use self::error::{ValidationError, ValidationErrorType};
pub use self::validator::{validate_parameter, Validator};

// --- MODULE DECLARATIONS ---
mod error;
mod validator;
mod rules {
    pub mod formula;
    pub mod parameters;
}
