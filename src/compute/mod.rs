//! Local formula evaluation: the expression language, the value context it
//! runs against, and the engine tying them to a solution.
pub mod engine;
pub mod expr;
pub mod ledger;

pub use engine::{evaluate, recalculate, validate, Engine, FormulaValidation};
pub use ledger::{ComputationError, Ledger};
