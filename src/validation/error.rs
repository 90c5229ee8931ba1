//! Defines the error types for the validation module.
use thiserror::Error;

/// The specific category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorType {
    /// A required field (name, unit) is blank.
    MissingField,
    /// Another parameter already uses this name.
    DuplicateName,
    /// A static parameter lacks the value its display type needs.
    MissingValue,
    /// A formula mentions `self`/`this` or its own calculation.
    SelfReference,
    /// Calculations reference each other in a loop.
    CircularReference,
    /// A formula token matches no parameter or calculation.
    UnresolvedReference,
    /// A formula does not evaluate.
    InvalidFormula,
}

/// A structured error report from an authoring check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Id of the parameter or calculation the error is about.
    pub subject: String,
    pub error_type: ValidationErrorType,
    /// A human-readable message explaining the error.
    pub message: String,
}

impl ValidationError {
    pub fn new(subject: &str, error_type: ValidationErrorType, message: impl Into<String>) -> Self {
        Self { subject: subject.to_string(), error_type, message: message.into() }
    }
}
