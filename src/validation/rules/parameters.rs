//! Authoring rules for a single parameter.

use crate::store::{DisplayType, NumberLike, Parameter, UiType};
use crate::validation::error::{ValidationError, ValidationErrorType};

fn blank(value: &Option<NumberLike>) -> bool {
    value.as_ref().map_or(true, NumberLike::is_blank)
}

/// Name and unit must be present.
pub(crate) fn validate_required(candidate: &Parameter) -> Option<ValidationError> {
    let unit_missing = candidate.unit.as_deref().map_or(true, |u| u.trim().is_empty());
    if candidate.name.trim().is_empty() || unit_missing {
        return Some(ValidationError::new(
            &candidate.id,
            ValidationErrorType::MissingField,
            "Name and unit are required fields.",
        ));
    }
    None
}

/// Names are unique, ignoring case and surrounding whitespace. The candidate
/// itself (same id) is not a duplicate.
pub(crate) fn validate_unique_name(candidate: &Parameter, existing: &[Parameter]) -> Option<ValidationError> {
    let wanted = candidate.name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    let taken = existing
        .iter()
        .filter(|p| p.id != candidate.id)
        .any(|p| p.name.trim().to_lowercase() == wanted);

    taken.then(|| {
        ValidationError::new(
            &candidate.id,
            ValidationErrorType::DuplicateName,
            format!("A parameter named \"{}\" already exists.", candidate.name.trim()),
        )
    })
}

/// Static parameters carry their own value, so it must be there in the
/// shape the display type needs.
pub(crate) fn validate_static_value(candidate: &Parameter) -> Option<ValidationError> {
    if candidate.ui_kind() != UiType::Static {
        return None;
    }
    let message = match candidate.display_type {
        DisplayType::Simple if blank(&candidate.value) => "Static parameters with simple display require a value.",
        DisplayType::Range if blank(&candidate.range_min) || blank(&candidate.range_max) => {
            "Static parameters with range display require both min and max values."
        }
        DisplayType::Dropdown | DisplayType::Filter if candidate.dropdown_options.is_empty() => {
            "Static parameters with dropdown/filter display require options."
        }
        _ => return None,
    };
    Some(ValidationError::new(&candidate.id, ValidationErrorType::MissingValue, message))
}
