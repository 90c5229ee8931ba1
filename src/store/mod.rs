//! The solution data model and the name registry built over it.
pub mod registry;
pub mod types;

pub use registry::{NameCollision, NameMap};
pub use types::{
    migrate_calculations, Calculation, CalculationStatus, Category, ConditionalRule, DisplayType,
    DropdownOption, EvalOutcome, Named, NumberLike, Overrides, Parameter, Solution, UiType,
    UserInterface,
};
