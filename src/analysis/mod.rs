//! Pure text and structure analysis over a solution: name normalization,
//! formula tokenizing, name resolution, dependency discovery and rewriting.
pub mod dependencies;
pub mod filter_chain;
pub mod normalize;
pub mod resolver;
pub mod rewrite;
pub mod tokenizer;
pub mod topology;
pub mod units;

// Re-export the entry points most callers need
pub use dependencies::{compute_used_parameter_ids, unused_parameter_ids};
pub use filter_chain::resolve_filter_value;
pub use normalize::{normalize, underscore_alias};
pub use resolver::{resolve, resolve_all, resolve_best, MatchTier};
pub use rewrite::{rewrite, Substitution};
pub use tokenizer::extract_candidate_names;
pub use topology::{calculation_order, sort as sort_calculations, CalculationOrder};
pub use units::{convert_decimal_to_percentage, convert_percentage_to_decimal, PercentConverter};
