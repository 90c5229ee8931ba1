//! Boundary with the external numeric solver: request construction, the wire
//! types, and pairing responses back with their targets.
pub mod builder;
pub mod compare;
pub mod problem;
pub mod response;

pub use builder::{build_request, parse_solution, RequestBuilder};
pub use compare::{compare_results, compare_solutions, format_metric_name, single_results, ComparisonRow};
pub use problem::{EvaluationRequest, NodeType, RequestNode};
pub use response::{parse_response, zip_results, ResultMap};
