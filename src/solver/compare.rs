//! Side-by-side comparison of two solutions.

use super::builder::RequestBuilder;
use super::problem::EvaluationRequest;
use super::response::ResultMap;
use crate::error::EngineError;
use crate::store::types::parse_float_prefix;
use crate::store::{Overrides, Solution};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub metric: String,
    pub variant_a: f64,
    pub variant_b: f64,
    pub difference: f64,
    pub percent_change: String,
}

pub type RequestPair = (Result<EvaluationRequest, EngineError>, Result<EvaluationRequest, EngineError>);

impl RequestBuilder {
    /// Builds the requests for two solutions in parallel. They share nothing
    /// but the builder's configuration.
    pub fn build_comparison(
        &self,
        a: &Solution,
        overrides_a: &Overrides,
        b: &Solution,
        overrides_b: &Overrides,
    ) -> RequestPair {
        rayon::join(|| self.build(a, overrides_a), || self.build(b, overrides_b))
    }
}

/// [`RequestBuilder::build_comparison`] with the default configuration.
pub fn compare_solutions(a: &Solution, b: &Solution, overrides_a: &Overrides, overrides_b: &Overrides) -> RequestPair {
    RequestBuilder::default().build_comparison(a, overrides_a, b, overrides_b)
}

/// One row per metric found in either result, `a`'s metrics first.
pub fn compare_results(a: &ResultMap, b: &ResultMap) -> Vec<ComparisonRow> {
    let keys = a.keys().chain(b.keys().filter(|k| !a.contains_key(*k)));
    keys.map(|key| {
        let variant_a = a.get(key).map_or(0.0, numeric);
        let variant_b = b.get(key).map_or(0.0, numeric);
        let difference = variant_b - variant_a;
        ComparisonRow {
            metric: format_metric_name(key),
            variant_a,
            variant_b,
            difference,
            percent_change: percent_change(variant_a, difference),
        }
    })
    .collect()
}

/// Rows for a single solution: both variants carry the same value.
pub fn single_results(result: &ResultMap) -> Vec<ComparisonRow> {
    result
        .iter()
        .map(|(key, value)| {
            let v = numeric(value);
            ComparisonRow {
                metric: format_metric_name(key),
                variant_a: v,
                variant_b: v,
                difference: 0.0,
                percent_change: "0.0%".to_string(),
            }
        })
        .collect()
}

/// Numbers as-is, numeric text by its leading number, anything else 0.
fn numeric(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn percent_change(base: f64, difference: f64) -> String {
    if base == 0.0 {
        return "0.0%".to_string();
    }
    // + 0.0 turns -0.0 into 0.0
    format!("{:.1}%", difference / base * 100.0 + 0.0)
}

/// `total_cost_per_year` -> `Total Cost Per Year`.
pub fn format_metric_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut word_start = true;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_ascii_alphanumeric() {
            if word_start {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c.to_ascii_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Calculation, NumberLike, Parameter};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn results(pairs: &[(&str, Value)]) -> ResultMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[rstest]
    #[case("total_cost_per_year", "Total Cost Per Year")]
    #[case("NPV", "Npv")]
    #[case("co2_SAVINGS", "Co2 Savings")]
    #[case("payback (years)", "Payback (Years)")]
    fn test_format_metric_name(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(format_metric_name(key), expected);
    }

    #[test]
    fn test_compare_results() {
        let a = results(&[("cost", json!(200.0)), ("zero_base", json!(0)), ("only_a", json!("12.5 EUR"))]);
        let b = results(&[("cost", json!(150)), ("zero_base", json!(10)), ("only_b", json!("Error"))]);

        let rows = compare_results(&a, &b);
        assert_eq!(
            rows,
            vec![
                ComparisonRow {
                    metric: "Cost".into(),
                    variant_a: 200.0,
                    variant_b: 150.0,
                    difference: -50.0,
                    percent_change: "-25.0%".into(),
                },
                ComparisonRow {
                    metric: "Only A".into(),
                    variant_a: 12.5,
                    variant_b: 0.0,
                    difference: -12.5,
                    percent_change: "-100.0%".into(),
                },
                ComparisonRow {
                    metric: "Zero Base".into(),
                    variant_a: 0.0,
                    variant_b: 10.0,
                    difference: 10.0,
                    percent_change: "0.0%".into(),
                },
                ComparisonRow {
                    metric: "Only B".into(),
                    variant_a: 0.0,
                    variant_b: 0.0,
                    difference: 0.0,
                    percent_change: "0.0%".into(),
                },
            ]
        );
    }

    #[test]
    fn test_no_negative_zero() {
        let a = results(&[("x", json!(-5))]);
        assert_eq!(compare_results(&a, &a)[0].percent_change, "0.0%");
    }

    #[test]
    fn test_single_results() {
        let rows = single_results(&results(&[("net_savings", json!(42))]));
        assert_eq!(rows[0].metric, "Net Savings");
        assert_eq!((rows[0].variant_a, rows[0].variant_b, rows[0].difference), (42.0, 42.0, 0.0));
    }

    #[test]
    fn test_row_serializes_camel_case() {
        let row = single_results(&results(&[("a", json!(1))])).remove(0);
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["variantA"], json!(1.0));
        assert_eq!(value["percentChange"], json!("0.0%"));
    }

    #[test]
    fn test_build_comparison_in_parallel() {
        let mut price = Parameter::new("p", "Price");
        price.test_value = Some(NumberLike::Number(2.0));
        let mut total = Calculation::new("c", "Total", "Price * 3");
        total.display_result = Some(true);
        let a = Solution::new(vec![price.clone()], vec![total.clone()]);
        let b = Solution::new(vec![price], vec![total]);

        let override_b = Overrides::from([("p".to_string(), NumberLike::Number(5.0))]);
        let (req_a, req_b) = compare_solutions(&a, &b, &Overrides::new(), &override_b);
        let (req_a, req_b) = (req_a.unwrap(), req_b.unwrap());

        assert_eq!(req_a.inputs.get("Price"), Some(&2.0));
        assert_eq!(req_b.inputs.get("Price"), Some(&5.0));
        assert_eq!(req_a.target, req_b.target);
    }
}
