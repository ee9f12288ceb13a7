//! Search filter clean-up.
//!
//! Before a search request is sent, filters are normalized:
//!
//! - `null`, blank strings and empty arrays are dropped
//! - values of numeric fields are coerced to JSON numbers; values that do
//!   not parse are dropped
//!
//! An empty result means "no filter at all" and callers fall back to the
//! unfiltered listing.

use serde_json::{Map, Number, Value};
use tracing::warn;

/// Raw filter form: field name to JSON value.
pub type SearchFilters = Map<String, Value>;

/// Clean `filters` for a collection whose numeric fields are `numeric`.
#[must_use]
pub fn normalize_filters(filters: &SearchFilters, numeric: &[&str]) -> SearchFilters {
    filters
        .iter()
        .filter_map(|(key, value)| {
            let is_numeric = numeric.contains(&key.as_str());
            normalize_value(key, value, is_numeric).map(|v| (key.clone(), v))
        })
        .collect()
}

fn normalize_value(key: &str, value: &Value, numeric: bool) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::Array(items) => {
            let kept: Vec<Value> = items
                .iter()
                .filter_map(|item| normalize_value(key, item, numeric))
                .collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        Value::String(s) if numeric => {
            let coerced = parse_number(s.trim());
            if coerced.is_none() {
                warn!(field = key, value = %s, "dropping non-numeric filter value");
            }
            coerced.map(Value::Number)
        }
        other => Some(other.clone()),
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(Number::from(n));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Parse `key=value` pairs (CLI style) into a filter map. Repeated keys
/// become arrays.
#[must_use]
pub fn filters_from_pairs<'a, I>(pairs: I) -> SearchFilters
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = SearchFilters::new();
    for (key, value) in pairs {
        let value = Value::String(value.to_owned());
        match out.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                out.insert(key.to_owned(), value);
            }
        }
    }
    out
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> SearchFilters {
        match value {
            Value::Object(m) => m,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn empty_strings_dropped_and_numbers_coerced() {
        let raw = map(json!({ "bedrooms": "3", "city": "" }));
        let cleaned = normalize_filters(&raw, &["bedrooms", "price"]);
        assert_eq!(Value::Object(cleaned), json!({ "bedrooms": 3 }));
    }

    #[test]
    fn nulls_and_empty_arrays_are_dropped() {
        let raw = map(json!({
            "status": null,
            "types": [],
            "tags": ["", null],
            "city": "Lyon",
        }));
        let cleaned = normalize_filters(&raw, &[]);
        assert_eq!(Value::Object(cleaned), json!({ "city": "Lyon" }));
    }

    #[test]
    fn all_empty_normalizes_to_nothing() {
        let raw = map(json!({ "city": "  ", "price": null, "types": [] }));
        assert!(normalize_filters(&raw, &["price"]).is_empty());
    }

    #[test]
    fn decimals_and_numeric_arrays_are_coerced() {
        let raw = map(json!({ "price": " 1250.5 ", "bedrooms": ["2", "x", 3] }));
        let cleaned = normalize_filters(&raw, &["price", "bedrooms"]);
        assert_eq!(
            Value::Object(cleaned),
            json!({ "price": 1250.5, "bedrooms": [2, 3] })
        );
    }

    #[test]
    fn unparseable_numeric_value_is_dropped() {
        let raw = map(json!({ "price": "cheap", "city": "Nice" }));
        let cleaned = normalize_filters(&raw, &["price"]);
        assert_eq!(Value::Object(cleaned), json!({ "city": "Nice" }));
    }

    #[test]
    fn non_numeric_fields_keep_their_text() {
        let raw = map(json!({ "zip": "01000" }));
        let cleaned = normalize_filters(&raw, &["price"]);
        assert_eq!(Value::Object(cleaned), json!({ "zip": "01000" }));
    }

    #[test]
    fn pairs_become_filters() {
        let filters = filters_from_pairs([("city", "Paris"), ("type", "flat"), ("type", "house")]);
        assert_eq!(
            Value::Object(filters),
            json!({ "city": "Paris", "type": ["flat", "house"] })
        );
    }
}
