//! Lookup of values nested inside provider JSON.
//!
//! Provider responses are sparse: any intermediate object may be missing
//! depending on the sensors installed at a station. A missing segment is
//! not an error, the lookup just yields nothing and callers fall back to
//! a default.

use serde_json::Value;

/// One step of a path: an object key or an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for Segment<'a> {
    fn from(key: &'a str) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment<'_> {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Follow `path` from `root`, returning `None` as soon as a segment is absent.
pub fn value_at<'v>(root: &'v Value, path: &[Segment<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(root, |current, segment| match segment {
        Segment::Key(key) => current.get(*key),
        Segment::Index(index) => current.get(*index),
    })
}

/// Numeric value at `path`, or `default` when absent, null or not a number.
pub fn number_or(root: &Value, path: &[Segment<'_>], default: f64) -> f64 {
    value_at(root, path)
        .and_then(Value::as_f64)
        .unwrap_or(default)
}

/// String value at `path`, if present.
pub fn str_at<'v>(root: &'v Value, path: &[Segment<'_>]) -> Option<&'v str> {
    value_at(root, path).and_then(Value::as_str)
}

/// Builds a `&[Segment]` from a mix of keys and indices.
///
/// ```
/// use roadweather_core::path;
/// let p = path!["Wind", 0, "Speed", "Value"];
/// assert_eq!(p.len(), 4);
/// ```
#[macro_export]
macro_rules! path {
    ($($segment:expr),* $(,)?) => {
        [$($crate::json_path::Segment::from($segment)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observation() -> Value {
        json!({
            "Air": { "Temperature": { "Value": -3.4 }, "RelativeHumidity": { "Value": 87 } },
            "Wind": [ { "Speed": { "Value": 4.2 }, "Direction": { "Value": 225 } } ],
            "Aggregated30minutes": {
                "Precipitation": { "SnowSum": { "Solid": { "Value": 1.5 } } }
            }
        })
    }

    #[test]
    fn reads_nested_keys_and_indices() {
        let obs = observation();
        assert_eq!(number_or(&obs, &path!["Air", "Temperature", "Value"], 0.0), -3.4);
        assert_eq!(number_or(&obs, &path!["Wind", 0, "Direction", "Value"], 0.0), 225.0);
    }

    #[test]
    fn every_truncated_document_yields_default() {
        let full = path!["Aggregated30minutes", "Precipitation", "SnowSum", "Solid", "Value"];

        // Build documents that stop after each prefix of the path.
        for depth in 0..full.len() {
            let mut doc = json!({});
            let mut cursor = &mut doc;
            for segment in &full[..depth] {
                if let Segment::Key(key) = segment {
                    cursor[*key] = json!({});
                    cursor = &mut cursor[*key];
                }
            }
            assert_eq!(number_or(&doc, &full, 0.0), 0.0, "depth {depth}");
            assert!(value_at(&doc, &full).is_none());
        }
    }

    #[test]
    fn missing_array_entry_yields_default() {
        let obs = json!({ "Wind": [] });
        assert_eq!(number_or(&obs, &path!["Wind", 0, "Speed", "Value"], 0.0), 0.0);
    }

    #[test]
    fn non_numeric_leaf_yields_default() {
        let obs = json!({ "Air": { "Temperature": { "Value": null } } });
        assert_eq!(number_or(&obs, &path!["Air", "Temperature", "Value"], 7.0), 7.0);
    }

    #[test]
    fn str_lookup() {
        let doc = json!({ "Geometry": { "WGS84": "POINT (13.05 55.69)" } });
        assert_eq!(str_at(&doc, &path!["Geometry", "WGS84"]), Some("POINT (13.05 55.69)"));
        assert_eq!(str_at(&doc, &path!["Geometry", "SWEREF99TM"]), None);
    }
}
