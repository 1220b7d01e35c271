//! Dotted-path reads over loosely structured JSON documents.
//!
//! The wallet backend renames fields between API generations, so callers pass a short,
//! ordered list of candidate paths (e.g. `["data.details.scan_id", "data.scan_id", "scan_id"]`)
//! and take the first one that resolves to a usable value.
//!
//! A path is a `.`-separated list of segments. Against an object a segment is a key;
//! against an array it must be a non-negative integer index.

use serde_json::Value;

/// Resolves a single dotted `path` against `document`.
///
/// Returns `None` as soon as a segment cannot be resolved against the shape of the
/// current value. A JSON `null` at the end of the path is returned as-is; filtering of
/// absent and empty values is done by [`extract`].
pub fn resolve<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Returns the first candidate path whose value is neither absent, `null`, nor an empty string.
pub fn extract<'a, P>(document: &'a Value, candidates: &[P]) -> Option<&'a Value>
where
    P: AsRef<str>,
{
    candidates
        .iter()
        .filter_map(|path| resolve(document, path.as_ref()))
        .find(|value| is_present(value))
}

/// Same as [`extract`], but renders the found value with [`stringify`].
///
/// Identifiers threaded between requests are sometimes numbers, sometimes strings.
pub fn extract_string<P>(document: &Value, candidates: &[P]) -> Option<String>
where
    P: AsRef<str>,
{
    extract(document, candidates).map(stringify)
}

/// String form of a JSON value, as used when comparing status codes or building URLs.
///
/// Integral floats render without a fractional part, so `200.0` and `200` agree.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
