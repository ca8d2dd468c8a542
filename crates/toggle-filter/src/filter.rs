//! Toggle-driven pruning of JSON document trees.
//!
//! A mapping that carries the [`TOGGLE_MARKER_KEY`] is gated by the feature it
//! names. When the feature is disabled the mapping is removed from its parent
//! together with everything below it; when enabled it is kept as-is, marker
//! included, and its children are filtered in turn.
//!
//! # Rules
//!
//! - Scalars (string, number, bool, null) are copied unchanged.
//! - A gated mapping under an object key removes the whole entry, key included.
//! - A gated mapping inside an array removes that element only.
//! - The gate is checked before descending, so children of a removed node are
//!   never visited.
//! - Containers emptied by filtering stay in the output as `{}` or `[]`.
//! - The root node is never removed, even when it carries a marker.

use std::borrow::Cow;
use std::convert::Infallible;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;

/// Reserved key marking a mapping as conditionally present.
pub const TOGGLE_MARKER_KEY: &str = "x-feature-toggle";

/// Remove every subtree whose marker feature is disabled.
///
/// `is_enabled` is asked about each marker feature encountered on the way
/// down. Unknown features should resolve to `false`. A marker whose value is
/// not a string is looked up by its JSON text (`42`, `true`, `null`), so an
/// ordinary flag source reports it as unknown and therefore disabled.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use toggle_filter::filter_document;
///
/// let spec = json!({
///     "paths": {
///         "/users": {
///             "get": {"summary": "List users"},
///             "post": {"x-feature-toggle": "user-signup", "summary": "Create user"}
///         }
///     }
/// });
///
/// let filtered = filter_document(&spec, |_| false);
/// assert_eq!(
///     filtered,
///     json!({"paths": {"/users": {"get": {"summary": "List users"}}}})
/// );
/// ```
pub fn filter_document<F>(node: &Value, mut is_enabled: F) -> Value
where
    F: FnMut(&str) -> bool,
{
    match try_filter_document(node, |name| Ok::<_, Infallible>(is_enabled(name))) {
        Ok(filtered) => filtered,
        Err(never) => match never {},
    }
}

/// Fallible variant of [`filter_document`].
///
/// The first error returned by `is_enabled` aborts the traversal and is
/// handed back to the caller untouched.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use toggle_filter::try_filter_document;
///
/// let doc = json!({"beta": {"x-feature-toggle": "beta"}});
/// let err = try_filter_document(&doc, |_| Err("toggles not initialized"));
/// assert_eq!(err, Err("toggles not initialized"));
/// ```
pub fn try_filter_document<F, E>(node: &Value, mut is_enabled: F) -> std::result::Result<Value, E>
where
    F: FnMut(&str) -> std::result::Result<bool, E>,
{
    traverse(node, &mut is_enabled)
}

/// Parse a JSON string, prune it with [`filter_document`] and serialize the
/// result back to compact JSON.
///
/// # Errors
///
/// Returns an error if the input is not valid JSON.
///
/// # Examples
///
/// ```
/// use toggle_filter::filter_json;
///
/// let json = r#"{"items":[{"x-feature-toggle":"f2","id":1},{"id":2}]}"#;
/// let out = filter_json(json, |_| false).unwrap();
/// assert_eq!(out, r#"{"items":[{"id":2}]}"#);
/// ```
pub fn filter_json<F>(json: &str, is_enabled: F) -> Result<String>
where
    F: FnMut(&str) -> bool,
{
    let value: Value = serde_json::from_str(json)?;
    let filtered = filter_document(&value, is_enabled);
    Ok(serde_json::to_string(&filtered)?)
}

/// List the feature names referenced by markers anywhere in the document.
///
/// Names appear once each, in the order they are first met during a
/// depth-first walk. Non-string marker values are skipped.
pub fn collect_toggles(node: &Value) -> Vec<String> {
    let mut names = Vec::new();
    collect_into(node, &mut names);
    names
}

fn collect_into(node: &Value, names: &mut Vec<String>) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(name)) = map.get(TOGGLE_MARKER_KEY) {
                if !names.iter().any(|seen| seen == name) {
                    names.push(name.clone());
                }
            }
            for child in map.values() {
                collect_into(child, names);
            }
        }
        Value::Array(arr) => {
            for elem in arr {
                collect_into(elem, names);
            }
        }
        _ => {}
    }
}

fn traverse<F, E>(node: &Value, is_enabled: &mut F) -> std::result::Result<Value, E>
where
    F: FnMut(&str) -> std::result::Result<bool, E>,
{
    match node {
        Value::Object(map) => filter_object(map, is_enabled),
        Value::Array(arr) => filter_array(arr, is_enabled),
        other => Ok(other.clone()),
    }
}

/// Rebuild an object from its surviving entries, in original key order.
fn filter_object<F, E>(
    map: &Map<String, Value>,
    is_enabled: &mut F,
) -> std::result::Result<Value, E>
where
    F: FnMut(&str) -> std::result::Result<bool, E>,
{
    let mut result = Map::with_capacity(map.len());

    for (key, child) in map {
        let kept = match child {
            Value::Array(arr) => filter_array(arr, is_enabled)?,
            Value::Object(inner) => {
                if !is_present(inner, is_enabled)? {
                    debug!(key = %key, "pruned toggled entry");
                    continue;
                }
                filter_object(inner, is_enabled)?
            }
            scalar => scalar.clone(),
        };
        result.insert(key.clone(), kept);
    }

    Ok(Value::Object(result))
}

/// Keep array elements whose gate is open, filtering each survivor.
fn filter_array<F, E>(arr: &[Value], is_enabled: &mut F) -> std::result::Result<Value, E>
where
    F: FnMut(&str) -> std::result::Result<bool, E>,
{
    let mut result = Vec::with_capacity(arr.len());

    for (index, elem) in arr.iter().enumerate() {
        if let Value::Object(inner) = elem {
            if !is_present(inner, is_enabled)? {
                debug!(index, "pruned toggled array element");
                continue;
            }
        }
        result.push(traverse(elem, is_enabled)?);
    }

    Ok(Value::Array(result))
}

/// Whether a mapping survives its own marker.
fn is_present<F, E>(
    map: &Map<String, Value>,
    is_enabled: &mut F,
) -> std::result::Result<bool, E>
where
    F: FnMut(&str) -> std::result::Result<bool, E>,
{
    let feature = match map.get(TOGGLE_MARKER_KEY) {
        None => return Ok(true),
        Some(Value::String(feature)) => Cow::Borrowed(feature.as_str()),
        Some(other) => {
            debug!(marker = %other, "non-string toggle marker queried by its JSON text");
            Cow::Owned(other.to_string())
        }
    };

    let enabled = is_enabled(&feature)?;
    if !enabled {
        debug!(feature = %feature, "feature disabled");
    }
    Ok(enabled)
}
