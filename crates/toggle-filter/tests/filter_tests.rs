/// Behavioral tests for toggle-driven document pruning.
///
/// Covers toggled operations under `paths`, toggled array elements, whole-entry removal, ordering, empty-container handling
/// and error propagation from the toggle predicate.
use serde_json::{json, Value};
use toggle_filter::{
    collect_toggles, filter_document, filter_json, try_filter_document, FilterError, ToggleSet,
    TOGGLE_MARKER_KEY,
};

// ============================================================================
// Helpers
// ============================================================================

/// Realistic OpenAPI document with toggled tags, paths, parameters and schema
/// properties.
fn openapi_fixture() -> Value {
    let raw = include_str!("fixtures/openapi.json");
    serde_json::from_str(raw).expect("openapi.json fixture must be valid JSON")
}

/// A single toggled operation under `/users`.
fn users_post_document() -> Value {
    json!({
        "info": {},
        "paths": {"/users": {"post": {"x-feature-toggle": "f1"}}}
    })
}

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .expect("value must be an object")
        .keys()
        .map(String::as_str)
        .collect()
}

// ============================================================================
// 1. Toggled operations and array elements
// ============================================================================

#[test]
fn disabled_operation_under_path_is_removed() {
    let filtered = filter_document(&users_post_document(), |name| {
        assert_eq!(name, "f1");
        false
    });

    assert_eq!(filtered, json!({"info": {}, "paths": {"/users": {}}}));
}

#[test]
fn enabled_operation_is_kept_verbatim() {
    let input = users_post_document();
    let filtered = filter_document(&input, |_| true);

    assert_eq!(filtered, input);
    assert_eq!(
        filtered["paths"]["/users"]["post"][TOGGLE_MARKER_KEY],
        json!("f1"),
        "the marker stays on kept nodes"
    );
}

#[test]
fn disabled_array_element_is_removed() {
    let input = json!({"items": [{"x-feature-toggle": "f2", "id": 1}, {"id": 2}]});
    let filtered = filter_document(&input, |name| name != "f2");

    assert_eq!(filtered, json!({"items": [{"id": 2}]}));
}

// ============================================================================
// 2. Whole-entry removal and pre-order decisions
// ============================================================================

#[test]
fn disabled_entry_removes_key_not_just_value() {
    let input = json!({"a": 1, "beta": {"x-feature-toggle": "beta", "nested": {"x": 1}}});
    let filtered = filter_document(&input, |_| false);

    assert!(filtered.get("beta").is_none(), "key must be gone entirely");
    assert_eq!(filtered, json!({"a": 1}));
}

#[test]
fn children_of_disabled_node_are_never_queried() {
    let input = json!({
        "outer": {
            "x-feature-toggle": "outer",
            "inner": {"x-feature-toggle": "inner"},
            "list": [{"x-feature-toggle": "in-list"}]
        }
    });

    let mut asked = Vec::new();
    let filtered = filter_document(&input, |name| {
        asked.push(name.to_string());
        false
    });

    assert_eq!(filtered, json!({}));
    assert_eq!(asked, vec!["outer"]);
}

#[test]
fn children_of_disabled_array_element_are_never_queried() {
    let input = json!([{"x-feature-toggle": "outer", "child": {"x-feature-toggle": "inner"}}]);

    let mut asked = Vec::new();
    let filtered = filter_document(&input, |name| {
        asked.push(name.to_string());
        false
    });

    assert_eq!(filtered, json!([]));
    assert_eq!(asked, vec!["outer"]);
}

#[test]
fn enabled_node_descends_into_children() {
    let input = json!({
        "outer": {
            "x-feature-toggle": "outer",
            "keep": {"x-feature-toggle": "keep"},
            "drop": {"x-feature-toggle": "drop"}
        }
    });
    let toggles = ToggleSet::new().enable("outer").enable("keep");

    let filtered = filter_document(&input, |name| toggles.is_enabled(name));

    assert_eq!(
        filtered,
        json!({"outer": {"x-feature-toggle": "outer", "keep": {"x-feature-toggle": "keep"}}})
    );
}

#[test]
fn unknown_features_resolve_to_disabled_via_toggle_set() {
    let input = json!({"a": {"x-feature-toggle": "not-in-backend"}, "b": true});
    let toggles = ToggleSet::new().enable("something-else");

    let filtered = filter_document(&input, |name| toggles.is_enabled(name));

    assert_eq!(filtered, json!({"b": true}));
}

// ============================================================================
// 3. Empty containers are preserved
// ============================================================================

#[test]
fn mapping_emptied_by_filtering_stays_as_empty_object() {
    let input = json!({"wrapper": {"only": {"x-feature-toggle": "gone"}}});
    let filtered = filter_document(&input, |_| false);

    assert_eq!(filtered, json!({"wrapper": {}}));
}

#[test]
fn sequence_emptied_by_filtering_stays_as_empty_array() {
    let input = json!({"list": [{"x-feature-toggle": "a"}, {"x-feature-toggle": "b"}]});
    let filtered = filter_document(&input, |_| false);

    assert_eq!(filtered, json!({"list": []}));
}

#[test]
fn pre_existing_empty_containers_are_kept() {
    let input = json!({"a": {}, "b": [], "c": [{}, []]});
    assert_eq!(filter_document(&input, |_| false), input);
}

// ============================================================================
// 4. Scalars, nulls and nested arrays
// ============================================================================

#[test]
fn scalars_and_nulls_are_copied_unchanged() {
    let input = json!({"s": "x", "n": 1.5, "b": false, "z": null, "list": [null, 1, "two"]});
    assert_eq!(filter_document(&input, |_| false), input);
}

#[test]
fn marker_key_with_scalar_sibling_does_not_gate_scalars() {
    // Markers only gate mappings; a scalar entry next to a marker is part of
    // the gated mapping, not gated on its own.
    let input = json!({"op": {"x-feature-toggle": "on", "summary": "kept"}});
    let filtered = filter_document(&input, |_| true);

    assert_eq!(filtered, input);
}

#[test]
fn nested_arrays_apply_the_element_rule() {
    let input = json!({"matrix": [[{"x-feature-toggle": "off"}, {"id": 1}], [{"id": 2}]]});
    let filtered = filter_document(&input, |_| false);

    assert_eq!(filtered, json!({"matrix": [[{"id": 1}], [{"id": 2}]]}));
}

#[test]
fn root_array_applies_the_element_rule() {
    let input = json!([{"x-feature-toggle": "off"}, {"id": 1}, 7]);
    let filtered = filter_document(&input, |_| false);

    assert_eq!(filtered, json!([{"id": 1}, 7]));
}

// ============================================================================
// 5. Ordering
// ============================================================================

#[test]
fn surviving_keys_keep_input_order() {
    let input = json!({
        "zeta": 1,
        "alpha": {"x-feature-toggle": "drop"},
        "mid": {"x": 1},
        "beta": 2,
        "omega": {"x-feature-toggle": "keep"}
    });

    let filtered = filter_document(&input, |name| name == "keep");

    assert_eq!(keys(&filtered), vec!["zeta", "mid", "beta", "omega"]);
}

#[test]
fn surviving_elements_keep_input_order() {
    let input = json!([
        {"id": 1},
        {"id": 2, "x-feature-toggle": "drop"},
        {"id": 3, "x-feature-toggle": "keep"},
        {"id": 4}
    ]);

    let filtered = filter_document(&input, |name| name == "keep");
    let ids: Vec<i64> = filtered
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();

    assert_eq!(ids, vec![1, 3, 4]);
}

// ============================================================================
// 6. Input is never mutated
// ============================================================================

#[test]
fn input_document_is_left_untouched() {
    let input = openapi_fixture();
    let snapshot = input.clone();

    let _ = filter_document(&input, |_| false);

    assert_eq!(input, snapshot);
}

// ============================================================================
// 7. Realistic OpenAPI document
// ============================================================================

#[test]
fn openapi_all_disabled() {
    let filtered = filter_document(&openapi_fixture(), |_| false);

    assert_eq!(filtered["tags"], json!([{"name": "users"}]));
    assert_eq!(keys(&filtered["paths"]), vec!["/users"]);
    assert_eq!(keys(&filtered["paths"]["/users"]), vec!["get"]);
    assert_eq!(
        filtered["paths"]["/users"]["get"]["parameters"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        keys(&filtered["components"]["schemas"]["User"]["properties"]),
        vec!["id"]
    );
}

#[test]
fn openapi_partial_rollout() {
    let toggles = ToggleSet::new().enable("billing").enable("nicknames");
    let filtered = filter_document(&openapi_fixture(), |name| toggles.is_enabled(name));

    assert_eq!(filtered["tags"].as_array().unwrap().len(), 2);
    assert_eq!(keys(&filtered["paths"]), vec!["/users", "/invoices"]);
    assert!(filtered["paths"]["/users"].get("post").is_none());
    assert_eq!(
        keys(&filtered["components"]["schemas"]["User"]["properties"]),
        vec!["id", "nickname"]
    );
}

#[test]
fn openapi_all_enabled_is_identity() {
    let input = openapi_fixture();
    assert_eq!(filter_document(&input, |_| true), input);
}

#[test]
fn openapi_toggle_listing() {
    assert_eq!(
        collect_toggles(&openapi_fixture()),
        vec!["billing", "cursor-pagination", "user-signup", "nicknames"]
    );
}

// ============================================================================
// 8. Error transparency
// ============================================================================

#[derive(Debug, PartialEq)]
struct NotReady;

#[test]
fn predicate_error_propagates_unchanged() {
    let result = try_filter_document(&users_post_document(), |_| Err(NotReady));
    assert_eq!(result, Err(NotReady));
}

#[test]
fn predicate_error_is_not_raised_without_markers() {
    let input = json!({"a": {"b": [1, 2, {"c": null}]}});
    let result = try_filter_document(&input, |_| Err(NotReady));
    assert_eq!(result, Ok(input));
}

#[test]
fn try_filter_matches_infallible_filter() {
    let toggles = ToggleSet::new().enable("billing");
    let input = openapi_fixture();

    let infallible = filter_document(&input, |name| toggles.is_enabled(name));
    let fallible = try_filter_document(&input, |name| Ok::<_, NotReady>(toggles.is_enabled(name)));

    assert_eq!(fallible, Ok(infallible));
}

// ============================================================================
// 9. String entry point
// ============================================================================

#[test]
fn filter_json_roundtrips_compact_output() {
    let json = r#"{"info":{},"paths":{"/users":{"post":{"x-feature-toggle":"f1"}}}}"#;
    let out = filter_json(json, |_| false).unwrap();
    assert_eq!(out, r#"{"info":{},"paths":{"/users":{}}}"#);
}

#[test]
fn filter_json_rejects_invalid_input() {
    let err = filter_json("{not json", |_| true).unwrap_err();
    assert!(matches!(err, FilterError::Json(_)));
    assert!(err.to_string().starts_with("JSON error"));
}
