use mcpset::merge::{append_only, merge_server_maps};
use mcpset::ServerMap;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use serde_json::{json, Value};

fn arb_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-50i64..50).prop_map(Value::from),
        "[a-z]{0,3}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-d]", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Everything in `existing` is still present, unchanged, in `merged`.
fn preserves(existing: &Value, merged: &Value) -> bool {
    match (existing, merged) {
        (Value::Object(old), Value::Object(new)) => old
            .iter()
            .all(|(key, value)| new.get(key).is_some_and(|merged| preserves(value, merged))),
        (Value::Array(old), Value::Array(new)) => new.len() >= old.len() && new[..old.len()] == old[..],
        (old, new) => old == new,
    }
}

proptest! {
    #[test]
    fn prop_merge_is_idempotent(tree in arb_tree()) {
        prop_assert_eq!(append_only(&tree, &tree), tree);
    }

    #[test]
    fn prop_merge_never_loses_existing_data(existing in arb_tree(), incoming in arb_tree()) {
        let merged = append_only(&existing, &incoming);
        prop_assert!(preserves(&existing, &merged));
    }

    #[test]
    fn prop_remerging_incoming_is_a_no_op(existing in arb_tree(), incoming in arb_tree()) {
        let merged = append_only(&existing, &incoming);
        prop_assert_eq!(append_only(&merged, &incoming), merged.clone());
        prop_assert_eq!(append_only(&merged, &existing), merged);
    }

    #[test]
    fn prop_mapping_keys_are_a_union(
        existing in prop::collection::btree_map("[a-f]", arb_tree(), 0..5),
        incoming in prop::collection::btree_map("[a-f]", arb_tree(), 0..5),
    ) {
        let existing: ServerMap = existing.into_iter().collect();
        let incoming: ServerMap = incoming.into_iter().collect();

        let merged = merge_server_maps(&existing, &incoming);

        let mut expected: Vec<&String> = existing.keys().chain(incoming.keys()).collect();
        expected.sort();
        expected.dedup();
        let mut actual: Vec<&String> = merged.keys().collect();
        actual.sort();
        prop_assert_eq!(actual, expected);
    }
}

#[rstest]
#[case(json!("existing"), json!("incoming"), json!("existing"))]
#[case(json!(1), json!(2), json!(1))]
#[case(json!(false), json!(true), json!(false))]
#[case(json!(null), json!({"a": 1}), json!(null))]
#[case(json!([1]), json!({"a": 1}), json!([1]))]
#[case(json!({"a": 1}), json!([1]), json!({"a": 1}))]
#[case(json!("x"), json!(["x"]), json!("x"))]
fn test_existing_wins_on_scalars_and_mismatches(
    #[case] existing: Value,
    #[case] incoming: Value,
    #[case] expected: Value,
) {
    assert_eq!(append_only(&existing, &incoming), expected);
}

#[rstest]
#[case(json!({"a": [1, 2]}), json!({"a": [2, 3]}), json!({"a": [1, 2, 3]}))]
#[case(json!({"a": 1}), json!({"b": 2}), json!({"a": 1, "b": 2}))]
#[case(json!({"env": {"A": "1"}}), json!({"env": {"A": "2", "B": "3"}}), json!({"env": {"A": "1", "B": "3"}}))]
#[case(json!([{"x": 1, "y": 2}]), json!([{"y": 2, "x": 1}]), json!([{"x": 1, "y": 2}]))]
fn test_documented_merges(#[case] existing: Value, #[case] incoming: Value, #[case] expected: Value) {
    assert_eq!(append_only(&existing, &incoming), expected);
}
