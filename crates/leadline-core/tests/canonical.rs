use leadline_core::canonical::{stable_json_bytes, stable_json_hash_hex};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn stable_json_sorts_nested_keys() {
    let value = json!({"b": {"y": 1, "x": 2}, "a": [{"d": 1, "c": 2}]});
    let bytes = stable_json_bytes(&value).expect("stable json");
    assert_eq!(
        String::from_utf8(bytes).expect("utf8"),
        r#"{"a":[{"c":2,"d":1}],"b":{"x":2,"y":1}}"#
    );
}

#[test]
fn stable_hash_ignores_field_order() {
    let left = json!({"first": "Jane", "last": "Doe"});
    let right = json!({"last": "Doe", "first": "Jane"});
    assert_eq!(
        stable_json_hash_hex(&left).expect("hash"),
        stable_json_hash_hex(&right).expect("hash")
    );
}

proptest! {
    #[test]
    fn stable_hash_is_deterministic(
        keys in proptest::collection::btree_map("[a-z]{1,8}", 0u32..1000, 0..12)
    ) {
        let value = serde_json::to_value(&keys).expect("value");
        let a = stable_json_hash_hex(&value).expect("hash");
        let b = stable_json_hash_hex(&value).expect("hash");
        prop_assert_eq!(a.len(), 64);
        prop_assert_eq!(a, b);
    }
}
