use std::rc::Rc;

use serde_json::{json, Value};

use super::*;
use crate::decode::{decode, Decoded};

fn tree(value: Value) -> WireMap {
    serde_json::from_value(value).unwrap()
}

fn int(path: &str, v: i64) -> WireValue {
    WireValue::new(path, WireKind::Int(v))
}

fn sample() -> WireMap {
    tree(json!({
        "a": {
            "type": "dict",
            "value": {
                "x": {"type": "int", "value": 1, "full_access_path": "a[\"x\"]"},
                "items": {
                    "type": "list",
                    "value": [
                        {"type": "int", "value": 10, "full_access_path": "a[\"items\"][0]"},
                        {"type": "int", "value": 11, "full_access_path": "a[\"items\"][1]"},
                    ],
                },
            },
            "full_access_path": "a",
        },
        "b": {
            "type": "DataService",
            "name": "Other",
            "value": {
                "y": {"type": "str", "value": "untouched", "full_access_path": "b.y"},
            },
            "full_access_path": "b",
        },
    }))
}

#[test]
fn get_nested() {
    let root = sample();
    assert_eq!(get_at_path(&root, r#"a["x"]"#).unwrap().kind, WireKind::Int(1));
    assert_eq!(get_at_path(&root, "a.items[1]").unwrap().kind, WireKind::Int(11));
    assert_eq!(
        get_at_path(&root, "b.y").unwrap().kind,
        WireKind::Str("untouched".into())
    );
}

#[test]
fn set_shares_untouched_subtrees() {
    let root = sample();
    let new = set_at_path(&root, "a.x", int("a.x", 42)).unwrap();

    assert!(Rc::ptr_eq(&root["b"], &new["b"]));
    assert!(!Rc::ptr_eq(&root["a"], &new["a"]));
    let old_items = get_at_path(&root, "a.items").unwrap();
    let new_items = get_at_path(&new, "a.items").unwrap();
    assert!(Rc::ptr_eq(old_items, new_items));

    assert_eq!(**get_at_path(&new, "a.x").unwrap(), int("a.x", 42));
    assert_eq!(get_at_path(&root, "a.x").unwrap().kind, WireKind::Int(1));
    assert_eq!(root, sample());
}

#[test]
fn set_replaces_every_field() {
    let root = sample();
    let mut value = WireValue::new("b.y", WireKind::Bool(true));
    value.readonly = true;
    value.doc = Some("now a flag".into());
    let new = set_at_path(&root, "b.y", value.clone()).unwrap();
    assert_eq!(**get_at_path(&new, "b.y").unwrap(), value);
}

#[test]
fn set_creates_missing_terminal_key() {
    let root = sample();
    let new = set_at_path(&root, "b.z", int("b.z", 3)).unwrap();
    assert_eq!(get_at_path(&new, "b.z").unwrap().kind, WireKind::Int(3));
    assert!(get_at_path(&root, "b.z").is_err());
}

#[test]
fn set_appends_at_sequence_end() {
    let root = sample();
    let new = set_at_path(&root, "a.items[2]", int("a.items[2]", 12)).unwrap();
    let Decoded::List(items) = decode(get_at_path(&new, "a.items").unwrap()) else {
        panic!("expected list");
    };
    assert_eq!(items, [Decoded::Int(10), Decoded::Int(11), Decoded::Int(12)]);
}

#[test]
fn set_past_append_position_overflows() {
    let root = sample();
    let err = set_at_path(&root, "a.items[3]", int("", 0)).unwrap_err();
    assert_eq!(
        err,
        PatchError::CreationOverflow {
            path: "a.items[3]".into(),
            index: 3,
            len: 2,
        }
    );
    assert_eq!(root, sample());
}

#[test]
fn set_missing_prefix_fails_without_touching_input() {
    let root = sample();
    let err = set_at_path(&root, "missing.x", int("", 0)).unwrap_err();
    assert_eq!(
        err,
        PatchError::Resolution {
            path: "missing.x".into(),
            segment: ".missing".into(),
            position: 0,
            failure: ResolutionFailure::KeyNotFound,
        }
    );
    assert_eq!(root, sample());
    assert_eq!(Rc::strong_count(&root["a"]), 1);
}

#[test]
fn set_nonterminal_index_out_of_bounds() {
    let root = sample();
    let err = set_at_path(&root, "a.items[2].deep", int("", 0)).unwrap_err();
    assert!(matches!(
        err,
        PatchError::Resolution {
            position: 2,
            failure: ResolutionFailure::IndexOutOfBounds { len: 2 },
            ..
        }
    ));
}

#[test]
fn set_through_leaf_fails() {
    let root = sample();
    let err = set_at_path(&root, "a.x.deeper", int("", 0)).unwrap_err();
    assert_eq!(
        err,
        PatchError::Resolution {
            path: "a.x.deeper".into(),
            segment: ".x".into(),
            position: 1,
            failure: ResolutionFailure::NotAContainer { tag: "int".into() },
        }
    );
    assert_eq!(root, sample());
}

#[test]
fn empty_path_is_rejected() {
    let root = sample();
    assert_eq!(
        set_at_path(&root, "", int("", 0)).unwrap_err(),
        PatchError::EmptyPath
    );
    assert_eq!(get_at_path(&root, "..").unwrap_err(), PatchError::EmptyPath);
}

#[test]
fn top_level_key_can_be_created() {
    let root = WireMap::new();
    let new = set_at_path(&root, "counter", int("counter", 1)).unwrap();
    assert_eq!(new.len(), 1);
    assert!(root.is_empty());
}

#[test]
fn tree_update_applies_pushed_value() {
    let root = sample();
    let update = TreeUpdate {
        full_access_path: "a.items[0]".into(),
        value: int("a.items[0]", -1),
    };
    let new = apply_tree_update(&root, &update).unwrap();
    assert_eq!(decode(get_at_path(&new, "a.items[0]").unwrap()), Decoded::Int(-1));
}

#[test]
fn error_message_names_segment() {
    let root = sample();
    let err = get_at_path(&root, r#"b["nope"]"#).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"cannot resolve `.nope` (segment 1) in `b["nope"]`: key not found"#
    );
}
