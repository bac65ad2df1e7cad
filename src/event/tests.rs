use serde_json::json;

use super::*;
use crate::wire::WireKind;

#[test]
fn parameter_update() {
    let e = PushEvent::from_json(&json!({
        "id": "namespace='scan' parameter_group='timing' param_type='float'",
        "value": 2.5,
    }))
    .unwrap();
    assert_eq!(
        e,
        PushEvent::Parameter(ParameterUpdate {
            id: "namespace='scan' parameter_group='timing' param_type='float'".into(),
            value: ParamValue::Number(2.5),
        })
    );
}

#[test]
fn tree_update() {
    let e = PushEvent::from_json(&json!({
        "data": {
            "full_access_path": "devices.shutter.open",
            "value": {
                "type": "bool",
                "value": true,
                "full_access_path": "devices.shutter.open",
                "doc": null,
                "readonly": false,
            },
        },
    }))
    .unwrap();
    let PushEvent::Tree { data } = e else {
        panic!("expected tree update");
    };
    assert_eq!(data.full_access_path, "devices.shutter.open");
    assert_eq!(data.value.kind, WireKind::Bool(true));
}

#[test]
fn unrecognised_shape() {
    assert!(PushEvent::from_json(&json!({"something": "else"})).is_err());
}
