//! Requests decoded from JSON and served end to end.

use conductor::{Error, Request};
use serde_json::json;
use uuid::Uuid;

use crate::common::*;

fn serve(t: &TestConductor, request: serde_json::Value) -> Result<serde_json::Value, Error> {
    let request: Request = serde_json::from_value(request).unwrap();
    let output = t.executor.handle(request)?;
    Ok(serde_json::to_value(output.into_value()).unwrap())
}

#[test]
fn update_over_the_wire_returns_primitive_instance() {
    let t = TestConductor::new();
    let uuid = t.instance();

    let reply = serve(
        &t,
        json!({
            "version": "1.0",
            "context": {"user_id": "user", "project_id": "proj", "request_id": "req-9"},
            "command": {"InstanceUpdate": {
                "instance_uuid": uuid,
                "updates": {"Task_State": "spawning", "terminated_at": null}
            }}
        }),
    )
    .unwrap();

    assert_eq!(reply["uuid"], json!(uuid));
    assert_eq!(reply["task_state"], json!("spawning"));
    assert_eq!(reply["terminated_at"], json!(null));
    assert!(reply["created_at"].is_string());
    assert_eq!(t.notifier.len(), 1);
}

#[test]
fn update_of_unknown_instance_is_not_found_and_writes_nothing() {
    let t = TestConductor::new();
    t.instance();
    let err = serve(
        &t,
        json!({
            "version": "1.26",
            "context": {"user_id": "user", "project_id": "proj"},
            "command": {"InstanceUpdate": {
                "instance_uuid": Uuid::new_v4().to_string(),
                "updates": {"task_state": "spawning"}
            }}
        }),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "{:?}", err);
    assert_eq!(t.store.write_count(), 0);
    assert!(t.notifier.is_empty());
}

#[test]
fn version_too_old_for_operation_is_typed_failure() {
    let t = TestConductor::new();
    let err = serve(
        &t,
        json!({
            "version": "1.23",
            "context": {"user_id": "user", "project_id": "proj"},
            "command": {"InstanceGet": {"instance_id": 1}}
        }),
    )
    .unwrap_err();
    let encoded = serde_json::to_value(&err).unwrap();
    assert!(encoded.get("NotImplemented").is_some(), "{}", encoded);
}

#[test]
fn admin_context_travels_to_the_store() {
    let t = TestConductor::new();
    let foreign = t.store.create_instance("elsewhere", "someone");
    let request = |is_admin: bool| {
        json!({
            "version": "1.26",
            "context": {"user_id": "user", "project_id": "proj", "is_admin": is_admin},
            "command": {"InstanceGet": {"instance_id": foreign.id}}
        })
    };

    let err = serve(&t, request(false)).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let reply = serve(&t, request(true)).unwrap();
    assert_eq!(reply["project_id"], json!("elsewhere"));
}

#[test]
fn service_listing_is_a_json_array() {
    let t = TestConductor::new();
    t.store.create_service("h1", "nova-compute", "compute");
    t.store.create_service("h1", "nova-network", "network");

    let reply = serve(
        &t,
        json!({
            "version": "1.21",
            "context": {"user_id": "user", "project_id": "proj"},
            "command": {"ServiceGetAllBy": {"host": "h1"}}
        }),
    )
    .unwrap();
    let services = reply.as_array().unwrap();
    assert_eq!(services.len(), 2);
    assert!(services.iter().all(|s| s["host"] == json!("h1")));
}

#[test]
fn ping_round_trips_arbitrary_payload() {
    let t = TestConductor::new();
    let payload = json!({"nested": [1, "two", {"three": 3.5}], "flag": true});
    let reply = serve(
        &t,
        json!({
            "version": "1.22",
            "context": {"user_id": "user", "project_id": "proj"},
            "command": {"Ping": {"arg": payload}}
        }),
    )
    .unwrap();
    assert_eq!(reply, json!({"service": "conductor", "arg": payload}));
}
