//! Wire format tests for commands, requests, outputs and errors.

use crate::{Command, Error, Output, Request, RpcVersion, SortDir, Value};

#[test]
fn test_request_decodes_from_json() {
    let json = r#"{
        "version": "1.24",
        "context": {"user_id": "u", "project_id": "p"},
        "command": {"InstanceGet": {"instance_id": 3}}
    }"#;
    let request: Request = serde_json::from_str(json).unwrap();
    assert_eq!(request.version, RpcVersion::new(1, 24));
    assert!(!request.context.is_admin);
    assert_eq!(request.command, Command::InstanceGet { instance_id: 3 });
}

#[test]
fn test_unit_command_is_a_bare_string() {
    let json = serde_json::to_string(&Command::InstanceGetAll).unwrap();
    assert_eq!(json, "\"InstanceGetAll\"");
}

#[test]
fn test_unknown_argument_rejected() {
    let json = r#"{"MigrationGet": {"migration_id": 1, "elevated": true}}"#;
    assert!(serde_json::from_str::<Command>(json).is_err());
}

#[test]
fn test_optional_arguments_default() {
    let json = r#"{"InstanceGetAllByFilters": {"sort_key": "created_at"}}"#;
    match serde_json::from_str::<Command>(json).unwrap() {
        Command::InstanceGetAllByFilters {
            filters, sort_dir, ..
        } => {
            assert!(filters.is_empty());
            assert_eq!(sort_dir, SortDir::Desc);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_malformed_timestamp_rejected_at_decode() {
    let json = r#"{"VolGetUsageByTime": {"start_time": "last tuesday"}}"#;
    assert!(serde_json::from_str::<Command>(json).is_err());
}

#[test]
fn test_command_round_trip() {
    let cmd = Command::BlockDeviceMappingDestroy {
        bdms: None,
        instance_uuid: Some("u".into()),
        volume_id: Some("v".into()),
        device_name: None,
    };
    let json = serde_json::to_string(&cmd).unwrap();
    assert_eq!(serde_json::from_str::<Command>(&json).unwrap(), cmd);
}

#[test]
fn test_output_and_error_encode_with_kind_tags() {
    let out = serde_json::to_value(Output::Maybe(Some(Value::Int(4444)))).unwrap();
    assert_eq!(out, serde_json::json!({"Maybe": 4444}));

    let err = serde_json::to_value(Error::NotFound {
        reason: "gone".into(),
    })
    .unwrap();
    assert_eq!(err, serde_json::json!({"NotFound": {"reason": "gone"}}));
}
