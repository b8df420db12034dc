//! Contract version negotiation.

use super::{ctx, fixture, obj};
use crate::{Command, ConductorConfig, ErrorKind, Operation, Request, RpcVersion, Value};

fn request(version: RpcVersion, command: Command) -> Request {
    Request {
        version,
        context: ctx(),
        command,
    }
}

#[test]
fn test_operation_newer_than_caller_is_refused_without_store_access() {
    let f = fixture();
    let inst = f.store.create_instance("proj", "user");
    let err = f
        .executor
        .handle(request(
            RpcVersion::new(1, 25),
            Command::InstanceInfoCacheUpdate {
                instance_uuid: inst.uuid.to_string(),
                values: obj(&[("network_info", Value::Array(vec![]))]),
            },
        ))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
    assert_eq!(f.store.write_count(), 0);
}

#[test]
fn test_caller_at_introducing_version_is_served() {
    let f = fixture();
    let out = f
        .executor
        .handle(request(
            RpcVersion::new(1, 22),
            Command::Ping {
                arg: Value::from("x"),
            },
        ))
        .unwrap();
    assert_eq!(out.into_value().get("arg"), Some(&Value::from("x")));
}

#[test]
fn test_old_caller_still_reaches_old_operations() {
    let f = fixture();
    let inst = f.store.create_instance("proj", "user");
    let out = f.executor.handle(request(
        RpcVersion::new(1, 0),
        Command::InstanceUpdate {
            instance_uuid: inst.uuid.to_string(),
            updates: obj(&[("progress", Value::Int(40))]),
        },
    ));
    assert!(out.is_ok());
}

#[test]
fn test_caller_newer_than_cap_is_refused() {
    let f = fixture();
    let err = f
        .executor
        .handle(request(
            RpcVersion::new(1, 27),
            Command::Ping { arg: Value::Null },
        ))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
}

#[test]
fn test_other_major_is_refused() {
    let f = fixture();
    for version in [RpcVersion::new(0, 26), RpcVersion::new(2, 0)] {
        let err = f
            .executor
            .handle(request(version, Command::Ping { arg: Value::Null }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }
}

#[test]
fn test_lowered_cap_hides_newer_operations() {
    let f = fixture();
    let executor = f.executor.with_config(ConductorConfig {
        version_cap: RpcVersion::new(1, 21),
        backdoor_port: None,
    });

    let err = executor
        .execute(&ctx(), Command::Ping { arg: Value::Null })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);

    let out = executor.execute(
        &ctx(),
        Command::ServiceGetAllBy {
            topic: None,
            host: None,
        },
    );
    assert!(out.is_ok());
}

#[test]
fn test_negotiate_every_operation_at_current() {
    let f = fixture();
    for op in Operation::ALL {
        assert!(f.executor.negotiate(RpcVersion::CURRENT, op).is_ok(), "{}", op);
    }
}
