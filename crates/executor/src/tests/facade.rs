//! Pass-through operations: argument forwarding, context elevation,
//! per-operation error exposure and result normalization.

use std::collections::BTreeMap;

use conductor_core::{
    ActionEventValues, AgentBuild, ComputeNode, SecurityGroup, SecurityGroupRule, StoreError,
    Timestamp,
};

use super::{ctx, fixture, obj};
use crate::{Command, ConductorConfig, ErrorKind, Executor, Output, Value};

fn ts(s: &str) -> Timestamp {
    Timestamp::parse_canonical(s).unwrap()
}

fn values(out: Output) -> Vec<Value> {
    match out {
        Output::Values(v) => v,
        other => panic!("expected a sequence, got {:?}", other),
    }
}

// ==================== Migrations ====================

#[test]
fn test_migration_update_and_not_found() {
    let f = fixture();
    let inst = f.store.create_instance("proj", "user");
    let migration = f.store.create_migration(inst.uuid, "migrating");

    let out = f
        .executor
        .execute(
            &ctx(),
            Command::MigrationUpdate {
                migration_id: migration.id,
                status: "finished".into(),
            },
        )
        .unwrap()
        .into_value();
    assert_eq!(out.get("status"), Some(&Value::from("finished")));

    let err = f
        .executor
        .execute(&ctx(), Command::MigrationGet { migration_id: 4242 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_unconfirmed_migrations_filter_on_destination() {
    let f = fixture();
    let inst = f.store.create_instance("proj", "user");
    let mut done = f.store.create_migration(inst.uuid, "finished");
    done.dest_compute = Some("dest".into());
    done.updated_at = Some(ts("2012-01-01T00:00:00.000000"));
    f.store.put_migration(done.clone());
    let mut elsewhere = f.store.create_migration(inst.uuid, "finished");
    elsewhere.dest_compute = Some("other".into());
    elsewhere.updated_at = Some(ts("2012-01-01T00:00:00.000000"));
    f.store.put_migration(elsewhere);

    let out = values(
        f.executor
            .execute(
                &ctx(),
                Command::MigrationGetUnconfirmedByDestCompute {
                    confirm_window_secs: 10,
                    dest_compute: "dest".into(),
                },
            )
            .unwrap(),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get("id"), Some(&Value::Int(done.id)));
}

// ==================== Aggregates ====================

#[test]
fn test_aggregate_host_membership() {
    let f = fixture();
    let agg = f.store.create_aggregate("rack-1", Some("az1"));

    let added = f
        .executor
        .execute(
            &ctx(),
            Command::AggregateHostAdd {
                aggregate_id: agg.id,
                host: "h1".into(),
            },
        )
        .unwrap()
        .into_value();
    assert_eq!(added.get("host"), Some(&Value::from("h1")));

    let err = f
        .executor
        .execute(
            &ctx(),
            Command::AggregateHostAdd {
                aggregate_id: agg.id,
                host: "h1".into(),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let by_host = values(
        f.executor
            .execute(
                &ctx(),
                Command::AggregateGetByHost {
                    host: "h1".into(),
                    key: None,
                },
            )
            .unwrap(),
    );
    assert_eq!(by_host.len(), 1);

    let removed = f
        .executor
        .execute(
            &ctx(),
            Command::AggregateHostDelete {
                aggregate_id: agg.id,
                host: "h1".into(),
            },
        )
        .unwrap();
    assert_eq!(removed, Output::Unit);

    let err = f
        .executor
        .execute(
            &ctx(),
            Command::AggregateHostDelete {
                aggregate_id: agg.id,
                host: "h1".into(),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_aggregate_metadata_set_delete_replaces() {
    let f = fixture();
    let agg = f.store.create_aggregate("rack-1", None);
    let first: BTreeMap<String, String> = [("a", "0"), ("b", "2")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    f.executor
        .execute(
            &ctx(),
            Command::AggregateMetadataAdd {
                aggregate_id: agg.id,
                metadata: first,
                set_delete: false,
            },
        )
        .unwrap();

    let mut second = BTreeMap::new();
    second.insert("a".to_string(), "1".to_string());
    let out = f
        .executor
        .execute(
            &ctx(),
            Command::AggregateMetadataAdd {
                aggregate_id: agg.id,
                metadata: second,
                set_delete: true,
            },
        )
        .unwrap();
    assert_eq!(
        out,
        Output::Value(Value::Object(obj(&[("a", Value::from("1"))])))
    );

    let err = f
        .executor
        .execute(
            &ctx(),
            Command::AggregateMetadataDelete {
                aggregate_id: agg.id,
                key: "b".into(),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_aggregate_get_missing_is_not_found() {
    let f = fixture();
    let err = f
        .executor
        .execute(&ctx(), Command::AggregateGet { aggregate_id: 77 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ==================== Usage ====================

fn bw_update(uuid: &str, bw_in: Option<i64>) -> Command {
    Command::BwUsageUpdate {
        instance_uuid: uuid.to_string(),
        mac: "fa:16:3e:00:00:01".into(),
        start_period: ts("2012-10-29T00:00:00.000000"),
        bw_in,
        bw_out: None,
        last_ctr_in: None,
        last_ctr_out: None,
        last_refreshed: None,
    }
}

#[test]
fn test_bw_usage_without_counters_only_reads() {
    let f = fixture();
    let out = f.executor.execute(&ctx(), bw_update("u-1", None)).unwrap();
    assert_eq!(out, Output::Maybe(None));
    assert_eq!(f.store.write_count(), 0);
}

#[test]
fn test_bw_usage_with_counters_writes_then_reads() {
    let f = fixture();
    let out = f
        .executor
        .execute(&ctx(), bw_update("u-1", Some(100)))
        .unwrap();
    assert_eq!(f.store.write_count(), 1);
    match out {
        Output::Maybe(Some(usage)) => assert_eq!(usage.get("bw_in"), Some(&Value::Int(100))),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_vol_usage_update_then_listing() {
    let f = fixture();
    let inst = f.store.create_instance("proj", "user");
    let out = f
        .executor
        .execute(
            &ctx(),
            Command::VolUsageUpdate {
                volume_id: "vol-1".into(),
                rd_req: 1,
                rd_bytes: 512,
                wr_req: 2,
                wr_bytes: 1024,
                instance_uuid: inst.uuid.to_string(),
                last_refreshed: None,
                update_totals: false,
            },
        )
        .unwrap();
    assert_eq!(out, Output::Unit);

    let listed = values(
        f.executor
            .execute(
                &ctx(),
                Command::VolGetUsageByTime {
                    start_time: ts("2000-01-01T00:00:00.000000"),
                },
            )
            .unwrap(),
    );
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].get("curr_read_bytes"), Some(&Value::Int(512)));
}

// ==================== Network / agents ====================

#[test]
fn test_agent_build_lookup_is_optional() {
    let f = fixture();
    let lookup = || Command::AgentBuildGetByTriple {
        hypervisor: "kvm".into(),
        os: "linux".into(),
        architecture: "x86_64".into(),
    };
    assert_eq!(
        f.executor.execute(&ctx(), lookup()).unwrap(),
        Output::Maybe(None)
    );

    f.store.put_agent_build(AgentBuild {
        id: 1,
        hypervisor: "kvm".into(),
        os: "linux".into(),
        architecture: "x86_64".into(),
        version: "1.0".into(),
        url: "http://agents/kvm".into(),
        md5hash: "d41d8cd98f00b204e9800998ecf8427e".into(),
    });
    match f.executor.execute(&ctx(), lookup()).unwrap() {
        Output::Maybe(Some(build)) => {
            assert_eq!(build.get("url"), Some(&Value::from("http://agents/kvm")))
        }
        other => panic!("unexpected {:?}", other),
    }
}

// ==================== Block devices ====================

fn bdm_values(uuid: &str, device: &str, volume: &str) -> crate::Object {
    obj(&[
        ("instance_uuid", Value::from(uuid)),
        ("device_name", Value::from(device)),
        ("volume_id", Value::from(volume)),
    ])
}

#[test]
fn test_bdm_upsert_keys_on_instance_and_device() {
    let f = fixture();
    let uuid = f.store.create_instance("proj", "user").uuid.to_string();
    for volume in ["vol-1", "vol-2"] {
        let out = f
            .executor
            .execute(
                &ctx(),
                Command::BlockDeviceMappingUpdateOrCreate {
                    values: bdm_values(&uuid, "/dev/vdb", volume),
                    create: None,
                },
            )
            .unwrap();
        assert_eq!(out, Output::Unit);
    }
    let all = f.store.all_block_device_mappings();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].volume_id.as_deref(), Some("vol-2"));

    let listed = values(
        f.executor
            .execute(
                &ctx(),
                Command::BlockDeviceMappingGetAllByInstance {
                    instance_uuid: uuid,
                },
            )
            .unwrap(),
    );
    assert_eq!(listed.len(), 1);
}

#[test]
fn test_bdm_explicit_update_requires_id() {
    let f = fixture();
    let uuid = f.store.create_instance("proj", "user").uuid.to_string();
    let err = f
        .executor
        .execute(
            &ctx(),
            Command::BlockDeviceMappingUpdateOrCreate {
                values: bdm_values(&uuid, "/dev/vdb", "vol-1"),
                create: Some(false),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(f.store.write_count(), 0);
}

#[test]
fn test_bdm_destroy_shapes() {
    let f = fixture();
    let uuid = f.store.create_instance("proj", "user").uuid.to_string();
    for (device, volume) in [("/dev/vdb", "vol-1"), ("/dev/vdc", "vol-2"), ("/dev/vdd", "vol-3")] {
        f.executor
            .execute(
                &ctx(),
                Command::BlockDeviceMappingUpdateOrCreate {
                    values: bdm_values(&uuid, device, volume),
                    create: Some(true),
                },
            )
            .unwrap();
    }
    let ids: Vec<i64> = f
        .store
        .all_block_device_mappings()
        .iter()
        .map(|b| b.id)
        .collect();

    f.executor
        .execute(
            &ctx(),
            Command::BlockDeviceMappingDestroy {
                bdms: Some(vec![ids[0]]),
                instance_uuid: None,
                volume_id: None,
                device_name: None,
            },
        )
        .unwrap();
    f.executor
        .execute(
            &ctx(),
            Command::BlockDeviceMappingDestroy {
                bdms: None,
                instance_uuid: Some(uuid.clone()),
                volume_id: Some("vol-2".into()),
                device_name: None,
            },
        )
        .unwrap();
    f.executor
        .execute(
            &ctx(),
            Command::BlockDeviceMappingDestroy {
                bdms: None,
                instance_uuid: Some(uuid.clone()),
                volume_id: None,
                device_name: Some("/dev/vdd".into()),
            },
        )
        .unwrap();
    assert!(f.store.all_block_device_mappings().is_empty());
}

#[test]
fn test_bdm_destroy_ambiguous_selector_touches_nothing() {
    let f = fixture();
    let writes_before = f.store.write_count();
    let err = f
        .executor
        .execute(
            &ctx(),
            Command::BlockDeviceMappingDestroy {
                bdms: Some(vec![1]),
                instance_uuid: Some("u".into()),
                volume_id: Some("v".into()),
                device_name: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.reason(), "invalid block_device_mapping_destroy invocation");
    assert_eq!(f.store.write_count(), writes_before);
}

// ==================== Services ====================

fn node(service_id: i64) -> ComputeNode {
    ComputeNode {
        id: 900,
        service_id,
        hypervisor_hostname: "h1.example".into(),
        hypervisor_type: "kvm".into(),
        vcpus: 16,
        memory_mb: 65536,
        local_gb: 1000,
        vcpus_used: 2,
        memory_mb_used: 4096,
        local_gb_used: 40,
    }
}

fn services(f: &super::Fixture, topic: Option<&str>, host: Option<&str>) -> Vec<Value> {
    values(
        f.executor
            .execute(
                &ctx(),
                Command::ServiceGetAllBy {
                    topic: topic.map(str::to_string),
                    host: host.map(str::to_string),
                },
            )
            .unwrap(),
    )
}

#[test]
fn test_service_lookup_shapes() {
    let f = fixture();
    let compute = f.store.create_service("h1", "nova-compute", "compute");
    f.store.put_compute_node(node(compute.id));
    f.store.create_service("h1", "nova-network", "network");
    f.store.create_service("h2", "nova-compute", "compute");

    assert_eq!(services(&f, None, None).len(), 3);
    assert_eq!(services(&f, None, Some("h1")).len(), 2);
    assert_eq!(services(&f, Some("compute"), None).len(), 2);

    let joined = services(&f, Some("compute"), Some("h1"));
    assert_eq!(joined.len(), 1);
    assert!(joined[0].get("compute_node").is_some());

    let single = services(&f, Some("network"), Some("h1"));
    assert_eq!(single.len(), 1);
    assert!(single[0].get("compute_node").is_none());

    assert!(services(&f, Some("scheduler"), Some("h1")).is_empty());
}

#[test]
fn test_service_empty_strings_mean_absent() {
    let f = fixture();
    f.store.create_service("h1", "nova-compute", "compute");
    assert_eq!(services(&f, Some(""), Some("")).len(), 1);
}

// ==================== Actions ====================

#[test]
fn test_action_event_lifecycle() {
    let f = fixture();
    let inst = f.store.create_instance("proj", "user");
    let action = f.store.action_start(&ctx(), "reboot", inst.uuid, "req-1");
    let event_values = |result: Option<&str>| ActionEventValues {
        event: "compute_reboot_instance".into(),
        request_id: "req-1".into(),
        instance_uuid: inst.uuid,
        start_time: None,
        finish_time: None,
        result: result.map(str::to_string),
        traceback: None,
    };

    let started = f
        .executor
        .execute(
            &ctx(),
            Command::ActionEventStart {
                values: event_values(None),
            },
        )
        .unwrap()
        .into_value();
    assert_eq!(started.get("action_id"), Some(&Value::Int(action.id)));

    let finished = f
        .executor
        .execute(
            &ctx(),
            Command::ActionEventFinish {
                values: event_values(Some("Error")),
            },
        )
        .unwrap()
        .into_value();
    assert_eq!(finished.get("result"), Some(&Value::from("Error")));
    assert_eq!(
        f.store.action(action.id).and_then(|a| a.message).as_deref(),
        Some("Error")
    );
    assert_eq!(f.store.action_events(action.id).len(), 1);
}

#[test]
fn test_action_event_without_action_is_internal() {
    let f = fixture();
    let inst = f.store.create_instance("proj", "user");
    let err = f
        .executor
        .execute(
            &ctx(),
            Command::ActionEventStart {
                values: ActionEventValues {
                    event: "compute_stop_instance".into(),
                    request_id: "req-unknown".into(),
                    instance_uuid: inst.uuid,
                    start_time: None,
                    finish_time: None,
                    result: None,
                    traceback: None,
                },
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

// ==================== Failure exposure ====================

#[test]
fn test_undeclared_failure_hides_detail_kind() {
    let f = fixture();
    f.store.inject_fault(
        "provider_fw_rule_get_all",
        StoreError::InstanceNotFound {
            instance: "x".into(),
        },
    );
    let err = f
        .executor
        .execute(&ctx(), Command::ProviderFwRuleGetAll)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.reason().starts_with("provider_fw_rule_get_all failed"));

    // Faults fire once.
    assert_eq!(
        f.executor
            .execute(&ctx(), Command::ProviderFwRuleGetAll)
            .unwrap(),
        Output::Values(vec![])
    );
}

#[test]
fn test_declared_failure_keeps_its_kind() {
    let f = fixture();
    f.store.inject_fault(
        "migration_get",
        StoreError::MigrationNotFound { migration_id: 3 },
    );
    let err = f
        .executor
        .execute(&ctx(), Command::MigrationGet { migration_id: 3 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ==================== Plumbing ====================

#[test]
fn test_ping_echoes_argument() {
    let f = fixture();
    let arg = Value::Object(obj(&[("n", Value::Int(1))]));
    let out = f
        .executor
        .execute(&ctx(), Command::Ping { arg: arg.clone() })
        .unwrap()
        .into_value();
    assert_eq!(
        out,
        Value::Object(obj(&[
            ("arg", arg),
            ("service", Value::from("conductor")),
        ]))
    );
}

#[test]
fn test_backdoor_port_comes_from_config() {
    let f = fixture();
    assert_eq!(
        f.executor.execute(&ctx(), Command::GetBackdoorPort).unwrap(),
        Output::Maybe(None)
    );

    let executor = Executor::new(f.store.clone()).with_config(ConductorConfig {
        backdoor_port: Some(4444),
        ..ConductorConfig::default()
    });
    assert_eq!(
        executor.execute(&ctx(), Command::GetBackdoorPort).unwrap(),
        Output::Maybe(Some(Value::Int(4444)))
    );
}

// ==================== Windows and security groups ====================

#[test]
fn test_active_by_window_bounds() {
    let f = fixture();
    let mut early = f.store.create_instance("proj", "user");
    early.launched_at = Some(ts("2012-01-01T00:00:00.000000"));
    early.terminated_at = Some(ts("2012-02-01T00:00:00.000000"));
    early.host = Some("h1".into());
    f.store.put_instance(early);
    let mut running = f.store.create_instance("proj", "user");
    running.launched_at = Some(ts("2012-03-01T00:00:00.000000"));
    running.host = Some("h2".into());
    f.store.put_instance(running.clone());

    let window = |begin: &str, end: Option<&str>, host: Option<&str>| {
        values(
            f.executor
                .execute(
                    &ctx(),
                    Command::InstanceGetActiveByWindow {
                        begin: ts(begin),
                        end: end.map(ts),
                        project_id: None,
                        host: host.map(str::to_string),
                    },
                )
                .unwrap(),
        )
    };

    assert_eq!(window("2012-01-15T00:00:00.000000", None, None).len(), 2);
    let after = window("2012-02-15T00:00:00.000000", None, None);
    assert_eq!(after.len(), 1);
    assert_eq!(
        after[0].get("uuid"),
        Some(&Value::from(running.uuid.to_string()))
    );
    assert!(window(
        "2012-01-15T00:00:00.000000",
        Some("2012-01-20T00:00:00.000000"),
        Some("h2")
    )
    .is_empty());
}

#[test]
fn test_security_groups_by_instance_and_rules() {
    let f = fixture();
    let rule = SecurityGroupRule {
        id: 1,
        parent_group_id: 7,
        protocol: Some("tcp".into()),
        from_port: Some(22),
        to_port: Some(22),
        cidr: Some("0.0.0.0/0".into()),
        group_id: None,
    };
    f.store.put_security_group(SecurityGroup {
        id: 7,
        name: "ssh".into(),
        description: "ssh in".into(),
        user_id: "user".into(),
        project_id: "proj".into(),
        instance_ids: vec![3],
        rules: vec![rule],
    });

    let groups = values(
        f.executor
            .execute(&ctx(), Command::SecurityGroupGetByInstance { instance_id: 3 })
            .unwrap(),
    );
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].get("name"), Some(&Value::from("ssh")));

    let none = values(
        f.executor
            .execute(&ctx(), Command::SecurityGroupGetByInstance { instance_id: 4 })
            .unwrap(),
    );
    assert!(none.is_empty());

    let rules = values(
        f.executor
            .execute(
                &ctx(),
                Command::SecurityGroupRuleGetBySecurityGroup {
                    security_group_id: 7,
                },
            )
            .unwrap(),
    );
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].get("from_port"), Some(&Value::Int(22)));
    assert_eq!(f.store.write_count(), 0);
}
