//! Properties that hold for all inputs.

use std::collections::BTreeMap;

use conductor::{to_primitive, InstanceField, Operation, StoreError, Timestamp};
use proptest::prelude::*;

use crate::common::*;

fn update(uuid: &str, updates: Object) -> Command {
    Command::InstanceUpdate {
        instance_uuid: uuid.to_string(),
        updates,
    }
}

fn allowed_key() -> impl Strategy<Value = String> {
    prop::sample::select(InstanceField::ALL.to_vec()).prop_map(|f| f.as_str().to_string())
}

fn disallowed_key() -> impl Strategy<Value = String> {
    "[a-z_]{1,24}".prop_filter("must be outside the whitelist", |k| {
        InstanceField::from_name(k).is_none()
    })
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

fn canonical_timestamp() -> impl Strategy<Value = String> {
    (1970i32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60, 0u32..1_000_000).prop_map(
        |(y, mo, d, h, mi, s, us)| {
            format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06}",
                y, mo, d, h, mi, s, us
            )
        },
    )
}

fn metadata() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-f]", "[0-9]{1,3}", 0..6)
}

/// A lookup command and the store method it reaches first.
fn probe(op: Operation) -> (Command, &'static str) {
    match op {
        Operation::InstanceGet => (Command::InstanceGet { instance_id: 1 }, "instance_get"),
        Operation::MigrationGet => (Command::MigrationGet { migration_id: 1 }, "migration_get"),
        Operation::AggregateGet => (Command::AggregateGet { aggregate_id: 1 }, "aggregate_get"),
        Operation::InstanceGetAll => (Command::InstanceGetAll, "instance_get_all"),
        _ => (Command::ProviderFwRuleGetAll, "provider_fw_rule_get_all"),
    }
}

fn store_error() -> impl Strategy<Value = StoreError> {
    prop_oneof![
        Just(StoreError::InstanceNotFound {
            instance: "1".into()
        }),
        Just(StoreError::MigrationNotFound { migration_id: 1 }),
        Just(StoreError::AggregateNotFound { aggregate_id: 1 }),
        Just(StoreError::InvalidUuid { uuid: "x".into() }),
        Just(StoreError::AdminRequired),
        Just(StoreError::not_implemented("lookup")),
        Just(StoreError::invalid("bad column")),
        Just(StoreError::internal("connection reset")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn disallowed_key_rejects_whole_update(
        good in prop::collection::btree_map(allowed_key(), scalar(), 0..4),
        bad in disallowed_key(),
        bad_value in scalar(),
    ) {
        let t = TestConductor::new();
        let uuid = t.instance();
        let mut updates: Object = good.into_iter().collect();
        updates.insert(bad, bad_value);

        let err = t.run(update(&uuid, updates)).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        prop_assert_eq!(t.store.write_count(), 0);
        prop_assert!(t.notifier.is_empty());
    }

    #[test]
    fn temporal_update_round_trips_canonical_string(ts in canonical_timestamp()) {
        let t = TestConductor::new();
        let uuid = t.instance();
        let out = t
            .run(update(&uuid, obj([("launched_at".to_string(), Value::String(ts.clone()))])))
            .unwrap();
        let updated = expect_value(out);
        prop_assert_eq!(updated.get("launched_at"), Some(&Value::String(ts)));
    }

    #[test]
    fn bandwidth_without_counters_is_read_only(bw_in in 0i64..1_000_000, bw_out in 0i64..1_000_000) {
        let t = TestConductor::new();
        let start = Timestamp::parse_canonical("2012-10-29T00:00:00.000000").unwrap();
        let cmd = |bw_in: Option<i64>, bw_out: Option<i64>| Command::BwUsageUpdate {
            instance_uuid: "u-1".into(),
            mac: "fa:16:3e:00:00:01".into(),
            start_period: start,
            bw_in,
            bw_out,
            last_ctr_in: None,
            last_ctr_out: None,
            last_refreshed: None,
        };
        let written = t.run(cmd(Some(bw_in), Some(bw_out))).unwrap();
        let writes = t.store.write_count();

        let read = t.run(cmd(None, None)).unwrap();
        prop_assert_eq!(t.store.write_count(), writes);
        prop_assert_eq!(read, written);
    }

    #[test]
    fn metadata_replace_leaves_exactly_the_given_keys(
        initial in metadata(),
        replacement in metadata(),
    ) {
        let t = TestConductor::new();
        let agg = t.store.create_aggregate("rack", None);
        t.run(Command::AggregateMetadataAdd {
            aggregate_id: agg.id,
            metadata: initial,
            set_delete: false,
        })
        .unwrap();

        let out = t
            .run(Command::AggregateMetadataAdd {
                aggregate_id: agg.id,
                metadata: replacement.clone(),
                set_delete: true,
            })
            .unwrap();
        let expected: Object = replacement
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        prop_assert_eq!(expect_value(out), Value::Object(expected));
    }

    #[test]
    fn destroy_needs_exactly_one_selector_shape(
        by_ids in any::<bool>(),
        with_instance in any::<bool>(),
        with_volume in any::<bool>(),
        with_device in any::<bool>(),
    ) {
        let t = TestConductor::new();
        let uuid = t.instance();
        for (device, volume) in [("/dev/vdb", "vol-1"), ("/dev/vdc", "vol-2")] {
            t.run(Command::BlockDeviceMappingUpdateOrCreate {
                values: obj([
                    ("instance_uuid".to_string(), Value::from(uuid.as_str())),
                    ("device_name".to_string(), Value::from(device)),
                    ("volume_id".to_string(), Value::from(volume)),
                ]),
                create: Some(true),
            })
            .unwrap();
        }
        let before = t.store.all_block_device_mappings();

        let result = t.run(Command::BlockDeviceMappingDestroy {
            bdms: by_ids.then(|| vec![before[0].id]),
            instance_uuid: with_instance.then(|| uuid.clone()),
            volume_id: with_volume.then(|| "vol-1".to_string()),
            device_name: with_device.then(|| "/dev/vdb".to_string()),
        });
        let shapes = [
            by_ids && !with_instance && !with_volume && !with_device,
            !by_ids && with_instance && with_volume && !with_device,
            !by_ids && with_instance && !with_volume && with_device,
        ];
        let after = t.store.all_block_device_mappings();
        if shapes.iter().any(|s| *s) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(after.len(), 1);
            prop_assert_eq!(after[0].id, before[1].id);
        } else {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
            prop_assert_eq!(after, before);
        }
    }

    #[test]
    fn undeclared_failures_are_internal(
        op in prop::sample::select(vec![
            Operation::InstanceGet,
            Operation::MigrationGet,
            Operation::AggregateGet,
            Operation::InstanceGetAll,
            Operation::ProviderFwRuleGetAll,
        ]),
        err in store_error(),
    ) {
        let t = TestConductor::new();
        let (cmd, method) = probe(op);
        let declared = op.allowed_failures().contains(&err.kind());
        t.store.inject_fault(method, err);

        let result = t.run(cmd);
        let observed = match result {
            Ok(out) => return Err(TestCaseError::fail(format!("succeeded with {:?}", out))),
            Err(e) => e.kind(),
        };
        if declared {
            prop_assert_eq!(observed, ErrorKind::NotFound);
        } else {
            prop_assert_eq!(observed, ErrorKind::Internal);
        }
    }
}

#[test]
fn normalizer_is_idempotent() {
    let t = TestConductor::new();
    let instance = t.store.create_instance("proj", "user");
    let once = to_primitive(&instance).unwrap();
    let twice = to_primitive(&once).unwrap();
    assert_eq!(once, twice);
}
