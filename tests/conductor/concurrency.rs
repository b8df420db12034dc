//! Many callers against one executor.
//!
//! The executor adds no locking of its own; these tests check that the
//! store's per-operation atomicity shows through the facade.

use std::collections::BTreeSet;
use std::thread;

use crate::common::*;

const THREADS: i64 = 8;

#[test]
fn concurrent_updates_each_see_a_distinct_prior_state() {
    let t = TestConductor::new();
    let uuid = t.instance();

    thread::scope(|s| {
        for i in 1..=THREADS {
            let t = &t;
            let uuid = uuid.as_str();
            s.spawn(move || {
                let updates = obj([("progress".to_string(), Value::Int(i))]);
                t.run(Command::InstanceUpdate {
                    instance_uuid: uuid.to_string(),
                    updates,
                })
                .unwrap();
            });
        }
    });

    let events = t.notifier.events();
    assert_eq!(events.len(), THREADS as usize);

    // Every write saw the state left by exactly one other write (or the
    // initial state), so the old values form a chain through the new ones.
    let olds: BTreeSet<i64> = events.iter().map(|(old, _)| old.progress).collect();
    let news: BTreeSet<i64> = events.iter().map(|(_, new)| new.progress).collect();
    assert_eq!(olds.len(), THREADS as usize);
    assert_eq!(news, (1..=THREADS).collect::<BTreeSet<_>>());

    let last = expect_value(
        t.run(Command::InstanceGetByUuid {
            instance_uuid: uuid.clone(),
        })
        .unwrap(),
    );
    let last = last.get("progress").and_then(Value::as_int).unwrap();
    let mut expected_olds: BTreeSet<i64> = news.clone();
    expected_olds.remove(&last);
    expected_olds.insert(0);
    assert_eq!(olds, expected_olds);
}

#[test]
fn concurrent_membership_adds_admit_exactly_one() {
    let t = TestConductor::new();
    let agg = t.store.create_aggregate("rack", None);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let t = &t;
                s.spawn(move || {
                    t.run(Command::AggregateHostAdd {
                        aggregate_id: agg.id,
                        host: "h1".into(),
                    })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind() == ErrorKind::Conflict));
}

#[test]
fn execute_many_from_several_threads() {
    let t = TestConductor::new();
    let agg = t.store.create_aggregate("rack", None);

    thread::scope(|s| {
        for i in 0..THREADS {
            let t = &t;
            s.spawn(move || {
                let results = t.executor.execute_many(
                    &ctx(),
                    vec![
                        Command::AggregateGet {
                            aggregate_id: agg.id,
                        },
                        Command::AggregateHostAdd {
                            aggregate_id: agg.id,
                            host: format!("h{}", i),
                        },
                        Command::AggregateGet { aggregate_id: -1 },
                    ],
                );
                assert!(results[0].is_ok());
                assert!(results[1].is_ok());
                assert_eq!(results[2].as_ref().unwrap_err().kind(), ErrorKind::NotFound);
            });
        }
    });

    let hosts = expect_value(
        t.run(Command::AggregateGet {
            aggregate_id: agg.id,
        })
        .unwrap(),
    );
    assert_eq!(
        hosts.get("hosts").and_then(Value::as_array).map(|h| h.len()),
        Some(THREADS as usize)
    );
}
