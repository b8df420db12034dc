//! Test modules for the executor crate.

use std::sync::Arc;

use conductor_storage::testing::RecordingNotifier;
use conductor_storage::MemoryStore;

use crate::{Executor, Object, RequestContext, Value};

pub mod facade;
pub mod negotiation;
pub mod serialization;

/// An executor over a fresh store, with handles on both collaborators.
pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub executor: Executor,
}

pub(crate) fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let executor = Executor::new(store.clone()).with_notifier(notifier.clone());
    Fixture {
        store,
        notifier,
        executor,
    }
}

pub(crate) fn ctx() -> RequestContext {
    RequestContext::new("user", "proj").with_request_id("req-1")
}

pub(crate) fn obj(pairs: &[(&str, Value)]) -> Object {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
