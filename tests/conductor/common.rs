//! Shared fixtures for the conductor test suite.

#![allow(dead_code)]

use std::sync::{Arc, Once};

pub use conductor::storage::testing::{RecordingNotifier, ScriptedHostApi};
pub use conductor::storage::MemoryStore;
pub use conductor::{
    Command, ErrorKind, Executor, Object, Output, RequestContext, RpcVersion, Value,
};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route conductor logs to the test writer; `RUST_LOG` overrides the level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("conductor=warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// An executor over a fresh in-memory store with a recording notifier.
pub struct TestConductor {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub executor: Executor,
}

impl TestConductor {
    pub fn new() -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let executor = Executor::new(store.clone()).with_notifier(notifier.clone());
        Self {
            store,
            notifier,
            executor,
        }
    }

    /// Seed one instance owned by [`ctx`]'s project; returns its uuid.
    pub fn instance(&self) -> String {
        self.store.create_instance("proj", "user").uuid.to_string()
    }

    pub fn run(&self, cmd: Command) -> conductor::Result<Output> {
        self.executor.execute(&ctx(), cmd)
    }
}

pub fn ctx() -> RequestContext {
    RequestContext::new("user", "proj").with_request_id("req-test")
}

pub fn obj<I>(pairs: I) -> Object
where
    I: IntoIterator<Item = (String, Value)>,
{
    pairs.into_iter().collect()
}

/// Extract the value from an `Output::Value` or `Output::Maybe(Some)`.
pub fn expect_value(output: Output) -> Value {
    match output {
        Output::Value(v) | Output::Maybe(Some(v)) => v,
        other => panic!("Expected a value, got {:?}", other),
    }
}
