//! Change notifier that records instead of publishing.

use conductor_core::{ChangeNotifier, Instance, RequestContext};
use parking_lot::Mutex;

/// Keeps every `(before, after)` pair it is sent, in arrival order.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(Instance, Instance)>>,
}

impl RecordingNotifier {
    /// Create a notifier with no recorded events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events so far.
    pub fn events(&self) -> Vec<(Instance, Instance)> {
        self.events.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn send_update(&self, _ctx: &RequestContext, old: &Instance, new: &Instance) {
        self.events.lock().push((old.clone(), new.clone()));
    }
}
