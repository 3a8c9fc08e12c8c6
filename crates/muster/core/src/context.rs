//! Ambient per-call context handed to stage functions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

/// Caller-owned context passed to auth, custom-validation, and serve
/// functions.
///
/// Carries request metadata (caller identity, trace ids, deadlines — the
/// engine does not interpret any of it) and a shared cancellation flag.
/// The engine itself never polls the flag between field evaluations;
/// honoring it is up to the stage functions, and timeouts belong to the
/// host caller. Clones share the cancellation flag, so a clone handed to
/// another thread can cancel the original.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    meta: HashMap<String, Value>,
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Read a metadata entry back.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Signal cancellation to every holder of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
