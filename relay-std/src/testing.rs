//! Test utilities for consumers of the runtime.
//!
//! Nothing here submits registration rows, so pulling this module into a
//! test binary never changes what the loader discovers.
//!
//! - [`RecordingLifecycle`]: counts `initialize`/`destroy` calls
//! - [`CapturingHandler`]: a [`CallHandler`] that records every call and
//!   answers with a programmable value
//! - [`selector`]: shorthand for building a flat-parameter [`Selector`]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use relay_core::{BoxError, CallError, CallHandler, Lifecycle, MethodDescriptor, Selector, Value};

// ============================================================================
// Recording Lifecycle
// ============================================================================

/// A [`Lifecycle`] view that counts its calls.
///
/// Clones share the counters, so a test can keep one half and hand the
/// other to [`Constructed::with_lifecycle`](crate::registration::Constructed::with_lifecycle).
pub struct RecordingLifecycle {
    initialized: Arc<AtomicUsize>,
    destroyed: Arc<AtomicUsize>,
}

impl RecordingLifecycle {
    /// Creates a recorder with both counters at zero.
    pub fn new() -> Self {
        Self {
            initialized: Arc::new(AtomicUsize::new(0)),
            destroyed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times `initialize` ran.
    pub fn initialized(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }

    /// How many times `destroy` ran.
    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl Default for RecordingLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RecordingLifecycle {
    fn clone(&self) -> Self {
        Self {
            initialized: self.initialized.clone(),
            destroyed: self.destroyed.clone(),
        }
    }
}

impl Lifecycle for RecordingLifecycle {
    fn initialize(&self) -> Result<(), BoxError> {
        self.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&self) -> Result<(), BoxError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Capturing Handler
// ============================================================================

/// A [`CallHandler`] that records every invocation and answers with a
/// programmable value (default [`Value::Null`]).
///
/// Clones share the recorded calls and the response.
pub struct CapturingHandler {
    calls: Arc<Mutex<Vec<(MethodDescriptor, Vec<Value>)>>>,
    response: Arc<Mutex<Value>>,
}

impl CapturingHandler {
    /// Creates a handler answering every call with [`Value::Null`].
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new(Value::Null)),
        }
    }

    /// Sets the value returned by later calls.
    pub fn respond_with(&self, value: Value) {
        *self.response.lock().unwrap() = value;
    }

    /// The recorded calls, in invocation order.
    pub fn calls(&self) -> Vec<(MethodDescriptor, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    /// How many calls were recorded.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Drops the recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Default for CapturingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CapturingHandler {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
            response: self.response.clone(),
        }
    }
}

impl CallHandler for CapturingHandler {
    fn invoke(&self, method: &MethodDescriptor, args: Vec<Value>) -> Result<Value, CallError> {
        self.calls.lock().unwrap().push((*method, args));
        Ok(self.response.lock().unwrap().clone())
    }
}

// ============================================================================
// Selector shorthand
// ============================================================================

/// Builds a selector from flat key/value pairs.
pub fn selector(pairs: &[(&str, &str)]) -> Selector {
    let mut built = Selector::new();
    for (key, value) in pairs {
        built = built.with_param(*key, *value);
    }
    built
}
