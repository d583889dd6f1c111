//! Per-unit-of-work collection scopes.
//!
//! This is the isolation core: each logical unit of work (one inbound
//! request handled by the host) owns a [`CallScope`], and every call
//! captured while that unit runs lands in that scope's bucket and no
//! other. The active scope travels with execution-context lineage via
//! tokio's task-local storage, so concurrent units sharing a process
//! never see each other's records and no registry-wide lock exists —
//! each bucket has its own mutex and nothing else is shared.
//!
//! # Lifecycle
//!
//! ```
//! use reqscope::CallScope;
//!
//! # async fn handle_unit() {
//! let scope = CallScope::begin();            // fresh, empty bucket
//! scope.enter(async {
//!     // every reqscope::collect() on this lineage lands in `scope`
//! }).await;
//! let calls = scope.take();                  // drain, in completion order
//! # }
//! ```
//!
//! Sub-tasks spawned from inside a unit do not inherit the binding
//! automatically; clone the current handle into them:
//!
//! ```
//! use reqscope::CallScope;
//!
//! # async fn helper() {}
//! # async fn inside_unit() {
//! if let Some(scope) = CallScope::current() {
//!     tokio::spawn(scope.enter(helper()));
//! }
//! # }
//! ```
//!
//! Entering a new scope on a lineage that already has one shadows the
//! old binding for the duration: pooled workers that begin a fresh
//! scope per unit can never inherit records from the previous unit.

use crate::record::CapturedCall;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

tokio::task_local! {
    static ACTIVE_SCOPE: CallScope;
}

/// Bucket state. `Some` while the scope is open; `None` once drained,
/// after which late records are dropped.
type Bucket = Mutex<Option<Vec<CapturedCall>>>;

/// Handle to one unit of work's record bucket.
///
/// Cheap to clone; all clones share the same bucket. The bucket is
/// reclaimed when the last handle drops, so abandoned units (a task
/// cancelled before draining) cannot leak records indefinitely.
#[derive(Clone)]
pub struct CallScope {
    bucket: Arc<Bucket>,
}

impl CallScope {
    /// Begin a scope with a fresh, empty bucket.
    pub fn begin() -> Self {
        Self {
            bucket: Arc::new(Mutex::new(Some(Vec::new()))),
        }
    }

    /// The scope bound to the calling execution context, if any.
    pub fn current() -> Option<Self> {
        ACTIVE_SCOPE.try_with(Self::clone).ok()
    }

    /// Run a future with this scope bound to its execution-context
    /// lineage. Everything awaited inside — nested helpers included —
    /// collects into this scope's bucket.
    ///
    /// The returned future can be handed to `tokio::spawn` directly to
    /// propagate the scope into a sub-task.
    pub fn enter<F: Future>(&self, fut: F) -> impl Future<Output = F::Output> {
        ACTIVE_SCOPE.scope(self.clone(), fut)
    }

    /// Synchronous counterpart of [`enter`](Self::enter) for hosts that
    /// run units of work on plain threads.
    pub fn enter_sync<T>(&self, f: impl FnOnce() -> T) -> T {
        ACTIVE_SCOPE.sync_scope(self.clone(), f)
    }

    /// Drain the bucket: returns all records collected so far, in the
    /// order their sends completed, and closes the bucket. Records
    /// collected after the drain are dropped. Draining twice yields an
    /// empty vector the second time.
    pub fn take(&self) -> Vec<CapturedCall> {
        self.lock().take().unwrap_or_default()
    }

    /// Number of records currently buffered. Zero after draining.
    pub fn len(&self) -> usize {
        self.lock().as_ref().map_or(0, Vec::len)
    }

    /// Whether the bucket currently holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, call: CapturedCall) {
        match self.lock().as_mut() {
            Some(records) => records.push(call),
            // Scope already drained; the send raced unit teardown.
            None => tracing::trace!("scope already drained, dropping captured call"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<CapturedCall>>> {
        // A panic while holding the lock only poisons one unit's bucket;
        // keep collecting rather than propagating the poison.
        match self.bucket.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for CallScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallScope")
            .field("records", &self.len())
            .finish()
    }
}

/// Append a captured call to the calling context's active scope.
///
/// No scope bound, or scope already drained: the record is dropped
/// silently. This must never fail — the HTTP call it describes has
/// already completed and must not be failed by instrumentation.
pub fn collect(call: CapturedCall) {
    match CallScope::current() {
        Some(scope) => scope.record(call),
        None => tracing::trace!("no active scope, dropping captured call"),
    }
}
