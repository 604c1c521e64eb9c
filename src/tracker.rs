//! Background operation tracking.
//!
//! Each user-triggered mutation gets a [`Process`] entry in the store so the
//! progress indicator can show it. The bookkeeping is cosmetic: it never
//! gates, retries or serializes the call it describes.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{Process, ProcessId, ProcessPatch, ProcessStatus};
use crate::store::Store;

/// Records operations as processes in the [`Store`].
#[derive(Clone)]
pub struct OperationTracker {
    store: Store,
    last_id: Arc<AtomicU64>,
}

impl OperationTracker {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            last_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Allocate an id from the current time in milliseconds, bumped past the
    /// previous id when two operations start within the same millisecond.
    fn next_id(&self) -> ProcessId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let bump = |last: u64| now.max(last + 1);
        match self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last)))
        {
            Ok(previous) | Err(previous) => bump(previous),
        }
    }

    /// Append an active process at the placeholder midpoint.
    pub fn start(&self, name: impl Into<String>) -> ProcessId {
        let id = self.next_id();
        let process = Process::started(id, name);
        debug!(process_id = id, name = %process.name, "Process started");
        self.store.push_process(process);
        id
    }

    /// Mark a process as settled successfully.
    pub fn complete(&self, id: ProcessId) {
        self.settle(id, None);
    }

    /// Mark a process as settled with a failure. The status is still
    /// `Completed`; the message is kept on the process.
    pub fn fail(&self, id: ProcessId, message: impl Into<String>) {
        self.settle(id, Some(message.into()));
    }

    fn settle(&self, id: ProcessId, error: Option<String>) {
        let found = self.store.update_process(
            id,
            ProcessPatch {
                progress: Some(Process::SETTLED_PROGRESS),
                status: Some(ProcessStatus::Completed),
                error: Some(error),
                ..Default::default()
            },
        );
        if !found {
            warn!(process_id = id, "Settled a process that is no longer tracked");
        }
    }

    /// Run `operation` as a tracked process.
    pub async fn run<T, F>(&self, name: impl Into<String>, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let id = self.start(name);
        let result = operation.await;
        match &result {
            Ok(_) => self.complete(id),
            Err(e) => self.fail(id, e.to_string()),
        }
        result
    }
}
