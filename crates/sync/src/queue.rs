//! Debounced write queue for high-frequency field edits.
//!
//! Profile fields and the semester table are edited keystroke by keystroke;
//! writing each keystroke through would hammer the store. Instead every edit
//! schedules a delayed merge-upsert keyed by target path, and a newer edit to
//! the same path cancels and replaces the older one, so only the final value
//! of a burst reaches the wire.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::gateway::{DocumentGateway, StorePath};
use crate::notice::NoticeSender;

/// Debounce window for single profile fields.
pub const PROFILE_FIELD_DEBOUNCE: Duration = Duration::from_millis(1000);
/// Longer window for semester-table edits, which arrive in tighter bursts.
pub const SEMESTER_TABLE_DEBOUNCE: Duration = Duration::from_millis(1500);

struct PendingWrite {
    seq: u64,
    fields: Value,
    task: JoinHandle<()>,
}

#[derive(Clone)]
pub struct DebouncedMutationQueue {
    gateway: Arc<dyn DocumentGateway>,
    notices: NoticeSender,
    pending: Arc<Mutex<HashMap<StorePath, PendingWrite>>>,
    seq: Arc<AtomicU64>,
}

impl DebouncedMutationQueue {
    pub fn new(gateway: Arc<dyn DocumentGateway>, notices: NoticeSender) -> Self {
        Self {
            gateway,
            notices,
            pending: Arc::new(Mutex::new(HashMap::new())),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule `fields` to be merge-upserted into `path` after `delay`. A
    /// pending write to the same path is cancelled and replaced wholesale;
    /// writes to other paths are unaffected.
    pub async fn schedule(&self, path: StorePath, fields: Value, delay: Duration) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        // The window is measured from here, not from when the spawned task
        // first gets polled.
        let deadline = tokio::time::Instant::now() + delay;
        let task = tokio::spawn(flush_after(
            self.clone(),
            path.clone(),
            fields.clone(),
            seq,
            deadline,
        ));

        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.insert(path, PendingWrite { seq, fields, task }) {
            previous.task.abort();
        }
    }

    /// Write the pending value for `path` immediately, if any. Used when the
    /// edit surface is being torn down and the window cannot be waited out.
    pub async fn flush_now(&self, path: &StorePath) -> Result<()> {
        let entry = {
            let mut pending = self.pending.lock().await;
            pending.remove(path)
        };
        let Some(entry) = entry else {
            return Ok(());
        };
        entry.task.abort();
        debug!("flushing pending write to {} ahead of its window", path);
        self.gateway.merge_upsert(path.clone(), entry.fields).await
    }

    /// Flush every pending write, in no particular order. Failures are
    /// reported per path; the first error is returned after all paths have
    /// been attempted.
    pub async fn flush_all(&self) -> Result<()> {
        let entries: Vec<(StorePath, PendingWrite)> = {
            let mut pending = self.pending.lock().await;
            pending.drain().collect()
        };
        let mut first_error = None;
        for (path, entry) in entries {
            entry.task.abort();
            if let Err(err) = self.gateway.merge_upsert(path.clone(), entry.fields).await {
                error!("flush of pending write to {} failed: {}", path, err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Drop the pending write for `path` without sending it.
    pub async fn cancel(&self, path: &StorePath) {
        let mut pending = self.pending.lock().await;
        if let Some(entry) = pending.remove(path) {
            entry.task.abort();
        }
    }

    /// Drop every pending write. Called on identity swaps so a signed-out
    /// user's unsent edits never land under the next session.
    pub async fn cancel_all(&self) {
        let mut pending = self.pending.lock().await;
        for (_, entry) in pending.drain() {
            entry.task.abort();
        }
    }

    /// Paths with a write still waiting out its window.
    pub async fn pending_paths(&self) -> Vec<StorePath> {
        self.pending.lock().await.keys().cloned().collect()
    }

    /// The fields of the pending write for `path`, if any. Lets a caller
    /// fold a new edit into a write it is about to replace.
    pub async fn pending_fields(&self, path: &StorePath) -> Option<Value> {
        self.pending
            .lock()
            .await
            .get(path)
            .map(|entry| entry.fields.clone())
    }
}

async fn flush_after(
    queue: DebouncedMutationQueue,
    path: StorePath,
    fields: Value,
    seq: u64,
    deadline: tokio::time::Instant,
) {
    tokio::time::sleep_until(deadline).await;

    // Only the write that still owns the map entry may fire; a replacement
    // scheduled during the sleep has taken ownership of the path.
    {
        let mut pending = queue.pending.lock().await;
        match pending.get(&path) {
            Some(entry) if entry.seq == seq => {
                pending.remove(&path);
            }
            _ => return,
        }
    }

    if let Err(err) = queue.gateway.merge_upsert(path.clone(), fields).await {
        error!("debounced write to {} failed: {}", path, err);
        queue.notices.alert(format!("Failed to save changes: {}", err));
    }
}
