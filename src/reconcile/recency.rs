use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

/// How long a freshly connected device counts as "recently added". Within
/// this window a default-input change is attributed to the OS auto-selecting
/// the new device; outside it, to the user.
pub const DEFAULT_RECENCY_WINDOW: Duration = Duration::from_secs(2);

/// Completion message of a scheduled expiry. Routed back to the owning task,
/// which applies it via [`RecencyTracker::handle_window_elapsed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyExpiry {
    pub generation: u64,
}

/// Tracks which device UIDs appeared since the last expiry of the recency
/// window.
///
/// Owned by a single task; all mutation happens there. The expiry timer is a
/// spawned sleep that reports back over `expiry_tx` instead of touching the
/// sets itself, so there is no concurrent access. Each new batch of additions
/// aborts the previous timer and bumps the generation; an expiry message from
/// an aborted timer that already made it into the queue is ignored by the
/// generation check.
pub struct RecencyTracker {
    window: Duration,
    known: HashSet<String>,
    recently_added: HashSet<String>,
    generation: u64,
    pending_expiry: Option<JoinHandle<()>>,
    expiry_tx: UnboundedSender<RecencyExpiry>,
}

impl RecencyTracker {
    pub fn new(window: Duration, expiry_tx: UnboundedSender<RecencyExpiry>) -> Self {
        Self {
            window,
            known: HashSet::new(),
            recently_added: HashSet::new(),
            generation: 0,
            pending_expiry: None,
            expiry_tx,
        }
    }

    /// Seed the known set from a snapshot taken before monitoring starts, so
    /// devices present at startup are never treated as new. Called once.
    pub fn initialize(&mut self, current_uids: HashSet<String>) {
        self.known = current_uids;
        self.recently_added.clear();
    }

    /// Replace the known set with the current snapshot and return the UIDs
    /// that were not known before. A non-empty batch joins the recently-added
    /// set and restarts the expiry window for the whole set.
    pub fn on_device_list_changed(&mut self, current_uids: HashSet<String>) -> HashSet<String> {
        let added: HashSet<String> = current_uids.difference(&self.known).cloned().collect();

        if !added.is_empty() {
            self.recently_added.extend(added.iter().cloned());
            self.schedule_expiry();
        }

        self.known = current_uids;
        added
    }

    pub fn is_recently_added(&self, uid: &str) -> bool {
        self.recently_added.contains(uid)
    }

    /// Apply a timer completion. Stale generations are from timers that were
    /// superseded by a later batch and must not clear the set early.
    pub fn handle_window_elapsed(&mut self, expiry: RecencyExpiry) {
        if expiry.generation != self.generation {
            debug!(
                generation = expiry.generation,
                current = self.generation,
                "ignoring stale recency expiry"
            );
            return;
        }

        debug!(
            cleared = self.recently_added.len(),
            "recency window elapsed"
        );
        self.recently_added.clear();
        self.pending_expiry = None;
    }

    /// Cancel-and-replace: at most one expiry is ever outstanding.
    fn schedule_expiry(&mut self) {
        if let Some(pending) = self.pending_expiry.take() {
            pending.abort();
        }

        self.generation += 1;
        let generation = self.generation;
        let window = self.window;
        let tx = self.expiry_tx.clone();

        self.pending_expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = tx.send(RecencyExpiry { generation });
        }));
    }
}

impl Drop for RecencyTracker {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_expiry.take() {
            pending.abort();
        }
    }
}
