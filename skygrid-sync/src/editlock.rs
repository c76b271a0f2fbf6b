use tracing::{debug, info};

use crate::stream::GridSnapshot;

/// Whether stream snapshots apply immediately or are buffered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Live,
    Editing,
}

/// Mediates between the external update stream and a local edit session.
///
/// While any sensitive interaction (drag, in-place field edit) is in
/// progress, incoming snapshots must not clobber the user's working
/// state. They are collapsed into a single-slot buffer (latest wins)
/// and flushed exactly once when the last session ends. No snapshot is
/// ever silently dropped: it is applied immediately or in collapsed
/// form at session end.
#[derive(Default)]
pub struct EditLockQueue {
    sessions: u32,
    buffered: Option<GridSnapshot>,
    suppressed: u64,
}

impl EditLockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        if self.sessions > 0 {
            SyncState::Editing
        } else {
            SyncState::Live
        }
    }

    /// Start a sensitive interaction. Sessions are reference-counted so
    /// overlapping interactions (drag during a text edit) coalesce.
    pub fn begin_session(&mut self) {
        self.sessions += 1;
        if self.sessions == 1 {
            info!("edit session started, buffering stream updates");
        }
    }

    /// End one sensitive interaction. When the last session closes, the
    /// buffered snapshot (if any) is handed back for exactly one apply
    /// and the buffer is cleared.
    pub fn end_session(&mut self) -> Option<GridSnapshot> {
        debug_assert!(self.sessions > 0, "end_session without begin_session");
        self.sessions = self.sessions.saturating_sub(1);
        if self.sessions > 0 {
            return None;
        }

        let flushed = self.buffered.take();
        if flushed.is_some() {
            info!(
                suppressed = self.suppressed,
                "edit session ended, applying buffered snapshot"
            );
        }
        self.suppressed = 0;
        flushed
    }

    /// Offer an incoming stream snapshot.
    ///
    /// Returns the snapshot when it should be applied now (`Live`);
    /// buffers it otherwise, replacing any earlier buffered snapshot.
    pub fn offer(&mut self, snapshot: GridSnapshot) -> Option<GridSnapshot> {
        match self.state() {
            SyncState::Live => Some(snapshot),
            SyncState::Editing => {
                if self.buffered.is_some() {
                    self.suppressed += 1;
                    debug!(
                        suppressed = self.suppressed,
                        "replacing buffered snapshot, latest wins"
                    );
                }
                self.buffered = Some(snapshot);
                None
            }
        }
    }

    /// Stream events superseded while editing (all but the survivor)
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }
}
