use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skygrid_shared::{Booking, Resource};
use tokio::sync::broadcast;
use tracing::debug;

/// Full current state pushed by the storage collaborator on every
/// external change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub bookings: Vec<Booking>,
    pub resources: Vec<Resource>,
    pub received_at: DateTime<Utc>,
}

impl GridSnapshot {
    pub fn new(bookings: Vec<Booking>, resources: Vec<Resource>) -> Self {
        Self {
            bookings,
            resources,
            received_at: Utc::now(),
        }
    }
}

/// Broadcast fan-out for grid snapshots.
///
/// The storage collaborator (or a test) publishes here; every
/// subscribed engine receives each snapshot in arrival order.
#[derive(Clone)]
pub struct SnapshotFeed {
    tx: broadcast::Sender<GridSnapshot>,
}

impl SnapshotFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GridSnapshot> {
        self.tx.subscribe()
    }

    pub fn publish(&self, snapshot: GridSnapshot) {
        // No receivers is fine; the push is best-effort like any feed.
        if self.tx.send(snapshot).is_err() {
            debug!("snapshot published with no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SnapshotFeed {
    fn default() -> Self {
        Self::new(100)
    }
}
