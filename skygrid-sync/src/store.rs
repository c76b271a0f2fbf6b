use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skygrid_shared::{Booking, BookingStatus, Resource};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::stream::{GridSnapshot, SnapshotFeed};

/// Partial update for a booking record, mirroring the storage
/// collaborator's `update(id, partialFields)` interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headcount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_row: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_resource_names: Option<Vec<String>>,
}

impl BookingPatch {
    pub fn apply_to(&self, booking: &mut Booking) {
        if let Some(name) = &self.customer_name {
            booking.customer_name = name.clone();
        }
        if let Some(contact) = &self.contact {
            booking.contact = Some(contact.clone());
        }
        if let Some(headcount) = self.headcount {
            booking.headcount = headcount;
        }
        if let Some(status) = self.status {
            booking.status = status;
        }
        if let Some(time_row) = self.time_row {
            booking.time_row = time_row;
        }
        if let Some(start_column) = self.start_column {
            booking.start_column = start_column;
        }
        if let Some(names) = &self.assigned_resource_names {
            booking.assigned_resource_names = names.clone();
        }
    }
}

/// Write side of the storage collaborator.
///
/// Fire-and-forget from the engine's perspective: confirmations come
/// back through the snapshot feed, and the collaborator owns retries.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<(), StoreError>;
    async fn update(&self, id: Uuid, patch: BookingPatch) -> Result<(), StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// In-memory store that echoes every committed write back through the
/// snapshot feed, modeling the storage collaborator's push behavior.
pub struct InMemoryBookingStore {
    bookings: Mutex<HashMap<Uuid, Booking>>,
    resources: Mutex<Vec<Resource>>,
    feed: SnapshotFeed,
    fail_next: AtomicBool,
}

impl InMemoryBookingStore {
    pub fn new(feed: SnapshotFeed) -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
            resources: Mutex::new(Vec::new()),
            feed,
            fail_next: AtomicBool::new(false),
        }
    }

    pub async fn seed_resources(&self, resources: Vec<Resource>) {
        *self.resources.lock().await = resources;
        self.push_snapshot().await;
    }

    /// Make the next write fail, to exercise rollback paths
    pub fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("injected failure".to_string()));
        }
        Ok(())
    }

    async fn push_snapshot(&self) {
        let bookings: Vec<Booking> = self.bookings.lock().await.values().cloned().collect();
        let resources = self.resources.lock().await.clone();
        self.feed.publish(GridSnapshot::new(bookings, resources));
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, booking: &Booking) -> Result<(), StoreError> {
        self.take_failure()?;
        self.bookings
            .lock()
            .await
            .insert(booking.id, booking.clone());
        info!(booking_id = %booking.id, "stored booking");
        self.push_snapshot().await;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: BookingPatch) -> Result<(), StoreError> {
        self.take_failure()?;
        {
            let mut bookings = self.bookings.lock().await;
            let booking = bookings
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            patch.apply_to(booking);
        }
        self.push_snapshot().await;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.take_failure()?;
        {
            // Soft delete: the record stays for audit.
            let mut bookings = self.bookings.lock().await;
            let booking = bookings
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            booking.status = BookingStatus::Deleted;
        }
        self.push_snapshot().await;
        Ok(())
    }
}
