pub mod editlock;
pub mod store;
pub mod stream;

pub use editlock::{EditLockQueue, SyncState};
pub use store::{BookingPatch, BookingStore, InMemoryBookingStore, StoreError};
pub use stream::{GridSnapshot, SnapshotFeed};
