pub mod capability;
pub mod models;

pub use capability::Capabilities;
pub use models::booking::{Booking, BookingStatus, HistoryAction, HistoryEntry};
pub use models::request::{BookingRequest, RequestStatus};
pub use models::resource::{Resource, ResourceFlags, ResourceKind, ResourceMetrics};
pub use models::slots::{DaySchedule, ADDITIONAL_SLOT_OFFSET};
