use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Unconfirmed,
    Confirmed,
    Pending,
    Cancelled,
    Deleted,
}

/// Action kinds recorded in a booking's history log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Created,
    Moved,
    StatusChanged,
    FieldsUpdated,
    PilotAssigned,
    PilotUnassigned,
}

/// Append-only audit record of a state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub actor_id: String,
    pub actor_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A multi-column time-slot booking on the scheduling grid.
///
/// Occupies exactly `span` contiguous resource columns starting at
/// `start_column` at `time_row` on `date`. Deleted bookings are kept
/// for audit and no longer count toward occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time_row: u32,
    pub start_column: u32,
    pub span: u32,
    /// Display names of the assigned pilots/vehicles, one per spanned column.
    pub assigned_resource_names: Vec<String>,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub headcount: u32,
    pub status: BookingStatus,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        date: NaiveDate,
        time_row: u32,
        start_column: u32,
        span: u32,
        customer_name: String,
        headcount: u32,
    ) -> Self {
        // A zero-width booking cannot exist on the grid.
        let span = span.max(1);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            date,
            time_row,
            start_column,
            span,
            assigned_resource_names: vec![String::new(); span as usize],
            customer_name,
            contact: None,
            headcount,
            status: BookingStatus::Unconfirmed,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Last column index covered by this booking (inclusive).
    /// Saturates so a malformed zero-span row (e.g. from a bad
    /// deserialized snapshot) cannot underflow.
    pub fn end_column(&self) -> u32 {
        self.start_column + self.span.saturating_sub(1)
    }

    /// Whether this booking covers the given column at its time row
    pub fn occupies_column(&self, column: u32) -> bool {
        column >= self.start_column && column <= self.end_column()
    }

    /// Whether this booking's column range intersects `[start, start+span-1]`
    pub fn overlaps(&self, start: u32, span: u32) -> bool {
        let end = start + span.saturating_sub(1);
        self.start_column <= end && start <= self.end_column()
    }

    /// Deleted rows are retained for audit but never block the grid
    pub fn blocks_occupancy(&self) -> bool {
        self.status != BookingStatus::Deleted
    }

    /// Append a history entry and refresh the modified timestamp
    pub fn record(
        &mut self,
        action: HistoryAction,
        actor_id: &str,
        actor_name: &str,
        detail: Option<String>,
    ) {
        let now = Utc::now();
        self.history.push(HistoryEntry {
            action,
            actor_id: actor_id.to_string(),
            actor_name: actor_name.to_string(),
            timestamp: now,
            detail,
        });
        self.updated_at = now;
    }
}
