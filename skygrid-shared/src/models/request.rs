use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking request status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Waitlist,
    Deleted,
}

/// A pre-booking intent, decoupled from the grid.
///
/// Carries the desired date/time/headcount only; it becomes a `Booking`
/// on explicit approval, never implicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time_row: u32,
    pub headcount: u32,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingRequest {
    pub fn new(date: NaiveDate, time_row: u32, headcount: u32, customer_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            time_row,
            headcount,
            customer_name,
            contact: None,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, RequestStatus::Pending | RequestStatus::Waitlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending() {
        let request = BookingRequest::new(
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            0,
            4,
            "Sam Lee".to_string(),
        );

        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.is_open());
    }
}
