use chrono::NaiveDate;
use skygrid_shared::Booking;
use tracing::warn;

/// Advisory capacity report for one time row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub available_spots: u32,
    pub would_overbook: bool,
}

/// Computes free capacity and flags overbooking.
///
/// Advisory only: the placement path never consults this to reject a
/// request. Admins may knowingly overbook.
pub struct AvailabilityEvaluator;

impl AvailabilityEvaluator {
    /// Free spots at `time_row` = summed per-column capacity minus the
    /// headcount already booked (non-deleted) at that row.
    pub fn evaluate(
        bookings: &[Booking],
        date: NaiveDate,
        time_row: u32,
        requested_headcount: u32,
        capacity_per_column: &[u32],
    ) -> AvailabilityReport {
        let total_capacity: u32 = capacity_per_column.iter().sum();
        let booked: u32 = bookings
            .iter()
            .filter(|b| b.date == date && b.time_row == time_row && b.blocks_occupancy())
            .map(|b| b.headcount)
            .sum();

        let available_spots = total_capacity.saturating_sub(booked);
        let would_overbook = requested_headcount > available_spots;
        if would_overbook {
            warn!(
                time_row,
                requested_headcount, available_spots, "request would overbook"
            );
        }

        AvailabilityReport {
            available_spots,
            would_overbook,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
    }

    #[test]
    fn test_overbooking_is_flagged_not_blocked() {
        // Two columns of capacity 4 each, empty row.
        let report = AvailabilityEvaluator::evaluate(&[], day(), 0, 10, &[4, 4]);

        assert_eq!(report.available_spots, 8);
        assert!(report.would_overbook);
    }

    #[test]
    fn test_existing_headcount_reduces_availability() {
        let mut booking = Booking::new(day(), 0, 0, 1, "Customer".to_string(), 3);
        let report =
            AvailabilityEvaluator::evaluate(std::slice::from_ref(&booking), day(), 0, 5, &[4, 4]);
        assert_eq!(report.available_spots, 5);
        assert!(!report.would_overbook);

        // Deleted bookings give their spots back.
        booking.status = skygrid_shared::BookingStatus::Deleted;
        let report = AvailabilityEvaluator::evaluate(&[booking], day(), 0, 5, &[4, 4]);
        assert_eq!(report.available_spots, 8);
    }

    #[test]
    fn test_other_rows_do_not_count() {
        let booking = Booking::new(day(), 1, 0, 1, "Customer".to_string(), 4);
        let report = AvailabilityEvaluator::evaluate(&[booking], day(), 0, 8, &[4, 4]);

        assert_eq!(report.available_spots, 8);
        assert!(!report.would_overbook);
    }
}
