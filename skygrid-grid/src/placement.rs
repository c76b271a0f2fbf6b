use std::collections::HashMap;

use chrono::NaiveDate;
use skygrid_shared::{Booking, BookingStatus, HistoryAction};
use tracing::debug;
use uuid::Uuid;

/// Widest booking the grid supports (tandem + photo vehicle)
pub const MAX_SPAN: u32 = 3;

/// Result of a placement probe: ok iff no non-deleted booking at the
/// same time row overlaps the proposed column range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementCheck {
    pub ok: bool,
    pub conflicting: Vec<Uuid>,
}

/// Pure placement and mutation logic for the scheduling grid.
///
/// Every operation returns a new or copied booking; the caller owns the
/// booking set and swaps results in atomically, so an observer never
/// sees a half-applied move.
pub struct PlacementEngine;

impl PlacementEngine {
    /// Probe whether a span fits at `(time_row, start_column)` on `date`.
    ///
    /// Pure and idempotent: identical arguments always yield identical
    /// results. Out-of-range columns are an error, never a mutation.
    pub fn can_place(
        bookings: &[Booking],
        date: NaiveDate,
        time_row: u32,
        start_column: u32,
        span: u32,
        resource_count: u32,
    ) -> Result<PlacementCheck, PlacementError> {
        Self::check_bounds(start_column, span, resource_count)?;

        let conflicting =
            Self::conflicts_excluding(bookings, date, time_row, start_column, span, None);
        Ok(PlacementCheck {
            ok: conflicting.is_empty(),
            conflicting,
        })
    }

    /// Create a new booking at the given cell, rejecting overlap.
    #[allow(clippy::too_many_arguments)]
    pub fn place(
        bookings: &[Booking],
        date: NaiveDate,
        time_row: u32,
        start_column: u32,
        span: u32,
        customer_name: String,
        headcount: u32,
        resource_count: u32,
        actor_id: &str,
        actor_name: &str,
    ) -> Result<Booking, PlacementError> {
        let check = Self::can_place(bookings, date, time_row, start_column, span, resource_count)?;
        if !check.ok {
            return Err(PlacementError::Conflict {
                conflicting: check.conflicting,
            });
        }

        let mut booking = Booking::new(date, time_row, start_column, span, customer_name, headcount);
        booking.record(HistoryAction::Created, actor_id, actor_name, None);
        debug!(
            booking_id = %booking.id,
            time_row,
            start_column,
            span,
            "placed booking"
        );
        Ok(booking)
    }

    /// Relocate an existing booking to a new cell, re-validating the
    /// entire destination span with the moving booking excluded.
    ///
    /// Returns a mutated copy; the caller replaces the original in one
    /// step, which clears the old occupancy and applies the new one
    /// atomically.
    pub fn relocate(
        bookings: &[Booking],
        booking_id: Uuid,
        new_time_row: u32,
        new_start_column: u32,
        resource_count: u32,
        actor_id: &str,
        actor_name: &str,
    ) -> Result<Booking, PlacementError> {
        let original = bookings
            .iter()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| PlacementError::NotFound(booking_id.to_string()))?;

        Self::check_bounds(new_start_column, original.span, resource_count)?;

        let conflicting = Self::conflicts_excluding(
            bookings,
            original.date,
            new_time_row,
            new_start_column,
            original.span,
            Some(booking_id),
        );
        if !conflicting.is_empty() {
            return Err(PlacementError::Conflict { conflicting });
        }

        let mut moved = original.clone();
        let detail = format!(
            "from ({}, {}) to ({}, {})",
            original.time_row, original.start_column, new_time_row, new_start_column
        );
        moved.time_row = new_time_row;
        moved.start_column = new_start_column;
        moved.record(HistoryAction::Moved, actor_id, actor_name, Some(detail));
        debug!(booking_id = %booking_id, new_time_row, new_start_column, "moved booking");
        Ok(moved)
    }

    /// Change a booking's status, recording the transition.
    ///
    /// Deleted is terminal: the row stays for audit and cannot be
    /// transitioned back onto the grid.
    pub fn change_status(
        booking: &Booking,
        new_status: BookingStatus,
        actor_id: &str,
        actor_name: &str,
    ) -> Result<Booking, PlacementError> {
        if booking.status == BookingStatus::Deleted {
            return Err(PlacementError::InvalidTransition {
                from: format!("{:?}", booking.status),
                to: format!("{new_status:?}"),
            });
        }

        let mut updated = booking.clone();
        let detail = format!("{:?} -> {:?}", booking.status, new_status);
        updated.status = new_status;
        updated.record(
            HistoryAction::StatusChanged,
            actor_id,
            actor_name,
            Some(detail),
        );
        Ok(updated)
    }

    /// Assign a resource name to one of the booking's spanned columns
    pub fn assign_resource(
        booking: &Booking,
        column_offset: u32,
        resource_name: &str,
        actor_id: &str,
        actor_name: &str,
    ) -> Result<Booking, PlacementError> {
        if column_offset >= booking.span {
            return Err(PlacementError::ColumnOffsetOutOfRange {
                offset: column_offset,
                span: booking.span,
            });
        }

        let mut updated = booking.clone();
        updated.assigned_resource_names[column_offset as usize] = resource_name.to_string();
        updated.record(
            HistoryAction::PilotAssigned,
            actor_id,
            actor_name,
            Some(resource_name.to_string()),
        );
        Ok(updated)
    }

    /// Clear an assigned resource name from one of the spanned columns
    pub fn unassign_resource(
        booking: &Booking,
        column_offset: u32,
        actor_id: &str,
        actor_name: &str,
    ) -> Result<Booking, PlacementError> {
        if column_offset >= booking.span {
            return Err(PlacementError::ColumnOffsetOutOfRange {
                offset: column_offset,
                span: booking.span,
            });
        }

        let mut updated = booking.clone();
        let previous =
            std::mem::take(&mut updated.assigned_resource_names[column_offset as usize]);
        updated.record(
            HistoryAction::PilotUnassigned,
            actor_id,
            actor_name,
            (!previous.is_empty()).then_some(previous),
        );
        Ok(updated)
    }

    /// Cell occupancy for a day: (time_row, column) -> booking id
    pub fn occupancy(bookings: &[Booking], date: NaiveDate) -> HashMap<(u32, u32), Uuid> {
        let mut cells = HashMap::new();
        for booking in bookings
            .iter()
            .filter(|b| b.date == date && b.blocks_occupancy())
        {
            for column in booking.start_column..=booking.end_column() {
                cells.insert((booking.time_row, column), booking.id);
            }
        }
        cells
    }

    /// Invariant check: no two non-deleted bookings on the same date and
    /// time row may overlap. Run after every place/move in debug paths.
    pub fn verify_no_overlap(bookings: &[Booking], date: NaiveDate) -> Result<(), PlacementError> {
        let active: Vec<&Booking> = bookings
            .iter()
            .filter(|b| b.date == date && b.blocks_occupancy())
            .collect();

        for (i, a) in active.iter().enumerate() {
            for b in &active[i + 1..] {
                if a.time_row == b.time_row && a.overlaps(b.start_column, b.span) {
                    return Err(PlacementError::Conflict {
                        conflicting: vec![a.id, b.id],
                    });
                }
            }
        }
        Ok(())
    }

    fn check_bounds(
        start_column: u32,
        span: u32,
        resource_count: u32,
    ) -> Result<(), PlacementError> {
        if span == 0 || span > MAX_SPAN {
            return Err(PlacementError::InvalidSpan(span));
        }
        // checked_add: a start column near u32::MAX must come back as
        // OutOfBounds, not wrap the comparison.
        if start_column
            .checked_add(span)
            .map_or(true, |end| end > resource_count)
        {
            return Err(PlacementError::OutOfBounds {
                start_column,
                span,
                resource_count,
            });
        }
        Ok(())
    }

    fn conflicts_excluding(
        bookings: &[Booking],
        date: NaiveDate,
        time_row: u32,
        start_column: u32,
        span: u32,
        exclude: Option<Uuid>,
    ) -> Vec<Uuid> {
        bookings
            .iter()
            .filter(|b| {
                b.date == date
                    && b.time_row == time_row
                    && b.blocks_occupancy()
                    && Some(b.id) != exclude
                    && b.overlaps(start_column, span)
            })
            .map(|b| b.id)
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Column range out of bounds: start {start_column} span {span} with {resource_count} resources")]
    OutOfBounds {
        start_column: u32,
        span: u32,
        resource_count: u32,
    },

    #[error("Invalid span: {0}")]
    InvalidSpan(u32),

    #[error("Column offset {offset} out of range for span {span}")]
    ColumnOffsetOutOfRange { offset: u32, span: u32 },

    #[error("Placement conflicts with {} existing booking(s)", conflicting.len())]
    Conflict { conflicting: Vec<Uuid> },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygrid_shared::BookingStatus;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
    }

    fn place(bookings: &[Booking], row: u32, col: u32, span: u32) -> Booking {
        PlacementEngine::place(
            bookings,
            day(),
            row,
            col,
            span,
            "Customer".to_string(),
            2,
            4,
            "u1",
            "Admin",
        )
        .unwrap()
    }

    #[test]
    fn test_place_records_creation() {
        let booking = place(&[], 0, 1, 2);

        assert_eq!(booking.history.len(), 1);
        assert_eq!(booking.history[0].action, HistoryAction::Created);
        assert_eq!(booking.assigned_resource_names.len(), 2);
    }

    #[test]
    fn test_span_conflict_reports_existing_id() {
        let existing = place(&[], 0, 1, 2); // columns 1..=2
        let bookings = vec![existing.clone()];

        // New span=1 booking at column 2 on the same row must conflict.
        let check = PlacementEngine::can_place(&bookings, day(), 0, 2, 1, 4).unwrap();
        assert!(!check.ok);
        assert_eq!(check.conflicting, vec![existing.id]);

        let result = PlacementEngine::place(
            &bookings,
            day(),
            0,
            2,
            1,
            "Other".to_string(),
            1,
            4,
            "u1",
            "Admin",
        );
        assert!(matches!(result, Err(PlacementError::Conflict { .. })));
        // Rejected attempt leaves the grid unchanged.
        assert_eq!(bookings.len(), 1);
    }

    #[test]
    fn test_can_place_is_idempotent() {
        let bookings = vec![place(&[], 1, 0, 1)];

        let first = PlacementEngine::can_place(&bookings, day(), 1, 0, 1, 4).unwrap();
        let second = PlacementEngine::can_place(&bookings, day(), 1, 0, 1, 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let result = PlacementEngine::can_place(&[], day(), 0, 3, 2, 4);
        assert!(matches!(result, Err(PlacementError::OutOfBounds { .. })));

        let result = PlacementEngine::can_place(&[], day(), 0, 0, 4, 4);
        assert!(matches!(result, Err(PlacementError::InvalidSpan(4))));
    }

    #[test]
    fn test_bounds_check_near_u32_max() {
        // The start column plus span must not wrap the comparison.
        let result = PlacementEngine::can_place(&[], day(), 0, u32::MAX - 1, 3, 4);
        assert!(matches!(result, Err(PlacementError::OutOfBounds { .. })));

        let result = PlacementEngine::can_place(&[], day(), 0, u32::MAX, 1, 4);
        assert!(matches!(result, Err(PlacementError::OutOfBounds { .. })));
    }

    #[test]
    fn test_deleted_booking_does_not_conflict() {
        let mut existing = place(&[], 0, 0, 2);
        existing.status = BookingStatus::Deleted;
        let bookings = vec![existing];

        let check = PlacementEngine::can_place(&bookings, day(), 0, 0, 1, 4).unwrap();
        assert!(check.ok);
    }

    #[test]
    fn test_relocate_revalidates_whole_span() {
        let wide = place(&[], 0, 0, 2); // columns 0..=1
        let blocker = place(&[wide.clone()], 0, 3, 1); // column 3
        let bookings = vec![wide.clone(), blocker.clone()];

        // Destination anchor (column 2) is free but the span reaches
        // column 3, which is occupied.
        let result =
            PlacementEngine::relocate(&bookings, wide.id, 0, 2, 4, "u1", "Admin");
        match result {
            Err(PlacementError::Conflict { conflicting }) => {
                assert_eq!(conflicting, vec![blocker.id]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_relocate_ignores_own_footprint() {
        let booking = place(&[], 0, 0, 2);
        let bookings = vec![booking.clone()];

        // Shifting one column right overlaps the old footprint; that
        // must not count as a conflict.
        let moved =
            PlacementEngine::relocate(&bookings, booking.id, 0, 1, 4, "u1", "Admin").unwrap();
        assert_eq!(moved.start_column, 1);
        assert_eq!(moved.history.last().unwrap().action, HistoryAction::Moved);
        assert_eq!(
            moved.history.last().unwrap().detail.as_deref(),
            Some("from (0, 0) to (0, 1)")
        );
    }

    #[test]
    fn test_no_overlap_invariant_after_move() {
        let a = place(&[], 0, 0, 2);
        let bookings = vec![a.clone()];
        let b = place(&bookings, 0, 2, 2);
        let mut bookings = vec![a, b.clone()];

        let moved = PlacementEngine::relocate(&bookings, b.id, 1, 0, 4, "u1", "Admin").unwrap();
        let slot = bookings.iter_mut().find(|x| x.id == b.id).unwrap();
        *slot = moved;

        assert!(PlacementEngine::verify_no_overlap(&bookings, day()).is_ok());
    }

    #[test]
    fn test_status_change_audited_and_deleted_terminal() {
        let booking = place(&[], 0, 0, 1);

        let confirmed =
            PlacementEngine::change_status(&booking, BookingStatus::Confirmed, "u1", "Admin")
                .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(
            confirmed.history.last().unwrap().detail.as_deref(),
            Some("Unconfirmed -> Confirmed")
        );

        let deleted =
            PlacementEngine::change_status(&confirmed, BookingStatus::Deleted, "u1", "Admin")
                .unwrap();
        let result =
            PlacementEngine::change_status(&deleted, BookingStatus::Pending, "u1", "Admin");
        assert!(matches!(
            result,
            Err(PlacementError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_assign_and_unassign_resource() {
        let booking = place(&[], 0, 0, 2);

        let assigned =
            PlacementEngine::assign_resource(&booking, 1, "Mira", "u1", "Admin").unwrap();
        assert_eq!(assigned.assigned_resource_names[1], "Mira");
        assert_eq!(
            assigned.history.last().unwrap().action,
            HistoryAction::PilotAssigned
        );

        let cleared = PlacementEngine::unassign_resource(&assigned, 1, "u1", "Admin").unwrap();
        assert!(cleared.assigned_resource_names[1].is_empty());
        assert_eq!(
            cleared.history.last().unwrap().detail.as_deref(),
            Some("Mira")
        );

        let result = PlacementEngine::assign_resource(&booking, 2, "Mira", "u1", "Admin");
        assert!(matches!(
            result,
            Err(PlacementError::ColumnOffsetOutOfRange { offset: 2, span: 2 })
        ));
    }

    #[test]
    fn test_occupancy_map_covers_span() {
        let booking = place(&[], 2, 1, 3);
        let cells = PlacementEngine::occupancy(&[booking.clone()], day());

        assert_eq!(cells.len(), 3);
        assert_eq!(cells.get(&(2, 1)), Some(&booking.id));
        assert_eq!(cells.get(&(2, 3)), Some(&booking.id));
        assert_eq!(cells.get(&(2, 0)), None);
    }
}
