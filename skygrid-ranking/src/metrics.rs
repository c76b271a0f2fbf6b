use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use skygrid_shared::{Booking, Resource, ResourceMetrics};
use uuid::Uuid;

/// Recompute per-resource metrics for one day.
///
/// A resource is "booked" in a time row when any non-deleted booking on
/// that date lists its display name among the assigned columns.
pub fn derive_metrics(
    resources: &[Resource],
    bookings: &[Booking],
    date: NaiveDate,
    row_count: u32,
) -> HashMap<Uuid, ResourceMetrics> {
    let todays: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.date == date && b.blocks_occupancy())
        .collect();

    resources
        .iter()
        .map(|resource| {
            let mut bookings_today = 0u32;
            let mut busy_rows: HashSet<u32> = HashSet::new();
            for booking in &todays {
                if booking
                    .assigned_resource_names
                    .iter()
                    .any(|name| name == &resource.display_name)
                {
                    bookings_today += 1;
                    busy_rows.insert(booking.time_row);
                }
            }
            let metrics = ResourceMetrics {
                bookings_today,
                open_slots_today: row_count.saturating_sub(busy_rows.len() as u32),
            };
            (resource.id, metrics)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygrid_shared::ResourceKind;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
    }

    fn booking_with_pilot(time_row: u32, pilot: &str) -> Booking {
        let mut booking = Booking::new(day(), time_row, 0, 1, "Customer".to_string(), 2);
        booking.assigned_resource_names[0] = pilot.to_string();
        booking
    }

    #[test]
    fn test_metrics_count_assignments_per_day() {
        let mira = Resource::new("Mira".to_string(), ResourceKind::Pilot);
        let jon = Resource::new("Jon".to_string(), ResourceKind::Pilot);

        let bookings = vec![
            booking_with_pilot(0, "Mira"),
            booking_with_pilot(2, "Mira"),
            booking_with_pilot(1, "Jon"),
        ];

        let metrics = derive_metrics(&[mira.clone(), jon.clone()], &bookings, day(), 4);

        assert_eq!(metrics[&mira.id].bookings_today, 2);
        assert_eq!(metrics[&mira.id].open_slots_today, 2);
        assert_eq!(metrics[&jon.id].bookings_today, 1);
        assert_eq!(metrics[&jon.id].open_slots_today, 3);
    }

    #[test]
    fn test_deleted_bookings_are_excluded() {
        let mira = Resource::new("Mira".to_string(), ResourceKind::Pilot);
        let mut booking = booking_with_pilot(0, "Mira");
        booking.status = skygrid_shared::BookingStatus::Deleted;

        let metrics = derive_metrics(std::slice::from_ref(&mira), &[booking], day(), 4);
        assert_eq!(metrics[&mira.id].bookings_today, 0);
        assert_eq!(metrics[&mira.id].open_slots_today, 4);
    }
}
