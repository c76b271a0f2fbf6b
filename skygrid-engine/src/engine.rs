use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use skygrid_gesture::{GestureEvent, PressTracker};
use skygrid_grid::{AvailabilityEvaluator, AvailabilityReport, PlacementEngine};
use skygrid_ranking::{derive_metrics, ResourceRanker};
use skygrid_shared::{
    Booking, BookingRequest, BookingStatus, Capabilities, DaySchedule, HistoryAction,
    RequestStatus, Resource,
};
use skygrid_sync::{BookingPatch, BookingStore, EditLockQueue, GridSnapshot, SyncState};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::EngineError;

/// The scheduling grid facade the UI layer talks to.
///
/// Owns the working booking set and serializes every mutation path
/// through it: confirmed stream snapshots while live, the one-shot
/// buffered flush at edit-session end, and optimistic local writes.
/// Writes go to the store fire-and-forget style; their confirmations
/// come back through the snapshot feed. A newer snapshot always wins
/// over a diverged optimistic copy (stale writes are never merged).
pub struct GridEngine {
    bookings: Vec<Booking>,
    resources: Vec<Resource>,
    requests: Vec<BookingRequest>,
    schedule: DaySchedule,
    queue: EditLockQueue,
    store: Arc<dyn BookingStore>,
    ranker: ResourceRanker,
    capabilities: Capabilities,
    column_capacity: u32,
    /// Working set as of the last applied snapshot; rollback target
    /// when a write fails.
    last_confirmed: Vec<Booking>,
    actor_id: String,
    actor_name: String,
}

impl GridEngine {
    pub fn new(
        store: Arc<dyn BookingStore>,
        capabilities: Capabilities,
        schedule: DaySchedule,
        column_capacity: u32,
        actor_id: String,
        actor_name: String,
    ) -> Self {
        Self {
            bookings: Vec::new(),
            resources: Vec::new(),
            requests: Vec::new(),
            schedule,
            queue: EditLockQueue::new(),
            store,
            ranker: ResourceRanker::new(),
            capabilities,
            column_capacity,
            last_confirmed: Vec::new(),
            actor_id,
            actor_name,
        }
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn requests(&self) -> &[BookingRequest] {
        &self.requests
    }

    pub fn schedule(&self) -> &DaySchedule {
        &self.schedule
    }

    pub fn sync_state(&self) -> SyncState {
        self.queue.state()
    }

    fn resource_count(&self) -> u32 {
        self.resources.len() as u32
    }

    fn date(&self) -> NaiveDate {
        self.schedule.date
    }

    // ---- stream reconciliation -------------------------------------

    /// Feed an incoming stream snapshot through the edit lock. Applies
    /// immediately while live, buffers (latest wins) while editing.
    pub fn handle_snapshot(&mut self, snapshot: GridSnapshot) {
        if let Some(snapshot) = self.queue.offer(snapshot) {
            self.apply_snapshot(snapshot);
        }
    }

    /// Start a sensitive interaction (drag, in-place field edit).
    pub fn begin_edit(&mut self) {
        self.queue.begin_session();
    }

    /// End a sensitive interaction; flushes the buffered snapshot once
    /// all overlapping sessions have closed.
    pub fn end_edit(&mut self) {
        if let Some(snapshot) = self.queue.end_session() {
            self.apply_snapshot(snapshot);
        }
    }

    /// The snapshot is the source of truth: any diverged optimistic
    /// copy is overwritten, never merged.
    fn apply_snapshot(&mut self, snapshot: GridSnapshot) {
        info!(
            bookings = snapshot.bookings.len(),
            resources = snapshot.resources.len(),
            "applying stream snapshot"
        );
        let mut bookings = snapshot.bookings;
        let before = bookings.len();
        // A zero-span row would break the column math downstream.
        bookings.retain(|b| b.span > 0);
        if bookings.len() < before {
            warn!(
                dropped = before - bookings.len(),
                "dropped zero-span bookings from stream snapshot"
            );
        }
        self.bookings = bookings;
        self.resources = snapshot.resources;
        self.last_confirmed = self.bookings.clone();
    }

    fn rollback(&mut self, context: &str) {
        error!(context, "write failed, rolling back to last known-good state");
        self.bookings = self.last_confirmed.clone();
    }

    // ---- booking operations ----------------------------------------

    /// Place a new booking. Overbooking is advisory: the report is
    /// returned to the caller, never used to reject.
    pub async fn place_booking(
        &mut self,
        time_row: u32,
        start_column: u32,
        span: u32,
        customer_name: String,
        headcount: u32,
    ) -> Result<(Uuid, AvailabilityReport), EngineError> {
        let report = self.availability(time_row, headcount);
        if report.would_overbook {
            warn!(
                time_row,
                headcount, report.available_spots, "placing despite overbooking"
            );
        }

        let booking = PlacementEngine::place(
            &self.bookings,
            self.date(),
            time_row,
            start_column,
            span,
            customer_name,
            headcount,
            self.resource_count(),
            &self.actor_id,
            &self.actor_name,
        )?;
        let id = booking.id;

        // Optimistic apply, then persist; confirmation arrives via feed.
        self.bookings.push(booking.clone());
        debug_assert!(PlacementEngine::verify_no_overlap(&self.bookings, self.date()).is_ok());

        if let Err(err) = self.store.create(&booking).await {
            self.rollback("create booking");
            return Err(err.into());
        }
        Ok((id, report))
    }

    /// Relocate a booking. The whole destination span is re-validated
    /// and the swap is one logical step: old and new occupancy are
    /// never visible together.
    pub async fn move_booking(
        &mut self,
        booking_id: Uuid,
        new_time_row: u32,
        new_start_column: u32,
    ) -> Result<(), EngineError> {
        if !self.capabilities.can_drag_bookings {
            return Err(EngineError::PermissionDenied("move requires drag capability"));
        }

        let moved = PlacementEngine::relocate(
            &self.bookings,
            booking_id,
            new_time_row,
            new_start_column,
            self.resource_count(),
            &self.actor_id,
            &self.actor_name,
        )?;
        self.replace_local(moved)?;
        debug_assert!(PlacementEngine::verify_no_overlap(&self.bookings, self.date()).is_ok());

        let patch = BookingPatch {
            time_row: Some(new_time_row),
            start_column: Some(new_start_column),
            ..BookingPatch::default()
        };
        if let Err(err) = self.store.update(booking_id, patch).await {
            self.rollback("move booking");
            return Err(err.into());
        }
        Ok(())
    }

    /// Update customer-facing fields in place.
    pub async fn update_booking(
        &mut self,
        booking_id: Uuid,
        patch: BookingPatch,
    ) -> Result<(), EngineError> {
        let booking = self.find(booking_id)?;
        let mut updated = booking.clone();
        patch.apply_to(&mut updated);
        updated.record(
            HistoryAction::FieldsUpdated,
            &self.actor_id,
            &self.actor_name,
            serde_json::to_string(&patch).ok(),
        );
        self.replace_local(updated)?;

        if let Err(err) = self.store.update(booking_id, patch).await {
            self.rollback("update booking");
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn set_status(
        &mut self,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<(), EngineError> {
        let booking = self.find(booking_id)?;
        let updated =
            PlacementEngine::change_status(booking, status, &self.actor_id, &self.actor_name)?;
        self.replace_local(updated)?;

        let patch = BookingPatch {
            status: Some(status),
            ..BookingPatch::default()
        };
        if let Err(err) = self.store.update(booking_id, patch).await {
            self.rollback("set status");
            return Err(err.into());
        }
        Ok(())
    }

    /// Soft delete: the row is retained for audit and stops blocking
    /// the grid.
    pub async fn delete_booking(&mut self, booking_id: Uuid) -> Result<(), EngineError> {
        let booking = self.find(booking_id)?;
        let updated = PlacementEngine::change_status(
            booking,
            BookingStatus::Deleted,
            &self.actor_id,
            &self.actor_name,
        )?;
        self.replace_local(updated)?;

        if let Err(err) = self.store.delete(booking_id).await {
            self.rollback("delete booking");
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn assign_resource(
        &mut self,
        booking_id: Uuid,
        column_offset: u32,
        resource_name: &str,
    ) -> Result<(), EngineError> {
        let booking = self.find(booking_id)?;
        let updated = PlacementEngine::assign_resource(
            booking,
            column_offset,
            resource_name,
            &self.actor_id,
            &self.actor_name,
        )?;
        let names = updated.assigned_resource_names.clone();
        self.replace_local(updated)?;

        let patch = BookingPatch {
            assigned_resource_names: Some(names),
            ..BookingPatch::default()
        };
        if let Err(err) = self.store.update(booking_id, patch).await {
            self.rollback("assign resource");
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn unassign_resource(
        &mut self,
        booking_id: Uuid,
        column_offset: u32,
    ) -> Result<(), EngineError> {
        let booking = self.find(booking_id)?;
        let updated = PlacementEngine::unassign_resource(
            booking,
            column_offset,
            &self.actor_id,
            &self.actor_name,
        )?;
        let names = updated.assigned_resource_names.clone();
        self.replace_local(updated)?;

        let patch = BookingPatch {
            assigned_resource_names: Some(names),
            ..BookingPatch::default()
        };
        if let Err(err) = self.store.update(booking_id, patch).await {
            self.rollback("unassign resource");
            return Err(err.into());
        }
        Ok(())
    }

    // ---- booking requests ------------------------------------------

    pub fn submit_request(&mut self, request: BookingRequest) -> Uuid {
        let id = request.id;
        info!(request_id = %id, "booking request submitted");
        self.requests.push(request);
        id
    }

    /// Approve a request into a real booking at the chosen cell. Goes
    /// through the same placement gate as any other booking; approval
    /// is always explicit.
    pub async fn approve_request(
        &mut self,
        request_id: Uuid,
        start_column: u32,
        span: u32,
    ) -> Result<(Uuid, AvailabilityReport), EngineError> {
        let request = self
            .requests
            .iter()
            .find(|r| r.id == request_id)
            .ok_or_else(|| EngineError::RequestNotFound(request_id.to_string()))?;
        if !request.is_open() {
            return Err(EngineError::RequestNotFound(format!(
                "{request_id} is not open for approval"
            )));
        }

        let (time_row, customer_name, headcount) =
            (request.time_row, request.customer_name.clone(), request.headcount);
        let placed = self
            .place_booking(time_row, start_column, span, customer_name, headcount)
            .await?;

        if let Some(request) = self.requests.iter_mut().find(|r| r.id == request_id) {
            request.status = RequestStatus::Approved;
        }
        Ok(placed)
    }

    pub fn set_request_status(
        &mut self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<(), EngineError> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| EngineError::RequestNotFound(request_id.to_string()))?;
        request.status = status;
        Ok(())
    }

    // ---- availability, ranking, rendering --------------------------

    pub fn availability(&self, time_row: u32, requested_headcount: u32) -> AvailabilityReport {
        let capacities = vec![self.column_capacity; self.resources.len()];
        AvailabilityEvaluator::evaluate(
            &self.bookings,
            self.date(),
            time_row,
            requested_headcount,
            &capacities,
        )
    }

    /// Column order for rendering. Reference-stable: the same `Arc`
    /// comes back while the computed order is unchanged.
    pub fn ranked_resources(&mut self) -> Arc<Vec<Resource>> {
        let metrics = derive_metrics(
            &self.resources,
            &self.bookings,
            self.date(),
            self.schedule.row_count() as u32,
        );
        self.ranker.rank(&self.resources, &metrics)
    }

    pub fn occupancy(&self) -> HashMap<(u32, u32), Uuid> {
        PlacementEngine::occupancy(&self.bookings, self.date())
    }

    // ---- slot management -------------------------------------------

    pub fn override_slot_label(&mut self, time_row: u32, label: String) -> Result<(), EngineError> {
        if !self.capabilities.can_manage_availability {
            return Err(EngineError::PermissionDenied(
                "slot management requires availability capability",
            ));
        }
        self.schedule.override_label(time_row, label);
        Ok(())
    }

    pub fn append_slot(&mut self, label: String) -> Result<u32, EngineError> {
        if !self.capabilities.can_manage_availability {
            return Err(EngineError::PermissionDenied(
                "slot management requires availability capability",
            ));
        }
        Ok(self.schedule.append_slot(label))
    }

    // ---- gesture integration ---------------------------------------

    /// Commit a move-mode destination pick. Validation failures reject
    /// the move, return the tracker to idle, and leave the origin
    /// booking untouched.
    pub async fn commit_gesture_move(
        &mut self,
        tracker: &mut PressTracker,
        booking_id: Uuid,
        time_row: u32,
        column: u32,
    ) -> Result<(), EngineError> {
        let GestureEvent::MoveRequested { time_row, column } =
            tracker.select_cell(time_row, column)?
        else {
            return Err(EngineError::Gesture(skygrid_gesture::GestureError::NotArmed));
        };

        match self.move_booking(booking_id, time_row, column).await {
            Ok(()) => {
                tracker.resolve_move(true);
                Ok(())
            }
            Err(err) => {
                tracker.resolve_move(false);
                Err(err)
            }
        }
    }

    // ---- internals --------------------------------------------------

    fn find(&self, booking_id: Uuid) -> Result<&Booking, EngineError> {
        self.bookings
            .iter()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| EngineError::BookingNotFound(booking_id.to_string()))
    }

    /// Swap an updated copy over the original in one step.
    fn replace_local(&mut self, updated: Booking) -> Result<(), EngineError> {
        let slot = self
            .bookings
            .iter_mut()
            .find(|b| b.id == updated.id)
            .ok_or_else(|| EngineError::BookingNotFound(updated.id.to_string()))?;
        *slot = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygrid_shared::ResourceKind;
    use skygrid_sync::{InMemoryBookingStore, SnapshotFeed};

    fn schedule() -> DaySchedule {
        DaySchedule::new(
            NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
            vec!["09:00".to_string(), "11:00".to_string()],
        )
    }

    fn engine_with(capabilities: Capabilities) -> GridEngine {
        let store = Arc::new(InMemoryBookingStore::new(SnapshotFeed::new(16)));
        let mut engine = GridEngine::new(
            store,
            capabilities,
            schedule(),
            4,
            "u1".to_string(),
            "Admin".to_string(),
        );
        let resources = vec![
            Resource::new("Mira".to_string(), ResourceKind::Pilot).with_priority(1),
            Resource::new("Jon".to_string(), ResourceKind::Pilot).with_priority(2),
        ];
        engine.apply_snapshot(GridSnapshot::new(Vec::new(), resources));
        engine
    }

    #[tokio::test]
    async fn test_overbooking_flagged_but_permitted() {
        let mut engine = engine_with(Capabilities::admin());

        // Two columns of capacity 4: 8 total spots.
        let (_, report) = engine
            .place_booking(0, 0, 1, "Big Group".to_string(), 10)
            .await
            .unwrap();

        assert_eq!(report.available_spots, 8);
        assert!(report.would_overbook);
        assert_eq!(engine.bookings().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_drops_zero_span_bookings() {
        let mut engine = engine_with(Capabilities::admin());
        let (kept, _) = engine
            .place_booking(0, 0, 1, "Kept".to_string(), 2)
            .await
            .unwrap();

        let mut malformed = Booking::new(
            schedule().date,
            0,
            1,
            1,
            "Malformed".to_string(),
            2,
        );
        malformed.span = 0;
        let mut bookings = engine.bookings().to_vec();
        bookings.push(malformed);
        engine.apply_snapshot(GridSnapshot::new(bookings, Vec::new()));

        assert_eq!(engine.bookings().len(), 1);
        assert_eq!(engine.bookings()[0].id, kept);
        // Column math stays safe after the sanitized apply.
        assert_eq!(engine.occupancy().len(), 1);
    }

    #[tokio::test]
    async fn test_move_requires_capability() {
        let mut engine = engine_with(Capabilities::read_only());
        let result = engine.move_booking(Uuid::new_v4(), 0, 0).await;
        assert!(matches!(result, Err(EngineError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_optimistic_state() {
        let feed = SnapshotFeed::new(16);
        let store = Arc::new(InMemoryBookingStore::new(feed));
        let mut engine = GridEngine::new(
            store.clone(),
            Capabilities::admin(),
            schedule(),
            4,
            "u1".to_string(),
            "Admin".to_string(),
        );
        engine.apply_snapshot(GridSnapshot::new(
            Vec::new(),
            vec![Resource::new("Mira".to_string(), ResourceKind::Pilot)],
        ));

        store.fail_next_write();
        let result = engine.place_booking(0, 0, 1, "Customer".to_string(), 2).await;

        assert!(matches!(result, Err(EngineError::WriteFailed(_))));
        // Grid interactive with the prior state intact.
        assert!(engine.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_leaves_grid_unchanged() {
        let mut engine = engine_with(Capabilities::admin());
        let (first, _) = engine
            .place_booking(0, 0, 2, "Span".to_string(), 2)
            .await
            .unwrap();

        let result = engine.place_booking(0, 1, 1, "Other".to_string(), 1).await;
        match result {
            Err(EngineError::Placement(skygrid_grid::PlacementError::Conflict {
                conflicting,
            })) => assert_eq!(conflicting, vec![first]),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(engine.bookings().len(), 1);
    }

    #[tokio::test]
    async fn test_request_approval_is_explicit() {
        let mut engine = engine_with(Capabilities::admin());
        let request = BookingRequest::new(engine.date(), 1, 3, "Sam".to_string());
        let request_id = engine.submit_request(request);

        // Submitting alone never creates a booking.
        assert!(engine.bookings().is_empty());

        let (booking_id, _) = engine.approve_request(request_id, 0, 1).await.unwrap();
        assert_eq!(engine.bookings().len(), 1);
        assert_eq!(engine.bookings()[0].id, booking_id);
        assert_eq!(engine.requests()[0].status, RequestStatus::Approved);

        // A second approval of the same request is rejected.
        let again = engine.approve_request(request_id, 1, 1).await;
        assert!(matches!(again, Err(EngineError::RequestNotFound(_))));
    }

    #[tokio::test]
    async fn test_slot_management_gated() {
        let mut engine = engine_with(Capabilities::read_only());
        let result = engine.append_slot("17:00".to_string());
        assert!(matches!(result, Err(EngineError::PermissionDenied(_))));

        let mut admin = engine_with(Capabilities::admin());
        let row = admin.append_slot("17:00".to_string()).unwrap();
        assert_eq!(row, skygrid_shared::ADDITIONAL_SLOT_OFFSET);
    }

    #[test]
    fn test_editing_buffers_snapshots_until_session_end() {
        let mut engine = engine_with(Capabilities::admin());
        engine.begin_edit();
        assert_eq!(engine.sync_state(), SyncState::Editing);

        let booking = Booking::new(engine.date(), 0, 0, 1, "A".to_string(), 1);
        engine.handle_snapshot(GridSnapshot::new(vec![booking.clone()], Vec::new()));
        assert!(engine.bookings().is_empty());

        engine.end_edit();
        assert_eq!(engine.sync_state(), SyncState::Live);
        assert_eq!(engine.bookings().len(), 1);
    }
}
