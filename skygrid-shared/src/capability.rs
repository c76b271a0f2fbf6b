use serde::{Deserialize, Serialize};

/// Resolved capability set handed in by the auth collaborator.
///
/// The engine never computes these; it only consumes them to gate
/// drag/move interactions and slot management.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capabilities {
    pub can_manage_availability: bool,
    pub can_drag_bookings: bool,
}

impl Capabilities {
    /// Full administrative capability set
    pub fn admin() -> Self {
        Self {
            can_manage_availability: true,
            can_drag_bookings: true,
        }
    }

    /// Read-only viewer, no grid mutations
    pub fn read_only() -> Self {
        Self::default()
    }
}
