use skygrid_gesture::GestureError;
use skygrid_grid::PlacementError;
use skygrid_sync::StoreError;

/// Failures surfaced to the UI layer.
///
/// Nothing here is fatal: a failed operation leaves the prior grid
/// state intact and the grid interactive.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Gesture(#[from] GestureError),

    #[error("Write failed, local changes rolled back: {0}")]
    WriteFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(&'static str),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Request not found: {0}")]
    RequestNotFound(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::BookingNotFound(id),
            StoreError::WriteFailed(msg) => Self::WriteFailed(msg),
        }
    }
}
