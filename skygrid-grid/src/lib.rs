pub mod availability;
pub mod placement;

pub use availability::{AvailabilityEvaluator, AvailabilityReport};
pub use placement::{PlacementCheck, PlacementEngine, PlacementError, MAX_SPAN};
