pub mod press;

pub use press::{
    GestureConfig, GestureError, GestureEvent, GlowLevel, PressPhase, PressTarget, PressTracker,
    ReleaseOutcome,
};
