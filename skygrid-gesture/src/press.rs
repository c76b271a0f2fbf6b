use serde::{Deserialize, Serialize};
use skygrid_shared::Capabilities;
use tracing::debug;

/// Timing and displacement thresholds for press gestures.
///
/// All durations are milliseconds; the tracker never reads a clock, the
/// caller passes timestamps in, so tests simulate elapsed time directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GestureConfig {
    /// T1: context menu arms after this hold.
    pub menu_arm_ms: u64,
    /// T2: move mode arms after this hold (drag-capable targets only).
    pub move_arm_ms: u64,
    /// Synthetic-click suppression window after a completed long-press.
    pub click_debounce_ms: u64,
    /// Pointer travel that cancels a pending press; `None` disables
    /// movement cancellation.
    pub cancel_threshold_px: Option<f32>,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            menu_arm_ms: 500,
            move_arm_ms: 1000,
            click_debounce_ms: 100,
            cancel_threshold_px: Some(8.0),
        }
    }
}

/// Current phase of the in-flight gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressPhase {
    Idle,
    Pressed,
    MenuArmed,
    MoveArmed,
    Dragging,
    Committed,
    Cancelled,
}

/// Feedback intensity applied to the pressed cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlowLevel {
    Off,
    Low,
    High,
}

/// What the tracker is pressing on
#[derive(Debug, Clone, Copy, Default)]
pub struct PressTarget {
    /// Whether this element type supports move mode at all.
    pub movable: bool,
}

/// Side effects emitted by the state machine for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    OpenContextMenu { x: f32, y: f32 },
    MoveModeEntered,
    HapticPulse,
    Glow(GlowLevel),
    MoveRequested { time_row: u32, column: u32 },
}

/// How a pointer release resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Released before T1: plain tap, the caller's click handler governs.
    Tap,
    /// Context menu was opened during the hold; nothing further.
    MenuOpen,
    /// Move mode stays armed, awaiting a destination cell.
    AwaitingDestination,
}

/// Long-press/drag gesture state machine.
///
/// Two timers run from press start: T1 arms the context menu, T2 arms
/// move mode. Movement beyond the cancel threshold before either fires
/// resets to idle with no side effects. The host drives time by calling
/// `poll` with the current timestamp.
pub struct PressTracker {
    config: GestureConfig,
    phase: PressPhase,
    glow: GlowLevel,
    press_started_ms: u64,
    origin: (f32, f32),
    pointer: (f32, f32),
    move_capable: bool,
    suppress_clicks_until_ms: u64,
}

impl PressTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: PressPhase::Idle,
            glow: GlowLevel::Off,
            press_started_ms: 0,
            origin: (0.0, 0.0),
            pointer: (0.0, 0.0),
            move_capable: false,
            suppress_clicks_until_ms: 0,
        }
    }

    pub fn phase(&self) -> PressPhase {
        self.phase
    }

    pub fn glow(&self) -> GlowLevel {
        self.glow
    }

    /// Begin a press. Move mode is reachable only when the target type
    /// supports it and the caller holds the drag capability.
    pub fn press_start(
        &mut self,
        now_ms: u64,
        x: f32,
        y: f32,
        target: PressTarget,
        capabilities: Capabilities,
    ) {
        self.phase = PressPhase::Pressed;
        self.glow = GlowLevel::Off;
        self.press_started_ms = now_ms;
        self.origin = (x, y);
        self.pointer = (x, y);
        self.move_capable = target.movable && capabilities.can_drag_bookings;
    }

    /// Advance the timers. Emits each arming event at most once, in
    /// order, even when a single poll jumps past both thresholds.
    pub fn poll(&mut self, now_ms: u64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        if !matches!(self.phase, PressPhase::Pressed | PressPhase::MenuArmed) {
            return events;
        }

        let held = now_ms.saturating_sub(self.press_started_ms);

        if self.phase == PressPhase::Pressed && held >= self.config.menu_arm_ms {
            self.phase = PressPhase::MenuArmed;
            self.glow = GlowLevel::Low;
            debug!(held_ms = held, "context menu armed");
            events.push(GestureEvent::OpenContextMenu {
                x: self.pointer.0,
                y: self.pointer.1,
            });
            events.push(GestureEvent::Glow(GlowLevel::Low));
        }

        if self.phase == PressPhase::MenuArmed
            && self.move_capable
            && held >= self.config.move_arm_ms
        {
            self.phase = PressPhase::MoveArmed;
            self.glow = GlowLevel::High;
            self.suppress_clicks_until_ms = now_ms + self.config.click_debounce_ms;
            debug!(held_ms = held, "move mode armed");
            events.push(GestureEvent::MoveModeEntered);
            events.push(GestureEvent::Glow(GlowLevel::High));
            events.push(GestureEvent::HapticPulse);
        }

        events
    }

    /// Pointer moved. Travel beyond the threshold before a timer fires
    /// cancels the gesture outright; after move-arming it is a drag.
    pub fn pointer_move(&mut self, now_ms: u64, x: f32, y: f32) {
        self.pointer = (x, y);
        match self.phase {
            PressPhase::Pressed => {
                if self.exceeded_threshold() {
                    debug!(
                        held_ms = now_ms.saturating_sub(self.press_started_ms),
                        "press cancelled by movement"
                    );
                    self.reset();
                }
            }
            PressPhase::MoveArmed | PressPhase::Dragging => {
                self.phase = PressPhase::Dragging;
            }
            _ => {}
        }
    }

    /// Pointer released. Clears both timers; a completed long-press
    /// extends the synthetic-click suppression window from here.
    pub fn release(&mut self, now_ms: u64) -> ReleaseOutcome {
        match self.phase {
            PressPhase::MoveArmed | PressPhase::Dragging => {
                self.suppress_clicks_until_ms = now_ms + self.config.click_debounce_ms;
                // Move mode survives the release, awaiting a cell tap.
                self.phase = PressPhase::MoveArmed;
                self.glow = GlowLevel::High;
                ReleaseOutcome::AwaitingDestination
            }
            PressPhase::MenuArmed => {
                self.reset();
                ReleaseOutcome::MenuOpen
            }
            _ => {
                self.reset();
                ReleaseOutcome::Tap
            }
        }
    }

    /// Pointer-cancel (system stole the gesture): drop everything.
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// While move mode is armed, a destination cell tap produces the
    /// move request the engine validates through placement.
    pub fn select_cell(&mut self, time_row: u32, column: u32) -> Result<GestureEvent, GestureError> {
        if !matches!(self.phase, PressPhase::MoveArmed | PressPhase::Dragging) {
            return Err(GestureError::NotArmed);
        }
        Ok(GestureEvent::MoveRequested { time_row, column })
    }

    /// Report the outcome of the requested move back to the tracker.
    /// Conflict rejection returns to idle with the origin untouched.
    pub fn resolve_move(&mut self, committed: bool) {
        self.phase = if committed {
            PressPhase::Committed
        } else {
            PressPhase::Cancelled
        };
        let terminal = self.phase;
        self.reset();
        debug!(?terminal, "move resolved");
    }

    /// Whether a synthetic click arriving now should be swallowed
    pub fn should_suppress_click(&self, now_ms: u64) -> bool {
        now_ms < self.suppress_clicks_until_ms
    }

    fn exceeded_threshold(&self) -> bool {
        let Some(threshold) = self.config.cancel_threshold_px else {
            return false;
        };
        let dx = self.pointer.0 - self.origin.0;
        let dy = self.pointer.1 - self.origin.1;
        (dx * dx + dy * dy).sqrt() > threshold
    }

    fn reset(&mut self) {
        self.phase = PressPhase::Idle;
        self.glow = GlowLevel::Off;
        self.move_capable = false;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GestureError {
    #[error("Move mode is not armed")]
    NotArmed,
}
