//! Normalised input events and pointer state
//!
//! Gesture decoding happens in the host. The engine only sees strokes and
//! taps in world coordinates with a velocity in px/ms, plus scalar pinch and
//! wheel deltas for the brush radius.

use crate::core_types::Vec2;
use serde::{Deserialize, Serialize};

/// Modifier keys and gesture flags attached to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    /// Erase obstacles, or place repellers
    pub shift: bool,
    /// Inject cold, or place dipoles
    pub alt: bool,
    /// Touch held in place; injects cold like `alt`
    pub long_press: bool,
}

impl Modifiers {
    /// Whether temperature injection should be negative
    pub fn cold(&self) -> bool {
        self.alt || self.long_press
    }
}

/// One stroke or tap sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeEvent {
    /// World position in pixels
    pub position: Vec2,
    /// Pointer velocity in px/ms
    pub velocity: Vec2,
    /// Held keys and gesture flags
    pub modifiers: Modifiers,
}

impl StrokeEvent {
    /// Event at `(x, y)` moving at `(vx, vy)` px/ms with no modifiers
    pub fn new(x: f32, y: f32, vx: f32, vy: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
            modifiers: Modifiers::default(),
        }
    }

    /// Attach modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether every coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|c| c.is_finite())
    }
}

/// Pointer state the driver injects from on every fixed step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    /// Whether a stroke (or tap pulse) is injecting
    pub active: bool,
    /// World position in pixels
    pub position: Vec2,
    /// World velocity in px/s
    pub velocity: Vec2,
    /// Modifiers of the latest event
    pub modifiers: Modifiers,
    /// Last non-zero stroke direction, used to aim dipoles
    pub last_direction: Vec2,
    /// Remaining seconds of a tap pulse
    pub tap_remaining: Option<f32>,
    /// Seconds since the last input
    pub idle_time: f32,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            active: false,
            position: Vec2::zeros(),
            velocity: Vec2::zeros(),
            modifiers: Modifiers::default(),
            last_direction: Vec2::new(1.0, 0.0),
            tap_remaining: None,
            idle_time: 0.0,
        }
    }
}

impl PointerState {
    /// Take over an event's position and scaled velocity and mark input activity
    pub fn update(&mut self, event: &StrokeEvent, velocity_scale: f32) {
        self.active = true;
        self.position = event.position;
        self.velocity = event.velocity * velocity_scale;
        // Long press is sticky for the rest of the stroke
        self.modifiers = Modifiers {
            long_press: self.modifiers.long_press || event.modifiers.long_press,
            ..event.modifiers
        };
        if self.velocity.norm() > f32::EPSILON {
            self.last_direction = self.velocity.normalize();
        }
        self.idle_time = 0.0;
    }

    /// End the current stroke
    pub fn release(&mut self) {
        self.active = false;
        self.velocity = Vec2::zeros();
        self.modifiers = Modifiers::default();
        self.tap_remaining = None;
    }

    /// Count down a tap pulse and idle time by one step
    pub fn tick(&mut self, dt: f32) {
        if let Some(remaining) = self.tap_remaining {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.release();
            } else {
                self.tap_remaining = Some(remaining);
            }
        }
        if !self.active {
            self.idle_time += dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_update_scales_velocity() {
        let mut pointer = PointerState::default();
        pointer.idle_time = 3.0;
        pointer.update(&StrokeEvent::new(10.0, 20.0, 0.3, -0.4), 1000.0);
        assert!(pointer.active);
        assert_relative_eq!(pointer.velocity.x, 300.0);
        assert_relative_eq!(pointer.velocity.y, -400.0);
        assert_relative_eq!(pointer.last_direction.x, 0.6);
        assert_eq!(pointer.idle_time, 0.0);
    }

    #[test]
    fn test_still_event_keeps_direction() {
        let mut pointer = PointerState::default();
        pointer.update(&StrokeEvent::new(0.0, 0.0, 0.0, 1.0), 1000.0);
        pointer.update(&StrokeEvent::new(5.0, 5.0, 0.0, 0.0), 1000.0);
        assert_relative_eq!(pointer.last_direction.y, 1.0);
    }

    #[test]
    fn test_long_press_sticks_until_release() {
        let mut pointer = PointerState::default();
        let held = Modifiers {
            long_press: true,
            ..Modifiers::default()
        };
        pointer.update(&StrokeEvent::new(0.0, 0.0, 0.0, 0.0).with_modifiers(held), 1.0);
        pointer.update(&StrokeEvent::new(1.0, 0.0, 0.0, 0.0), 1.0);
        assert!(pointer.modifiers.cold());
        pointer.release();
        assert!(!pointer.modifiers.cold());
    }

    #[test]
    fn test_tap_pulse_expires() {
        let mut pointer = PointerState::default();
        pointer.update(&StrokeEvent::new(0.0, 0.0, 1.0, 0.0), 1.0);
        pointer.tap_remaining = Some(0.05);
        pointer.tick(0.03);
        assert!(pointer.active);
        pointer.tick(0.03);
        assert!(!pointer.active);
        assert_eq!(pointer.idle_time, 0.03);
    }

    #[test]
    fn test_non_finite_event() {
        assert!(StrokeEvent::new(1.0, 2.0, 3.0, 4.0).is_finite());
        assert!(!StrokeEvent::new(f32::NAN, 2.0, 3.0, 4.0).is_finite());
    }
}
