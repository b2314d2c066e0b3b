//! Temperature-to-velocity coupling
//!
//! Warm nodes rise and cold nodes sink. The coupling is a direct linear
//! push on the vertical velocity component, not a solved equation of state:
//!
//! ```text
//! v -= T · strength · BUOYANCY_SCALE · dt
//! ```
//!
//! Canvas y grows downward, so "up" is negative v. Nothing is clamped here;
//! the velocity field's own damping bounds runaway updrafts.

use crate::grid::{ScalarField, VelocityField};
use rayon::prelude::*;
use tracing::warn;

/// Converts unit temperature into px/s² of vertical acceleration
pub const BUOYANCY_SCALE: f32 = 240.0;

/// Push the velocity field vertically according to temperature
///
/// Grids of different shapes are left untouched.
pub fn apply_buoyancy(
    velocity: &mut VelocityField,
    temperature: &ScalarField,
    strength: f32,
    dt: f32,
) {
    if temperature.data().len() != velocity.v().len() {
        warn!(
            "Buoyancy skipped: temperature grid ({}) does not match velocity grid ({})",
            temperature.data().len(),
            velocity.v().len()
        );
        return;
    }
    if !strength.is_finite() || !dt.is_finite() {
        return;
    }
    let scale = strength * BUOYANCY_SCALE * dt;
    if scale == 0.0 {
        return;
    }
    let (_, v) = velocity.components_mut();
    v.par_iter_mut()
        .zip(temperature.data().par_iter())
        .for_each(|(v, &t)| *v -= t * scale);
}
