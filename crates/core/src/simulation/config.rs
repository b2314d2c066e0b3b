//! Engine tuning constants
//!
//! Everything the driver needs that is not a user control lives in
//! [`SimulationConfig`]. Defaults reproduce the toy's feel at 60 Hz; hosts can
//! deserialize an override from JSON or TOML.

use super::clock::DEFAULT_SIM_STEP;
use super::governor::GovernorConfig;
use crate::solver::{ForceFieldParams, MAX_GRID_DIM};
use serde::{Deserialize, Serialize};

/// Tuning constants for [`Simulation`](super::Simulation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed physics step in seconds
    pub sim_step: f32,
    /// Per-frame elapsed-time clamp in seconds (`None` disables)
    pub max_frame_delta: Option<f32>,

    /// Per-step velocity damping factor
    pub velocity_damping: f32,
    /// Per-step velocity damping factor with wind memory on
    pub memory_velocity_damping: f32,
    /// Smoothing strength per step
    pub diffusion: f32,
    /// Smoothing strength per step with wind memory on
    pub memory_diffusion: f32,
    /// Factor applied to velocity across a wall face
    pub boundary_damping: f32,

    /// Per-step smoke decay
    pub smoke_dissipation: f32,
    /// Per-step temperature decay
    pub temperature_dissipation: f32,
    /// Smoke injected per step while a stroke is active
    pub smoke_amount: f32,
    /// Heat injected per step while a stroke is active (negated for cold)
    pub heat_amount: f32,
    /// Fraction of the pointer velocity injected per step
    pub brush_strength: f32,
    /// Spin per unit pointer speed for the vortex brush
    pub vortex_spin: f32,
    /// Pointer speed assumed by the vortex brush when the pointer is still (px/s)
    pub vortex_min_speed: f32,

    /// Converts gesture velocity (px/ms) to world velocity (px/s)
    pub pointer_velocity_scale: f32,
    /// Multiplier on tap impulses
    pub tap_multiplier: f32,
    /// How long a tap keeps injecting, in seconds
    pub tap_duration: f32,
    /// Brush radius change per pinch pixel
    pub pinch_sensitivity: f32,
    /// Brush radius change per wheel unit
    pub wheel_sensitivity: f32,
    /// Smallest brush radius in pixels
    pub min_brush_radius: f32,
    /// Largest brush radius in pixels
    pub max_brush_radius: f32,

    /// Seconds without input before the idle breeze starts
    pub idle_breeze_delay: f32,
    /// Idle breeze speed in px/s
    pub idle_breeze_speed: f32,
    /// Idle breeze injection strength per step
    pub idle_breeze_strength: f32,

    /// Limits shared by every force source
    pub force_field: ForceFieldParams,
    /// Strength of a source placed by a multi-finger tap
    pub force_strength: f32,
    /// Radius of a source placed by a multi-finger tap
    pub force_radius: f32,

    /// Node budget per grid. A tier whose grid would exceed it is treated as
    /// an allocation failure, so constrained hosts fall back to Low early.
    pub max_grid_nodes: usize,

    /// Seed for particle placement
    pub seed: u64,
    /// Quality governor thresholds
    pub governor: GovernorConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sim_step: DEFAULT_SIM_STEP,
            max_frame_delta: Some(0.25),

            velocity_damping: 0.975,
            memory_velocity_damping: 0.993,
            diffusion: 0.18,
            memory_diffusion: 0.06,
            boundary_damping: 0.25,

            smoke_dissipation: 0.985,
            temperature_dissipation: 0.992,
            smoke_amount: 0.35,
            heat_amount: 0.25,
            brush_strength: 0.35,
            vortex_spin: 0.8,
            vortex_min_speed: 120.0,

            pointer_velocity_scale: 1000.0,
            tap_multiplier: 2.0,
            tap_duration: 0.12,
            pinch_sensitivity: 0.2,
            wheel_sensitivity: -0.02,
            min_brush_radius: 12.0,
            max_brush_radius: 160.0,

            idle_breeze_delay: 4.0,
            idle_breeze_speed: 90.0,
            idle_breeze_strength: 0.05,

            force_field: ForceFieldParams::default(),
            force_strength: 60_000.0,
            force_radius: 140.0,

            max_grid_nodes: MAX_GRID_DIM * MAX_GRID_DIM,

            seed: 0x5EED_u64,
            governor: GovernorConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Damping factor for the current wind-memory setting
    pub fn damping(&self, wind_memory: bool) -> f32 {
        if wind_memory {
            self.memory_velocity_damping
        } else {
            self.velocity_damping
        }
    }

    /// Smoothing strength for the current wind-memory setting
    pub fn diffusion_strength(&self, wind_memory: bool) -> f32 {
        if wind_memory {
            self.memory_diffusion
        } else {
            self.diffusion
        }
    }

    /// Clamp a brush radius into the configured range
    pub fn clamp_brush_radius(&self, radius: f32) -> f32 {
        if radius.is_nan() {
            return self.min_brush_radius;
        }
        radius.clamp(self.min_brush_radius, self.max_brush_radius.max(self.min_brush_radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_is_stickier() {
        let config = SimulationConfig::default();
        assert!(config.damping(true) > config.damping(false));
        assert!(config.diffusion_strength(true) < config.diffusion_strength(false));
    }

    #[test]
    fn test_clamp_brush_radius() {
        let config = SimulationConfig::default();
        assert_eq!(config.clamp_brush_radius(5.0), 12.0);
        assert_eq!(config.clamp_brush_radius(500.0), 160.0);
        assert_eq!(config.clamp_brush_radius(f32::NAN), 12.0);
        assert_eq!(config.clamp_brush_radius(42.0), 42.0);
    }
}
