//! Per-step wind physics
//!
//! This module holds the kernels the fixed-step driver runs each tick. The
//! grids themselves live in [`crate::grid`]; everything here reads or
//! mutates them:
//!
//! - [`advection`]: semi-Lagrangian transport of smoke and temperature
//! - [`buoyancy`]: temperature pushing the vertical velocity
//! - [`force_field`]: user-placed attractors, repellers and dipoles
//! - [`particles`]: tracer particles carried by the wind
//! - [`quality`]: grid resolution and particle population per preset
//! - [`theme`]: particle motion profile per visual theme
//!
//! # Example
//!
//! ```rust,ignore
//! use wind_sim_core::grid::{GridShape, ScalarField, VelocityField};
//! use wind_sim_core::solver::QualityPreset;
//!
//! let (w, h) = QualityPreset::High.grid_dimensions(800.0, 600.0);
//! let shape = GridShape::new(800.0, 600.0, w, h);
//! let mut velocity = VelocityField::new(shape)?;
//! let mut smoke = ScalarField::new(shape)?;
//! velocity.add_velocity(100.0, 300.0, 400.0, 0.0, 40.0, 1.0);
//! smoke.add_scalar(100.0, 300.0, 1.0, 40.0, None);
//! smoke.advect(&velocity, 1.0 / 60.0, 0.985, None);
//! ```

pub mod advection;
pub mod buoyancy;
pub mod force_field;
pub mod particles;
pub mod quality;
pub mod theme;

// Re-exports
pub use advection::{advect_scalar_cpu, AdvectionParams};
pub use buoyancy::{apply_buoyancy, BUOYANCY_SCALE};
pub use force_field::{ForceFieldLayer, ForceFieldParams, ForceKind, ForceSource, ForceSourceId};
pub use particles::{ParticleSystem, StepOptions};
pub use quality::{QualityPreset, MAX_GRID_DIM, MAX_PARTICLES, MIN_PARTICLES};
pub use theme::{ParticleProfile, Theme};
