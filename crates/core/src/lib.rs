//! Wind Simulation Core Library
//!
//! The engine behind an interactive wind toy: a coarse velocity grid painted by
//! pointer strokes, smoke and temperature carried through it by semi-Lagrangian
//! advection, user-painted walls, tracer particles with per-theme motion, and
//! optional attractor/repeller/dipole force sources.
//!
//! ## Architecture
//!
//! - [`grid`]: node grids (velocity, scalar, obstacle) and their shared geometry
//! - [`solver`]: per-step kernels (advection, buoyancy, forces, particles) and quality presets
//! - [`simulation`]: the fixed-step driver, input handling, settings and the quality governor
//!
//! The core never draws. Renderers and audio layers read the flat buffers and
//! flow statistics after each [`Simulation::advance_frame`].

// Core types and utilities
pub mod core_types;
pub mod error;

// Fields and kernels
pub mod grid;
pub mod solver;

// Driver
pub mod simulation;

// Re-export core types
pub use core_types::Vec2;
pub use error::SimError;

// Re-export grid types
pub use grid::{apply_obstacles_to_field, GridShape, ObstacleField, ScalarField, VelocityField};

// Re-export solver types
pub use solver::{
    ForceFieldLayer, ForceFieldParams, ForceKind, ForceSource, ForceSourceId, ParticleProfile,
    ParticleSystem, QualityPreset, Theme,
};

// Re-export driver types
pub use simulation::{
    BrushMode, FlowStats, FrameReport, GovernorConfig, GovernorState, Mode, Modifiers,
    OverlayMode, PerformanceGovernor, PhysicsMode, Settings, Simulation, SimulationConfig,
    SimulationState, StrokeEvent, Tool,
};
