//! Node grids: geometry, velocity, scalar quantities and obstacles

pub mod obstacle_field;
pub mod scalar_field;
pub mod shape;
pub mod velocity_field;

// Re-export main types
pub use obstacle_field::{apply_obstacles_to_field, ObstacleField};
pub use scalar_field::ScalarField;
pub use shape::{Brush, GridShape};
pub use velocity_field::VelocityField;
