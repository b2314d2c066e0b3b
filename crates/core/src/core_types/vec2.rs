//! Vector type alias for 2D positions and directions.

use nalgebra::Vector2;

/// 2D vector type for canvas positions, pointer velocities and directions.
///
/// This is a simple alias for `nalgebra::Vector2<f32>`, used for force-source
/// placement and gesture events. Grid kernels work on flat `f32` buffers.
pub type Vec2 = Vector2<f32>;
