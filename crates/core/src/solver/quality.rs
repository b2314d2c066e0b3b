//! Quality presets for grid resolution and particle population
//!
//! This module defines quality presets that determine grid resolution and particle count.
//! Higher quality means a finer velocity grid and more particles but more computational cost.

use crate::grid::shape::MIN_GRID_DIM;
use serde::{Deserialize, Serialize};

/// Upper bound on grid nodes along either axis
pub const MAX_GRID_DIM: usize = 512;

/// Lower bound on particle population
pub const MIN_PARTICLES: usize = 64;

/// Upper bound on particle population
pub const MAX_PARTICLES: usize = 12_000;

/// Quality preset determining grid resolution and particle density
///
/// The grid dimensions are calculated from the world size so that cell size
/// stays roughly constant across canvas sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QualityPreset {
    /// High quality: ~12px cells, one particle per ~180px²
    #[default]
    High,
    /// Low quality: ~20px cells, one particle per ~400px²
    Low,
}

impl QualityPreset {
    /// Get target cell size in world pixels for this quality preset
    #[must_use]
    pub const fn target_cell_size(&self) -> f32 {
        match self {
            Self::High => 12.0,
            Self::Low => 20.0,
        }
    }

    /// World area (px²) covered by each particle
    #[must_use]
    pub const fn area_per_particle(&self) -> f32 {
        match self {
            Self::High => 180.0,
            Self::Low => 400.0,
        }
    }

    /// Calculate grid dimensions for a world rectangle
    ///
    /// # Arguments
    ///
    /// * `world_width` - World width in pixels
    /// * `world_height` - World height in pixels
    ///
    /// # Returns
    ///
    /// Tuple of `(width, height)` in nodes. Nodes sit on cell corners, so a
    /// world `n` cells wide has `n + 1` nodes.
    #[must_use]
    pub fn grid_dimensions(&self, world_width: f32, world_height: f32) -> (usize, usize) {
        let cell = self.target_cell_size();
        (
            nodes_along(world_width, cell),
            nodes_along(world_height, cell),
        )
    }

    /// Calculate particle population for a world rectangle
    #[must_use]
    pub fn particle_count(&self, world_width: f32, world_height: f32) -> usize {
        let area = finite_or_zero(world_width) * finite_or_zero(world_height);
        let count = (area / self.area_per_particle()).round() as usize;
        count.clamp(MIN_PARTICLES, MAX_PARTICLES)
    }

    /// The other preset
    #[must_use]
    pub const fn toggled(&self) -> Self {
        match self {
            Self::High => Self::Low,
            Self::Low => Self::High,
        }
    }
}

fn nodes_along(extent: f32, cell: f32) -> usize {
    // The float-to-int cast saturates, so only the node increment can overflow
    let cells = (finite_or_zero(extent) / cell).ceil() as usize;
    cells.saturating_add(1).clamp(MIN_GRID_DIM, MAX_GRID_DIM)
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_cell_sizes() {
        assert_eq!(QualityPreset::High.target_cell_size(), 12.0);
        assert_eq!(QualityPreset::Low.target_cell_size(), 20.0);
    }

    #[test]
    fn test_grid_dimensions() {
        let (width, height) = QualityPreset::Low.grid_dimensions(800.0, 600.0);
        assert_eq!(width, 41);
        assert_eq!(height, 31);

        let (width, height) = QualityPreset::High.grid_dimensions(800.0, 600.0);
        assert_eq!(width, 68);
        assert_eq!(height, 51);
    }

    #[test]
    fn test_grid_dimensions_clamping() {
        // Degenerate world should clamp to minimum
        let (width, height) = QualityPreset::High.grid_dimensions(0.0, f32::NAN);
        assert_eq!(width, MIN_GRID_DIM);
        assert_eq!(height, MIN_GRID_DIM);

        // Very large world should clamp to maximum
        let (width, height) = QualityPreset::High.grid_dimensions(100_000.0, 100_000.0);
        assert_eq!(width, MAX_GRID_DIM);
        assert_eq!(height, MAX_GRID_DIM);

        // Finite extents far past usize range still clamp
        let (width, height) = QualityPreset::Low.grid_dimensions(1.0e30, f32::MAX);
        assert_eq!(width, MAX_GRID_DIM);
        assert_eq!(height, MAX_GRID_DIM);
    }

    #[test]
    fn test_particle_count() {
        assert_eq!(QualityPreset::High.particle_count(900.0, 600.0), 3000);
        assert_eq!(QualityPreset::Low.particle_count(900.0, 600.0), 1350);
        assert_eq!(QualityPreset::Low.particle_count(10.0, 10.0), MIN_PARTICLES);
        assert_eq!(QualityPreset::High.particle_count(1e5, 1e5), MAX_PARTICLES);
        assert_eq!(QualityPreset::High.particle_count(1.0e30, 1.0e30), MAX_PARTICLES);
    }

    #[test]
    fn test_toggled() {
        assert_eq!(QualityPreset::High.toggled(), QualityPreset::Low);
        assert_eq!(QualityPreset::Low.toggled().toggled(), QualityPreset::Low);
    }
}
