//! User-painted solid cells
//!
//! A binary mask over the same lattice as the velocity field. Painting is a
//! hard circle (no soft edge). The mask blocks scalar injection, holds no
//! smoke or heat, resamples particles that wander in, and pins the velocity
//! field to zero inside walls.

use super::shape::{Brush, GridShape};
use super::velocity_field::VelocityField;
use crate::error::{zeroed_buffer, SimError};

/// Value stored for a solid node
pub const SOLID: u8 = 1;

/// Value stored for an empty node
pub const EMPTY: u8 = 0;

/// Binary solid/empty node grid
#[derive(Debug, Clone)]
pub struct ObstacleField {
    shape: GridShape,
    data: Vec<u8>,
}

impl ObstacleField {
    /// Create an all-empty obstacle field
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AllocationFailed`] if the mask cannot be reserved.
    pub fn new(shape: GridShape) -> Result<Self, SimError> {
        Ok(Self {
            shape,
            data: zeroed_buffer(shape.node_count())?,
        })
    }

    /// Resize to a new shape. Always clears every obstacle.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AllocationFailed`] if a new mask cannot be reserved.
    pub fn resize(&mut self, shape: GridShape) -> Result<(), SimError> {
        if shape.node_count() == self.data.len() {
            self.shape = shape;
            self.clear();
            return Ok(());
        }
        *self = Self::new(shape)?;
        Ok(())
    }

    /// Remove every obstacle
    pub fn clear(&mut self) {
        self.data.fill(EMPTY);
    }

    /// Grid shape of this mask
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// Raw mask in row-major order (1 = solid)
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of solid nodes
    pub fn solid_count(&self) -> usize {
        self.data.iter().filter(|&&cell| cell == SOLID).count()
    }

    /// Set every node within `radius` of a world position to solid (`add`) or empty
    pub fn paint(&mut self, x: f32, y: f32, radius: f32, add: bool) {
        let Some(brush) = Brush::new(&self.shape, x, y, radius) else {
            return;
        };
        let value = if add { SOLID } else { EMPTY };
        let data = &mut self.data;
        brush.for_each_node(&self.shape, |index, _, _, _| data[index] = value);
    }

    /// Whether the node nearest to a world position is solid
    pub fn is_solid_at(&self, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let (ix, iy) = self.shape.nearest_node(x, y);
        self.data[self.shape.index(ix, iy)] == SOLID
    }

    /// Whether node `index` is solid
    #[inline]
    pub fn is_solid(&self, index: usize) -> bool {
        self.data.get(index).is_some_and(|&cell| cell == SOLID)
    }
}

/// Pin the velocity field to the obstacle mask
///
/// Solid nodes lose all velocity. An empty node with a solid 4-neighbour has
/// the velocity component crossing that face multiplied by
/// `boundary_damping` (a solid left/right neighbour damps `u`, a solid
/// up/down neighbour damps `v`). This is a cheap no-slip-ish wall without a
/// pressure solve. Mismatched grids are ignored.
pub fn apply_obstacles_to_field(
    field: &mut VelocityField,
    obstacles: &ObstacleField,
    boundary_damping: f32,
) {
    if obstacles.data.len() != field.u().len() {
        return;
    }
    let damp = if boundary_damping.is_nan() {
        1.0
    } else {
        boundary_damping.clamp(0.0, 1.0)
    };
    let width = field.width();
    let height = field.height();
    let solid = &obstacles.data;
    let (u, v) = field.components_mut();

    for y in 0..height {
        let row_offset = y * width;
        for x in 0..width {
            let index = row_offset + x;
            if solid[index] == SOLID {
                u[index] = 0.0;
                v[index] = 0.0;
                continue;
            }
            let has_left = x > 0 && solid[index - 1] == SOLID;
            let has_right = x < width - 1 && solid[index + 1] == SOLID;
            let has_up = y > 0 && solid[index - width] == SOLID;
            let has_down = y < height - 1 && solid[index + width] == SOLID;
            if has_left || has_right {
                u[index] *= damp;
            }
            if has_up || has_down {
                v[index] *= damp;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn shape() -> GridShape {
        GridShape::new(100.0, 100.0, 11, 11)
    }

    #[test]
    fn test_paint_is_hard_circle() {
        let mut obstacles = ObstacleField::new(shape()).unwrap();
        obstacles.paint(50.0, 50.0, 20.0, true);

        assert!(obstacles.is_solid_at(50.0, 50.0));
        assert!(obstacles.is_solid_at(70.0, 50.0));
        // Diagonal (2,2) is 2.83 nodes away, outside the 2-node radius
        assert!(!obstacles.is_solid_at(70.0, 70.0));
        assert!(!obstacles.is_solid_at(80.0, 50.0));
        assert_eq!(obstacles.solid_count(), 13);
    }

    #[test]
    fn test_erase() {
        let mut obstacles = ObstacleField::new(shape()).unwrap();
        obstacles.paint(50.0, 50.0, 30.0, true);
        obstacles.paint(50.0, 50.0, 10.0, false);
        assert!(!obstacles.is_solid_at(50.0, 50.0));
        assert!(obstacles.is_solid_at(80.0, 50.0));
    }

    #[test]
    fn test_is_solid_rounds_to_nearest_node() {
        let mut obstacles = ObstacleField::new(shape()).unwrap();
        obstacles.paint(0.0, 0.0, 0.0, true);
        // Radius floors at one node, so (0,0), (1,0), (0,1) are solid
        assert!(obstacles.is_solid_at(4.9, 4.9));
        assert!(!obstacles.is_solid_at(15.1, 15.1));
    }

    #[test]
    fn test_resize_clears() {
        let mut obstacles = ObstacleField::new(shape()).unwrap();
        obstacles.paint(50.0, 50.0, 30.0, true);
        obstacles.resize(GridShape::new(120.0, 120.0, 11, 11)).unwrap();
        assert_eq!(obstacles.solid_count(), 0);
    }

    #[test]
    fn test_apply_obstacles_to_field() {
        let s = GridShape::new(40.0, 40.0, 5, 5);
        let mut obstacles = ObstacleField::new(s).unwrap();
        obstacles.paint(20.0, 20.0, 0.0, true); // plus shape around (2,2)

        let mut field = VelocityField::new(s).unwrap();
        {
            let (u, v) = field.components_mut();
            u.fill(10.0);
            v.fill(10.0);
        }
        apply_obstacles_to_field(&mut field, &obstacles, 0.25);

        // Inside the wall
        assert_eq!(field.u()[s.index(2, 2)], 0.0);
        assert_eq!(field.v()[s.index(2, 2)], 0.0);
        // (0,2) has a solid right neighbour: only u damped
        assert_relative_eq!(field.u()[s.index(0, 2)], 2.5);
        assert_relative_eq!(field.v()[s.index(0, 2)], 10.0);
        // (2,0) has a solid neighbour below: only v damped
        assert_relative_eq!(field.u()[s.index(2, 0)], 10.0);
        assert_relative_eq!(field.v()[s.index(2, 0)], 2.5);
        // (1,1) touches solid on the right and below: both damped
        assert_relative_eq!(field.u()[s.index(1, 1)], 2.5);
        assert_relative_eq!(field.v()[s.index(1, 1)], 2.5);
        // Far corner untouched
        assert_relative_eq!(field.u()[s.index(4, 4)], 10.0);
    }

    #[test]
    fn test_mismatched_grids_are_ignored() {
        let obstacles = ObstacleField::new(GridShape::new(10.0, 10.0, 3, 3)).unwrap();
        let mut field = VelocityField::new(GridShape::new(10.0, 10.0, 4, 4)).unwrap();
        field.components_mut().0.fill(1.0);
        apply_obstacles_to_field(&mut field, &obstacles, 0.0);
        assert!(field.u().iter().all(|&u| u == 1.0));
    }
}
