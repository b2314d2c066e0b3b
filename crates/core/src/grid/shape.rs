//! Grid geometry shared by every field
//!
//! All fields are node-centred lattices of `width × height` samples spread over
//! a continuous world rectangle (the canvas size in CSS pixels). Node `(ix, iy)`
//! sits at world position `(ix / (width-1) · world_width, iy / (height-1) · world_height)`,
//! so the first and last nodes lie exactly on the world edges.

use crate::error::SimError;
use serde::Serialize;

/// Smallest allowed grid dimension. A single node has no cell size.
pub const MIN_GRID_DIM: usize = 2;

/// Largest grid dimension along either axis. Keeps the node count within
/// `usize` even on 32-bit targets.
pub const MAX_AXIS_NODES: usize = 1 << 15;

/// Smallest allowed world extent in pixels
pub const MIN_WORLD_EXTENT: f32 = 1.0;

/// Dimensions of a field lattice and the world rectangle it covers
///
/// Built only through [`GridShape::new`] or [`GridShape::try_new`], so both
/// axes always lie in `[MIN_GRID_DIM, MAX_AXIS_NODES]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[non_exhaustive]
pub struct GridShape {
    /// World width in pixels
    pub world_width: f32,
    /// World height in pixels
    pub world_height: f32,
    /// Grid width in nodes
    pub width: usize,
    /// Grid height in nodes
    pub height: usize,
}

impl GridShape {
    /// Create a grid shape, clamping invalid input
    ///
    /// Non-finite or tiny world extents become [`MIN_WORLD_EXTENT`] and grid
    /// dimensions are clamped to `[MIN_GRID_DIM, MAX_AXIS_NODES]`.
    #[must_use]
    pub fn new(world_width: f32, world_height: f32, width: usize, height: usize) -> Self {
        Self {
            world_width: sanitize_extent(world_width),
            world_height: sanitize_extent(world_height),
            width: width.clamp(MIN_GRID_DIM, MAX_AXIS_NODES),
            height: height.clamp(MIN_GRID_DIM, MAX_AXIS_NODES),
        }
    }

    /// Like [`new`](Self::new), but rejects oversized dimensions instead of clamping them
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidDimensions`] if either axis exceeds [`MAX_AXIS_NODES`].
    pub fn try_new(
        world_width: f32,
        world_height: f32,
        width: usize,
        height: usize,
    ) -> Result<Self, SimError> {
        if width > MAX_AXIS_NODES || height > MAX_AXIS_NODES {
            return Err(SimError::InvalidDimensions { width, height });
        }
        Ok(Self::new(world_width, world_height, width, height))
    }

    /// Total number of nodes
    #[inline]
    pub fn node_count(&self) -> usize {
        self.width * self.height
    }

    /// World distance between horizontally adjacent nodes
    #[inline]
    pub fn cell_width(&self) -> f32 {
        self.world_width / (self.width - 1) as f32
    }

    /// World distance between vertically adjacent nodes
    #[inline]
    pub fn cell_height(&self) -> f32 {
        self.world_height / (self.height - 1) as f32
    }

    /// Row-major index of node `(ix, iy)`
    #[inline]
    pub fn index(&self, ix: usize, iy: usize) -> usize {
        iy * self.width + ix
    }

    /// Convert a world position to continuous grid coordinates
    #[inline]
    pub fn to_grid(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x / self.world_width) * (self.width - 1) as f32,
            (y / self.world_height) * (self.height - 1) as f32,
        )
    }

    /// World position of node `(ix, iy)`
    #[inline]
    pub fn to_world(&self, ix: usize, iy: usize) -> (f32, f32) {
        (
            (ix as f32 / (self.width - 1) as f32) * self.world_width,
            (iy as f32 / (self.height - 1) as f32) * self.world_height,
        )
    }

    /// Nearest node to a world position, clamped onto the grid
    pub fn nearest_node(&self, x: f32, y: f32) -> (usize, usize) {
        let (gx, gy) = self.to_grid(x, y);
        let ix = gx.round().clamp(0.0, (self.width - 1) as f32) as usize;
        let iy = gy.round().clamp(0.0, (self.height - 1) as f32) as usize;
        (ix, iy)
    }

    /// Bilinearly sample a node buffer at a world position
    ///
    /// Positions outside the world are clamped onto the edge nodes, so the
    /// result never extrapolates past the grid.
    pub fn sample(&self, data: &[f32], x: f32, y: f32) -> f32 {
        let (gx, gy) = self.to_grid(x, y);
        let gx = clamp_or_zero(gx, (self.width - 1) as f32);
        let gy = clamp_or_zero(gy, (self.height - 1) as f32);

        let x0 = gx.floor() as usize;
        let y0 = gy.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = gx - x0 as f32;
        let ty = gy - y0 as f32;

        let top = lerp(data[self.index(x0, y0)], data[self.index(x1, y0)], tx);
        let bottom = lerp(data[self.index(x0, y1)], data[self.index(x1, y1)], tx);
        lerp(top, bottom, ty)
    }
}

/// Circular brush footprint in grid coordinates
///
/// Shared by velocity injection, scalar injection and obstacle painting. The
/// radius is mapped to grid units along whichever axis gives the larger value
/// and floored at one node so the smallest brush still touches something.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    /// Centre in grid coordinates
    pub gx: f32,
    /// Centre in grid coordinates
    pub gy: f32,
    /// Radius in grid units (≥ 1)
    pub radius: f32,
}

impl Brush {
    /// Map a world-space brush onto `shape`
    ///
    /// Returns `None` for non-finite input, which would otherwise poison the
    /// field with NaN.
    pub fn new(shape: &GridShape, x: f32, y: f32, radius: f32) -> Option<Self> {
        if !x.is_finite() || !y.is_finite() || !radius.is_finite() {
            return None;
        }
        let (gx, gy) = shape.to_grid(x, y);
        let rx = (radius / shape.world_width) * (shape.width - 1) as f32;
        let ry = (radius / shape.world_height) * (shape.height - 1) as f32;
        Some(Self {
            gx,
            gy,
            radius: rx.max(ry).max(1.0),
        })
    }

    /// Gaussian weight for a squared grid distance, `σ = sigma_factor · radius`
    #[inline]
    pub fn gaussian(&self, dist2: f32, sigma_factor: f32) -> f32 {
        let sigma = self.radius * sigma_factor;
        (-dist2 / (2.0 * sigma * sigma)).exp()
    }

    /// Visit every node inside the brush circle
    ///
    /// Only the bounding box of the circle is scanned. The callback receives
    /// the node index, its grid offset from the centre and the squared
    /// distance.
    pub fn for_each_node(&self, shape: &GridShape, mut f: impl FnMut(usize, f32, f32, f32)) {
        let r2 = self.radius * self.radius;
        let max_x = (shape.width - 1) as f32;
        let max_y = (shape.height - 1) as f32;

        let min_ix = (self.gx - self.radius).floor().max(0.0);
        let max_ix = (self.gx + self.radius).ceil().min(max_x);
        let min_iy = (self.gy - self.radius).floor().max(0.0);
        let max_iy = (self.gy + self.radius).ceil().min(max_y);
        if min_ix > max_ix || min_iy > max_iy {
            return;
        }

        for iy in (min_iy as usize)..=(max_iy as usize) {
            let dy = iy as f32 - self.gy;
            for ix in (min_ix as usize)..=(max_ix as usize) {
                let dx = ix as f32 - self.gx;
                let dist2 = dx * dx + dy * dy;
                if dist2 > r2 {
                    continue;
                }
                f(shape.index(ix, iy), dx, dy, dist2);
            }
        }
    }
}

#[inline]
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn clamp_or_zero(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

fn sanitize_extent(extent: f32) -> f32 {
    if extent.is_finite() {
        extent.max(MIN_WORLD_EXTENT)
    } else {
        MIN_WORLD_EXTENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shape_clamps_degenerate_input() {
        let shape = GridShape::new(f32::NAN, -5.0, 0, 1);
        assert_eq!(shape.world_width, MIN_WORLD_EXTENT);
        assert_eq!(shape.world_height, MIN_WORLD_EXTENT);
        assert_eq!(shape.width, 2);
        assert_eq!(shape.height, 2);
        assert_eq!(shape.node_count(), 4);
    }

    #[test]
    fn test_oversized_axes_clamp() {
        let shape = GridShape::new(10.0, 10.0, usize::MAX, usize::MAX);
        assert_eq!(shape.width, MAX_AXIS_NODES);
        assert_eq!(shape.height, MAX_AXIS_NODES);
        assert_eq!(shape.node_count(), MAX_AXIS_NODES * MAX_AXIS_NODES);
    }

    #[test]
    fn test_try_new_rejects_oversized_axes() {
        assert!(GridShape::try_new(10.0, 10.0, 64, 48).is_ok());
        assert_eq!(
            GridShape::try_new(10.0, 10.0, usize::MAX, 3),
            Err(SimError::InvalidDimensions {
                width: usize::MAX,
                height: 3
            })
        );
    }

    #[test]
    fn test_node_world_mapping() {
        let shape = GridShape::new(800.0, 600.0, 5, 4);
        assert_eq!(shape.to_world(0, 0), (0.0, 0.0));
        assert_eq!(shape.to_world(4, 3), (800.0, 600.0));
        assert_relative_eq!(shape.cell_width(), 200.0);
        assert_relative_eq!(shape.cell_height(), 200.0);

        let (gx, gy) = shape.to_grid(400.0, 300.0);
        assert_relative_eq!(gx, 2.0);
        assert_relative_eq!(gy, 1.5);
    }

    #[test]
    fn test_nearest_node_rounds_and_clamps() {
        let shape = GridShape::new(100.0, 100.0, 11, 11);
        assert_eq!(shape.nearest_node(14.0, 16.0), (1, 2));
        assert_eq!(shape.nearest_node(-50.0, 500.0), (0, 10));
    }

    #[test]
    fn test_bilinear_sample_interpolates_and_clamps() {
        let shape = GridShape::new(10.0, 10.0, 2, 2);
        // Corners: (0,0)=0, (1,0)=1, (0,1)=2, (1,1)=3
        let data = [0.0, 1.0, 2.0, 3.0];
        assert_relative_eq!(shape.sample(&data, 5.0, 5.0), 1.5);
        assert_relative_eq!(shape.sample(&data, 10.0, 0.0), 1.0);
        // Outside the world clamps to the nearest edge
        assert_relative_eq!(shape.sample(&data, -100.0, -100.0), 0.0);
        assert_relative_eq!(shape.sample(&data, 100.0, 100.0), 3.0);
    }

    #[test]
    fn test_brush_radius_floor_and_cutoff() {
        let shape = GridShape::new(100.0, 100.0, 11, 11);
        let brush = Brush::new(&shape, 50.0, 50.0, 0.1).unwrap();
        assert_eq!(brush.radius, 1.0);

        let mut visited = Vec::new();
        brush.for_each_node(&shape, |index, _, _, dist2| visited.push((index, dist2)));
        // Centre plus its four direct neighbours
        assert_eq!(visited.len(), 5);
        assert!(visited.iter().all(|&(_, d2)| d2 <= 1.0));
    }

    #[test]
    fn test_brush_outside_world_touches_nothing() {
        let shape = GridShape::new(100.0, 100.0, 11, 11);
        let brush = Brush::new(&shape, 500.0, 500.0, 10.0).unwrap();
        let mut count = 0;
        brush.for_each_node(&shape, |_, _, _, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_brush_rejects_nan() {
        let shape = GridShape::new(100.0, 100.0, 11, 11);
        assert!(Brush::new(&shape, f32::NAN, 0.0, 10.0).is_none());
    }
}
