//! Coarse 2D velocity field
//!
//! Stores the `(u, v)` wind velocity at every grid node in world pixels per
//! second. The field is mutated by brush injection, idle breezes and force
//! sources, then relaxed each step by damping and a sticky smoothing pass.
//! There is no pressure projection: the field is a visual wind, not an
//! incompressible fluid.

use super::shape::{Brush, GridShape};
use crate::error::{zeroed_buffer, SimError};
use rayon::prelude::*;

/// Gaussian width of a velocity brush relative to its radius
pub const VELOCITY_SIGMA_FACTOR: f32 = 0.55;

/// Two parallel node grids holding the x and y velocity components
///
/// Invariant: `u`, `v` and both scratch buffers always have length
/// `shape.node_count()`.
#[derive(Debug, Clone)]
pub struct VelocityField {
    shape: GridShape,
    u: Vec<f32>,
    v: Vec<f32>,
    // Scratch buffers for the smoothing pass (swapped with u/v afterwards)
    u_scratch: Vec<f32>,
    v_scratch: Vec<f32>,
}

impl VelocityField {
    /// Create a zero-filled velocity field
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AllocationFailed`] if the buffers cannot be reserved.
    pub fn new(shape: GridShape) -> Result<Self, SimError> {
        let len = shape.node_count();
        Ok(Self {
            shape,
            u: zeroed_buffer(len)?,
            v: zeroed_buffer(len)?,
            u_scratch: zeroed_buffer(len)?,
            v_scratch: zeroed_buffer(len)?,
        })
    }

    /// Resize to a new world/grid shape
    ///
    /// Reallocates only if the node count changed; otherwise the existing
    /// buffers are zero-filled in place. Old content is never resampled.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AllocationFailed`] if new buffers cannot be
    /// reserved. The field is left untouched in that case.
    pub fn resize(&mut self, shape: GridShape) -> Result<(), SimError> {
        let len = shape.node_count();
        if len == self.u.len() {
            self.shape = shape;
            self.clear();
            self.u_scratch.fill(0.0);
            self.v_scratch.fill(0.0);
            return Ok(());
        }
        *self = Self::new(shape)?;
        Ok(())
    }

    /// Zero both velocity components
    pub fn clear(&mut self) {
        self.u.fill(0.0);
        self.v.fill(0.0);
    }

    /// Grid shape of this field
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// Grid width in nodes
    pub fn width(&self) -> usize {
        self.shape.width
    }

    /// Grid height in nodes
    pub fn height(&self) -> usize {
        self.shape.height
    }

    /// X velocity component in row-major order
    pub fn u(&self) -> &[f32] {
        &self.u
    }

    /// Y velocity component in row-major order
    pub fn v(&self) -> &[f32] {
        &self.v
    }

    /// Mutable access to both components at once
    pub fn components_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.u, &mut self.v)
    }

    /// Multiply every velocity sample by `factor`
    ///
    /// The factor is clamped to `[0, 1]`. It is applied once per fixed step,
    /// so callers pick it to approximate an exponential decay at 60 Hz.
    pub fn apply_damping(&mut self, factor: f32) {
        let factor = if factor.is_nan() {
            1.0
        } else {
            factor.clamp(0.0, 1.0)
        };
        if factor == 1.0 {
            return;
        }
        self.u.par_iter_mut().for_each(|u| *u *= factor);
        self.v.par_iter_mut().for_each(|v| *v *= factor);
    }

    /// Inject a Gaussian-weighted velocity impulse around a world position
    ///
    /// Nodes within the brush radius receive `(vx, vy) · strength · weight`
    /// with `weight = exp(-d²/(2σ²))`, `σ = 0.55 r`. Injection is additive, so
    /// overlapping strokes accumulate.
    pub fn add_velocity(
        &mut self,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        radius: f32,
        strength: f32,
    ) {
        let Some(brush) = Brush::new(&self.shape, x, y, radius) else {
            return;
        };
        let vx_scaled = vx * strength;
        let vy_scaled = vy * strength;
        let (u, v) = (&mut self.u, &mut self.v);
        brush.for_each_node(&self.shape, |index, _, _, dist2| {
            let weight = brush.gaussian(dist2, VELOCITY_SIGMA_FACTOR);
            u[index] += vx_scaled * weight;
            v[index] += vy_scaled * weight;
        });
    }

    /// Inject a swirl around a world position
    ///
    /// Each node inside the brush is pushed tangentially, perpendicular to its
    /// offset from the centre, with the same Gaussian weighting as
    /// [`add_velocity`](Self::add_velocity). Positive `spin` turns clockwise
    /// on screen (y grows downward).
    pub fn add_vortex(&mut self, x: f32, y: f32, spin: f32, radius: f32, strength: f32) {
        let Some(brush) = Brush::new(&self.shape, x, y, radius) else {
            return;
        };
        if !spin.is_finite() {
            return;
        }
        let scaled = spin * strength;
        let (u, v) = (&mut self.u, &mut self.v);
        brush.for_each_node(&self.shape, |index, dx, dy, dist2| {
            let dist = dist2.sqrt();
            if dist < 1e-3 {
                return;
            }
            let weight = brush.gaussian(dist2, VELOCITY_SIGMA_FACTOR);
            // Tangent to the circle through this node, normalised by the brush radius
            let falloff = (dist / brush.radius).min(1.0);
            u[index] += -dy / dist * scaled * weight * falloff;
            v[index] += dx / dist * scaled * weight * falloff;
        });
    }

    /// One sticky smoothing pass
    ///
    /// Each node moves toward `(4·self + N + S + E + W) / 8` by `strength`
    /// (clamped to `[0, 1]`). Counting the node itself four times keeps wind
    /// lingering instead of spreading out. Edge lookups clamp to the border.
    pub fn diffuse(&mut self, strength: f32) {
        let strength = if strength.is_nan() {
            0.0
        } else {
            strength.clamp(0.0, 1.0)
        };
        if strength == 0.0 {
            return;
        }
        let width = self.shape.width;
        let height = self.shape.height;

        smooth_component(&self.u, &mut self.u_scratch, width, height, strength);
        smooth_component(&self.v, &mut self.v_scratch, width, height, strength);

        std::mem::swap(&mut self.u, &mut self.u_scratch);
        std::mem::swap(&mut self.v, &mut self.v_scratch);
    }

    /// Bilinearly sample the velocity at a world position
    pub fn sample(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.shape.sample(&self.u, x, y),
            self.shape.sample(&self.v, x, y),
        )
    }

    /// Scalar vorticity `∂v/∂x - ∂u/∂y` at node `(ix, iy)` in 1/s
    ///
    /// Uses central differences in the interior and one-sided differences on
    /// the border.
    pub fn vorticity_at(&self, ix: usize, iy: usize) -> f32 {
        let w = self.shape.width;
        let h = self.shape.height;
        let ix = ix.min(w - 1);
        let iy = iy.min(h - 1);

        let left = ix.saturating_sub(1);
        let right = (ix + 1).min(w - 1);
        let up = iy.saturating_sub(1);
        let down = (iy + 1).min(h - 1);

        let dx = (right - left) as f32 * self.shape.cell_width();
        let dy = (down - up) as f32 * self.shape.cell_height();

        let dv_dx = (self.v[self.shape.index(right, iy)] - self.v[self.shape.index(left, iy)]) / dx;
        let du_dy = (self.u[self.shape.index(ix, down)] - self.u[self.shape.index(ix, up)]) / dy;
        dv_dx - du_dy
    }

    /// Sum of `|u| + |v|` over the whole grid
    pub fn total_magnitude(&self) -> f32 {
        self.u
            .iter()
            .zip(&self.v)
            .map(|(u, v)| u.abs() + v.abs())
            .sum()
    }
}

fn smooth_component(src: &[f32], dst: &mut [f32], width: usize, height: usize, strength: f32) {
    dst.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let row_offset = y * width;
            let up = y.saturating_sub(1) * width;
            let down = (y + 1).min(height - 1) * width;
            for (x, out) in row.iter_mut().enumerate() {
                let left = x.saturating_sub(1);
                let right = (x + 1).min(width - 1);
                let index = row_offset + x;
                let center = src[index];
                let avg = (center * 4.0
                    + src[row_offset + left]
                    + src[row_offset + right]
                    + src[up + x]
                    + src[down + x])
                    / 8.0;
                *out = center + (avg - center) * strength;
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn field(width: usize, height: usize) -> VelocityField {
        VelocityField::new(GridShape::new(100.0, 100.0, width, height)).unwrap()
    }

    #[test]
    fn test_resize_keeps_components_in_step() {
        let mut f = field(8, 8);
        f.add_velocity(50.0, 50.0, 10.0, 5.0, 20.0, 1.0);

        f.resize(GridShape::new(200.0, 50.0, 13, 5)).unwrap();
        assert_eq!(f.u().len(), 13 * 5);
        assert_eq!(f.v().len(), 13 * 5);
        assert_eq!(f.total_magnitude(), 0.0);

        // Same node count: zeroed in place
        f.add_velocity(50.0, 25.0, 10.0, 5.0, 20.0, 1.0);
        f.resize(GridShape::new(300.0, 300.0, 5, 13)).unwrap();
        assert_eq!(f.u().len(), 65);
        assert_eq!(f.total_magnitude(), 0.0);
    }

    #[test]
    fn test_damping_monotonic() {
        let mut f = field(16, 16);
        f.add_velocity(50.0, 50.0, 100.0, -40.0, 30.0, 1.0);

        let mut previous = f.total_magnitude();
        for _ in 0..50 {
            f.apply_damping(0.9);
            let current = f.total_magnitude();
            assert!(current < previous);
            previous = current;
        }

        let before = f.total_magnitude();
        f.apply_damping(1.0);
        assert_eq!(f.total_magnitude(), before);
    }

    #[test]
    fn test_injection_peaks_at_centre_and_decays() {
        let mut f = VelocityField::new(GridShape::new(200.0, 200.0, 21, 21)).unwrap();
        f.add_velocity(100.0, 100.0, 50.0, 0.0, 50.0, 1.0);

        let shape = *f.shape();
        let centre = f.u()[shape.index(10, 10)];
        assert_relative_eq!(centre, 50.0);

        // Walk outward along +x: strictly decreasing until the cutoff
        let mut previous = centre;
        for ix in 11..=15 {
            let value = f.u()[shape.index(ix, 10)];
            assert!(value > 0.0 && value < previous, "ix={ix} value={value}");
            previous = value;
        }
        // Beyond the radius nothing was touched
        assert_eq!(f.u()[shape.index(16, 10)], 0.0);
        assert!(f.v().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_injection_accumulates() {
        let mut f = field(11, 11);
        f.add_velocity(50.0, 50.0, 10.0, 0.0, 10.0, 1.0);
        f.add_velocity(50.0, 50.0, 10.0, 0.0, 10.0, 0.5);
        let index = f.shape().index(5, 5);
        assert_relative_eq!(f.u()[index], 15.0);
    }

    #[test]
    fn test_vortex_is_tangential() {
        let mut f = VelocityField::new(GridShape::new(200.0, 200.0, 21, 21)).unwrap();
        f.add_vortex(100.0, 100.0, 30.0, 50.0, 1.0);
        let shape = *f.shape();

        // Right of centre: motion is along +y (clockwise on screen)
        let right = shape.index(12, 10);
        assert_abs_diff_eq!(f.u()[right], 0.0);
        assert!(f.v()[right] > 0.0);

        // Below centre: motion is along -x
        let below = shape.index(10, 12);
        assert!(f.u()[below] < 0.0);
        assert_abs_diff_eq!(f.v()[below], 0.0);

        // The eye of the vortex stays calm
        let centre = shape.index(10, 10);
        assert_eq!(f.u()[centre], 0.0);
        assert_eq!(f.v()[centre], 0.0);
    }

    #[test]
    fn test_diffuse_spreads_and_preserves_uniform_field() {
        let mut f = field(5, 5);
        let index = f.shape().index(2, 2);
        f.components_mut().0[index] = 8.0;
        f.diffuse(1.0);

        // Centre keeps half its value, each neighbour gets an eighth
        assert_relative_eq!(f.u()[index], 4.0);
        assert_relative_eq!(f.u()[f.shape().index(1, 2)], 1.0);
        assert_relative_eq!(f.u()[f.shape().index(2, 3)], 1.0);
        assert_eq!(f.u()[f.shape().index(1, 1)], 0.0);

        let mut uniform = field(4, 4);
        uniform.components_mut().1.fill(3.0);
        uniform.diffuse(0.7);
        assert!(uniform.v().iter().all(|&v| (v - 3.0).abs() < 1e-6));
    }

    #[test]
    fn test_diffuse_zero_strength_is_noop() {
        let mut f = field(5, 5);
        f.add_velocity(50.0, 50.0, 10.0, 3.0, 20.0, 1.0);
        let before = f.u().to_vec();
        f.diffuse(0.0);
        assert_eq!(f.u(), before.as_slice());
    }

    #[test]
    fn test_vorticity_of_solid_rotation() {
        // u = -ω y, v = ω x has vorticity 2ω everywhere
        let shape = GridShape::new(10.0, 10.0, 11, 11);
        let mut f = VelocityField::new(shape).unwrap();
        let omega = 0.5;
        {
            let (u, v) = f.components_mut();
            for iy in 0..11 {
                for ix in 0..11 {
                    let (x, y) = shape.to_world(ix, iy);
                    u[shape.index(ix, iy)] = -omega * y;
                    v[shape.index(ix, iy)] = omega * x;
                }
            }
        }
        assert_relative_eq!(f.vorticity_at(5, 5), 2.0 * omega, epsilon = 1e-5);
        assert_relative_eq!(f.vorticity_at(0, 10), 2.0 * omega, epsilon = 1e-5);
    }

    #[test]
    fn test_nan_injection_ignored() {
        let mut f = field(5, 5);
        f.add_velocity(f32::NAN, 10.0, 1.0, 1.0, 10.0, 1.0);
        assert_eq!(f.total_magnitude(), 0.0);
    }
}
