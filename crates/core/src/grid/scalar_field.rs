//! Scalar quantities carried by the wind
//!
//! One `ScalarField` type backs both smoke density (unitless, ≥ 0) and
//! temperature (signed, centred on zero). Each holds a current buffer plus a
//! scratch buffer of the same size; advection reads one and writes the other,
//! then the two are swapped.

use super::obstacle_field::ObstacleField;
use super::shape::{Brush, GridShape};
use super::velocity_field::VelocityField;
use crate::error::{zeroed_buffer, SimError};
use crate::solver::advection::{advect_scalar_cpu, AdvectionParams};

/// Gaussian width of a scalar brush relative to its radius
pub const SCALAR_SIGMA_FACTOR: f32 = 0.5;

/// Double-buffered scalar node grid
#[derive(Debug, Clone)]
pub struct ScalarField {
    shape: GridShape,
    data: Vec<f32>,
    next: Vec<f32>,
}

impl ScalarField {
    /// Create a zero-filled scalar field
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AllocationFailed`] if the buffers cannot be reserved.
    pub fn new(shape: GridShape) -> Result<Self, SimError> {
        let len = shape.node_count();
        Ok(Self {
            shape,
            data: zeroed_buffer(len)?,
            next: zeroed_buffer(len)?,
        })
    }

    /// Resize to a new shape, always dropping existing content
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AllocationFailed`] if new buffers cannot be reserved.
    pub fn resize(&mut self, shape: GridShape) -> Result<(), SimError> {
        if shape.node_count() == self.data.len() {
            self.shape = shape;
            self.clear();
            return Ok(());
        }
        *self = Self::new(shape)?;
        Ok(())
    }

    /// Zero both buffers
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.next.fill(0.0);
    }

    /// Grid shape of this field
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// Current values in row-major order
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to the current values
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Add a Gaussian-weighted amount around a world position
    ///
    /// Nodes flagged solid in `obstacles` are skipped, so nothing is injected
    /// behind a wall.
    pub fn add_scalar(
        &mut self,
        x: f32,
        y: f32,
        amount: f32,
        radius: f32,
        obstacles: Option<&ObstacleField>,
    ) {
        let Some(brush) = Brush::new(&self.shape, x, y, radius) else {
            return;
        };
        if !amount.is_finite() {
            return;
        }
        let solid = obstacles
            .map(ObstacleField::data)
            .filter(|solid| solid.len() == self.data.len());
        let data = &mut self.data;
        brush.for_each_node(&self.shape, |index, _, _, dist2| {
            if solid.is_some_and(|solid| solid[index] != 0) {
                return;
            }
            data[index] += amount * brush.gaussian(dist2, SCALAR_SIGMA_FACTOR);
        });
    }

    /// Semi-Lagrangian advection through `velocity`
    ///
    /// Every non-solid node traces back along the local velocity by `dt`,
    /// samples the pre-step field there and scales it by `dissipation`.
    /// Solid nodes are forced to zero. The pass reads only the current buffer
    /// and writes only the scratch buffer, which then becomes current.
    pub fn advect(
        &mut self,
        velocity: &VelocityField,
        dt: f32,
        dissipation: f32,
        obstacles: Option<&ObstacleField>,
    ) {
        let solid = obstacles
            .map(ObstacleField::data)
            .filter(|solid| solid.len() == self.data.len());
        let params = AdvectionParams::new(dt, dissipation);

        advect_scalar_cpu(&self.data, &mut self.next, &self.shape, velocity, solid, params);

        std::mem::swap(&mut self.data, &mut self.next);
    }

    /// Bilinearly sample the field at a world position
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        self.shape.sample(&self.data, x, y)
    }

    /// Sum of all node values
    pub fn total(&self) -> f32 {
        self.data.iter().sum()
    }
}
