//! Coarse flow statistics for sonification
//!
//! The audio layer polls these a few times per second to drive a tone, so
//! they are sampled on a stride rather than over every node, and reduced
//! serially so the same field always gives the same numbers.

use crate::grid::VelocityField;
use serde::{Deserialize, Serialize};

/// Default sampling stride in nodes
pub const DEFAULT_STATS_STRIDE: usize = 4;

/// Summary of the current wind
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowStats {
    /// Mean `|(u, v)|` in px/s
    pub mean_speed: f32,
    /// Mean `|∂v/∂x - ∂u/∂y|` in 1/s
    pub mean_vorticity: f32,
    /// Number of nodes sampled
    pub samples: usize,
}

/// Sample mean speed and vorticity every `stride` nodes in each axis
pub fn sample_flow_stats(field: &VelocityField, stride: usize) -> FlowStats {
    let stride = stride.max(1);
    let shape = *field.shape();
    let (u, v) = (field.u(), field.v());

    let mut speed_sum = 0.0_f64;
    let mut vorticity_sum = 0.0_f64;
    let mut samples = 0_usize;
    for iy in (0..shape.height).step_by(stride) {
        for ix in (0..shape.width).step_by(stride) {
            let index = shape.index(ix, iy);
            speed_sum += f64::from(u[index].hypot(v[index]));
            vorticity_sum += f64::from(field.vorticity_at(ix, iy).abs());
            samples += 1;
        }
    }

    if samples == 0 {
        return FlowStats::default();
    }
    FlowStats {
        mean_speed: (speed_sum / samples as f64) as f32,
        mean_vorticity: (vorticity_sum / samples as f64) as f32,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridShape;
    use approx::assert_relative_eq;

    #[test]
    fn test_still_air() {
        let field = VelocityField::new(GridShape::new(100.0, 100.0, 9, 9)).unwrap();
        let stats = sample_flow_stats(&field, 2);
        assert_eq!(stats.samples, 25);
        assert_eq!(stats.mean_speed, 0.0);
        assert_eq!(stats.mean_vorticity, 0.0);
    }

    #[test]
    fn test_uniform_wind_has_speed_but_no_spin() {
        let mut field = VelocityField::new(GridShape::new(100.0, 100.0, 9, 9)).unwrap();
        {
            let (u, v) = field.components_mut();
            u.fill(3.0);
            v.fill(4.0);
        }
        let stats = sample_flow_stats(&field, 3);
        assert_relative_eq!(stats.mean_speed, 5.0);
        assert_relative_eq!(stats.mean_vorticity, 0.0);
    }

    #[test]
    fn test_vortex_registers_spin() {
        let mut field = VelocityField::new(GridShape::new(200.0, 200.0, 21, 21)).unwrap();
        field.add_vortex(100.0, 100.0, 50.0, 60.0, 1.0);
        let stats = sample_flow_stats(&field, 1);
        assert!(stats.mean_speed > 0.0);
        assert!(stats.mean_vorticity > 0.0);
        // Zero stride is treated as one
        assert_eq!(sample_flow_stats(&field, 0), stats);
    }
}
