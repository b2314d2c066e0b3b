//! User-placed force sources
//!
//! Attractors pull wind toward a point, repellers push it away, and a dipole
//! is a repeller/attractor pair that drives a jet along its direction. Each
//! source accelerates every velocity node inside its radius:
//!
//! ```text
//! accel   = min(MAX_ACCEL, strength · falloff / (dist² + EPS))
//! falloff = 1 - dist / radius
//! ```
//!
//! `EPS` keeps the centre finite and `MAX_ACCEL` caps the spike next to it.

use crate::core_types::Vec2;
use crate::grid::VelocityField;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Dipole poles sit this fraction of the radius either side of the centre
pub const DIPOLE_OFFSET: f32 = 0.35;

/// Each dipole pole runs at this fraction of the configured strength
pub const DIPOLE_POLE_STRENGTH: f32 = 0.85;

/// Floor applied to a dipole direction's length before normalising
pub const MIN_DIRECTION_LENGTH: f32 = 0.01;

/// Added to node distance before it is used as a divisor
pub const DISTANCE_EPSILON: f32 = 0.001;

/// Kind of force source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForceKind {
    /// Pulls wind toward the source
    Attractor,
    /// Pushes wind away from the source
    Repeller,
    /// Repeller behind, attractor ahead, along the source direction
    Dipole,
}

/// Stable handle for a placed source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForceSourceId(pub u32);

/// A single placed source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceSource {
    /// Handle assigned at placement
    pub id: ForceSourceId,
    /// Source kind
    pub kind: ForceKind,
    /// Centre in world pixels
    pub position: Vec2,
    /// Unit direction (meaningful for dipoles only)
    pub direction: Vec2,
    /// Acceleration numerator in px³/s²
    pub strength: f32,
    /// Reach in world pixels
    pub radius: f32,
}

/// Global limits shared by every source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceFieldParams {
    /// Maximum acceleration a single pole may apply (px/s²)
    pub max_accel: f32,
    /// Softening term added to squared distance (px²)
    pub epsilon: f32,
}

impl Default for ForceFieldParams {
    fn default() -> Self {
        Self {
            max_accel: 2400.0,
            epsilon: 25.0,
        }
    }
}

/// The set of active sources
#[derive(Debug, Clone)]
pub struct ForceFieldLayer {
    sources: FxHashMap<ForceSourceId, ForceSource>,
    next_id: u32,
    params: ForceFieldParams,
}

impl Default for ForceFieldLayer {
    fn default() -> Self {
        Self::new(ForceFieldParams::default())
    }
}

impl ForceFieldLayer {
    /// Create an empty layer. Ids start at 1.
    #[must_use]
    pub fn new(params: ForceFieldParams) -> Self {
        Self {
            sources: FxHashMap::default(),
            next_id: 1,
            params,
        }
    }

    /// Place a new source and return its id
    ///
    /// The direction is normalised with its length floored at
    /// [`MIN_DIRECTION_LENGTH`]; a zero direction becomes `+x`. Negative
    /// radius or strength is clamped to zero.
    pub fn add(
        &mut self,
        kind: ForceKind,
        position: Vec2,
        direction: Vec2,
        strength: f32,
        radius: f32,
    ) -> ForceSourceId {
        let id = ForceSourceId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let degenerate =
            direction.norm() < f32::EPSILON || !direction.iter().all(|c| c.is_finite());
        let direction = if degenerate {
            Vec2::new(1.0, 0.0)
        } else {
            direction / direction.norm().max(MIN_DIRECTION_LENGTH)
        };

        self.sources.insert(
            id,
            ForceSource {
                id,
                kind,
                position,
                direction,
                strength: finite_non_negative(strength),
                radius: finite_non_negative(radius),
            },
        );
        id
    }

    /// Remove a source. Returns whether it existed.
    pub fn remove(&mut self, id: ForceSourceId) -> bool {
        self.sources.remove(&id).is_some()
    }

    /// Remove every source
    pub fn clear(&mut self) {
        self.sources.clear();
    }

    /// Look up a source by id
    pub fn get(&self, id: ForceSourceId) -> Option<&ForceSource> {
        self.sources.get(&id)
    }

    /// Number of active sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether there are no sources
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Active sources sorted by id
    pub fn sources(&self) -> Vec<ForceSource> {
        let mut sources: Vec<ForceSource> = self.sources.values().copied().collect();
        sources.sort_by_key(|source| source.id);
        sources
    }

    /// Accelerate the velocity field by every active source for `dt` seconds
    ///
    /// Sources are applied in id order so the result does not depend on map
    /// iteration order.
    pub fn apply(&self, field: &mut VelocityField, dt: f32) {
        if self.sources.is_empty() || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        for source in self.sources() {
            match source.kind {
                ForceKind::Attractor => {
                    let (position, strength) = (source.position, source.strength);
                    self.apply_pole(field, position, -1.0, strength, source.radius, dt);
                }
                ForceKind::Repeller => {
                    let (position, strength) = (source.position, source.strength);
                    self.apply_pole(field, position, 1.0, strength, source.radius, dt);
                }
                ForceKind::Dipole => {
                    let offset = source.direction * (DIPOLE_OFFSET * source.radius);
                    let strength = source.strength * DIPOLE_POLE_STRENGTH;
                    let (head, tail) = (source.position + offset, source.position - offset);
                    self.apply_pole(field, head, -1.0, strength, source.radius, dt);
                    self.apply_pole(field, tail, 1.0, strength, source.radius, dt);
                }
            }
        }
    }

    /// Apply one radial pole. `sign` is +1 to push outward, -1 to pull inward.
    fn apply_pole(
        &self,
        field: &mut VelocityField,
        center: Vec2,
        sign: f32,
        strength: f32,
        radius: f32,
        dt: f32,
    ) {
        if radius <= 0.0 || strength == 0.0 {
            return;
        }
        let shape = *field.shape();
        let (gx0, gy0) = shape.to_grid(center.x - radius, center.y - radius);
        let (gx1, gy1) = shape.to_grid(center.x + radius, center.y + radius);
        let max_x = (shape.width - 1) as f32;
        let max_y = (shape.height - 1) as f32;
        let min_ix = gx0.floor().max(0.0);
        let max_ix = gx1.ceil().min(max_x);
        let min_iy = gy0.floor().max(0.0);
        let max_iy = gy1.ceil().min(max_y);
        if min_ix > max_ix || min_iy > max_iy {
            return;
        }

        let (u, v) = field.components_mut();
        for iy in (min_iy as usize)..=(max_iy as usize) {
            for ix in (min_ix as usize)..=(max_ix as usize) {
                let (x, y) = shape.to_world(ix, iy);
                let dx = x - center.x;
                let dy = y - center.y;
                let dist2 = dx * dx + dy * dy;
                let dist = dist2.sqrt();
                if dist > radius {
                    continue;
                }
                let falloff = 1.0 - dist / radius;
                let accel = (strength * falloff / (dist2 + self.params.epsilon))
                    .min(self.params.max_accel);
                let inv = 1.0 / (dist + DISTANCE_EPSILON);
                let index = shape.index(ix, iy);
                u[index] += sign * dx * inv * accel * dt;
                v[index] += sign * dy * inv * accel * dt;
            }
        }
    }
}

fn finite_non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridShape;
    use approx::assert_relative_eq;

    fn field() -> VelocityField {
        VelocityField::new(GridShape::new(200.0, 200.0, 21, 21)).unwrap()
    }

    fn layer() -> ForceFieldLayer {
        ForceFieldLayer::new(ForceFieldParams::default())
    }

    #[test]
    fn test_add_and_remove() {
        let mut forces = layer();
        let a = forces.add(ForceKind::Attractor, Vec2::new(10.0, 10.0), Vec2::zeros(), 1.0, 10.0);
        let b = forces.add(ForceKind::Repeller, Vec2::new(20.0, 20.0), Vec2::zeros(), 1.0, 10.0);
        assert_ne!(a, b);
        assert_eq!(forces.len(), 2);
        assert!(forces.remove(a));
        assert!(!forces.remove(a));
        assert_eq!(forces.sources()[0].id, b);
    }

    #[test]
    fn test_direction_normalised_with_floor() {
        let mut forces = layer();
        let id = forces.add(ForceKind::Dipole, Vec2::zeros(), Vec2::new(0.0, 5.0), 1.0, 10.0);
        let source = forces.get(id).unwrap();
        assert_relative_eq!(source.direction.norm(), 1.0);
        assert_relative_eq!(source.direction.y, 1.0);

        let id = forces.add(ForceKind::Dipole, Vec2::zeros(), Vec2::new(0.003, 0.0), 1.0, 10.0);
        // Shorter than the floor: scaled by 1/0.01 instead of 1/0.003
        assert_relative_eq!(forces.get(id).unwrap().direction.x, 0.3);

        let id = forces.add(ForceKind::Dipole, Vec2::zeros(), Vec2::zeros(), 1.0, 10.0);
        assert_eq!(forces.get(id).unwrap().direction, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_attractor_pulls_inward() {
        let mut f = field();
        let mut forces = layer();
        forces.add(ForceKind::Attractor, Vec2::new(100.0, 100.0), Vec2::zeros(), 100_000.0, 60.0);
        forces.apply(&mut f, 1.0 / 60.0);

        let s = *f.shape();
        // Node right of the source moves left, node above moves down
        assert!(f.u()[s.index(12, 10)] < 0.0);
        assert!(f.v()[s.index(10, 8)] > 0.0);
        // Outside the radius nothing happens
        assert_eq!(f.u()[s.index(17, 10)], 0.0);
    }

    #[test]
    fn test_repeller_mirrors_attractor() {
        let mut attracted = field();
        let mut repelled = field();
        let mut a = layer();
        let mut r = layer();
        a.add(ForceKind::Attractor, Vec2::new(100.0, 100.0), Vec2::zeros(), 50_000.0, 50.0);
        r.add(ForceKind::Repeller, Vec2::new(100.0, 100.0), Vec2::zeros(), 50_000.0, 50.0);
        a.apply(&mut attracted, 0.1);
        r.apply(&mut repelled, 0.1);

        for (ua, ur) in attracted.u().iter().zip(repelled.u()) {
            assert_relative_eq!(*ua, -*ur);
        }
    }

    #[test]
    fn test_acceleration_capped_near_centre() {
        let mut f = field();
        let mut forces = ForceFieldLayer::new(ForceFieldParams {
            max_accel: 100.0,
            epsilon: 1.0,
        });
        forces.add(ForceKind::Repeller, Vec2::new(101.0, 100.0), Vec2::zeros(), 1.0e9, 50.0);
        forces.apply(&mut f, 1.0);
        let s = *f.shape();
        // Node (10,10) is 1px left of the source: pushed left at the cap
        assert_relative_eq!(f.u()[s.index(10, 10)], -100.0 / 1.001, epsilon = 1e-3);
        assert!(f.u().iter().all(|u| u.is_finite()));
    }

    #[test]
    fn test_source_on_node_is_finite() {
        let mut f = field();
        let mut forces = layer();
        forces.add(ForceKind::Attractor, Vec2::new(100.0, 100.0), Vec2::zeros(), 1.0e6, 50.0);
        forces.apply(&mut f, 1.0);
        let s = *f.shape();
        assert_eq!(f.u()[s.index(10, 10)], 0.0);
        assert!(f.u().iter().chain(f.v()).all(|c| c.is_finite()));
    }

    #[test]
    fn test_dipole_drives_jet_along_direction() {
        let mut f = field();
        let mut forces = layer();
        forces.add(
            ForceKind::Dipole,
            Vec2::new(100.0, 100.0),
            Vec2::new(1.0, 0.0),
            200_000.0,
            80.0,
        );
        forces.apply(&mut f, 1.0 / 60.0);
        let s = *f.shape();
        // Between the poles the flow runs from repeller to attractor (+x)
        assert!(f.u()[s.index(10, 10)] > 0.0);
    }
}
