//! Tracer particles carried by the wind
//!
//! Particles are stored structure-of-arrays: current and previous positions
//! in four parallel buffers indexed by slot. Only the population matters, not
//! individual identity, so resizing may truncate, extend or reseed freely.
//! The world wraps toroidally: a particle leaving one edge re-enters on the
//! opposite one.

use super::theme::ParticleProfile;
use crate::error::{zeroed_buffer, SimError};
use crate::grid::{ObstacleField, VelocityField};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Attempts made to find an empty spot when resampling a particle out of a wall
const RESAMPLE_ATTEMPTS: usize = 12;

/// Spatial frequency of the deterministic jitter (1/px)
const JITTER_FREQUENCY: f32 = 0.01;

/// Temporal frequency of the deterministic jitter (rad/s)
const JITTER_SPEED: f32 = 0.6;

/// Per-step motion options
#[derive(Debug, Clone, Copy)]
pub struct StepOptions<'a> {
    /// Linear drag coefficient (1/s)
    pub drag: f32,
    /// Jitter amplitude (px/s)
    pub noise: f32,
    /// Vertical bias, scaled by dt before it is added to velocity
    pub gravity: f32,
    /// Multiplier on the final velocity
    pub speed_scale: f32,
    /// Solid mask; particles found inside are resampled
    pub obstacles: Option<&'a ObstacleField>,
}

impl<'a> StepOptions<'a> {
    /// Options taken from a theme profile, without obstacles
    pub fn from_profile(profile: ParticleProfile) -> Self {
        Self {
            drag: profile.drag,
            noise: profile.noise,
            gravity: profile.gravity,
            speed_scale: profile.speed_scale,
            obstacles: None,
        }
    }

    /// Attach an obstacle mask
    pub fn with_obstacles(mut self, obstacles: &'a ObstacleField) -> Self {
        self.obstacles = Some(obstacles);
        self
    }
}

impl Default for StepOptions<'_> {
    fn default() -> Self {
        Self {
            drag: 0.18,
            noise: 18.0,
            gravity: 0.0,
            speed_scale: 1.0,
            obstacles: None,
        }
    }
}

/// Structure-of-arrays particle arena
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    width: f32,
    height: f32,
    x: Vec<f32>,
    y: Vec<f32>,
    prev_x: Vec<f32>,
    prev_y: Vec<f32>,
    rng: StdRng,
}

impl ParticleSystem {
    /// Create an empty particle system with a deterministic random stream
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            x: Vec::new(),
            y: Vec::new(),
            prev_x: Vec::new(),
            prev_y: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Resize the population and its world rectangle
    ///
    /// With `reseed = false` the overlapping prefix of the old population is
    /// kept (wrapped into the new bounds) and only the added tail is seeded,
    /// which avoids a visual pop when the quality tier changes. With
    /// `reseed = true` every particle is placed afresh.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AllocationFailed`] if the arena cannot be reserved.
    /// The old population is kept in that case.
    pub fn resize(
        &mut self,
        count: usize,
        width: f32,
        height: f32,
        reseed: bool,
    ) -> Result<(), SimError> {
        let mut x = zeroed_buffer(count)?;
        let mut y = zeroed_buffer(count)?;
        let mut prev_x = zeroed_buffer(count)?;
        let mut prev_y = zeroed_buffer(count)?;

        let width = sanitize_extent(width);
        let height = sanitize_extent(height);

        let keep = if reseed { 0 } else { self.x.len().min(count) };
        for i in 0..keep {
            let nx = wrap_into(self.x[i], width);
            let ny = wrap_into(self.y[i], height);
            x[i] = nx;
            y[i] = ny;
            if nx == self.x[i] && ny == self.y[i] {
                prev_x[i] = wrap_into(self.prev_x[i], width);
                prev_y[i] = wrap_into(self.prev_y[i], height);
            } else {
                prev_x[i] = nx;
                prev_y[i] = ny;
            }
        }

        self.width = width;
        self.height = height;
        self.x = x;
        self.y = y;
        self.prev_x = prev_x;
        self.prev_y = prev_y;
        self.seed_range(keep, count);
        Ok(())
    }

    /// Place every particle uniformly at random with zero trail
    pub fn seed_particles(&mut self) {
        self.seed_range(0, self.x.len());
    }

    fn seed_range(&mut self, start: usize, end: usize) {
        for i in start..end {
            let nx = self.rng.random::<f32>() * self.width;
            let ny = self.rng.random::<f32>() * self.height;
            self.x[i] = nx;
            self.y[i] = ny;
            self.prev_x[i] = nx;
            self.prev_y[i] = ny;
        }
    }

    /// Advance every particle by `dt` seconds through `field`
    ///
    /// `time` is the simulation clock in seconds and drives the jitter phase.
    /// A particle sitting in a solid node is resampled to a random empty spot
    /// (with no trail) and skips physics for this step. A particle that wraps
    /// across an edge gets `prev = current` so no trail is drawn across the
    /// screen.
    pub fn step(&mut self, field: &VelocityField, dt: f32, time: f32, options: &StepOptions<'_>) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let drag_factor = (1.0 - options.drag * dt).max(0.0);
        let phase = time * JITTER_SPEED;
        let gravity_push = options.gravity * dt;

        for i in 0..self.x.len() {
            let cx = self.x[i];
            let cy = self.y[i];

            if let Some(obstacles) = options.obstacles {
                if obstacles.is_solid_at(cx, cy) {
                    self.resample(i, obstacles);
                    continue;
                }
            }

            let (vx, vy) = field.sample(cx, cy);
            let jitter_x = (cy * JITTER_FREQUENCY + phase).sin() * options.noise;
            let jitter_y = (cx * JITTER_FREQUENCY + phase).cos() * options.noise;
            let next_vx = (vx + jitter_x) * drag_factor * options.speed_scale;
            let next_vy = ((vy + jitter_y) * drag_factor + gravity_push) * options.speed_scale;

            let (nx, wrapped_x) = wrap(cx + next_vx * dt, self.width);
            let (ny, wrapped_y) = wrap(cy + next_vy * dt, self.height);

            self.x[i] = nx;
            self.y[i] = ny;
            if wrapped_x || wrapped_y {
                self.prev_x[i] = nx;
                self.prev_y[i] = ny;
            } else {
                self.prev_x[i] = cx;
                self.prev_y[i] = cy;
            }
        }
    }

    fn resample(&mut self, i: usize, obstacles: &ObstacleField) {
        let mut nx = 0.0;
        let mut ny = 0.0;
        for _ in 0..RESAMPLE_ATTEMPTS {
            nx = self.rng.random::<f32>() * self.width;
            ny = self.rng.random::<f32>() * self.height;
            if !obstacles.is_solid_at(nx, ny) {
                break;
            }
        }
        self.x[i] = nx;
        self.y[i] = ny;
        self.prev_x[i] = nx;
        self.prev_y[i] = ny;
    }

    /// Number of particles
    pub fn count(&self) -> usize {
        self.x.len()
    }

    /// World width particles wrap around
    pub fn width(&self) -> f32 {
        self.width
    }

    /// World height particles wrap around
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Current x positions
    pub fn x(&self) -> &[f32] {
        &self.x
    }

    /// Current y positions
    pub fn y(&self) -> &[f32] {
        &self.y
    }

    /// Previous x positions (trail start)
    pub fn prev_x(&self) -> &[f32] {
        &self.prev_x
    }

    /// Previous y positions (trail start)
    pub fn prev_y(&self) -> &[f32] {
        &self.prev_y
    }

    /// Overwrite one particle's position and trail, for scripted scenes and tests
    pub fn place(&mut self, i: usize, x: f32, y: f32) {
        if i < self.x.len() {
            self.x[i] = x;
            self.y[i] = y;
            self.prev_x[i] = x;
            self.prev_y[i] = y;
        }
    }
}

/// Toroidal wrap. Returns the wrapped value and whether a wrap happened.
fn wrap(value: f32, max: f32) -> (f32, bool) {
    if !value.is_finite() {
        return (max * 0.5, true);
    }
    if value < 0.0 {
        (wrap_into(value + max, max), true)
    } else if value > max {
        (wrap_into(value - max, max), true)
    } else {
        (value, false)
    }
}

fn wrap_into(value: f32, max: f32) -> f32 {
    if (0.0..=max).contains(&value) {
        value
    } else if value.is_finite() {
        value.rem_euclid(max)
    } else {
        max * 0.5
    }
}

fn sanitize_extent(extent: f32) -> f32 {
    if extent.is_finite() {
        extent.max(1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridShape;
    use approx::assert_relative_eq;

    fn still_options() -> StepOptions<'static> {
        StepOptions {
            drag: 0.0,
            noise: 0.0,
            gravity: 0.0,
            speed_scale: 1.0,
            obstacles: None,
        }
    }

    fn in_bounds(particles: &ParticleSystem) -> bool {
        particles
            .x()
            .iter()
            .zip(particles.y())
            .all(|(&x, &y)| {
                (0.0..=particles.width()).contains(&x) && (0.0..=particles.height()).contains(&y)
            })
    }

    #[test]
    fn test_seeding_within_bounds_with_zero_trail() {
        let mut particles = ParticleSystem::new(7);
        particles.resize(500, 320.0, 200.0, true).unwrap();
        assert_eq!(particles.count(), 500);
        assert!(in_bounds(&particles));
        assert_eq!(particles.x(), particles.prev_x());
        assert_eq!(particles.y(), particles.prev_y());
    }

    #[test]
    fn test_resize_preserves_prefix() {
        let mut particles = ParticleSystem::new(1);
        particles.resize(100, 300.0, 300.0, true).unwrap();
        let old_x = particles.x()[..100].to_vec();

        particles.resize(150, 300.0, 300.0, false).unwrap();
        assert_eq!(particles.count(), 150);
        assert_eq!(&particles.x()[..100], old_x.as_slice());

        particles.resize(40, 300.0, 300.0, false).unwrap();
        assert_eq!(particles.x(), &old_x[..40]);

        particles.resize(40, 300.0, 300.0, true).unwrap();
        assert_ne!(particles.x(), &old_x[..40]);
    }

    #[test]
    fn test_resize_wraps_kept_particles_into_smaller_world() {
        let mut particles = ParticleSystem::new(3);
        particles.resize(200, 1000.0, 1000.0, true).unwrap();
        particles.resize(200, 100.0, 50.0, false).unwrap();
        assert!(in_bounds(&particles));
    }

    #[test]
    fn test_still_particles_never_leave_world() {
        let field = VelocityField::new(GridShape::new(200.0, 100.0, 9, 5)).unwrap();
        let mut particles = ParticleSystem::new(11);
        particles.resize(300, 200.0, 100.0, true).unwrap();
        let start = particles.x().to_vec();

        for step in 0..120 {
            particles.step(&field, 1.0 / 60.0, step as f32 / 60.0, &still_options());
        }
        assert!(in_bounds(&particles));
        assert_eq!(particles.x(), start.as_slice());
    }

    #[test]
    fn test_wrap_resets_trail() {
        let shape = GridShape::new(100.0, 100.0, 5, 5);
        let mut field = VelocityField::new(shape).unwrap();
        field.components_mut().0.fill(600.0);

        let mut particles = ParticleSystem::new(5);
        particles.resize(1, 100.0, 100.0, true).unwrap();
        particles.place(0, 95.0, 50.0);

        // 600 px/s for 1/60 s = 10 px: crosses the right edge
        particles.step(&field, 1.0 / 60.0, 0.0, &still_options());
        assert_relative_eq!(particles.x()[0], 5.0, epsilon = 1e-4);
        assert_eq!(particles.prev_x()[0], particles.x()[0]);
        assert_eq!(particles.prev_y()[0], particles.y()[0]);

        // The next, non-wrapping step leaves a normal trail
        particles.step(&field, 1.0 / 60.0, 0.0, &still_options());
        assert_relative_eq!(particles.prev_x()[0], 5.0, epsilon = 1e-4);
        assert_relative_eq!(particles.x()[0], 15.0, epsilon = 1e-4);
    }

    #[test]
    fn test_drag_gravity_and_noise() {
        let shape = GridShape::new(1000.0, 1000.0, 5, 5);
        let field = VelocityField::new(shape).unwrap();
        let mut particles = ParticleSystem::new(5);
        particles.resize(1, 1000.0, 1000.0, true).unwrap();
        particles.place(0, 500.0, 500.0);

        let dt = 0.1;
        let options = StepOptions {
            drag: 0.0,
            noise: 0.0,
            gravity: 1000.0,
            speed_scale: 1.0,
            obstacles: None,
        };
        particles.step(&field, dt, 0.0, &options);
        // Gravity adds gravity·dt to the velocity, integrated over dt
        assert_relative_eq!(particles.y()[0], 510.0, epsilon = 1e-3);
        assert_relative_eq!(particles.x()[0], 500.0);

        // Jitter is a smooth function of position and time, so it is reproducible
        let jitter = StepOptions {
            noise: 10.0,
            ..still_options()
        };
        let mut a = particles.clone();
        let mut b = particles.clone();
        a.step(&field, dt, 2.0, &jitter);
        b.step(&field, dt, 2.0, &jitter);
        assert_eq!(a.x(), b.x());
        let expected = 500.0 + (510.0_f32 * 0.01 + 1.2).sin() * 10.0 * dt;
        assert_relative_eq!(a.x()[0], expected, epsilon = 1e-3);

        // Drag larger than 1/dt stops the particle entirely
        let stuck = StepOptions {
            drag: 100.0,
            noise: 10.0,
            ..still_options()
        };
        let mut c = particles.clone();
        c.step(&field, dt, 0.0, &stuck);
        assert_eq!(c.x()[0], 500.0);
    }

    #[test]
    fn test_particle_in_wall_is_resampled() {
        let shape = GridShape::new(100.0, 100.0, 11, 11);
        let field = VelocityField::new(shape).unwrap();
        let mut obstacles = ObstacleField::new(shape).unwrap();
        obstacles.paint(50.0, 50.0, 20.0, true);

        let mut particles = ParticleSystem::new(9);
        particles.resize(1, 100.0, 100.0, true).unwrap();
        particles.place(0, 50.0, 50.0);

        let options = still_options().with_obstacles(&obstacles);
        particles.step(&field, 1.0 / 60.0, 0.0, &options);

        let (x, y) = (particles.x()[0], particles.y()[0]);
        assert!(!obstacles.is_solid_at(x, y));
        assert_eq!(particles.prev_x()[0], x);
        assert_eq!(particles.prev_y()[0], y);
    }

    #[test]
    fn test_same_seed_same_population() {
        let mut a = ParticleSystem::new(42);
        let mut b = ParticleSystem::new(42);
        a.resize(64, 640.0, 480.0, true).unwrap();
        b.resize(64, 640.0, 480.0, true).unwrap();
        assert_eq!(a.x(), b.x());
        assert_eq!(a.y(), b.y());
    }
}
