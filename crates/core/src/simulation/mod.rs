//! Fixed-step simulation driver
//!
//! `Simulation` owns every field, the particle arena and the force sources in
//! one [`SimulationState`], and advances them in lockstep at a fixed step no
//! matter how often the host renders:
//!
//! 1. Pointer injection (brush, obstacle painting) or, after a quiet spell, the idle breeze
//! 2. Force sources
//! 3. Buoyancy (Wind+Temperature physics only)
//! 4. Smoothing, damping and obstacle clamping of the velocity field
//! 5. Smoke and temperature advection
//! 6. Particle motion (Particles mode only)
//!
//! Input handlers only update pointer state or place sources; all field
//! writes happen inside a step. The renderer and audio layer read the state
//! after [`Simulation::advance_frame`] returns.

mod clock;
pub mod config;
mod governor;
pub mod input;
pub mod settings;
mod stats;

pub use clock::{FixedStepClock, DEFAULT_SIM_STEP};
pub use config::SimulationConfig;
pub use governor::{GovernorConfig, GovernorState, PerformanceGovernor};
pub use input::{Modifiers, PointerState, StrokeEvent};
pub use settings::{BrushMode, Mode, OverlayMode, PhysicsMode, Settings, Tool};
pub use stats::{sample_flow_stats, FlowStats, DEFAULT_STATS_STRIDE};

use crate::core_types::Vec2;
use crate::error::SimError;
use crate::grid::{apply_obstacles_to_field, GridShape, ObstacleField, ScalarField, VelocityField};
use crate::solver::{
    apply_buoyancy, ForceFieldLayer, ForceKind, ForceSource, ForceSourceId, ParticleSystem,
    QualityPreset, StepOptions, Theme,
};
use tracing::{debug, error, info, warn};

/// Every buffer a simulation owns
///
/// All grids share one [`GridShape`]. The state is only mutated inside a
/// fixed step or by an explicit reset/rebuild.
#[derive(Debug, Clone)]
pub struct SimulationState {
    velocity: VelocityField,
    smoke: ScalarField,
    temperature: ScalarField,
    obstacles: ObstacleField,
    particles: ParticleSystem,
    forces: ForceFieldLayer,
    time: f32,
}

impl SimulationState {
    fn allocate(
        shape: GridShape,
        particle_count: usize,
        config: &SimulationConfig,
    ) -> Result<Self, SimError> {
        let mut particles = ParticleSystem::new(config.seed);
        particles.resize(particle_count, shape.world_width, shape.world_height, true)?;
        Ok(Self {
            velocity: VelocityField::new(shape)?,
            smoke: ScalarField::new(shape)?,
            temperature: ScalarField::new(shape)?,
            obstacles: ObstacleField::new(shape)?,
            particles,
            forces: ForceFieldLayer::new(config.force_field),
            time: 0.0,
        })
    }

    /// Rebuild every grid at `shape` (zeroing fields and obstacles) and the
    /// particle arena at `particle_count`
    ///
    /// New buffers are allocated before any old one is replaced, so on error
    /// the state is left untouched at its previous shape.
    fn rebuild(
        &mut self,
        shape: GridShape,
        particle_count: usize,
        reseed: bool,
    ) -> Result<(), SimError> {
        let velocity = VelocityField::new(shape)?;
        let smoke = ScalarField::new(shape)?;
        let temperature = ScalarField::new(shape)?;
        let obstacles = ObstacleField::new(shape)?;
        self.particles
            .resize(particle_count, shape.world_width, shape.world_height, reseed)?;

        self.velocity = velocity;
        self.smoke = smoke;
        self.temperature = temperature;
        self.obstacles = obstacles;
        Ok(())
    }

    /// One fixed step of `dt` seconds
    fn step(
        &mut self,
        dt: f32,
        settings: &Settings,
        config: &SimulationConfig,
        pointer: &PointerState,
    ) {
        if pointer.active {
            self.apply_pointer(pointer, settings, config);
        } else if pointer.idle_time >= config.idle_breeze_delay {
            self.apply_idle_breeze(config);
        }

        if settings.force_fields {
            self.forces.apply(&mut self.velocity, dt);
        }
        if settings.physics == PhysicsMode::WindTemperature {
            apply_buoyancy(
                &mut self.velocity,
                &self.temperature,
                settings.buoyancy_strength,
                dt,
            );
        }

        self.velocity
            .diffuse(config.diffusion_strength(settings.wind_memory));
        self.velocity.apply_damping(config.damping(settings.wind_memory));
        apply_obstacles_to_field(&mut self.velocity, &self.obstacles, config.boundary_damping);

        self.smoke.advect(
            &self.velocity,
            dt,
            config.smoke_dissipation,
            Some(&self.obstacles),
        );
        self.temperature.advect(
            &self.velocity,
            dt,
            config.temperature_dissipation,
            Some(&self.obstacles),
        );

        if settings.mode == Mode::Particles {
            let options = StepOptions::from_profile(settings.theme.particle_profile())
                .with_obstacles(&self.obstacles);
            self.particles.step(&self.velocity, dt, self.time, &options);
        }

        self.time += dt;
    }

    fn apply_pointer(
        &mut self,
        pointer: &PointerState,
        settings: &Settings,
        config: &SimulationConfig,
    ) {
        let (x, y) = (pointer.position.x, pointer.position.y);
        let radius = settings.brush_radius;

        if settings.tool == Tool::Obstacles {
            self.obstacles.paint(x, y, radius, !pointer.modifiers.shift);
            return;
        }

        match settings.brush {
            BrushMode::Push => self.velocity.add_velocity(
                x,
                y,
                pointer.velocity.x,
                pointer.velocity.y,
                radius,
                config.brush_strength,
            ),
            BrushMode::Vortex => {
                let speed = pointer.velocity.norm().max(config.vortex_min_speed);
                let direction = if pointer.modifiers.shift { -1.0 } else { 1.0 };
                let spin = direction * speed * config.vortex_spin;
                self.velocity
                    .add_vortex(x, y, spin, radius, config.brush_strength);
            }
        }

        if settings.mode == Mode::Smoke {
            self.smoke
                .add_scalar(x, y, config.smoke_amount, radius, Some(&self.obstacles));
        }
        if settings.physics == PhysicsMode::WindTemperature {
            let heat = if pointer.modifiers.cold() {
                -config.heat_amount
            } else {
                config.heat_amount
            };
            self.temperature
                .add_scalar(x, y, heat, radius, Some(&self.obstacles));
        }
    }

    /// Slow drifting gust so an untouched canvas never goes fully still
    fn apply_idle_breeze(&mut self, config: &SimulationConfig) {
        let shape = *self.velocity.shape();
        let (width, height) = (shape.world_width, shape.world_height);
        let time = self.time;

        let x = width * (0.5 + 0.35 * (time * 0.23).sin());
        let y = height * (0.5 + 0.3 * (time * 0.17).cos());
        let heading = time * 0.11;
        let vx = heading.cos() * config.idle_breeze_speed;
        let vy = heading.sin() * 0.35 * config.idle_breeze_speed;
        self.velocity.add_velocity(
            x,
            y,
            vx,
            vy,
            width.max(height) * 0.18,
            config.idle_breeze_strength,
        );
    }

    /// Wind velocity grid
    pub fn velocity(&self) -> &VelocityField {
        &self.velocity
    }

    /// Smoke density grid
    pub fn smoke(&self) -> &ScalarField {
        &self.smoke
    }

    /// Temperature grid
    pub fn temperature(&self) -> &ScalarField {
        &self.temperature
    }

    /// Obstacle mask
    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    /// Tracer particles
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Placed force sources
    pub fn forces(&self) -> &ForceFieldLayer {
        &self.forces
    }

    /// Simulated seconds since creation or the last reset
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Grid shape shared by every field
    pub fn shape(&self) -> &GridShape {
        self.velocity.shape()
    }
}

/// What one call to [`Simulation::advance_frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Fixed steps executed
    pub steps: u32,
    /// New effective quality if the governor switched tiers this frame
    pub quality_change: Option<QualityPreset>,
}

/// Fixed-step wind simulation
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    settings: Settings,
    state: SimulationState,
    clock: FixedStepClock,
    governor: PerformanceGovernor,
    pointer: PointerState,
    world_width: f32,
    world_height: f32,
    quality: QualityPreset,
}

impl Simulation {
    /// Create a simulation over a `world_width × world_height` pixel canvas
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] if even the Low tier buffers cannot be allocated.
    pub fn new(
        world_width: f32,
        world_height: f32,
        config: SimulationConfig,
    ) -> Result<Self, SimError> {
        Self::with_settings(world_width, world_height, config, Settings::default())
    }

    /// Create a simulation with an initial control-panel state
    ///
    /// If the High tier cannot be built the simulation starts at Low with the
    /// governor in its automatic low-power state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] if even the Low tier buffers cannot be allocated.
    pub fn with_settings(
        world_width: f32,
        world_height: f32,
        config: SimulationConfig,
        mut settings: Settings,
    ) -> Result<Self, SimError> {
        let world = GridShape::new(world_width, world_height, 2, 2);
        let (world_width, world_height) = (world.world_width, world.world_height);
        settings.brush_radius = config.clamp_brush_radius(settings.brush_radius);
        let mut governor = PerformanceGovernor::new(config.governor, settings.quality);

        let quality = governor.effective_quality();
        let (state, quality) = match build_state(world_width, world_height, quality, &config) {
            Ok(state) => (state, quality),
            Err(err) if quality == QualityPreset::High => {
                warn!(
                    "High quality allocation failed ({}), falling back to Low",
                    err
                );
                governor.force_low_power();
                let state =
                    build_state(world_width, world_height, QualityPreset::Low, &config)?;
                (state, QualityPreset::Low)
            }
            Err(err) => return Err(err),
        };

        let shape = *state.shape();
        info!(
            "Wind simulation initialized: {:.0}x{:.0} world, {}x{} grid, {} particles, quality={:?}",
            world_width,
            world_height,
            shape.width,
            shape.height,
            state.particles.count(),
            quality
        );

        Ok(Self {
            clock: FixedStepClock::new(config.sim_step, config.max_frame_delta),
            config,
            settings,
            state,
            governor,
            pointer: PointerState::default(),
            world_width,
            world_height,
            quality,
        })
    }

    /// Advance by one display frame's elapsed wall time
    ///
    /// Runs zero or more fixed steps from the accumulator, then lets the
    /// governor look at the frame time. A tier change rebuilds the grids and
    /// resizes the particle arena while keeping existing particles.
    pub fn advance_frame(&mut self, elapsed_seconds: f32) -> FrameReport {
        let steps = self.clock.advance(elapsed_seconds);
        let dt = self.clock.step_seconds();
        for _ in 0..steps {
            self.step_once(dt);
        }
        debug!(
            "Frame: elapsed={:.4}s, steps={}, t={:.2}s",
            elapsed_seconds, steps, self.state.time
        );

        let quality_change = self
            .governor
            .record_frame(elapsed_seconds * 1000.0)
            .and_then(|quality| self.switch_quality(quality));

        FrameReport {
            steps,
            quality_change,
        }
    }

    /// Run exactly one fixed step, bypassing the accumulator
    pub fn step(&mut self) {
        let dt = self.clock.step_seconds();
        self.step_once(dt);
    }

    fn step_once(&mut self, dt: f32) {
        self.state
            .step(dt, &self.settings, &self.config, &self.pointer);
        self.pointer.tick(dt);
    }

    /// Rebuild at `quality` if it differs from the running tier; returns the tier actually built
    fn switch_quality(&mut self, quality: QualityPreset) -> Option<QualityPreset> {
        if quality == self.quality {
            return None;
        }
        let before = self.quality;
        if let Err(err) = self.rebuild(quality, false) {
            error!("Quality rebuild failed: {}", err);
        }
        (self.quality != before).then_some(self.quality)
    }

    /// Rebuild every buffer for `quality` at the current world size
    ///
    /// Falls back to Low if High cannot be allocated. If Low fails too the
    /// buffers keep their previous shape and tier.
    fn rebuild(&mut self, quality: QualityPreset, reseed: bool) -> Result<(), SimError> {
        match self.rebuild_at(quality, reseed) {
            Ok(()) => {
                self.quality = quality;
            }
            Err(err) if quality == QualityPreset::High => {
                warn!(
                    "High quality allocation failed ({}), falling back to Low",
                    err
                );
                self.governor.force_low_power();
                self.rebuild_at(QualityPreset::Low, reseed)?;
                self.quality = QualityPreset::Low;
            }
            Err(err) => return Err(err),
        }
        let shape = self.state.shape();
        info!(
            "Rebuilt at {:?} quality: {}x{} grid, {} particles",
            self.quality,
            shape.width,
            shape.height,
            self.state.particles.count()
        );
        Ok(())
    }

    fn rebuild_at(&mut self, quality: QualityPreset, reseed: bool) -> Result<(), SimError> {
        let (shape, count) = layout(self.world_width, self.world_height, quality, &self.config)?;
        self.state.rebuild(shape, count, reseed)
    }

    /// Zero every field and reseed particles
    ///
    /// Obstacles and force sources are kept.
    pub fn reset(&mut self) {
        self.state.velocity.clear();
        self.state.smoke.clear();
        self.state.temperature.clear();
        self.state.particles.seed_particles();
        self.state.time = 0.0;
        self.clock.reset();
        self.pointer = PointerState::default();
        info!("Simulation reset");
    }

    /// Remove every obstacle
    pub fn clear_obstacles(&mut self) {
        self.state.obstacles.clear();
    }

    /// Follow a canvas resize
    ///
    /// Every grid is rebuilt for the new world (fields and obstacles zeroed);
    /// particles keep their positions, wrapped into the new bounds. On error
    /// the world size and every buffer stay as they were.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] if even the Low tier buffers cannot be allocated.
    pub fn resize(&mut self, world_width: f32, world_height: f32) -> Result<(), SimError> {
        let world = GridShape::new(world_width, world_height, 2, 2);
        let previous = (self.world_width, self.world_height);
        self.world_width = world.world_width;
        self.world_height = world.world_height;
        info!(
            "Resizing world to {:.0}x{:.0}",
            self.world_width, self.world_height
        );
        let result = self.rebuild(self.governor.effective_quality(), false);
        if result.is_err() {
            (self.world_width, self.world_height) = previous;
        }
        result
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Begin a stroke
    pub fn stroke_start(&mut self, event: &StrokeEvent) {
        if !event.is_finite() {
            warn!("Ignoring non-finite stroke event");
            return;
        }
        self.pointer.release();
        self.pointer.update(event, self.config.pointer_velocity_scale);
    }

    /// Continue a stroke
    pub fn stroke_move(&mut self, event: &StrokeEvent) {
        if !event.is_finite() {
            warn!("Ignoring non-finite stroke event");
            return;
        }
        self.pointer.update(event, self.config.pointer_velocity_scale);
    }

    /// Finish a stroke
    pub fn stroke_end(&mut self) {
        self.pointer.release();
    }

    /// A quick tap: a doubled impulse that injects for a short pulse
    pub fn tap(&mut self, event: &StrokeEvent) {
        if !event.is_finite() {
            warn!("Ignoring non-finite tap event");
            return;
        }
        self.pointer.release();
        self.pointer.update(
            event,
            self.config.pointer_velocity_scale * self.config.tap_multiplier,
        );
        self.pointer.tap_remaining = Some(self.config.tap_duration.max(0.0));
    }

    /// Touch held in place. Marks the current stroke as cold for temperature injection.
    pub fn long_press(&mut self, event: &StrokeEvent) {
        if !event.is_finite() {
            return;
        }
        let mut event = *event;
        event.modifiers.long_press = true;
        self.pointer.update(&event, self.config.pointer_velocity_scale);
    }

    /// Pinch distance change in pixels
    pub fn pinch(&mut self, delta: f32) {
        if delta.is_finite() {
            let radius = self.settings.brush_radius + delta * self.config.pinch_sensitivity;
            self.set_brush_radius(radius);
        }
    }

    /// Wheel delta (browser units; positive scrolls down and shrinks the brush)
    pub fn wheel(&mut self, delta: f32) {
        if delta.is_finite() {
            let radius = self.settings.brush_radius + delta * self.config.wheel_sensitivity;
            self.set_brush_radius(radius);
        }
    }

    /// Multi-finger tap: place a force source at the tap point
    ///
    /// Places an attractor, a repeller with Shift, or a dipole with Alt
    /// pointing along the last stroke direction. Does nothing unless force
    /// fields are enabled.
    pub fn multi_finger_tap(&mut self, event: &StrokeEvent) -> Option<ForceSourceId> {
        if !self.settings.force_fields || !event.is_finite() {
            return None;
        }
        let kind = if event.modifiers.alt {
            ForceKind::Dipole
        } else if event.modifiers.shift {
            ForceKind::Repeller
        } else {
            ForceKind::Attractor
        };
        self.pointer.idle_time = 0.0;
        Some(self.add_force_source(
            kind,
            event.position,
            self.pointer.last_direction,
            self.config.force_strength,
            self.config.force_radius,
        ))
    }

    // ------------------------------------------------------------------
    // Direct edits
    // ------------------------------------------------------------------

    /// Inject a velocity impulse directly (scripted scenes, host tools)
    ///
    /// Non-finite velocity or strength is ignored.
    pub fn add_velocity(&mut self, x: f32, y: f32, vx: f32, vy: f32, radius: f32, strength: f32) {
        if !(vx.is_finite() && vy.is_finite() && strength.is_finite()) {
            warn!("Ignoring non-finite velocity impulse");
            return;
        }
        self.state
            .velocity
            .add_velocity(x, y, vx, vy, radius, strength);
    }

    /// Inject smoke directly
    pub fn add_smoke(&mut self, x: f32, y: f32, amount: f32, radius: f32) {
        self.state
            .smoke
            .add_scalar(x, y, amount, radius, Some(&self.state.obstacles));
    }

    /// Inject heat directly (negative for cold)
    pub fn add_heat(&mut self, x: f32, y: f32, amount: f32, radius: f32) {
        self.state
            .temperature
            .add_scalar(x, y, amount, radius, Some(&self.state.obstacles));
    }

    /// Paint (`add`) or erase a circle of obstacles
    pub fn paint_obstacle(&mut self, x: f32, y: f32, radius: f32, add: bool) {
        self.state.obstacles.paint(x, y, radius, add);
    }

    /// Place a force source
    pub fn add_force_source(
        &mut self,
        kind: ForceKind,
        position: Vec2,
        direction: Vec2,
        strength: f32,
        radius: f32,
    ) -> ForceSourceId {
        let id = self
            .state
            .forces
            .add(kind, position, direction, strength, radius);
        debug!(
            "Placed {:?} source {:?} at ({:.1}, {:.1})",
            kind, id, position.x, position.y
        );
        id
    }

    /// Remove a force source; returns whether it existed
    pub fn remove_force_source(&mut self, id: ForceSourceId) -> bool {
        self.state.forces.remove(id)
    }

    /// Remove every force source
    pub fn clear_force_sources(&mut self) {
        self.state.forces.clear();
    }

    // ------------------------------------------------------------------
    // Control panel
    // ------------------------------------------------------------------

    /// Track particles or smoke
    pub fn set_mode(&mut self, mode: Mode) {
        self.settings.mode = mode;
    }

    /// Push or vortex brush
    pub fn set_brush_mode(&mut self, brush: BrushMode) {
        self.settings.brush = brush;
    }

    /// Paint wind or obstacles
    pub fn set_tool(&mut self, tool: Tool) {
        self.settings.tool = tool;
    }

    /// Manually choose a quality tier
    ///
    /// Overrides any automatic low-power state and rebuilds if the effective
    /// tier changed.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] if even the Low tier buffers cannot be allocated.
    pub fn set_quality(&mut self, quality: QualityPreset) -> Result<(), SimError> {
        self.settings.quality = quality;
        let effective = self.governor.set_user_quality(quality);
        if effective != self.quality {
            self.rebuild(effective, false)?;
        }
        Ok(())
    }

    /// Switch physics; leaving Wind+Temperature clears the temperature field
    pub fn set_physics(&mut self, physics: PhysicsMode) {
        if physics != PhysicsMode::WindTemperature {
            self.state.temperature.clear();
        }
        self.settings.physics = physics;
    }

    /// Visual theme, which also sets the particle motion profile
    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
    }

    /// Buoyancy strength, clamped to `[0, 2]`
    pub fn set_buoyancy_strength(&mut self, strength: f32) {
        self.settings.buoyancy_strength =
            clamp_or(strength, 0.0, 2.0, self.settings.buoyancy_strength);
    }

    /// Trail strength, clamped to `[0, 1]`
    pub fn set_trail_strength(&mut self, strength: f32) {
        self.settings.trail_strength =
            clamp_or(strength, 0.0, 1.0, self.settings.trail_strength);
    }

    /// Diagnostic overlay drawn over the canvas
    pub fn set_overlay(&mut self, overlay: OverlayMode) {
        self.settings.overlay = overlay;
    }

    /// Whether the renderer draws the obstacle mask
    pub fn set_show_obstacles(&mut self, show: bool) {
        self.settings.show_obstacles = show;
    }

    /// Slower damping and lighter smoothing so strokes linger
    pub fn set_wind_memory(&mut self, enabled: bool) {
        self.settings.wind_memory = enabled;
    }

    /// Enable force sources and multi-finger placement
    pub fn set_force_fields(&mut self, enabled: bool) {
        self.settings.force_fields = enabled;
    }

    /// Whether the host should sonify flow statistics
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
    }

    /// Sound volume, clamped to `[0, 1]`
    pub fn set_volume(&mut self, volume: f32) {
        self.settings.volume = clamp_or(volume, 0.0, 1.0, self.settings.volume);
    }

    /// Brush radius, clamped to the configured range
    pub fn set_brush_radius(&mut self, radius: f32) {
        self.settings.brush_radius = self.config.clamp_brush_radius(radius);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All simulation buffers
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Control-panel state
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Tuning constants
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Pointer state (the renderer draws the brush ring while active)
    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// Quality governor
    pub fn governor(&self) -> &PerformanceGovernor {
        &self.governor
    }

    /// Fixed-step clock
    pub fn clock(&self) -> &FixedStepClock {
        &self.clock
    }

    /// Tier the buffers are currently built at
    pub fn quality(&self) -> QualityPreset {
        self.quality
    }

    /// World size in pixels
    pub fn world_size(&self) -> (f32, f32) {
        (self.world_width, self.world_height)
    }

    /// Active force sources sorted by id
    pub fn force_sources(&self) -> Vec<ForceSource> {
        self.state.forces.sources()
    }

    /// Mean speed and vorticity on a coarse stride, for the audio layer
    pub fn flow_stats(&self, stride: usize) -> FlowStats {
        sample_flow_stats(&self.state.velocity, stride)
    }
}

/// Grid shape and particle count for `quality`, checked against the node budget
fn layout(
    world_width: f32,
    world_height: f32,
    quality: QualityPreset,
    config: &SimulationConfig,
) -> Result<(GridShape, usize), SimError> {
    let (width, height) = quality.grid_dimensions(world_width, world_height);
    let shape = GridShape::try_new(world_width, world_height, width, height)?;
    if shape.node_count() > config.max_grid_nodes {
        return Err(SimError::AllocationFailed {
            len: shape.node_count(),
        });
    }
    Ok((shape, quality.particle_count(world_width, world_height)))
}

fn build_state(
    world_width: f32,
    world_height: f32,
    quality: QualityPreset,
    config: &SimulationConfig,
) -> Result<SimulationState, SimError> {
    let (shape, count) = layout(world_width, world_height, quality, config)?;
    SimulationState::allocate(shape, count, config)
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}
