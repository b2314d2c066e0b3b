//! Control-panel state
//!
//! Every toggle and slider the host UI exposes. The driver reads these each
//! step; the setters on [`Simulation`](super::Simulation) clamp values before
//! storing them here.

use crate::solver::{QualityPreset, Theme};
use serde::{Deserialize, Serialize};

/// What the renderer draws and what strokes inject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Tracer particles with trails
    #[default]
    Particles,
    /// Smoke density; strokes also inject smoke
    Smoke,
}

/// Shape of the wind a stroke injects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BrushMode {
    /// Push along the stroke direction
    #[default]
    Push,
    /// Swirl around the pointer
    Vortex,
}

/// What a stroke edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tool {
    /// Inject wind (and smoke/heat, depending on mode)
    #[default]
    Wind,
    /// Paint walls; Shift erases
    Obstacles,
}

/// Which couplings run each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhysicsMode {
    /// Wind only
    #[default]
    Wind,
    /// Wind plus a temperature field driving buoyancy
    WindTemperature,
}

/// Science overlay drawn on top of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OverlayMode {
    /// Scene only
    #[default]
    None,
    /// Arrow per coarse cell
    Vectors,
    /// Integrated flow lines
    Streamlines,
    /// Signed vorticity heatmap
    Vorticity,
    /// Temperature heatmap
    Temperature,
}

/// Control-panel state
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Particles or smoke
    pub mode: Mode,
    /// Push or vortex brush
    pub brush: BrushMode,
    /// Wind or obstacle painting
    pub tool: Tool,
    /// Quality the user asked for; the governor may run lower
    pub quality: QualityPreset,
    /// Wind alone or wind plus temperature
    pub physics: PhysicsMode,
    /// Visual theme and particle motion profile
    pub theme: Theme,
    /// Buoyancy coupling strength in `[0, 2]`
    pub buoyancy_strength: f32,
    /// Trail persistence in `[0, 1]`; the renderer fades by `1 - trail_strength`
    pub trail_strength: f32,
    /// Science overlay
    pub overlay: OverlayMode,
    /// Whether the renderer tints obstacle cells
    pub show_obstacles: bool,
    /// Stickier wind: less damping, less smoothing
    pub wind_memory: bool,
    /// Whether placed force sources act on the wind
    pub force_fields: bool,
    /// Whether the host sonifies flow statistics
    pub sound_enabled: bool,
    /// Sound volume in `[0, 1]`
    pub volume: f32,
    /// Brush radius in world pixels
    pub brush_radius: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            brush: BrushMode::default(),
            tool: Tool::default(),
            quality: QualityPreset::default(),
            physics: PhysicsMode::default(),
            theme: Theme::default(),
            buoyancy_strength: 0.6,
            trail_strength: 0.85,
            overlay: OverlayMode::default(),
            show_obstacles: true,
            wind_memory: false,
            force_fields: false,
            sound_enabled: false,
            volume: 0.5,
            brush_radius: 42.0,
        }
    }
}
