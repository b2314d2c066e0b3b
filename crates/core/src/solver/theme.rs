//! Visual themes and the particle behaviour each one implies
//!
//! A theme changes how particles move, not just how they are drawn: embers
//! drift upward, snow falls and lingers, neon streaks with little drag.

use serde::{Deserialize, Serialize};

/// Selectable visual theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Theme {
    /// Pale blue streaks on a dark sky
    #[default]
    Classic,
    /// Glowing sparks that rise
    Ember,
    /// Slow flakes that settle
    Snow,
    /// Saturated, fast, low-drag trails
    Neon,
}

impl Theme {
    /// All themes in control-panel order
    pub const ALL: [Theme; 4] = [Theme::Classic, Theme::Ember, Theme::Snow, Theme::Neon];

    /// Particle motion profile for this theme
    pub const fn particle_profile(&self) -> ParticleProfile {
        match self {
            Theme::Classic => ParticleProfile {
                drag: 0.18,
                noise: 18.0,
                gravity: 0.0,
                speed_scale: 1.0,
            },
            Theme::Ember => ParticleProfile {
                drag: 0.24,
                noise: 26.0,
                gravity: -900.0,
                speed_scale: 0.9,
            },
            Theme::Snow => ParticleProfile {
                drag: 0.45,
                noise: 10.0,
                gravity: 1200.0,
                speed_scale: 0.7,
            },
            Theme::Neon => ParticleProfile {
                drag: 0.08,
                noise: 22.0,
                gravity: 0.0,
                speed_scale: 1.25,
            },
        }
    }

    /// Parse a control-panel label, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Theme::Classic),
            "ember" | "embers" => Some(Theme::Ember),
            "snow" => Some(Theme::Snow),
            "neon" => Some(Theme::Neon),
            _ => None,
        }
    }
}

/// How particles respond to the wind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleProfile {
    /// Linear drag coefficient (1/s)
    pub drag: f32,
    /// Amplitude of the smooth position/time jitter (px/s)
    pub noise: f32,
    /// Vertical bias added to velocity, scaled by dt (positive = down)
    pub gravity: f32,
    /// Multiplier on the final velocity before integration
    pub speed_scale: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("Neon"), Some(Theme::Neon));
        assert_eq!(Theme::from_name(" embers "), Some(Theme::Ember));
        assert_eq!(Theme::from_name("plaid"), None);
    }

    #[test]
    fn test_profiles_are_distinct() {
        assert!(Theme::Ember.particle_profile().gravity < 0.0);
        assert!(Theme::Snow.particle_profile().gravity > 0.0);
        assert!(Theme::Neon.particle_profile().drag < Theme::Classic.particle_profile().drag);
        for theme in Theme::ALL {
            let profile = theme.particle_profile();
            assert!(profile.drag >= 0.0 && profile.speed_scale > 0.0);
        }
    }
}
