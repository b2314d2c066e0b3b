//! Frame-rate driven quality governor
//!
//! Frame times are bucketed into fixed windows and each window's achieved FPS
//! feeds a two-state machine:
//!
//! ```text
//!            N consecutive windows < low_power_fps (user quality High only)
//!   Normal ──────────────────────────────────────────────────────────▶ AutoLowPower
//!          ◀──────────────────────────────────────────────────────────
//!            M consecutive windows > high_power_fps
//! ```
//!
//! The thresholds and window counts are asymmetric so the tier does not
//! oscillate around a single frame rate. The user's quality choice and the
//! effective quality are separate fields: a manual choice always clears the
//! automatic state.

use crate::solver::QualityPreset;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Governor thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Length of one FPS sampling window in milliseconds
    pub sample_window_ms: f32,
    /// Windows below this FPS count toward dropping to Low
    pub low_power_fps: f32,
    /// Consecutive low windows needed to drop to Low
    pub low_power_samples: u32,
    /// Windows above this FPS count toward returning to High
    pub high_power_fps: f32,
    /// Consecutive high windows needed to return to High
    pub high_power_samples: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            sample_window_ms: 900.0,
            low_power_fps: 45.0,
            low_power_samples: 3,
            high_power_fps: 55.0,
            high_power_samples: 4,
        }
    }
}

/// Governor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GovernorState {
    /// Running at the user's chosen quality
    #[default]
    Normal,
    /// Dropped to Low automatically
    AutoLowPower,
}

/// Watches frame rate and picks the effective quality tier
#[derive(Debug, Clone)]
pub struct PerformanceGovernor {
    config: GovernorConfig,
    user_quality: QualityPreset,
    state: GovernorState,
    window_ms: f32,
    window_frames: u32,
    low_streak: u32,
    high_streak: u32,
    last_fps: Option<f32>,
}

impl PerformanceGovernor {
    /// Create a governor in the Normal state
    #[must_use]
    pub fn new(config: GovernorConfig, user_quality: QualityPreset) -> Self {
        Self {
            config,
            user_quality,
            state: GovernorState::Normal,
            window_ms: 0.0,
            window_frames: 0,
            low_streak: 0,
            high_streak: 0,
            last_fps: None,
        }
    }

    /// Record one rendered frame
    ///
    /// Returns the new effective quality when a completed window caused a
    /// transition.
    pub fn record_frame(&mut self, frame_ms: f32) -> Option<QualityPreset> {
        if !frame_ms.is_finite() || frame_ms < 0.0 {
            return None;
        }
        self.window_ms += frame_ms;
        self.window_frames += 1;
        if self.window_ms < self.config.sample_window_ms {
            return None;
        }
        let fps = self.window_frames as f32 * 1000.0 / self.window_ms;
        self.window_ms = 0.0;
        self.window_frames = 0;
        self.record_sample(fps)
    }

    /// Feed one completed window's FPS directly
    ///
    /// Returns the new effective quality on a transition.
    pub fn record_sample(&mut self, fps: f32) -> Option<QualityPreset> {
        if fps.is_nan() {
            return None;
        }
        self.last_fps = Some(fps);
        match self.state {
            GovernorState::Normal => {
                if self.user_quality != QualityPreset::High {
                    return None;
                }
                if fps < self.config.low_power_fps {
                    self.low_streak += 1;
                } else {
                    self.low_streak = 0;
                }
                if self.low_streak >= self.config.low_power_samples {
                    info!(
                        "Frame rate {:.1} fps below {:.0} for {} windows, switching to Low quality",
                        fps, self.config.low_power_fps, self.low_streak
                    );
                    self.state = GovernorState::AutoLowPower;
                    self.reset_counters();
                    return Some(QualityPreset::Low);
                }
            }
            GovernorState::AutoLowPower => {
                if fps > self.config.high_power_fps {
                    self.high_streak += 1;
                } else {
                    self.high_streak = 0;
                }
                if self.high_streak >= self.config.high_power_samples {
                    info!(
                        "Frame rate {:.1} fps above {:.0} for {} windows, restoring {:?} quality",
                        fps, self.config.high_power_fps, self.high_streak, self.user_quality
                    );
                    self.state = GovernorState::Normal;
                    self.reset_counters();
                    return Some(self.user_quality);
                }
            }
        }
        None
    }

    /// Apply a manual quality choice
    ///
    /// Clears the automatic state and both counters. Returns the resulting
    /// effective quality.
    pub fn set_user_quality(&mut self, quality: QualityPreset) -> QualityPreset {
        self.user_quality = quality;
        self.state = GovernorState::Normal;
        self.reset_counters();
        self.window_ms = 0.0;
        self.window_frames = 0;
        self.effective_quality()
    }

    /// Drop to Low without waiting for frame-rate evidence
    ///
    /// Used when High-tier buffers could not be allocated. Has no effect when
    /// the user already chose Low.
    pub fn force_low_power(&mut self) {
        if self.user_quality == QualityPreset::High {
            self.state = GovernorState::AutoLowPower;
            self.reset_counters();
        }
    }

    fn reset_counters(&mut self) {
        self.low_streak = 0;
        self.high_streak = 0;
    }

    /// Quality the simulation should run at right now
    pub fn effective_quality(&self) -> QualityPreset {
        match self.state {
            GovernorState::Normal => self.user_quality,
            GovernorState::AutoLowPower => QualityPreset::Low,
        }
    }

    /// Quality the user asked for
    pub fn user_quality(&self) -> QualityPreset {
        self.user_quality
    }

    /// Current state
    pub fn state(&self) -> GovernorState {
        self.state
    }

    /// Whether the governor has overridden the user's choice
    pub fn is_auto_low_power(&self) -> bool {
        self.state == GovernorState::AutoLowPower
    }

    /// FPS of the most recent completed window
    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }

    /// Thresholds in use
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }
}
