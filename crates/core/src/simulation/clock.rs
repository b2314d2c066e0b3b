//! Fixed-timestep accumulator
//!
//! Wall-clock frame time is poured into an accumulator and drained in whole
//! `step` slices. Physics therefore advances the same number of steps for the
//! same total elapsed time however it is split into frames; the remainder
//! carries over to the next frame.

/// Default fixed step (60 Hz)
pub const DEFAULT_SIM_STEP: f32 = 1.0 / 60.0;

/// Absorbs f32 rounding of the step, so 15 steps of 1/60 s fit in 0.25 s
const ROUNDING_SLACK: f64 = 1e-7;

/// Accumulator-based fixed-step clock
///
/// The accumulator is kept in `f64` so that many tiny frame deltas sum to the
/// same step count as one large delta.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStepClock {
    step: f64,
    max_frame_delta: Option<f64>,
    accumulator: f64,
    total_steps: u64,
}

impl FixedStepClock {
    /// Create a clock with the given step and optional per-frame elapsed clamp
    ///
    /// A non-positive or non-finite step falls back to [`DEFAULT_SIM_STEP`].
    #[must_use]
    pub fn new(step: f32, max_frame_delta: Option<f32>) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            DEFAULT_SIM_STEP
        };
        Self {
            step: f64::from(step),
            max_frame_delta: max_frame_delta
                .filter(|max| max.is_finite() && *max > 0.0)
                .map(f64::from),
            accumulator: 0.0,
            total_steps: 0,
        }
    }

    /// Feed one frame's elapsed wall time and return how many fixed steps to run
    ///
    /// Negative or non-finite elapsed time counts as zero. Elapsed time above
    /// the configured maximum is clamped so a long pause cannot trigger a huge
    /// catch-up burst.
    pub fn advance(&mut self, elapsed_seconds: f32) -> u32 {
        let mut elapsed = if elapsed_seconds.is_finite() {
            f64::from(elapsed_seconds).max(0.0)
        } else {
            0.0
        };
        if let Some(max) = self.max_frame_delta {
            elapsed = elapsed.min(max);
        }
        self.accumulator += elapsed;

        let mut steps = 0;
        while self.accumulator + ROUNDING_SLACK >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        self.accumulator = self.accumulator.max(0.0);
        self.total_steps += u64::from(steps);
        steps
    }

    /// Fixed step length in seconds
    pub fn step_seconds(&self) -> f32 {
        self.step as f32
    }

    /// Unconsumed time carried to the next frame
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Steps issued since creation or the last reset
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Drop any carried-over time and the step counter
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.total_steps = 0;
    }
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(DEFAULT_SIM_STEP, Some(0.25))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remainder_carries_over() {
        let mut clock = FixedStepClock::new(0.125, None);
        assert_eq!(clock.advance(0.3), 2);
        assert!((clock.accumulator() - 0.05).abs() < 1e-6);
        assert_eq!(clock.advance(0.1), 1);
        assert_eq!(clock.total_steps(), 3);
    }

    #[test]
    fn test_zero_one_or_many_steps() {
        let mut clock = FixedStepClock::new(DEFAULT_SIM_STEP, None);
        assert_eq!(clock.advance(0.001), 0);
        assert_eq!(clock.advance(0.016), 1);
        assert_eq!(clock.advance(0.1), 6);
    }

    #[test]
    fn test_split_frames_match_single_frame() {
        let mut split = FixedStepClock::new(DEFAULT_SIM_STEP, None);
        let mut whole = FixedStepClock::new(DEFAULT_SIM_STEP, None);

        let split_steps: u32 = (0..41).map(|_| split.advance(0.005)).sum();
        let whole_steps = whole.advance(0.205);
        assert_eq!(split_steps, 12);
        assert_eq!(whole_steps, 12);
    }

    #[test]
    fn test_elapsed_clamp() {
        let mut clock = FixedStepClock::new(DEFAULT_SIM_STEP, Some(0.06));
        assert_eq!(clock.advance(10.0), 3);

        let mut quarter = FixedStepClock::new(DEFAULT_SIM_STEP, Some(0.25));
        assert_eq!(quarter.advance(30.0), 15);

        let mut unclamped = FixedStepClock::new(DEFAULT_SIM_STEP, None);
        assert_eq!(unclamped.advance(1.01), 60);
    }

    #[test]
    fn test_bad_input_ignored() {
        let mut clock = FixedStepClock::new(-1.0, Some(f32::NAN));
        assert!((clock.step_seconds() - DEFAULT_SIM_STEP).abs() < 1e-9);
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.advance(-3.0), 0);
        assert_eq!(clock.accumulator(), 0.0);
    }
}
