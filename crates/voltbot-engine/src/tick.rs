//! Fixed-timestep clock.
//!
//! Real frame time is fed into an accumulator and drained in whole physics
//! steps. A single frame's contribution is clamped to
//! [`TickConfig::max_frame_time`], so a stall (debugger pause, window drag)
//! costs at most a bounded burst of catch-up steps instead of a runaway loop.
//!
//! ```
//! use voltbot_engine::config::TickConfig;
//! use voltbot_engine::tick::FixedStep;
//!
//! let mut clock = FixedStep::new(&TickConfig { fixed_dt: 0.1, max_frame_time: 0.25 });
//! assert_eq!(clock.accumulate(0.05), 0);
//! assert_eq!(clock.accumulate(0.06), 1);
//! // a 10 second stall is clamped to 0.25 s worth of steps
//! assert_eq!(clock.accumulate(10.0), 2);
//! ```

use crate::config::TickConfig;

/// Accumulator-driven fixed step with tick and simulation-time counters.
#[derive(Debug, Clone)]
pub struct FixedStep {
    fixed_dt: f32,
    max_frame_time: f32,
    accumulator: f32,
    tick_count: u64,
    sim_time: f64,
}

impl FixedStep {
    /// # Panics
    ///
    /// Panics if `fixed_dt` is not positive and finite. Validate the
    /// configuration with [`GameConfig::validate`](crate::config::GameConfig::validate)
    /// first.
    pub fn new(config: &TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            fixed_dt: config.fixed_dt,
            max_frame_time: config.max_frame_time.max(config.fixed_dt),
            accumulator: 0.0,
            tick_count: 0,
            sim_time: 0.0,
        }
    }

    /// Add a frame's elapsed real time and return how many fixed steps are
    /// now due. The returned steps are consumed from the accumulator.
    pub fn accumulate(&mut self, frame_seconds: f32) -> u32 {
        let frame = if frame_seconds.is_finite() {
            frame_seconds.clamp(0.0, self.max_frame_time)
        } else {
            0.0
        };
        self.accumulator += frame;

        let mut due = 0;
        while self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            due += 1;
        }
        due
    }

    /// Record that one step has been simulated.
    pub fn record_tick(&mut self) {
        self.tick_count += 1;
        self.sim_time += self.fixed_dt as f64;
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulated seconds since the clock was created.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Leftover real time not yet consumed by a step, as a fraction of one
    /// step. Renderers interpolate with it.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.fixed_dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> FixedStep {
        FixedStep::new(&TickConfig::default())
    }

    #[test]
    fn one_step_per_fixed_dt() {
        let mut c = clock();
        let dt = c.fixed_dt();
        let mut total = 0;
        for _ in 0..45 {
            total += c.accumulate(dt);
        }
        assert_eq!(total, 45);
    }

    #[test]
    fn stall_is_clamped() {
        let mut c = clock();
        // 0.25 s at 45 Hz = 11.25 steps
        assert_eq!(c.accumulate(30.0), 11);
        assert!(c.alpha() > 0.0 && c.alpha() < 1.0);
    }

    #[test]
    fn negative_and_nan_frames_are_ignored() {
        let mut c = clock();
        assert_eq!(c.accumulate(-1.0), 0);
        assert_eq!(c.accumulate(f32::NAN), 0);
        assert_eq!(c.alpha(), 0.0);
    }

    #[test]
    fn record_tick_advances_counters() {
        let mut c = clock();
        c.record_tick();
        c.record_tick();
        assert_eq!(c.tick_count(), 2);
        assert!((c.sim_time() - 2.0 / 45.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "fixed_dt must be positive")]
    fn zero_dt_panics() {
        FixedStep::new(&TickConfig {
            fixed_dt: 0.0,
            max_frame_time: 0.25,
        });
    }
}
