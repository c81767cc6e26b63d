//! Tick sources for the simulation loop.
//!
//! The loop never reads wall time directly; it asks a [`Clock`], so tests
//! can drive the simulation with a manual clock and get deterministic
//! results.

use std::time::Instant;

/// Monotonic time source in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall-clock backed tick source.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-advanced clock for headless tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Accumulator that converts variable frame deltas into whole fixed steps.
///
/// Frame deltas are capped at one second so a suspended tab does not replay
/// a huge burst of steps on resume.
#[derive(Debug)]
pub struct FixedTimestep {
    step: f64,
    accumulator: f64,
    last: Option<f64>,
}

impl FixedTimestep {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            accumulator: 0.0,
            last: None,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Feed the current clock reading; returns how many fixed steps to run.
    pub fn advance(&mut self, now: f64) -> u32 {
        let dt = match self.last {
            Some(last) => (now - last).min(1.0).max(0.0),
            None => 0.0,
        };
        self.last = Some(now);
        self.accumulator += dt;

        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }
}
