use crate::config::PhysicsConfig;
use crate::ports::FrameDriver;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tracing::warn;

/// Turns frame timestamps into clamped deltas.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: f64,
    max_delta: f64,
}

impl FrameClock {
    /// A non-positive or NaN `max_delta` falls back to the default cap.
    pub fn new(max_delta: f64) -> Self {
        let max_delta = if max_delta > 0.0 {
            max_delta
        } else {
            let fallback = PhysicsConfig::default().max_frame_delta;
            warn!(max_delta, fallback, "invalid max frame delta");
            fallback
        };
        Self {
            last: 0.0,
            max_delta,
        }
    }

    /// Seconds since the previous timestamp, clamped to `[0, max_delta]` so a
    /// stalled host never produces one huge physics step.
    pub fn delta(&mut self, now: f64) -> f64 {
        let dt = (now - self.last).clamp(0.0, self.max_delta);
        self.last = now;
        dt
    }
}

/// Deterministic driver advancing a virtual clock by a fixed step.
#[derive(Debug, Clone)]
pub struct FixedStep {
    now: f64,
    step: f64,
    remaining: Option<u64>,
}

impl FixedStep {
    /// Runs forever.
    pub fn new(step: f64) -> Self {
        Self {
            now: 0.0,
            step,
            remaining: None,
        }
    }

    pub fn frames(step: f64, count: u64) -> Self {
        Self {
            now: 0.0,
            step,
            remaining: Some(count),
        }
    }
}

impl FrameDriver for FixedStep {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(n) = self.remaining.as_mut() {
            if *n == 0 {
                return None;
            }
            *n -= 1;
        }
        self.now += self.step;
        Some(self.now)
    }
}

/// Wall-clock driver sleeping out the rest of each frame.
#[derive(Debug)]
pub struct Paced {
    start: Instant,
    frame_dur: Duration,
    frame_start: Option<Instant>,
}

impl Paced {
    pub fn new(fps: u32) -> Self {
        Self {
            start: Instant::now(),
            frame_dur: Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
            frame_start: None,
        }
    }
}

impl FrameDriver for Paced {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(prev) = self.frame_start {
            let elapsed = prev.elapsed();
            if elapsed < self.frame_dur {
                std::thread::sleep(self.frame_dur - elapsed);
            }
        }
        let now = Instant::now();
        self.frame_start = Some(now);
        Some(now.duration_since(self.start).as_secs_f64())
    }
}

/// Pumps `driver` into `on_frame` until either side stops.
pub fn run<D, F, B>(driver: &mut D, mut on_frame: F) -> Option<B>
where
    D: FrameDriver + ?Sized,
    F: FnMut(f64) -> ControlFlow<B>,
{
    while let Some(now) = driver.next_frame() {
        if let ControlFlow::Break(b) = on_frame(now) {
            return Some(b);
        }
    }
    None
}
