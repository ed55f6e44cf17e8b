//! Countdown primitives driving reloads, regeneration, spawn cadence and
//! visual feedback

use serde::{Deserialize, Serialize};

/// Timer that completes once `progress` reaches `period`
///
/// Overflow past the period is kept when the timer wraps, so a stream of
/// short frames never loses time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timer {
    pub progress: f32,
    pub period: f32,
}

impl Timer {
    /// Fresh timer with no progress
    pub fn period(period: f32) -> Self {
        Self {
            progress: 0.0,
            period,
        }
    }

    /// Timer that is already done
    pub fn finished(period: f32) -> Self {
        Self {
            progress: period,
            period,
        }
    }

    #[inline]
    pub fn tick(&mut self, delta: f32) {
        self.progress += delta;
    }

    #[inline]
    pub fn done(&self) -> bool {
        self.progress >= self.period
    }

    /// If done, wrap back by one period and return true
    pub fn done_reset(&mut self) -> bool {
        if self.done() {
            self.progress -= self.period;
            true
        } else {
            false
        }
    }

    pub fn tick_done_reset(&mut self, delta: f32) -> bool {
        self.tick(delta);
        self.done_reset()
    }

    /// Complete immediately
    pub fn skip(&mut self) {
        self.progress = self.progress.max(self.period);
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
    }

    /// Progress through the period in 0..=1
    pub fn fraction(&self) -> f32 {
        if self.period <= 0.0 {
            1.0
        } else {
            (self.progress / self.period).clamp(0.0, 1.0)
        }
    }
}

/// Shape of an interpolation curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    /// Slow start
    QuadIn,
    /// Slow finish
    QuadOut,
    /// Slow start and finish
    Smooth,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Eased value running from `start` to `end` over a timer
///
/// Only ever feeds colors and opacity; gameplay never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interpolator {
    pub timer: Timer,
    pub start: f32,
    pub end: f32,
    pub easing: Easing,
}

impl Interpolator {
    /// Interpolator that starts out finished, resting at `end`
    pub fn new(start: f32, end: f32, duration: f32, easing: Easing) -> Self {
        Self {
            timer: Timer::finished(duration),
            start,
            end,
            easing,
        }
    }

    pub fn done(&self) -> bool {
        self.timer.done()
    }

    /// Restart from `start`
    pub fn reset(&mut self) {
        self.timer.reset();
    }

    /// Current value without advancing
    pub fn value(&self) -> f32 {
        if self.done() {
            return self.end;
        }
        let t = self.easing.apply(self.timer.fraction());
        self.start + (self.end - self.start) * t
    }

    /// Advance by `delta` and return the new value
    pub fn update(&mut self, delta: f32) -> f32 {
        self.timer.tick(delta);
        self.value()
    }
}
