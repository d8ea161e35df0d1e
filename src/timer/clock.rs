use std::time::{Duration, Instant};

use log::trace;

use crate::timer::TimeSource;

/// Cadence at which running clocks are ticked.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// What a single tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// The clock is stopped; nothing happened.
    Idle,
    /// Still counting down.
    Running { remaining_ms: u64 },
    /// Reached zero on this tick. Reported once; the clock is now stopped.
    /// `overrun` is how long ago zero was actually reached.
    Expired { overrun: Duration },
}

/// A single countdown.
///
/// Remaining time is settled from the elapsed wall time since the last
/// settlement, so a late or skipped tick never makes the clock run fast or
/// slow. Ticks only notify.
#[derive(Debug)]
pub struct Clock<T: TimeSource> {
    time: T,
    duration: Duration,
    remaining: Duration,
    running: bool,
    last_tick_at: Instant,
}

impl<T: TimeSource> Clock<T> {
    pub fn new(duration: Duration, time: T) -> Self {
        let last_tick_at = time.now();
        Self {
            time,
            duration,
            remaining: duration,
            running: false,
            last_tick_at,
        }
    }

    /// Begins counting down from the current remaining time.
    /// Returns `false` without side effects if already running.
    pub fn start(&mut self) -> bool {
        self.start_late(Duration::ZERO)
    }

    /// Like [`Clock::start`], but counts as if started `late` ago.
    pub fn start_late(&mut self, late: Duration) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.remaining = self.remaining.saturating_sub(late);
        self.last_tick_at = self.time.now();
        true
    }

    pub fn tick(&mut self) -> ClockTick {
        if !self.running {
            return ClockTick::Idle;
        }
        let overrun = self.settle();
        if self.remaining.is_zero() {
            self.running = false;
            trace!("clock expired {}ms ago", overrun.as_millis());
            return ClockTick::Expired { overrun };
        }
        ClockTick::Running {
            remaining_ms: self.remaining_ms(),
        }
    }

    /// Halts the countdown and returns the settled remaining time.
    pub fn stop(&mut self) -> u64 {
        if self.running {
            self.settle();
            self.running = false;
        }
        as_ms(self.remaining)
    }

    pub fn reset(&mut self) {
        self.stop();
        self.remaining = self.duration;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
        self.reset();
    }

    pub fn duration_ms(&self) -> u64 {
        as_ms(self.duration)
    }

    /// Remaining time accurate to the current instant, independent of tick cadence.
    pub fn remaining_ms(&self) -> u64 {
        if self.running {
            let elapsed = self.time.now().saturating_duration_since(self.last_tick_at);
            as_ms(self.remaining.saturating_sub(elapsed))
        } else {
            as_ms(self.remaining)
        }
    }

    /// Force the remaining time, clamped to the configured duration.
    pub fn set_remaining_ms(&mut self, ms: u64) {
        self.remaining = Duration::from_millis(ms).min(self.duration);
        self.last_tick_at = self.time.now();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ms() == 0
    }

    // Returns the elapsed time that did not fit in what was left.
    fn settle(&mut self) -> Duration {
        let now = self.time.now();
        let elapsed = now.saturating_duration_since(self.last_tick_at);
        let overrun = elapsed.saturating_sub(self.remaining);
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.last_tick_at = now;
        overrun
    }
}

// Rounds up so a clock only reads 0 once it has truly run out.
fn as_ms(duration: Duration) -> u64 {
    let ms = duration.as_millis() as u64;
    if duration > Duration::from_millis(ms) {
        ms + 1
    } else {
        ms
    }
}
