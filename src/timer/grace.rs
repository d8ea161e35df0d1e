use std::time::Duration;

use crate::timer::{Clock, ClockTick, TimeSource};

/// The post-expiry grace window.
///
/// Wraps a [`Clock`] and adds an `active` flag: a configured but idle grace
/// window and one that is counting down are different states.
#[derive(Debug)]
pub struct GraceClock<T: TimeSource> {
    clock: Clock<T>,
    active: bool,
}

impl<T: TimeSource> GraceClock<T> {
    pub fn new(duration: Duration, time: T) -> Self {
        Self {
            clock: Clock::new(duration, time),
            active: false,
        }
    }

    /// Opens a fresh grace window anchored `since` ago, i.e. at the instant
    /// the turn clock actually hit zero.
    pub fn start(&mut self, since: Duration) {
        self.active = true;
        self.clock.reset();
        self.clock.start_late(since);
    }

    pub fn tick(&mut self) -> ClockTick {
        if !self.active {
            return ClockTick::Idle;
        }
        let tick = self.clock.tick();
        if matches!(tick, ClockTick::Expired { .. }) {
            self.active = false;
        }
        tick
    }

    pub fn stop(&mut self) -> u64 {
        self.active = false;
        self.clock.stop()
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.clock.reset();
    }

    /// Zero whenever no grace window is open.
    pub fn remaining_ms(&self) -> u64 {
        if self.active {
            self.clock.remaining_ms()
        } else {
            0
        }
    }

    pub fn is_active(&self) -> bool {
        self.active && self.clock.is_running()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::FakeTime;

    fn grace(ms: u64) -> (GraceClock<FakeTime>, FakeTime) {
        let time = FakeTime::new();
        (GraceClock::new(Duration::from_millis(ms), time.clone()), time)
    }

    #[test]
    fn idle_until_started() {
        let (mut grace, time) = grace(2_000);
        assert!(!grace.is_active());
        assert_eq!(grace.remaining_ms(), 0);
        time.advance_ms(5_000);
        assert_eq!(grace.tick(), ClockTick::Idle);
    }

    #[test]
    fn start_always_opens_a_full_window() {
        let (mut grace, time) = grace(2_000);
        grace.start(Duration::ZERO);
        time.advance_ms(1_500);
        assert_eq!(grace.remaining_ms(), 500);
        grace.stop();
        grace.start(Duration::ZERO);
        assert_eq!(grace.remaining_ms(), 2_000);
        assert!(grace.is_active());
    }

    #[test]
    fn expiry_deactivates() {
        let (mut grace, time) = grace(2_000);
        grace.start(Duration::ZERO);
        time.advance_ms(1_900);
        assert_eq!(grace.tick(), ClockTick::Running { remaining_ms: 100 });
        time.advance_ms(100);
        assert_eq!(grace.tick(), ClockTick::Expired { overrun: Duration::ZERO });
        assert!(!grace.is_active());
        assert_eq!(grace.remaining_ms(), 0);
        assert_eq!(grace.tick(), ClockTick::Idle);
    }

    #[test]
    fn window_is_anchored_in_the_past() {
        let (mut grace, time) = grace(2_000);
        grace.start(Duration::from_millis(800));
        assert_eq!(grace.remaining_ms(), 1_200);
        time.advance_ms(1_200);
        assert!(matches!(grace.tick(), ClockTick::Expired { .. }));
        assert!(!grace.is_active());
    }

    #[test]
    fn stop_cancels_pending_expiry() {
        let (mut grace, time) = grace(1_000);
        grace.start(Duration::ZERO);
        time.advance_ms(600);
        grace.stop();
        time.advance_ms(1_000);
        assert_eq!(grace.tick(), ClockTick::Idle);
        assert!(!grace.is_running());
    }

    #[test]
    fn reset_closes_the_window() {
        let (mut grace, _) = grace(1_000);
        grace.start(Duration::ZERO);
        grace.reset();
        assert!(!grace.is_active());
        assert!(!grace.is_running());
    }
}
