use std::time::Duration;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::models::{Side, TimerState};
use crate::timer::{Clock, ClockTick, GraceClock, TimeSource};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerEventKind {
    Tick,
    TurnExpired,
    GraceStarted,
    GraceExpired,
}

/// Emitted by a [`TimerController`]. Every event carries the acting player
/// and a full snapshot, so subscribers never have to query back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub kind: TimerEventKind,
    pub player: Side,
    pub state: TimerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running(Side),
    GracePeriod(Side),
}

/// Turn clocks for one game: one [`Clock`] per colour plus the shared
/// [`GraceClock`]. At most one of the three runs at any time.
///
/// Events go out on the channel handed in at construction. The controller
/// only reports expiry; deciding between an auto-move and a time loss is the
/// caller's job.
pub struct TimerController<T: TimeSource> {
    time: T,
    white: Clock<T>,
    black: Clock<T>,
    grace: GraceClock<T>,
    grace_enabled: bool,
    active_player: Option<Side>,
    finished: bool,
    events: UnboundedSender<TimerEvent>,
}

impl<T: TimeSource> TimerController<T> {
    pub fn new(
        turn_time: Duration,
        grace_period: Duration,
        time: T,
        events: UnboundedSender<TimerEvent>,
    ) -> Self {
        Self {
            white: Clock::new(turn_time, time.clone()),
            black: Clock::new(turn_time, time.clone()),
            grace: GraceClock::new(grace_period, time.clone()),
            grace_enabled: !grace_period.is_zero(),
            active_player: None,
            finished: false,
            events,
            time,
        }
    }

    /// `Idle -> Running(white)`.
    pub fn start_game(&mut self) {
        if self.finished || self.active_player.is_some() {
            debug!("start_game ignored: controller already used");
            return;
        }
        self.white.reset();
        self.black.reset();
        self.grace.reset();
        self.active_player = Some(Side::White);
        self.white.start();
        debug!("timer started for white");
    }

    /// The only turn switch. Also closes a grace window the mover was in.
    pub fn on_move_made(&mut self) {
        let Some(mover) = self.active_player else {
            debug!("on_move_made ignored: no active player");
            return;
        };
        self.clock_mut(mover).stop();
        self.grace.stop();

        let next = mover.opposite();
        self.active_player = Some(next);
        let clock = self.clock_mut(next);
        clock.reset();
        clock.start();
        debug!("turn passed from {} to {}", mover, next);
    }

    /// Terminal: stops every clock. The controller is not reused afterwards.
    pub fn stop_all(&mut self) {
        self.white.stop();
        self.black.stop();
        self.grace.stop();
        self.active_player = None;
        self.finished = true;
        debug!("all timers stopped");
    }

    /// Advances whichever clock is running and emits the resulting events.
    pub fn poll(&mut self) {
        let Some(player) = self.active_player else {
            return;
        };

        if self.grace.is_active() {
            match self.grace.tick() {
                ClockTick::Running { remaining_ms } => {
                    trace!("grace tick for {}: {}ms", player, remaining_ms);
                    self.emit(TimerEventKind::Tick, player);
                }
                ClockTick::Expired { .. } => self.emit(TimerEventKind::GraceExpired, player),
                ClockTick::Idle => {}
            }
            return;
        }

        match self.clock_mut(player).tick() {
            ClockTick::Running { remaining_ms } => {
                trace!("tick for {}: {}ms", player, remaining_ms);
                self.emit(TimerEventKind::Tick, player);
            }
            ClockTick::Expired { overrun } => self.handle_turn_expired(player, overrun),
            ClockTick::Idle => {}
        }
    }

    /// Reinstates a saved snapshot: both remaining times and, when a player
    /// was on move, resumes that player's clock without resetting it.
    pub fn restore(&mut self, state: &TimerState) {
        if self.finished {
            return;
        }
        self.white.stop();
        self.black.stop();
        self.grace.reset();
        self.white.set_remaining_ms(state.white_remaining_ms);
        self.black.set_remaining_ms(state.black_remaining_ms);
        self.active_player = state.active_player;
        if let Some(player) = state.active_player {
            self.clock_mut(player).start();
        }
    }

    pub fn timer_state(&self) -> TimerState {
        let Some(active) = self.active_player else {
            return TimerState::idle(self.time.epoch_ms());
        };
        TimerState {
            white_remaining_ms: self.white.remaining_ms(),
            black_remaining_ms: self.black.remaining_ms(),
            active_player: Some(active),
            is_grace_period: self.grace.is_active(),
            grace_remaining_ms: self.grace.remaining_ms(),
            sync_timestamp: self.time.epoch_ms(),
        }
    }

    pub fn phase(&self) -> TimerPhase {
        match self.active_player {
            None => TimerPhase::Idle,
            Some(p) if self.grace.is_active() => TimerPhase::GracePeriod(p),
            Some(p) => TimerPhase::Running(p),
        }
    }

    pub fn active_player(&self) -> Option<Side> {
        self.active_player
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn clock(&self, side: Side) -> &Clock<T> {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    pub fn grace_clock(&self) -> &GraceClock<T> {
        &self.grace
    }

    fn clock_mut(&mut self, side: Side) -> &mut Clock<T> {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }

    // `overrun` is how long ago the turn clock actually reached zero.
    fn handle_turn_expired(&mut self, player: Side, overrun: Duration) {
        debug!(
            "turn expired for {} ({}ms before this poll)",
            player,
            overrun.as_millis()
        );
        self.emit(TimerEventKind::TurnExpired, player);
        if self.grace_enabled {
            self.grace.start(overrun);
            self.emit(TimerEventKind::GraceStarted, player);
            // The whole window already elapsed before this poll.
            if let ClockTick::Expired { .. } = self.grace.tick() {
                self.emit(TimerEventKind::GraceExpired, player);
            }
        } else {
            // Zero-length grace: straight to the consequence, never observable
            // as an open grace window.
            self.emit(TimerEventKind::GraceExpired, player);
        }
    }

    fn emit(&self, kind: TimerEventKind, player: Side) {
        let event = TimerEvent {
            kind,
            player,
            state: self.timer_state(),
        };
        if self.events.send(event).is_err() {
            trace!("timer event {:?} dropped: no subscriber", kind);
        }
    }
}
