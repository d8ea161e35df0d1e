//! Turn clocks, the grace window, and the per-game timer state machine.

pub mod clock;
pub mod controller;
pub mod grace;
pub mod time_source;

pub use clock::{Clock, ClockTick, TICK_INTERVAL};
pub use controller::{TimerController, TimerEvent, TimerEventKind, TimerPhase};
pub use grace::GraceClock;
pub use time_source::{FakeTime, TimeSource, WallTime};
