use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::SettingsError;
use crate::models::Side;

pub const TURN_TIME_SECONDS: RangeInclusive<u32> = 10..=300;
pub const GRACE_PERIOD_SECONDS: RangeInclusive<u32> = 0..=5;

/// What happens once the grace window runs out.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutBehavior {
    #[default]
    AutoMove,
    LoseOnTime,
}

/// Timing rules chosen by the host at game creation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    pub turn_time_seconds: u32,
    pub grace_period_seconds: u32,
    pub timeout_behavior: TimeoutBehavior,
    pub host_color: Side,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            turn_time_seconds: 60,
            grace_period_seconds: 2,
            timeout_behavior: TimeoutBehavior::AutoMove,
            host_color: Side::White,
        }
    }
}

impl GameSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !TURN_TIME_SECONDS.contains(&self.turn_time_seconds) {
            return Err(SettingsError::TurnTimeOutOfRange {
                value: self.turn_time_seconds,
                min: *TURN_TIME_SECONDS.start(),
                max: *TURN_TIME_SECONDS.end(),
            });
        }
        if !GRACE_PERIOD_SECONDS.contains(&self.grace_period_seconds) {
            return Err(SettingsError::GracePeriodOutOfRange {
                value: self.grace_period_seconds,
                min: *GRACE_PERIOD_SECONDS.start(),
                max: *GRACE_PERIOD_SECONDS.end(),
            });
        }
        Ok(())
    }

    pub fn turn_time(&self) -> Duration {
        Duration::from_secs(u64::from(self.turn_time_seconds))
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(u64::from(self.grace_period_seconds))
    }
}

/// Client-supplied overrides; anything omitted falls back to the defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub turn_time_seconds: Option<u32>,
    pub grace_period_seconds: Option<u32>,
    pub timeout_behavior: Option<TimeoutBehavior>,
    pub host_color: Option<Side>,
}

impl SettingsPatch {
    pub fn resolve(self) -> Result<GameSettings, SettingsError> {
        let defaults = GameSettings::default();
        let settings = GameSettings {
            turn_time_seconds: self.turn_time_seconds.unwrap_or(defaults.turn_time_seconds),
            grace_period_seconds: self
                .grace_period_seconds
                .unwrap_or(defaults.grace_period_seconds),
            timeout_behavior: self.timeout_behavior.unwrap_or(defaults.timeout_behavior),
            host_color: self.host_color.unwrap_or(defaults.host_color),
        };
        settings.validate()?;
        Ok(settings)
    }
}
