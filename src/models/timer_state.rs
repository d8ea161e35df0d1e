use serde::{Deserialize, Serialize};

use crate::models::Side;

/// Point-in-time view of both turn clocks and the grace window.
///
/// This is the timer snapshot clients render from. `server_time` is the
/// authoritative epoch-ms stamp used for drift correction on the client side.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    #[serde(rename = "whiteTimeRemaining")]
    pub white_remaining_ms: u64,
    #[serde(rename = "blackTimeRemaining")]
    pub black_remaining_ms: u64,
    pub active_player: Option<Side>,
    pub is_grace_period: bool,
    #[serde(rename = "graceTimeRemaining")]
    pub grace_remaining_ms: u64,
    #[serde(rename = "serverTime")]
    pub sync_timestamp: u64,
}

impl TimerState {
    /// Snapshot of a controller with no running game.
    pub fn idle(sync_timestamp: u64) -> Self {
        Self {
            white_remaining_ms: 0,
            black_remaining_ms: 0,
            active_player: None,
            is_grace_period: false,
            grace_remaining_ms: 0,
            sync_timestamp,
        }
    }
}
