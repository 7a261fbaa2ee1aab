//! Stable feedback codes returned to the network layer.
//!
//! Clients decide between retrying and ignoring based on these codes rather
//! than on error strings.
use serde::{Deserialize, Serialize};

use super::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum FeedbackCode {
    /// The intent was taken; any outcome follows on the event bus.
    Accepted = 0,
    /// Target zone is at capacity; retry in another zone.
    ZoneFull = 1,
    /// Every zone of the map is at capacity.
    MapFull = 2,
    /// The combatant is already present somewhere on the map.
    AlreadyPlaced = 3,
    /// Attacker or target left or died before the action was resolved.
    StaleAction = 4,
    /// The map is not accepting intents yet, or is not open.
    NotRunning = 5,
    /// The map is shutting down.
    Stopped = 6,
    /// The intent was understood but refused (unknown attack type, option policy).
    Rejected = 7,
    Internal = 8,
}

impl FeedbackCode {
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::ZoneFull => "ZONE_FULL",
            Self::MapFull => "MAP_FULL",
            Self::AlreadyPlaced => "ALREADY_PLACED",
            Self::StaleAction => "STALE_ACTION",
            Self::NotRunning => "NOT_RUNNING",
            Self::Stopped => "STOPPED",
            Self::Rejected => "REJECTED",
            Self::Internal => "INTERNAL",
        }
    }

    /// Code for the outcome of one intent, `Accepted` on success.
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Accepted,
            Err(error) => error.feedback_code(),
        }
    }

    /// True when the client may retry the same intent (possibly elsewhere).
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::ZoneFull | Self::NotRunning)
    }
}
