//! Event payloads published by zone workers.

use game_core::{AttackType, CombatantId, CombatantKind, OptionId, OptionItem};
use serde::{Deserialize, Serialize};

use super::bus::Topic;
use crate::api::FeedbackCode;
use crate::map::MapId;

/// Identifies the zone an event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneRef {
    pub map: MapId,
    pub zone: usize,
}

impl std::fmt::Display for ZoneRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.map, self.zone)
    }
}

/// Why a queued attack was dropped at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum DiscardReason {
    AttackerMissing,
    TargetMissing,
    AttackerDead,
    TargetDead,
    UnsupportedAttack,
    /// The behavior panicked; the zone kept running.
    Failed,
}

impl DiscardReason {
    pub fn feedback_code(self) -> FeedbackCode {
        match self {
            Self::AttackerMissing | Self::TargetMissing | Self::AttackerDead | Self::TargetDead => {
                FeedbackCode::StaleAction
            }
            Self::UnsupportedAttack => FeedbackCode::Rejected,
            Self::Failed => FeedbackCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    HealthChanged {
        zone: ZoneRef,
        attacker: CombatantId,
        target: CombatantId,
        attack_type: AttackType,
        amount: u32,
        hp_before: u32,
        hp_after: u32,
    },
    CombatantDied {
        zone: ZoneRef,
        id: CombatantId,
        killer: CombatantId,
    },
    ActionDiscarded {
        zone: ZoneRef,
        attacker: CombatantId,
        target: CombatantId,
        attack_type: AttackType,
        reason: DiscardReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionEvent {
    OptionApplied {
        zone: ZoneRef,
        target: CombatantId,
        option: OptionItem,
    },
    OptionRefreshed {
        zone: ZoneRef,
        target: CombatantId,
        option: OptionItem,
    },
    OptionRejected {
        zone: ZoneRef,
        target: CombatantId,
        id: OptionId,
        code: FeedbackCode,
    },
    OptionExpired {
        zone: ZoneRef,
        target: CombatantId,
        id: OptionId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneEvent {
    CombatantJoined {
        zone: ZoneRef,
        id: CombatantId,
        kind: CombatantKind,
    },
    CombatantLeft {
        zone: ZoneRef,
        id: CombatantId,
    },
    /// The worker exited; `released` combatants were handed back to the map.
    ZoneStopped { zone: ZoneRef, released: usize },
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Combat(CombatEvent),
    Options(OptionEvent),
    Zone(ZoneEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Combat(_) => Topic::Combat,
            Event::Options(_) => Topic::Options,
            Event::Zone(_) => Topic::Zone,
        }
    }
}

impl From<CombatEvent> for Event {
    fn from(event: CombatEvent) -> Self {
        Event::Combat(event)
    }
}

impl From<OptionEvent> for Event {
    fn from(event: OptionEvent) -> Self {
        Event::Options(event)
    }
}

impl From<ZoneEvent> for Event {
    fn from(event: ZoneEvent) -> Self {
        Event::Zone(event)
    }
}
