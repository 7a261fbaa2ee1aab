//! Unified error types surfaced by the runtime API.
//!
//! Configuration and capacity failures are returned to the map/session layer
//! as explicit results. Nothing in here crosses a zone worker boundary as a
//! panic; workers log their own failures and keep ticking.
use game_core::{Combatant, CombatantId, ErrorSeverity, GameError, LayoutError, OptionError};
use thiserror::Error;
use tokio::sync::oneshot;

use super::feedback::FeedbackCode;
use crate::map::{MapId, MapPhase};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("map {map_id} has no tile layout")]
    MissingTileLayout { map_id: MapId },

    #[error("map {map_id} has an invalid tile layout")]
    InvalidTileLayout {
        map_id: MapId,
        #[source]
        source: LayoutError,
    },

    #[error("map {map_id} zones are already populated")]
    AlreadyPopulated { map_id: MapId },

    #[error("map {map_id} is {phase}, expected {expected}")]
    InvalidPhase {
        map_id: MapId,
        phase: MapPhase,
        expected: MapPhase,
    },

    #[error("map {map_id} is already open")]
    DuplicateMap { map_id: MapId },

    #[error("map {map_id} is not open")]
    UnknownMap { map_id: MapId },

    #[error("map {map_id} is not running")]
    MapNotRunning { map_id: MapId },

    #[error("map {map_id} is stopping")]
    MapStopped { map_id: MapId },

    #[error("every zone of map {map_id} is full")]
    MapFull { map_id: MapId },

    #[error("zone {zone} is full ({max_players} players)")]
    ZoneFull { zone: usize, max_players: usize },

    #[error("combatant {id} is already placed in zone {zone}")]
    AlreadyPlaced { id: CombatantId, zone: usize },

    #[error("combatant {id} is not in this zone")]
    UnknownCombatant { id: CombatantId },

    #[error("zone {zone} is not running")]
    NotRunning { zone: usize },

    #[error("zone {zone} is stopping")]
    Stopped { zone: usize },

    #[error("zone {zone} worker command channel closed")]
    CommandChannelClosed { zone: usize },

    #[error("zone worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error(transparent)]
    Option(#[from] OptionError),
}

impl RuntimeError {
    /// Client-facing code for this failure.
    pub fn feedback_code(&self) -> FeedbackCode {
        match self {
            Self::MissingTileLayout { .. }
            | Self::InvalidTileLayout { .. }
            | Self::AlreadyPopulated { .. }
            | Self::InvalidPhase { .. }
            | Self::DuplicateMap { .. } => FeedbackCode::Internal,
            Self::UnknownMap { .. }
            | Self::MapNotRunning { .. }
            | Self::NotRunning { .. } => FeedbackCode::NotRunning,
            Self::MapStopped { .. } | Self::Stopped { .. } => FeedbackCode::Stopped,
            Self::MapFull { .. } => FeedbackCode::MapFull,
            Self::ZoneFull { .. } => FeedbackCode::ZoneFull,
            Self::AlreadyPlaced { .. } => FeedbackCode::AlreadyPlaced,
            Self::UnknownCombatant { .. } => FeedbackCode::StaleAction,
            Self::Option(_) => FeedbackCode::Rejected,
            Self::CommandChannelClosed { .. }
            | Self::ReplyChannelClosed(_) => FeedbackCode::Internal,
        }
    }
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingTileLayout { .. }
            | Self::InvalidTileLayout { .. }
            | Self::AlreadyPopulated { .. }
            | Self::InvalidPhase { .. }
            | Self::DuplicateMap { .. } => ErrorSeverity::Fatal,
            Self::MapFull { .. } | Self::ZoneFull { .. } => ErrorSeverity::Recoverable,
            Self::UnknownMap { .. }
            | Self::MapNotRunning { .. }
            | Self::MapStopped { .. }
            | Self::NotRunning { .. }
            | Self::Stopped { .. }
            | Self::UnknownCombatant { .. }
            | Self::AlreadyPlaced { .. } => ErrorSeverity::Validation,
            Self::Option(error) => error.severity(),
            Self::CommandChannelClosed { .. }
            | Self::ReplyChannelClosed(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingTileLayout { .. } => "MAP_MISSING_TILE_LAYOUT",
            Self::InvalidTileLayout { .. } => "MAP_INVALID_TILE_LAYOUT",
            Self::AlreadyPopulated { .. } => "MAP_ALREADY_POPULATED",
            Self::InvalidPhase { .. } => "MAP_INVALID_PHASE",
            Self::DuplicateMap { .. } => "MAP_DUPLICATE",
            Self::UnknownMap { .. } => "MAP_UNKNOWN",
            Self::Option(error) => error.error_code(),
            other => other.feedback_code().as_str(),
        }
    }
}

/// A join that did not happen.
///
/// The combatant is handed back so the caller can retry against another zone.
/// It is `None` only when the zone worker died while holding it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct JoinRejected {
    pub combatant: Option<Box<dyn Combatant>>,
    #[source]
    pub error: RuntimeError,
}

impl JoinRejected {
    pub(crate) fn new(combatant: Box<dyn Combatant>, error: RuntimeError) -> Self {
        Self {
            combatant: Some(combatant),
            error,
        }
    }

    pub fn feedback_code(&self) -> FeedbackCode {
        self.error.feedback_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_errors_are_recoverable() {
        let error = RuntimeError::ZoneFull {
            zone: 0,
            max_players: 2,
        };
        assert!(error.severity().is_recoverable());
        assert_eq!(error.feedback_code(), FeedbackCode::ZoneFull);
    }

    #[test]
    fn configuration_errors_are_fatal() {
        let error = RuntimeError::MissingTileLayout { map_id: MapId(7) };
        assert_eq!(error.severity(), ErrorSeverity::Fatal);
        assert_eq!(error.error_code(), "MAP_MISSING_TILE_LAYOUT");
        assert_eq!(error.to_string(), "map 7 has no tile layout");
    }

    #[test]
    fn stale_lookups_map_to_stale_action() {
        let error = RuntimeError::UnknownCombatant { id: CombatantId(3) };
        assert_eq!(error.feedback_code(), FeedbackCode::StaleAction);
    }

    #[test]
    fn map_phase_rejections_are_client_facing() {
        let stopped = RuntimeError::MapStopped { map_id: MapId(1) };
        assert_eq!(stopped.feedback_code(), FeedbackCode::Stopped);
        assert!(!stopped.severity().is_internal());

        let idle = RuntimeError::MapNotRunning { map_id: MapId(1) };
        assert_eq!(idle.feedback_code(), FeedbackCode::NotRunning);
        assert!(idle.feedback_code().is_retryable());
    }
}
