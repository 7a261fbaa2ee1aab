//! Tile layout metadata consumed by the map lifecycle.
//!
//! The tile-map format itself is parsed by an external loader; the session
//! core only needs the number of zones a map is split into and how many
//! combatants each zone can hold.

use crate::error::{ErrorSeverity, GameError};

/// Immutable zone metadata for one map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawTileLayout"))]
pub struct TileLayout {
    zone_count: usize,
    max_players: usize,
}

impl TileLayout {
    /// Creates a layout, rejecting zero zones or zero capacity.
    pub fn new(zone_count: usize, max_players: usize) -> Result<Self, LayoutError> {
        if zone_count == 0 {
            return Err(LayoutError::NoZones);
        }
        if max_players == 0 {
            return Err(LayoutError::NoCapacity);
        }
        Ok(Self {
            zone_count,
            max_players,
        })
    }

    /// Number of zones the map is subdivided into.
    pub const fn zone_count(&self) -> usize {
        self.zone_count
    }

    /// Maximum combatants per zone.
    pub const fn max_players(&self) -> usize {
        self.max_players
    }

    /// Returns a copy with a different zone count (used by test overrides).
    pub fn with_zone_count(self, zone_count: usize) -> Result<Self, LayoutError> {
        Self::new(zone_count, self.max_players)
    }

    /// Total combatant capacity across every zone.
    pub const fn total_capacity(&self) -> usize {
        self.zone_count * self.max_players
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawTileLayout {
    zone_count: usize,
    max_players: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTileLayout> for TileLayout {
    type Error = LayoutError;

    fn try_from(raw: RawTileLayout) -> Result<Self, Self::Error> {
        Self::new(raw.zone_count, raw.max_players)
    }
}

/// External map-definition loader.
///
/// Returns `None` when the map has no tile layout; the map lifecycle treats
/// that as a fatal configuration error.
pub trait TileLayoutSource {
    fn tile_layout(&self, map_id: u32) -> Option<TileLayout>;
}

impl TileLayoutSource for TileLayout {
    fn tile_layout(&self, _map_id: u32) -> Option<TileLayout> {
        Some(*self)
    }
}

impl<F> TileLayoutSource for F
where
    F: Fn(u32) -> Option<TileLayout>,
{
    fn tile_layout(&self, map_id: u32) -> Option<TileLayout> {
        self(map_id)
    }
}

/// Invalid tile layout metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("tile layout declares zero zones")]
    NoZones,

    #[error("tile layout declares zero players per zone")]
    NoCapacity,
}

impl GameError for LayoutError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoZones => "LAYOUT_NO_ZONES",
            Self::NoCapacity => "LAYOUT_NO_CAPACITY",
        }
    }
}
