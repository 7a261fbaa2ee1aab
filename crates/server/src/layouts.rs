//! Map layout catalog loaded from JSON.
//!
//! The file holds a list of `{ "id", "zone_count", "max_players" }` entries.
//! Unknown fields are ignored so the same file can carry tile data for other
//! consumers.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use game_core::{TileLayout, TileLayoutSource};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct MapDefinition {
    id: u32,
    zone_count: usize,
    max_players: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutCatalog {
    layouts: BTreeMap<u32, TileLayout>,
}

impl LayoutCatalog {
    /// One map (id 1) split into four zones of eight players.
    pub fn fallback() -> Self {
        let mut layouts = BTreeMap::new();
        if let Ok(layout) = TileLayout::new(4, 8) {
            layouts.insert(1, layout);
        }
        Self { layouts }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read map layouts from {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid map layouts in {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let definitions: Vec<MapDefinition> = serde_json::from_str(raw)?;

        let mut layouts = BTreeMap::new();
        for definition in definitions {
            let layout = TileLayout::new(definition.zone_count, definition.max_players)
                .with_context(|| format!("map {}", definition.id))?;
            if layouts.insert(definition.id, layout).is_some() {
                bail!("map {} is declared twice", definition.id);
            }
        }
        Ok(Self { layouts })
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.layouts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl TileLayoutSource for LayoutCatalog {
    fn tile_layout(&self, map_id: u32) -> Option<TileLayout> {
        self.layouts.get(&map_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layout_list() {
        let catalog = LayoutCatalog::from_json(
            r#"[
                {"id": 3, "zone_count": 3, "max_players": 2, "tileset": "cave"},
                {"id": 1, "zone_count": 1, "max_players": 16}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(catalog.tile_layout(3), Some(TileLayout::new(3, 2).unwrap()));
        assert_eq!(catalog.tile_layout(2), None);
    }

    #[test]
    fn rejects_invalid_entries() {
        assert!(LayoutCatalog::from_json(r#"[{"id": 1, "zone_count": 0, "max_players": 2}]"#).is_err());
        assert!(
            LayoutCatalog::from_json(
                r#"[{"id": 1, "zone_count": 1, "max_players": 2}, {"id": 1, "zone_count": 2, "max_players": 2}]"#
            )
            .is_err()
        );
        assert!(LayoutCatalog::from_json("{}").is_err());
    }

    #[test]
    fn fallback_has_one_map() {
        let catalog = LayoutCatalog::fallback();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.tile_layout(1).map(|layout| layout.zone_count()), Some(4));
    }
}
