//! Server-wide registry of open maps.

use std::collections::BTreeMap;
use std::sync::Arc;

use game_core::{AttackRegistry, Combatant, TileLayoutSource};
use tracing::info;

use super::{Map, MapId};
use crate::api::{Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::events::EventBus;

/// Owns every open [`Map`] and keeps map ids unique.
///
/// All maps publish into one shared [`EventBus`] and resolve attacks with one
/// shared [`AttackRegistry`].
#[derive(Debug)]
pub struct MapManager {
    config: RuntimeConfig,
    event_bus: EventBus,
    attacks: Arc<AttackRegistry>,
    maps: BTreeMap<MapId, Map>,
}

impl MapManager {
    pub fn new(config: RuntimeConfig) -> Self {
        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        Self {
            config,
            event_bus,
            attacks: Arc::new(AttackRegistry::with_defaults()),
            maps: BTreeMap::new(),
        }
    }

    /// Replaces the attack registry used by maps opened afterwards.
    pub fn with_attacks(mut self, attacks: AttackRegistry) -> Self {
        self.attacks = Arc::new(attacks);
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Builds, populates and starts the map `id`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<S>(&mut self, id: MapId, source: &S) -> Result<&Map>
    where
        S: TileLayoutSource + ?Sized,
    {
        if self.maps.contains_key(&id) {
            return Err(RuntimeError::DuplicateMap { map_id: id });
        }

        let mut map = Map::from_source(id, source, self.config.clone())?
            .with_event_bus(self.event_bus.clone())
            .with_attacks(Arc::clone(&self.attacks));
        map.populate()?;
        map.start()?;

        info!(target: "runtime::map", map = %id, open = self.maps.len() + 1, "map opened");
        Ok(self.maps.entry(id).or_insert(map))
    }

    pub fn get(&self, id: MapId) -> Option<&Map> {
        self.maps.get(&id)
    }

    /// Stops and removes the map `id`, returning the combatants it held.
    pub async fn close(&mut self, id: MapId) -> Result<Vec<Box<dyn Combatant>>> {
        let mut map = self
            .maps
            .remove(&id)
            .ok_or(RuntimeError::UnknownMap { map_id: id })?;
        Ok(map.stop().await)
    }

    /// Stops every open map. Stop is requested on all maps before any of
    /// them is awaited, so zone workers wind down in parallel.
    pub async fn shutdown(&mut self) -> Vec<Box<dyn Combatant>> {
        for map in self.maps.values() {
            map.request_stop();
        }

        let mut released = Vec::new();
        while let Some((_, mut map)) = self.maps.pop_first() {
            released.append(&mut map.stop().await);
        }
        info!(target: "runtime::map", released = released.len(), "all maps stopped");
        released
    }

    /// Open map ids in ascending order.
    pub fn ids(&self) -> Vec<MapId> {
        self.maps.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
