//! Map lifecycle: zone population, worker startup and shutdown.
//!
//! A [`Map`] walks `Created → Populated → Running → Stopped`. Zones are
//! created exactly once by [`Map::populate`], their workers are spawned by
//! [`Map::start`], and [`Map::stop`] joins every worker and returns the
//! combatants the zones still held.

mod context;
mod manager;
mod zone;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use game_core::{
    AttackRegistry, Combatant, CombatantId, GameError, TileLayout, TileLayoutSource,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::api::{JoinRejected, Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, Topic};
use crate::workers::ZoneWorker;

pub(crate) use context::MapContext;
pub use manager::MapManager;
pub use zone::{AttackIntent, CombatantView, Zone, ZoneSnapshot};

/// Server-wide map identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MapId(pub u32);

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum MapPhase {
    Created,
    Populated,
    Running,
    /// Stop requested. Workers drain and exit.
    Stopped,
}

/// One map instance and the zones it owns.
pub struct Map {
    context: Arc<MapContext>,
    config: RuntimeConfig,
    zones: Vec<Zone>,
    /// Workers built by `populate` and not yet spawned.
    pending: Vec<ZoneWorker>,
    workers: Vec<JoinHandle<Vec<Box<dyn Combatant>>>>,
    started_at: Option<Instant>,
    event_bus: EventBus,
    attacks: Arc<AttackRegistry>,
}

impl Map {
    /// Binds `id` to `layout`. A configured zone count override replaces the
    /// layout's zone count.
    pub fn new(id: MapId, layout: TileLayout, config: RuntimeConfig) -> Result<Self> {
        let layout = match config.zone_count_override {
            Some(zone_count) => layout
                .with_zone_count(zone_count)
                .map_err(|source| RuntimeError::InvalidTileLayout { map_id: id, source })?,
            None => layout,
        };

        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        Ok(Self {
            context: Arc::new(MapContext::new(id, layout)),
            config,
            zones: Vec::new(),
            pending: Vec::new(),
            workers: Vec::new(),
            started_at: None,
            event_bus,
            attacks: Arc::new(AttackRegistry::with_defaults()),
        })
    }

    /// Looks the layout up in `source`. A map without a layout is a
    /// configuration error reported here, not on first use.
    pub fn from_source<S>(id: MapId, source: &S, config: RuntimeConfig) -> Result<Self>
    where
        S: TileLayoutSource + ?Sized,
    {
        let layout = source
            .tile_layout(id.0)
            .ok_or(RuntimeError::MissingTileLayout { map_id: id })?;
        Self::new(id, layout, config)
    }

    /// Publishes into `event_bus` instead of a private bus. Only takes effect
    /// before [`populate`](Self::populate).
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Resolves attacks with `attacks`. Only takes effect before
    /// [`populate`](Self::populate).
    pub fn with_attacks(mut self, attacks: Arc<AttackRegistry>) -> Self {
        self.attacks = attacks;
        self
    }

    /// Creates one zone per layout entry, indexed from zero.
    pub fn populate(&mut self) -> Result<()> {
        let map_id = self.id();
        if !self.zones.is_empty() {
            return Err(RuntimeError::AlreadyPopulated { map_id });
        }
        let phase = self.phase();
        if phase != MapPhase::Created {
            return Err(RuntimeError::InvalidPhase {
                map_id,
                phase,
                expected: MapPhase::Created,
            });
        }

        let layout = self.context.layout;
        for index in 0..layout.zone_count() {
            let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size.max(1));
            let occupancy = Arc::new(AtomicUsize::new(0));

            self.zones.push(Zone::new(
                index,
                layout.max_players(),
                Arc::downgrade(&self.context),
                Arc::clone(&occupancy),
                command_tx,
            ));
            self.pending.push(ZoneWorker::new(
                index,
                Arc::clone(&self.context),
                occupancy,
                command_rx,
                Arc::clone(&self.attacks),
                self.event_bus.clone(),
                &self.config,
            ));
        }

        self.context.set_phase(MapPhase::Populated);
        info!(
            target: "runtime::map",
            map = %map_id,
            zones = layout.zone_count(),
            max_players = layout.max_players(),
            capacity = layout.total_capacity(),
            "map populated"
        );
        Ok(())
    }

    /// Spawns one worker per zone onto the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        let phase = self.phase();
        if phase != MapPhase::Populated {
            return Err(RuntimeError::InvalidPhase {
                map_id: self.id(),
                phase,
                expected: MapPhase::Populated,
            });
        }

        self.context.set_phase(MapPhase::Running);
        self.workers = self
            .pending
            .drain(..)
            .map(|worker| tokio::spawn(worker.run()))
            .collect();
        self.started_at = Some(Instant::now());

        info!(
            target: "runtime::map",
            map = %self.id(),
            workers = self.workers.len(),
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "map running"
        );
        Ok(())
    }

    /// Raises the stop flag and signals every zone worker without waiting.
    pub fn request_stop(&self) {
        if self.context.request_stop() {
            info!(target: "runtime::map", map = %self.id(), "map stop requested");
        }
    }

    /// Stops the map and waits for every zone worker to exit.
    ///
    /// Returns the combatants the zones still held. Queued attacks are
    /// resolved before a worker exits.
    pub async fn stop(&mut self) -> Vec<Box<dyn Combatant>> {
        self.request_stop();
        self.pending.clear();

        let mut released = Vec::new();
        for handle in self.workers.drain(..) {
            match handle.await {
                Ok(mut combatants) => released.append(&mut combatants),
                Err(error) => {
                    error!(target: "runtime::map", map = %self.context.id, %error, "zone worker failed")
                }
            }
        }

        info!(
            target: "runtime::map",
            map = %self.id(),
            released = released.len(),
            "map stopped"
        );
        released
    }

    /// First-fit placement: joins the lowest-index zone with a free slot.
    ///
    /// A join that loses a race for the last slot moves on to the next zone.
    /// Returns the index of the zone that accepted the combatant.
    pub async fn place(
        &self,
        combatant: Box<dyn Combatant>,
    ) -> std::result::Result<usize, JoinRejected> {
        let map_id = self.id();
        match self.phase() {
            MapPhase::Running => {}
            MapPhase::Stopped => {
                return Err(JoinRejected::new(combatant, RuntimeError::MapStopped { map_id }));
            }
            MapPhase::Created | MapPhase::Populated => {
                return Err(JoinRejected::new(combatant, RuntimeError::MapNotRunning { map_id }));
            }
        }

        let mut combatant = combatant;
        for zone in &self.zones {
            if zone.is_full() {
                continue;
            }
            match zone.join(combatant).await {
                Ok(()) => return Ok(zone.index()),
                Err(JoinRejected {
                    combatant: Some(returned),
                    error: RuntimeError::ZoneFull { .. },
                }) => {
                    warn!(target: "runtime::map", map = %map_id, zone = zone.index(), "zone filled during placement, trying next");
                    combatant = returned;
                }
                Err(rejected) => {
                    let severity = rejected.error.severity();
                    if severity.is_internal() {
                        error!(
                            target: "runtime::map",
                            map = %map_id,
                            zone = zone.index(),
                            severity = severity.as_str(),
                            error = %rejected.error,
                            "placement failed"
                        );
                    }
                    return Err(rejected);
                }
            }
        }

        Err(JoinRejected::new(combatant, RuntimeError::MapFull { map_id }))
    }

    /// First zone, by index, with room for another combatant.
    pub fn get_zone_not_max_player(&self) -> Option<&Zone> {
        self.zones.iter().find(|zone| !zone.is_full())
    }

    /// First zone, by index, holding at least one combatant.
    pub fn get_zone_player(&self) -> Option<&Zone> {
        self.zones.iter().find(|zone| !zone.is_empty())
    }

    /// Zone currently holding `id`, if any.
    pub fn zone_of(&self, id: CombatantId) -> Option<&Zone> {
        self.context
            .placement(id)
            .and_then(|index| self.zones.get(index))
    }

    /// Number of combatants placed across every zone.
    pub fn player_count(&self) -> usize {
        self.context.placed()
    }

    pub fn id(&self) -> MapId {
        self.context.id
    }

    pub fn layout(&self) -> &TileLayout {
        &self.context.layout
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, index: usize) -> Option<&Zone> {
        self.zones.get(index)
    }

    pub fn phase(&self) -> MapPhase {
        self.context.phase()
    }

    pub fn is_running(&self) -> bool {
        self.phase() == MapPhase::Running
    }

    pub fn is_stop_requested(&self) -> bool {
        self.context.is_stop_requested()
    }

    /// Time since the map entered `Running`.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|started| started.elapsed())
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }
}

impl Drop for Map {
    fn drop(&mut self) {
        // Detached workers still observe the signal and exit on their own.
        if !self.workers.is_empty() {
            self.request_stop();
        }
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("id", &self.id())
            .field("phase", &self.phase())
            .field("layout", self.layout())
            .field("zones", &self.zones.len())
            .finish_non_exhaustive()
    }
}
