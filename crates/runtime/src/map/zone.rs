//! Zone handle: the caller-facing side of a zone worker.
//!
//! Every mutation is sent over the zone's command queue and applied by the
//! worker, which is the only owner of the zone's combatants. The handle keeps
//! a shared occupancy counter so capacity queries never wait on the worker.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use game_core::{
    ApplyOutcome, AttackType, Combatant, CombatantId, CombatantKind, OptionItem,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use super::context::MapContext;
use super::{MapId, MapPhase};
use crate::api::{JoinRejected, Result, RuntimeError};
use crate::workers::{ZoneCommand, ZoneStats};

/// A request for `attacker` to hit `target`, resolved at the zone's next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackIntent {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub attack_type: AttackType,
}

impl AttackIntent {
    pub fn new(attacker: CombatantId, target: CombatantId, attack_type: AttackType) -> Self {
        Self {
            attacker,
            target,
            attack_type,
        }
    }
}

/// Read-only view of one combatant inside a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantView {
    pub id: CombatantId,
    pub kind: CombatantKind,
    pub health: u32,
    pub max_health: u32,
    pub alive: bool,
    pub options: Vec<OptionItem>,
}

impl CombatantView {
    pub(crate) fn of(combatant: &dyn Combatant) -> Self {
        let stats = combatant.stats();
        Self {
            id: combatant.id(),
            kind: combatant.kind(),
            health: stats.health(),
            max_health: stats.max_health(),
            alive: combatant.is_alive(),
            options: combatant.options().iter().cloned().collect(),
        }
    }
}

/// Point-in-time copy of a zone's state, ordered by combatant id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub map: MapId,
    pub zone: usize,
    pub max_players: usize,
    pub combatants: Vec<CombatantView>,
    pub pending_attacks: usize,
    pub stats: ZoneStats,
}

impl ZoneSnapshot {
    pub fn get(&self, id: CombatantId) -> Option<&CombatantView> {
        self.combatants.iter().find(|view| view.id == id)
    }
}

/// Handle to one capacity-bounded zone of a [`Map`](super::Map).
#[derive(Debug)]
pub struct Zone {
    index: usize,
    max_players: usize,
    map: Weak<MapContext>,
    occupancy: Arc<AtomicUsize>,
    commands: mpsc::Sender<ZoneCommand>,
}

impl Zone {
    pub(crate) fn new(
        index: usize,
        max_players: usize,
        map: Weak<MapContext>,
        occupancy: Arc<AtomicUsize>,
        commands: mpsc::Sender<ZoneCommand>,
    ) -> Self {
        Self {
            index,
            max_players,
            map,
            occupancy,
            commands,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Number of combatants currently in the zone.
    pub fn len(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.max_players
    }

    /// Identifier of the owning map, or `None` once the map is gone.
    pub fn map_id(&self) -> Option<MapId> {
        self.map.upgrade().map(|map| map.id)
    }

    /// Moves `combatant` into the zone.
    ///
    /// Fails with `ZoneFull` when the zone is at capacity and `AlreadyPlaced`
    /// when the id already lives in a zone of the same map. The combatant is
    /// handed back inside the rejection either way.
    pub async fn join(&self, combatant: Box<dyn Combatant>) -> std::result::Result<(), JoinRejected> {
        if let Err(error) = self.ensure_running() {
            return Err(JoinRejected::new(combatant, error));
        }
        if self.is_full() {
            return Err(JoinRejected::new(
                combatant,
                RuntimeError::ZoneFull {
                    zone: self.index,
                    max_players: self.max_players,
                },
            ));
        }

        // Reserve first so a closed queue can never swallow the combatant.
        let permit = match self.commands.reserve().await {
            Ok(permit) => permit,
            Err(_) => return Err(JoinRejected::new(combatant, self.closed_error())),
        };
        let (reply, rx) = oneshot::channel();
        permit.send(ZoneCommand::Join { combatant, reply });

        match rx.await {
            Ok(result) => result,
            Err(error) => Err(JoinRejected {
                combatant: None,
                error: RuntimeError::ReplyChannelClosed(error),
            }),
        }
    }

    /// Removes a combatant from the zone and hands it back, if it was here.
    ///
    /// Still served while a stopping worker drains its queue. Once the worker
    /// has exited this fails with `Stopped` and the combatant is returned by
    /// [`Map::stop`](super::Map::stop) instead.
    pub async fn leave(&self, id: CombatantId) -> Result<Option<Box<dyn Combatant>>> {
        self.ensure_started()?;
        self.send_request(|reply| ZoneCommand::Leave { id, reply }).await
    }

    /// Queues an attack for the next tick.
    ///
    /// Acceptance only means the intent was queued. Whether it lands is
    /// reported on the combat topic of the event bus.
    pub async fn attack(&self, intent: AttackIntent) -> Result<()> {
        self.ensure_running()?;
        self.commands
            .send(ZoneCommand::Attack(intent))
            .await
            .map_err(|_| self.closed_error())
    }

    /// Attaches a copy of `option` to `target`.
    pub async fn apply_option(&self, target: CombatantId, option: &OptionItem) -> Result<ApplyOutcome> {
        let option = option.clone();
        self.request(|reply| ZoneCommand::ApplyOption {
            target,
            option,
            reply,
        })
        .await?
    }

    pub async fn snapshot(&self) -> Result<ZoneSnapshot> {
        self.request(|reply| ZoneCommand::Snapshot { reply }).await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> ZoneCommand) -> Result<T> {
        self.ensure_running()?;
        self.send_request(command).await
    }

    async fn send_request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ZoneCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| self.closed_error())?;
        rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    fn ensure_running(&self) -> Result<()> {
        let Some(map) = self.map.upgrade() else {
            return Err(RuntimeError::Stopped { zone: self.index });
        };
        match map.phase() {
            MapPhase::Running => Ok(()),
            MapPhase::Stopped => Err(RuntimeError::Stopped { zone: self.index }),
            MapPhase::Created | MapPhase::Populated => {
                Err(RuntimeError::NotRunning { zone: self.index })
            }
        }
    }

    /// Like [`ensure_running`](Self::ensure_running), but lets a stopping
    /// zone through.
    fn ensure_started(&self) -> Result<()> {
        match self.ensure_running() {
            Err(RuntimeError::Stopped { .. }) if self.map.strong_count() > 0 => Ok(()),
            other => other,
        }
    }

    fn closed_error(&self) -> RuntimeError {
        match self.map.upgrade().map(|map| map.phase()) {
            Some(MapPhase::Running) => RuntimeError::CommandChannelClosed { zone: self.index },
            _ => RuntimeError::Stopped { zone: self.index },
        }
    }
}
