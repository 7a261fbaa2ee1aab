//! Zone worker that owns the authoritative combatant set of one zone.
//!
//! Receives commands from [`Zone`](crate::Zone) handles, resolves queued
//! attacks on every tick, and publishes deltas to the [`EventBus`].

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use game_core::{
    ApplyOutcome, AttackRegistry, Combatant, CombatantId, DamageReport, OptionItem, StackingRules,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::api::{FeedbackCode, JoinRejected, Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::events::{CombatEvent, DiscardReason, Event, EventBus, OptionEvent, ZoneEvent, ZoneRef};
use crate::map::{AttackIntent, CombatantView, MapContext, MapPhase, ZoneSnapshot};

/// Commands that can be sent to a zone worker
pub(crate) enum ZoneCommand {
    Join {
        combatant: Box<dyn Combatant>,
        reply: oneshot::Sender<std::result::Result<(), JoinRejected>>,
    },
    Leave {
        id: CombatantId,
        reply: oneshot::Sender<Option<Box<dyn Combatant>>>,
    },
    /// Queued until the next tick; no reply.
    Attack(AttackIntent),
    ApplyOption {
        target: CombatantId,
        option: OptionItem,
        reply: oneshot::Sender<Result<ApplyOutcome>>,
    },
    Snapshot {
        reply: oneshot::Sender<ZoneSnapshot>,
    },
}

impl std::fmt::Debug for ZoneCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Join { combatant, .. } => write!(f, "Join({})", combatant.id()),
            Self::Leave { id, .. } => write!(f, "Leave({id})"),
            Self::Attack(intent) => write!(f, "Attack({intent:?})"),
            Self::ApplyOption { target, option, .. } => {
                write!(f, "ApplyOption({target}, {:?})", option.id)
            }
            Self::Snapshot { .. } => f.write_str("Snapshot"),
        }
    }
}

/// Per-zone counters, reported in snapshots and on shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub ticks: u64,
    /// Attacks that applied damage.
    pub resolved: u64,
    /// Attacks dropped at dispatch, including failures.
    pub discarded: u64,
    /// Attacks, commands or ticks that panicked.
    pub failed: u64,
}

/// Background task driving one zone.
pub(crate) struct ZoneWorker {
    zone: ZoneRef,
    map: Arc<MapContext>,
    occupancy: Arc<AtomicUsize>,
    command_rx: mpsc::Receiver<ZoneCommand>,
    phase_rx: watch::Receiver<MapPhase>,
    attacks: Arc<AttackRegistry>,
    event_bus: EventBus,
    stacking: StackingRules,
    tick_interval: Duration,
    /// Point up to which option timers have been advanced.
    last_tick: Instant,
    combatants: BTreeMap<CombatantId, Box<dyn Combatant>>,
    pending: VecDeque<AttackIntent>,
    stats: ZoneStats,
}

impl ZoneWorker {
    pub(crate) fn new(
        index: usize,
        map: Arc<MapContext>,
        occupancy: Arc<AtomicUsize>,
        command_rx: mpsc::Receiver<ZoneCommand>,
        attacks: Arc<AttackRegistry>,
        event_bus: EventBus,
        config: &RuntimeConfig,
    ) -> Self {
        let zone = ZoneRef {
            map: map.id,
            zone: index,
        };
        let phase_rx = map.subscribe_phase();
        Self {
            zone,
            map,
            occupancy,
            command_rx,
            phase_rx,
            attacks,
            event_bus,
            stacking: config.stacking,
            tick_interval: config.tick_interval,
            last_tick: Instant::now(),
            combatants: BTreeMap::new(),
            pending: VecDeque::new(),
            stats: ZoneStats::default(),
        }
    }

    /// Main worker loop. Returns the combatants still held when the map stops.
    pub(crate) async fn run(mut self) -> Vec<Box<dyn Combatant>> {
        let period = self.tick_interval.max(Duration::from_millis(1));
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.last_tick = Instant::now();

        debug!(target: "runtime::zone", zone = %self.zone, "zone worker started");

        loop {
            tokio::select! {
                biased;

                changed = self.phase_rx.changed() => {
                    if changed.is_err() || *self.phase_rx.borrow() == MapPhase::Stopped {
                        break;
                    }
                }
                Some(command) = self.command_rx.recv() => {
                    self.guarded("command", |worker| worker.handle_command(command));
                }
                _ = ticker.tick() => {
                    self.guarded("tick", Self::tick);
                }
            }
        }

        self.shutdown()
    }

    /// Runs one step of the loop, containing any panic to that step.
    ///
    /// A panic drops whatever reply the step owned, so the caller sees a
    /// closed reply channel while the zone keeps ticking.
    fn guarded(&mut self, step: &'static str, f: impl FnOnce(&mut Self)) {
        if panic::catch_unwind(AssertUnwindSafe(|| f(self))).is_err() {
            self.stats.failed += 1;
            error!(target: "runtime::zone", zone = %self.zone, step, "zone step panicked; step dropped");
        }
    }

    fn handle_command(&mut self, command: ZoneCommand) {
        match command {
            ZoneCommand::Join { combatant, reply } => {
                let result = self.handle_join(combatant);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::zone", zone = %self.zone, "Join reply channel closed (caller dropped)");
                }
            }
            ZoneCommand::Leave { id, reply } => {
                let left = self.handle_leave(id);
                if let Err(Some(combatant)) = reply.send(left) {
                    // Nobody is waiting for it; keep the roster consistent.
                    warn!(target: "runtime::zone", zone = %self.zone, id = %combatant.id(), "Leave reply dropped, combatant discarded");
                }
            }
            ZoneCommand::Attack(intent) => self.pending.push_back(intent),
            ZoneCommand::ApplyOption {
                target,
                option,
                reply,
            } => {
                let result = self.handle_apply_option(target, option);
                if let Err(result) = reply.send(result) {
                    debug!(
                        target: "runtime::zone",
                        zone = %self.zone,
                        code = FeedbackCode::of(&result).as_str(),
                        "ApplyOption reply channel closed (caller dropped)"
                    );
                }
            }
            ZoneCommand::Snapshot { reply } => {
                self.advance_options();
                if reply.send(self.snapshot()).is_err() {
                    debug!(target: "runtime::zone", zone = %self.zone, "Snapshot reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn handle_join(
        &mut self,
        combatant: Box<dyn Combatant>,
    ) -> std::result::Result<(), JoinRejected> {
        let max_players = self.map.layout.max_players();
        if self.combatants.len() >= max_players {
            return Err(JoinRejected::new(
                combatant,
                RuntimeError::ZoneFull {
                    zone: self.zone.zone,
                    max_players,
                },
            ));
        }

        let id = combatant.id();
        if let Err(existing) = self.map.claim(id, self.zone.zone) {
            warn!(
                target: "runtime::zone",
                zone = %self.zone,
                %id,
                existing,
                "combatant already placed on this map; rejecting duplicate join"
            );
            return Err(JoinRejected::new(
                combatant,
                RuntimeError::AlreadyPlaced { id, zone: existing },
            ));
        }

        let kind = combatant.kind();
        let previous = self.combatants.insert(id, combatant);
        debug_assert!(previous.is_none(), "combatant {id} claimed twice in zone {}", self.zone);
        self.sync_occupancy();
        self.publish(ZoneEvent::CombatantJoined {
            zone: self.zone,
            id,
            kind,
        });
        Ok(())
    }

    fn handle_leave(&mut self, id: CombatantId) -> Option<Box<dyn Combatant>> {
        let combatant = self.combatants.remove(&id)?;
        self.map.release(id, self.zone.zone);
        self.sync_occupancy();
        self.publish(ZoneEvent::CombatantLeft {
            zone: self.zone,
            id,
        });
        Some(combatant)
    }

    fn handle_apply_option(&mut self, target: CombatantId, option: OptionItem) -> Result<ApplyOutcome> {
        // Settle running timers first so the new option's clock starts now.
        self.advance_options();
        let Some(combatant) = self.combatants.get_mut(&target) else {
            return Err(RuntimeError::UnknownCombatant { id: target });
        };

        match combatant.options_mut().apply(&option, &self.stacking) {
            Ok(outcome) => {
                let event = match outcome {
                    ApplyOutcome::Added => OptionEvent::OptionApplied {
                        zone: self.zone,
                        target,
                        option,
                    },
                    ApplyOutcome::Refreshed { .. } => OptionEvent::OptionRefreshed {
                        zone: self.zone,
                        target,
                        option,
                    },
                };
                self.publish(event);
                Ok(outcome)
            }
            Err(error) => {
                debug!(target: "runtime::zone", zone = %self.zone, %target, %error, "option rejected");
                self.publish(OptionEvent::OptionRejected {
                    zone: self.zone,
                    target,
                    id: option.id,
                    code: FeedbackCode::Rejected,
                });
                Err(error.into())
            }
        }
    }

    /// Advances option timers, then resolves every queued attack in order.
    fn tick(&mut self) {
        self.stats.ticks += 1;
        self.advance_options();
        self.resolve_pending();
    }

    /// Counts option timers down by the wall time since the last advance.
    ///
    /// Sub-millisecond remainders carry over to the next call.
    fn advance_options(&mut self) {
        let now = Instant::now();
        let elapsed_ms = u64::try_from(now.saturating_duration_since(self.last_tick).as_millis())
            .unwrap_or(u64::MAX);
        if elapsed_ms == 0 {
            return;
        }
        self.last_tick = self
            .last_tick
            .checked_add(Duration::from_millis(elapsed_ms))
            .unwrap_or(now);

        let mut expired = Vec::new();
        for (&id, combatant) in self.combatants.iter_mut() {
            for option in combatant.options_mut().advance(elapsed_ms) {
                expired.push(OptionEvent::OptionExpired {
                    zone: self.zone,
                    target: id,
                    id: option.id,
                });
            }
        }
        for event in expired {
            self.publish(event);
        }
    }

    fn resolve_pending(&mut self) {
        while let Some(intent) = self.pending.pop_front() {
            self.dispatch(intent);
        }
    }

    /// Resolves one attack. The damage is applied in a single synchronous
    /// step, so a stop signal can never observe it half-done.
    fn dispatch(&mut self, intent: AttackIntent) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_resolve(&intent)));

        match outcome {
            Ok(Ok(report)) => {
                self.stats.resolved += 1;
                self.publish(CombatEvent::HealthChanged {
                    zone: self.zone,
                    attacker: intent.attacker,
                    target: intent.target,
                    attack_type: intent.attack_type,
                    amount: report.amount,
                    hp_before: report.hp_before,
                    hp_after: report.hp_after,
                });
                if report.died {
                    info!(target: "runtime::zone", zone = %self.zone, id = %intent.target, killer = %intent.attacker, "combatant died");
                    self.publish(CombatEvent::CombatantDied {
                        zone: self.zone,
                        id: intent.target,
                        killer: intent.attacker,
                    });
                }
            }
            Ok(Err(reason)) => self.discard(intent, reason),
            Err(_) => {
                self.stats.failed += 1;
                error!(target: "runtime::zone", zone = %self.zone, ?intent, "attack behavior panicked; action dropped");
                self.discard(intent, DiscardReason::Failed);
            }
        }
    }

    fn try_resolve(&mut self, intent: &AttackIntent) -> std::result::Result<DamageReport, DiscardReason> {
        let behavior = self
            .attacks
            .get(intent.attack_type)
            .ok_or(DiscardReason::UnsupportedAttack)?;

        let attacker = self
            .combatants
            .get(&intent.attacker)
            .ok_or(DiscardReason::AttackerMissing)?;
        if !attacker.is_alive() {
            return Err(DiscardReason::AttackerDead);
        }
        let target = self
            .combatants
            .get(&intent.target)
            .ok_or(DiscardReason::TargetMissing)?;
        if !target.is_alive() {
            return Err(DiscardReason::TargetDead);
        }

        let amount = behavior.resolve(attacker.as_ref(), target.as_ref());
        let target = self
            .combatants
            .get_mut(&intent.target)
            .ok_or(DiscardReason::TargetMissing)?;
        Ok(target.take_damage(amount))
    }

    fn discard(&mut self, intent: AttackIntent, reason: DiscardReason) {
        self.stats.discarded += 1;
        debug!(target: "runtime::zone", zone = %self.zone, ?intent, %reason, "attack discarded");
        self.publish(CombatEvent::ActionDiscarded {
            zone: self.zone,
            attacker: intent.attacker,
            target: intent.target,
            attack_type: intent.attack_type,
            reason,
        });
    }

    fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            map: self.zone.map,
            zone: self.zone.zone,
            max_players: self.map.layout.max_players(),
            combatants: self
                .combatants
                .values()
                .map(|combatant| CombatantView::of(combatant.as_ref()))
                .collect(),
            pending_attacks: self.pending.len(),
            stats: self.stats,
        }
    }

    /// Drains already-queued commands, flushes pending attacks, and hands
    /// every combatant back to the map.
    fn shutdown(mut self) -> Vec<Box<dyn Combatant>> {
        self.command_rx.close();
        while let Ok(command) = self.command_rx.try_recv() {
            match command {
                ZoneCommand::Join { combatant, reply } => {
                    let rejected = JoinRejected::new(
                        combatant,
                        RuntimeError::Stopped {
                            zone: self.zone.zone,
                        },
                    );
                    if reply.send(Err(rejected)).is_err() {
                        debug!(target: "runtime::zone", zone = %self.zone, "Join reply channel closed during shutdown");
                    }
                }
                other => self.guarded("command", |worker| worker.handle_command(other)),
            }
        }
        self.resolve_pending();

        let released: Vec<_> = std::mem::take(&mut self.combatants).into_values().collect();
        for combatant in &released {
            self.map.release(combatant.id(), self.zone.zone);
        }
        self.sync_occupancy();

        self.publish(ZoneEvent::ZoneStopped {
            zone: self.zone,
            released: released.len(),
        });
        info!(
            target: "runtime::zone",
            zone = %self.zone,
            ticks = self.stats.ticks,
            resolved = self.stats.resolved,
            discarded = self.stats.discarded,
            released = released.len(),
            "zone worker stopped"
        );

        released
    }

    fn sync_occupancy(&self) {
        self.occupancy.store(self.combatants.len(), Ordering::Release);
    }

    fn publish(&self, event: impl Into<Event>) {
        self.event_bus.publish(event.into());
    }
}
