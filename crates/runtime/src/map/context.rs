//! State shared between a map, its zone handles and its zone workers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use game_core::{CombatantId, TileLayout};
use tokio::sync::watch;

use super::{MapId, MapPhase};

pub(crate) struct MapContext {
    pub(crate) id: MapId,
    pub(crate) layout: TileLayout,
    phase: watch::Sender<MapPhase>,
    stop_requested: AtomicBool,
    /// Which zone holds each combatant. A combatant id appears at most once.
    placements: Mutex<HashMap<CombatantId, usize>>,
}

impl MapContext {
    pub(crate) fn new(id: MapId, layout: TileLayout) -> Self {
        let (phase, _) = watch::channel(MapPhase::Created);
        Self {
            id,
            layout,
            phase,
            stop_requested: AtomicBool::new(false),
            placements: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn phase(&self) -> MapPhase {
        *self.phase.borrow()
    }

    pub(crate) fn set_phase(&self, phase: MapPhase) {
        self.phase.send_replace(phase);
    }

    pub(crate) fn subscribe_phase(&self) -> watch::Receiver<MapPhase> {
        self.phase.subscribe()
    }

    /// Raises the stop flag and signals every worker. Returns `false` when a
    /// stop had already been requested.
    pub(crate) fn request_stop(&self) -> bool {
        if self.stop_requested.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.set_phase(MapPhase::Stopped);
        true
    }

    pub(crate) fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Records `id` as living in `zone`. Fails with the zone that already
    /// holds it.
    pub(crate) fn claim(&self, id: CombatantId, zone: usize) -> Result<(), usize> {
        let mut placements = self.placements();
        if let Some(&existing) = placements.get(&id) {
            return Err(existing);
        }
        placements.insert(id, zone);
        Ok(())
    }

    /// Forgets `id` if it is recorded against `zone`.
    pub(crate) fn release(&self, id: CombatantId, zone: usize) {
        let mut placements = self.placements();
        if placements.get(&id) == Some(&zone) {
            placements.remove(&id);
        }
    }

    pub(crate) fn placement(&self, id: CombatantId) -> Option<usize> {
        self.placements().get(&id).copied()
    }

    pub(crate) fn placed(&self) -> usize {
        self.placements().len()
    }

    // A worker that panicked mid-update cannot leave the roster half-written,
    // so a poisoned lock is still usable.
    fn placements(&self) -> MutexGuard<'_, HashMap<CombatantId, usize>> {
        self.placements.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> MapContext {
        MapContext::new(MapId(1), TileLayout::new(2, 2).unwrap())
    }

    #[test]
    fn claim_rejects_second_zone() {
        let ctx = context();
        assert_eq!(ctx.claim(CombatantId(1), 0), Ok(()));
        assert_eq!(ctx.claim(CombatantId(1), 1), Err(0));
        assert_eq!(ctx.placement(CombatantId(1)), Some(0));
    }

    #[test]
    fn release_ignores_other_zones() {
        let ctx = context();
        ctx.claim(CombatantId(1), 0).unwrap();
        ctx.release(CombatantId(1), 1);
        assert_eq!(ctx.placed(), 1);
        ctx.release(CombatantId(1), 0);
        assert_eq!(ctx.placed(), 0);
    }

    #[test]
    fn stop_is_requested_once() {
        let ctx = context();
        let rx = ctx.subscribe_phase();
        assert!(ctx.request_stop());
        assert!(!ctx.request_stop());
        assert!(ctx.is_stop_requested());
        assert_eq!(*rx.borrow(), MapPhase::Stopped);
    }
}
