#![allow(dead_code)]

use std::time::Duration;

use game_core::{Character, CharacterStats, Combatant, CombatantId, Npc, TileLayout};
use runtime::{Event, Map, MapId, RuntimeConfig};
use tokio::sync::broadcast;

pub const TICK: Duration = Duration::from_millis(100);

pub fn config() -> RuntimeConfig {
    RuntimeConfig::default().with_tick_interval(TICK)
}

pub fn layout(zone_count: usize, max_players: usize) -> TileLayout {
    TileLayout::new(zone_count, max_players).expect("valid layout")
}

/// Populated but not started.
pub fn populated_map(zone_count: usize, max_players: usize) -> Map {
    let mut map = Map::new(MapId(1), layout(zone_count, max_players), config())
        .expect("map should build");
    map.populate().expect("populate should succeed");
    map
}

/// Populated and running. Must be called inside a tokio runtime.
pub fn running_map(zone_count: usize, max_players: usize) -> Map {
    let mut map = populated_map(zone_count, max_players);
    map.start().expect("start should succeed");
    map
}

/// 100 HP, attack 10, defense 4, no weapon.
pub fn player(id: u64) -> Box<dyn Combatant> {
    Box::new(Character::new(
        CombatantId(id),
        format!("player-{id}"),
        CharacterStats::new(100, 10, 4),
    ))
}

pub fn npc(id: u64, level: u32, health: u32) -> Box<dyn Combatant> {
    Box::new(Npc::new(
        CombatantId(id),
        0,
        level,
        CharacterStats::new(100, 10, 4).with_health(health),
    ))
}

pub async fn next_event(rx: &mut broadcast::Receiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event bus closed")
}

/// Lets every zone run at least one tick.
pub async fn wait_ticks(ticks: u32) {
    tokio::time::sleep(TICK * ticks + TICK / 2).await;
}
