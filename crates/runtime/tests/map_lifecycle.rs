mod common;

use common::{config, layout, player, populated_map, running_map};
use game_core::{ErrorSeverity, GameError, TileLayout};
use runtime::{FeedbackCode, Map, MapId, MapPhase, RuntimeError};

#[test]
fn populate_creates_one_empty_zone_per_layout_entry() {
    let map = populated_map(3, 2);

    assert_eq!(map.phase(), MapPhase::Populated);
    let indices: Vec<usize> = map.zones().iter().map(|zone| zone.index()).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    for zone in map.zones() {
        assert!(zone.is_empty());
        assert_eq!(zone.max_players(), 2);
        assert_eq!(zone.map_id(), Some(MapId(1)));
    }
}

#[test]
fn second_populate_is_rejected_without_appending() {
    let mut map = populated_map(3, 2);

    let error = map.populate().expect_err("second populate must fail");
    assert!(matches!(error, RuntimeError::AlreadyPopulated { map_id: MapId(1) }));
    assert_eq!(map.zones().len(), 3);
}

#[test]
fn missing_tile_layout_is_fatal_at_construction() {
    let source = |id: u32| (id == 7).then(|| layout(2, 4));

    let error = Map::from_source(MapId(9), &source, config()).expect_err("no layout for map 9");
    assert!(matches!(error, RuntimeError::MissingTileLayout { map_id: MapId(9) }));
    assert_eq!(error.severity(), ErrorSeverity::Fatal);

    let map = Map::from_source(MapId(7), &source, config()).expect("layout for map 7");
    assert_eq!(map.layout().zone_count(), 2);
    assert_eq!(map.phase(), MapPhase::Created);
}

#[test]
fn zone_count_override_replaces_layout() {
    let map = Map::new(MapId(1), layout(8, 3), config().with_zone_count_override(1))
        .expect("override is valid");
    assert_eq!(map.layout().zone_count(), 1);
    assert_eq!(map.layout().max_players(), 3);

    let error = Map::new(MapId(1), layout(8, 3), config().with_zone_count_override(0))
        .expect_err("zero zones is invalid");
    assert!(matches!(error, RuntimeError::InvalidTileLayout { .. }));
}

#[test]
fn layout_deserializes_from_json_and_ignores_extra_fields() {
    let parsed: TileLayout =
        serde_json::from_str(r#"{"zone_count": 3, "max_players": 2, "tileset": "cave"}"#)
            .expect("valid layout json");
    assert_eq!(parsed, layout(3, 2));

    assert!(serde_json::from_str::<TileLayout>(r#"{"zone_count": 0, "max_players": 2}"#).is_err());
}

#[tokio::test]
async fn start_requires_populated_map() {
    let mut map = Map::new(MapId(1), layout(1, 1), config()).expect("map should build");

    let error = map.start().expect_err("start before populate must fail");
    assert!(matches!(
        error,
        RuntimeError::InvalidPhase {
            phase: MapPhase::Created,
            expected: MapPhase::Populated,
            ..
        }
    ));

    map.populate().expect("populate should succeed");
    map.start().expect("start should succeed");
    assert!(map.is_running());
    assert!(map.elapsed().is_some());
    assert!(map.start().is_err());

    map.stop().await;
}

#[tokio::test]
async fn intents_are_refused_before_start() {
    let map = populated_map(1, 2);
    let zone = map.zone(0).expect("zone 0");

    let rejected = zone.join(player(1)).await.expect_err("not running yet");
    assert_eq!(rejected.feedback_code(), FeedbackCode::NotRunning);
    let returned = rejected.combatant.expect("combatant handed back");
    assert_eq!(returned.id().0, 1);
    assert!(zone.snapshot().await.is_err());

    let placed = map.place(player(2)).await.expect_err("not running yet");
    assert_eq!(placed.feedback_code(), FeedbackCode::NotRunning);
    assert!(placed.feedback_code().is_retryable());
    assert!(placed.combatant.is_some());
}

#[tokio::test(start_paused = true)]
async fn elapsed_tracks_running_time() {
    let mut map = running_map(1, 1);
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;

    let elapsed = map.elapsed().expect("running map has a start marker");
    assert!(elapsed >= std::time::Duration::from_secs(3));

    map.stop().await;
    assert_eq!(map.phase(), MapPhase::Stopped);
    assert!(map.is_stop_requested());
}
