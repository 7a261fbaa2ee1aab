mod common;

use common::{npc, player, running_map};
use game_core::CombatantId;
use runtime::{FeedbackCode, RuntimeError, Topic, Event, ZoneEvent};

#[tokio::test]
async fn first_fit_prefers_lowest_index_with_room() {
    let mut map = running_map(3, 2);

    map.zone(0).expect("zone 0").join(player(1)).await.expect("join zone 0");
    let zone = map.get_zone_not_max_player().expect("room left");
    assert_eq!(zone.index(), 0);

    let mut next_id = 2;
    for zone in map.zones() {
        while !zone.is_full() {
            zone.join(player(next_id)).await.expect("zone has room");
            next_id += 1;
        }
    }
    assert!(map.zones().iter().all(|zone| zone.len() == 2));
    assert!(map.get_zone_not_max_player().is_none());

    map.stop().await;
}

#[tokio::test]
async fn joining_a_full_zone_is_rejected_and_count_is_unchanged() {
    let mut map = running_map(1, 2);
    let zone = map.zone(0).expect("zone 0");

    zone.join(player(1)).await.expect("first join");
    zone.join(player(2)).await.expect("second join");

    let rejected = zone.join(player(3)).await.expect_err("zone is full");
    assert!(matches!(
        rejected.error,
        RuntimeError::ZoneFull {
            zone: 0,
            max_players: 2
        }
    ));
    assert_eq!(rejected.feedback_code(), FeedbackCode::ZoneFull);
    assert_eq!(
        rejected.combatant.as_ref().map(|combatant| combatant.id()),
        Some(CombatantId(3))
    );
    assert_eq!(zone.len(), 2);
    assert_eq!(zone.snapshot().await.expect("snapshot").combatants.len(), 2);

    map.stop().await;
}

#[tokio::test]
async fn place_fills_zones_in_order_then_reports_map_full() {
    let mut map = running_map(2, 2);

    let mut placed = Vec::new();
    for id in 1..=4 {
        placed.push(map.place(player(id)).await.expect("room left"));
    }
    assert_eq!(placed, vec![0, 0, 1, 1]);
    assert_eq!(map.player_count(), 4);

    let rejected = map.place(player(5)).await.expect_err("map is full");
    assert_eq!(rejected.feedback_code(), FeedbackCode::MapFull);
    assert!(rejected.combatant.is_some());

    map.stop().await;
}

#[tokio::test]
async fn a_combatant_is_placed_in_at_most_one_zone() {
    let mut map = running_map(2, 2);

    map.zone(0).expect("zone 0").join(player(1)).await.expect("join zone 0");
    let rejected = map
        .zone(1)
        .expect("zone 1")
        .join(player(1))
        .await
        .expect_err("duplicate id");

    assert!(matches!(
        rejected.error,
        RuntimeError::AlreadyPlaced {
            id: CombatantId(1),
            zone: 0
        }
    ));
    assert_eq!(rejected.feedback_code(), FeedbackCode::AlreadyPlaced);
    assert_eq!(map.zone(1).expect("zone 1").len(), 0);
    assert_eq!(map.zone_of(CombatantId(1)).map(|zone| zone.index()), Some(0));

    // Rejoining the zone that already holds it leaves the roster untouched.
    let zone = map.zone(0).expect("zone 0");
    let again = zone.join(player(1)).await.expect_err("already here");
    assert!(matches!(again.error, RuntimeError::AlreadyPlaced { zone: 0, .. }));
    assert_eq!(zone.len(), 1);
    assert_eq!(zone.snapshot().await.expect("snapshot").combatants.len(), 1);

    map.stop().await;
}

#[tokio::test]
async fn leave_hands_the_combatant_back() {
    let mut map = running_map(2, 1);
    let mut zone_events = map.subscribe(Topic::Zone);

    assert!(map.get_zone_player().is_none());
    assert_eq!(map.place(npc(5, 2, 100)).await.expect("placed"), 0);
    assert_eq!(map.get_zone_player().map(|zone| zone.index()), Some(0));

    let zone = map.zone(0).expect("zone 0");
    let left = zone
        .leave(CombatantId(5))
        .await
        .expect("zone is running")
        .expect("combatant was present");
    assert_eq!(left.id(), CombatantId(5));
    assert!(zone.is_empty());
    assert!(map.zone_of(CombatantId(5)).is_none());
    assert!(zone.leave(CombatantId(5)).await.expect("zone is running").is_none());

    // Cross-zone transfer is leave then join.
    map.zone(1).expect("zone 1").join(left).await.expect("join zone 1");
    assert_eq!(map.zone_of(CombatantId(5)).map(|zone| zone.index()), Some(1));

    let mut seen = Vec::new();
    while let Ok(event) = zone_events.try_recv() {
        seen.push(event);
    }
    assert!(matches!(seen[0], Event::Zone(ZoneEvent::CombatantJoined { .. })));
    assert!(matches!(seen[1], Event::Zone(ZoneEvent::CombatantLeft { .. })));
    assert!(matches!(seen[2], Event::Zone(ZoneEvent::CombatantJoined { .. })));

    map.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_placements_never_overfill_a_zone() {
    let mut map = running_map(2, 2);

    // Every call sees zone 0 with room, so the losers retry further along.
    let results = tokio::join!(
        map.place(player(1)),
        map.place(player(2)),
        map.place(player(3)),
        map.place(player(4)),
        map.place(player(5)),
        map.place(player(6)),
    );
    let results = [results.0, results.1, results.2, results.3, results.4, results.5];

    let mut per_zone = [0usize; 2];
    let mut map_full = 0;
    for result in results {
        match result {
            Ok(index) => per_zone[index] += 1,
            Err(rejected) => {
                assert_eq!(rejected.feedback_code(), FeedbackCode::MapFull);
                assert!(rejected.combatant.is_some());
                map_full += 1;
            }
        }
    }
    assert_eq!(per_zone, [2, 2]);
    assert_eq!(map_full, 2);
    assert!(map.zones().iter().all(|zone| zone.len() <= zone.max_players()));
    assert_eq!(map.player_count(), 4);

    map.stop().await;
}
