//! Async session layer for map instances and their zones.
//!
//! This crate turns the synchronous combat model of `game-core` into running
//! map sessions. Consumers open maps through [`MapManager`] (or drive a
//! [`Map`] directly), send intents to [`Zone`] handles, and subscribe to the
//! resulting deltas on the [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`map`] hosts the map state machine, zone handles and the map registry
//! - [`api`] exposes the error and feedback types downstream clients see
//! - [`events`] provides the topic-based event bus for outbound deltas
//! - [`config`] loads runtime tuning from the environment
//! - `workers` keeps the per-zone tick tasks internal to the crate
pub mod api;
pub mod config;
pub mod events;
pub mod map;

mod workers;

pub use api::{FeedbackCode, JoinRejected, Result, RuntimeError};
pub use config::RuntimeConfig;
pub use events::{
    CombatEvent, DiscardReason, Event, EventBus, OptionEvent, Topic, ZoneEvent, ZoneRef,
};
pub use map::{
    AttackIntent, CombatantView, Map, MapId, MapManager, MapPhase, Zone, ZoneSnapshot,
};
pub use workers::ZoneStats;
