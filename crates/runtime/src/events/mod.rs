//! Topic-based event bus for outbound zone deltas.
//!
//! Zone workers publish to a topic; network sinks subscribe only to the
//! topics they forward.

mod bus;
mod types;

pub use bus::{EventBus, Topic};
pub use types::{CombatEvent, DiscardReason, Event, OptionEvent, ZoneEvent, ZoneRef};
