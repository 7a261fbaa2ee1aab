//! Worker tasks that back the map orchestration.
//!
//! Each zone of a running map is driven by one [`ZoneWorker`] task that owns
//! the zone's combatants and resolves its combat queue.

mod zone;

pub use zone::ZoneStats;
pub(crate) use zone::{ZoneCommand, ZoneWorker};
