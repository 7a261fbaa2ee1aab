//! Deterministic combat model shared by the session runtime.
//!
//! `game-core` defines the combatant contract, the damage formula, the
//! attack-type strategies and the buff/debuff model. Everything here is
//! synchronous and side-effect free apart from explicit `&mut` mutation, so the
//! runtime's zone workers can call it from inside a tick without awaiting.
pub mod combat;
pub mod config;
pub mod error;
pub mod layout;
pub mod options;
pub mod stats;

pub use combat::{
    AttackBehavior, AttackRegistry, AttackType, Character, Combatant, CombatantId, CombatantKind,
    MeleeAttack, Npc, RangedAttack, calculate_damage,
};
pub use config::{CombatParams, GameConfig};
pub use error::{ErrorSeverity, GameError};
pub use layout::{LayoutError, TileLayout, TileLayoutSource};
pub use options::{
    ApplyOutcome, OptionCategory, OptionDuration, OptionError, OptionId, OptionItem, OptionSet,
    StackPolicy, StackingRules,
};
pub use stats::{CharacterStats, DamageReport, StatKind};
