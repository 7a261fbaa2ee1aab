//! Combat resolution system.
//!
//! # Architecture
//!
//! - **Combatant**: capability trait over a stat record and an option set
//! - **Damage formula**: pure function over effective attributes
//! - **Attack behaviors**: one strategy per attack type, looked up through
//!   [`AttackRegistry`]
//!
//! # Core Functions
//!
//! - `calculate_damage`: attack/defense formula shared by every combatant
//! - `AttackBehavior::resolve`: base damage adjusted for the attack type
//! - `AttackBehavior::execute`: resolve and apply to the target

pub mod attack;
pub mod combatant;
pub mod damage;

pub use attack::{
    AttackBehavior, AttackRegistry, AttackType, MELEE_BONUS, MeleeAttack, RANGED_PENALTY,
    RangedAttack,
};
pub use combatant::{Character, Combatant, CombatantId, CombatantKind, Npc};
pub use damage::calculate_damage;
