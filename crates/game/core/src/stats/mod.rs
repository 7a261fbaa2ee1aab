//! Combatant stat record.
//!
//! [`CharacterStats`] is the only stored stat state: health plus the base
//! offensive/defensive attributes. Effective attributes (base + options) are
//! never stored; they are recomputed from the combatant's
//! [`OptionSet`](crate::options::OptionSet) whenever damage is calculated.

mod character;

pub use character::{CharacterStats, DamageReport};

/// Attribute an option can modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum StatKind {
    /// Offensive attribute feeding damage calculation.
    Attack,
    /// Defensive attribute reducing incoming damage.
    Defense,
}
