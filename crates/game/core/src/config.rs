/// Game configuration constants and tunable combat parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Damage formula parameters shared by every combatant.
    pub combat: CombatParams,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of options (buffs/debuffs) a single combatant can hold.
    pub const MAX_OPTIONS: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_DEFENSE_DIVISOR: u32 = 2;
    pub const DEFAULT_MINIMUM_DAMAGE: u32 = 1;

    pub fn new() -> Self {
        Self {
            combat: CombatParams::default(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Balance parameters for [`crate::combat::calculate_damage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatParams {
    /// Effective defense is divided by this before being subtracted.
    pub defense_divisor: u32,
    /// Floor applied to the calculated (pre-behavior) damage.
    pub minimum: u32,
}

impl Default for CombatParams {
    fn default() -> Self {
        Self {
            defense_divisor: GameConfig::DEFAULT_DEFENSE_DIVISOR,
            minimum: GameConfig::DEFAULT_MINIMUM_DAMAGE,
        }
    }
}
