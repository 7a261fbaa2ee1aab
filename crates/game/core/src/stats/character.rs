use super::StatKind;

/// Mutable health/attribute record owned by exactly one combatant.
///
/// Health is unsigned and only ever lowered through [`Self::take_damage`],
/// which saturates at zero. Liveness is derived from health on every call.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterStats {
    health: u32,
    max_health: u32,
    pub attack: u32,
    pub defense: u32,
}

impl CharacterStats {
    /// Creates stats at full health.
    pub fn new(max_health: u32, attack: u32, defense: u32) -> Self {
        Self {
            health: max_health,
            max_health,
            attack,
            defense,
        }
    }

    /// Overrides current health (clamped to the maximum).
    pub fn with_health(mut self, health: u32) -> Self {
        self.health = health.min(self.max_health);
        self
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    /// `health > 0`.
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Base value of an attribute, before options.
    pub fn base(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
        }
    }

    /// Subtracts `amount` from health, flooring at zero.
    ///
    /// Has no effect once the owner is dead, so repeated hits on a corpse
    /// report `amount: 0` and never re-trigger the death transition.
    pub fn take_damage(&mut self, amount: u32) -> DamageReport {
        let hp_before = self.health;
        if hp_before == 0 {
            return DamageReport {
                amount: 0,
                hp_before,
                hp_after: 0,
                died: false,
            };
        }

        self.health = hp_before.saturating_sub(amount);

        DamageReport {
            amount: hp_before - self.health,
            hp_before,
            hp_after: self.health,
            died: self.health == 0,
        }
    }
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self::new(100, 10, 5)
    }
}

/// Outcome of a single damage application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageReport {
    /// Health actually removed (less than requested when overkilling).
    pub amount: u32,
    pub hp_before: u32,
    pub hp_after: u32,
    /// True only on the hit that moved health from positive to zero.
    pub died: bool,
}

impl DamageReport {
    /// True if health changed.
    pub fn changed(&self) -> bool {
        self.hp_before != self.hp_after
    }
}
