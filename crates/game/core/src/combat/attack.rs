//! Attack-type strategies.
//!
//! Every attack type is one [`AttackBehavior`] implementation. A behavior
//! takes the attacker's base damage (from [`Combatant::calculate_damage`]) and
//! applies a linear, type-specific adjustment. The adjustment only sees the
//! base number, so behaviors can be tested with a fixed input.
//!
//! New attack types are added by registering another behavior in an
//! [`AttackRegistry`]; existing behaviors are never extended with branches.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::stats::DamageReport;

use super::combatant::Combatant;

/// Fixed bonus added to melee hits.
pub const MELEE_BONUS: u32 = 1;

/// Fixed penalty subtracted from ranged hits.
pub const RANGED_PENALTY: u32 = 2;

/// Attack type selector carried by attack intents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AttackType {
    Melee,
    Ranged,
}

/// Damage adjustment and application for one attack type.
pub trait AttackBehavior: Send + Sync + fmt::Debug {
    fn attack_type(&self) -> AttackType;

    /// Adjusts a base damage value. Never negative: a penalty larger than the
    /// base yields zero rather than healing the target.
    fn adjust(&self, base: u32) -> u32;

    /// Base damage from the attacker, adjusted for this attack type.
    fn resolve(&self, attacker: &dyn Combatant, target: &dyn Combatant) -> u32 {
        self.adjust(attacker.calculate_damage(target))
    }

    /// Resolves the damage and applies it to `target`.
    fn execute(&self, attacker: &dyn Combatant, target: &mut dyn Combatant) -> DamageReport {
        let damage = self.resolve(attacker, &*target);
        target.take_damage(damage)
    }
}

/// Close-range attack with a flat bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeleeAttack {
    pub bonus: u32,
}

impl Default for MeleeAttack {
    fn default() -> Self {
        Self { bonus: MELEE_BONUS }
    }
}

impl AttackBehavior for MeleeAttack {
    fn attack_type(&self) -> AttackType {
        AttackType::Melee
    }

    fn adjust(&self, base: u32) -> u32 {
        base.saturating_add(self.bonus)
    }
}

/// Long-range attack, slightly weaker than the base damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangedAttack {
    pub penalty: u32,
}

impl Default for RangedAttack {
    fn default() -> Self {
        Self {
            penalty: RANGED_PENALTY,
        }
    }
}

impl AttackBehavior for RangedAttack {
    fn attack_type(&self) -> AttackType {
        AttackType::Ranged
    }

    fn adjust(&self, base: u32) -> u32 {
        base.saturating_sub(self.penalty)
    }
}

/// Maps attack types to their behavior.
#[derive(Clone, Debug, Default)]
pub struct AttackRegistry {
    behaviors: HashMap<AttackType, Arc<dyn AttackBehavior>>,
}

impl AttackRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`MeleeAttack`] and [`RangedAttack`] at their default constants.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MeleeAttack::default());
        registry.register(RangedAttack::default());
        registry
    }

    /// Registers `behavior` under its own attack type, replacing any previous one.
    pub fn register(&mut self, behavior: impl AttackBehavior + 'static) -> &mut Self {
        self.behaviors
            .insert(behavior.attack_type(), Arc::new(behavior));
        self
    }

    pub fn get(&self, attack_type: AttackType) -> Option<&dyn AttackBehavior> {
        self.behaviors.get(&attack_type).map(|b| b.as_ref())
    }

    pub fn contains(&self, attack_type: AttackType) -> bool {
        self.behaviors.contains_key(&attack_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{Character, CombatantId, Npc};
    use crate::stats::CharacterStats;
    use proptest::prelude::*;
    use strum::IntoEnumIterator;

    fn archer(attack: u32) -> Character {
        Character::new(CombatantId(1), "archer", CharacterStats::new(50, attack, 0))
    }

    fn dummy(defense: u32) -> Npc {
        Npc::new(CombatantId(2), 9, 0, CharacterStats::new(1_000, 0, defense))
    }

    #[test]
    fn ranged_penalty_clamps_at_zero() {
        let ranged = RangedAttack::default();
        assert_eq!(ranged.adjust(10), 8);
        assert_eq!(ranged.adjust(1), 0);
        assert_eq!(ranged.adjust(0), 0);
    }

    #[test]
    fn melee_adds_bonus() {
        assert_eq!(MeleeAttack::default().adjust(10), 11);
        assert_eq!(MeleeAttack { bonus: 4 }.adjust(u32::MAX), u32::MAX);
    }

    #[test]
    fn execute_applies_adjusted_damage() {
        let attacker = archer(12);
        let mut target = dummy(4);

        let report = RangedAttack::default().execute(&attacker, &mut target);

        // (12 - 4 / 2) - 2
        assert_eq!(report.amount, 8);
        assert_eq!(target.stats().health(), 992);
    }

    #[test]
    fn defaults_cover_every_attack_type() {
        let registry = AttackRegistry::with_defaults();
        for attack_type in AttackType::iter() {
            let behavior = registry.get(attack_type).expect("registered");
            assert_eq!(behavior.attack_type(), attack_type);
        }
    }

    #[test]
    fn register_replaces_existing_behavior() {
        let mut registry = AttackRegistry::with_defaults();
        registry.register(RangedAttack { penalty: 5 });
        assert_eq!(registry.get(AttackType::Ranged).unwrap().adjust(10), 5);
        assert!(AttackRegistry::new().get(AttackType::Melee).is_none());
    }

    proptest! {
        #[test]
        fn ranged_applied_damage_is_base_minus_penalty(attack in 0u32..500, defense in 0u32..500) {
            let attacker = archer(attack);
            let mut target = dummy(defense);
            let base = attacker.calculate_damage(&target);

            let report = RangedAttack::default().execute(&attacker, &mut target);

            prop_assert_eq!(report.amount, base.saturating_sub(RANGED_PENALTY));
        }
    }
}
