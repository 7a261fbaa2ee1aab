//! Combatant capability and its player/non-player implementations.

use core::fmt;

use crate::config::CombatParams;
use crate::options::OptionSet;
use crate::stats::{CharacterStats, DamageReport, StatKind};

use super::damage::calculate_damage;

/// Identifier of a combatant, assigned by the entity system that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u64);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Player character or non-player entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CombatantKind {
    Player,
    Npc,
}

/// Anything that can deal and receive damage.
///
/// Implementors only provide access to their data ([`CharacterStats`] and
/// [`OptionSet`]) and their damage formula; liveness and damage application
/// are derived from the stats so they can never disagree with health.
pub trait Combatant: Send + fmt::Debug {
    fn id(&self) -> CombatantId;

    fn kind(&self) -> CombatantKind;

    fn stats(&self) -> &CharacterStats;

    fn stats_mut(&mut self) -> &mut CharacterStats;

    fn options(&self) -> &OptionSet;

    fn options_mut(&mut self) -> &mut OptionSet;

    /// Damage this combatant would deal to `target` with no attack-type
    /// adjustment. Must not mutate either side.
    fn calculate_damage(&self, target: &dyn Combatant) -> u32;

    /// `health > 0`.
    fn is_alive(&self) -> bool {
        self.stats().is_alive()
    }

    /// Attribute value including active options.
    fn effective(&self, stat: StatKind) -> u32 {
        self.options().effective(stat, self.stats().base(stat))
    }

    /// Applies damage, flooring health at zero. No effect once dead.
    fn take_damage(&mut self, amount: u32) -> DamageReport {
        self.stats_mut().take_damage(amount)
    }
}

/// Player character.
#[derive(Clone, Debug)]
pub struct Character {
    id: CombatantId,
    pub name: String,
    stats: CharacterStats,
    options: OptionSet,
    /// Flat damage added by the equipped weapon.
    pub weapon_damage: u32,
    pub params: CombatParams,
}

impl Character {
    pub fn new(id: CombatantId, name: impl Into<String>, stats: CharacterStats) -> Self {
        Self {
            id,
            name: name.into(),
            stats,
            options: OptionSet::new(),
            weapon_damage: 0,
            params: CombatParams::default(),
        }
    }

    pub fn with_weapon(mut self, weapon_damage: u32) -> Self {
        self.weapon_damage = weapon_damage;
        self
    }

    pub fn with_params(mut self, params: CombatParams) -> Self {
        self.params = params;
        self
    }
}

impl Combatant for Character {
    fn id(&self) -> CombatantId {
        self.id
    }

    fn kind(&self) -> CombatantKind {
        CombatantKind::Player
    }

    fn stats(&self) -> &CharacterStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CharacterStats {
        &mut self.stats
    }

    fn options(&self) -> &OptionSet {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OptionSet {
        &mut self.options
    }

    fn calculate_damage(&self, target: &dyn Combatant) -> u32 {
        calculate_damage(
            self.effective(StatKind::Attack),
            self.weapon_damage,
            target.effective(StatKind::Defense),
            &self.params,
        )
    }
}

/// Non-player entity spawned from a template.
#[derive(Clone, Debug)]
pub struct Npc {
    id: CombatantId,
    pub template: u16,
    /// Added to attack when dealing damage.
    pub level: u32,
    stats: CharacterStats,
    options: OptionSet,
    pub params: CombatParams,
}

impl Npc {
    pub fn new(id: CombatantId, template: u16, level: u32, stats: CharacterStats) -> Self {
        Self {
            id,
            template,
            level,
            stats,
            options: OptionSet::new(),
            params: CombatParams::default(),
        }
    }

    pub fn with_params(mut self, params: CombatParams) -> Self {
        self.params = params;
        self
    }
}

impl Combatant for Npc {
    fn id(&self) -> CombatantId {
        self.id
    }

    fn kind(&self) -> CombatantKind {
        CombatantKind::Npc
    }

    fn stats(&self) -> &CharacterStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CharacterStats {
        &mut self.stats
    }

    fn options(&self) -> &OptionSet {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OptionSet {
        &mut self.options
    }

    fn calculate_damage(&self, target: &dyn Combatant) -> u32 {
        calculate_damage(
            self.effective(StatKind::Attack),
            self.level,
            target.effective(StatKind::Defense),
            &self.params,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{OptionId, OptionItem, StackingRules};

    fn knight() -> Character {
        Character::new(CombatantId(1), "knight", CharacterStats::new(100, 10, 4)).with_weapon(5)
    }

    fn goblin() -> Npc {
        Npc::new(CombatantId(2), 0, 3, CharacterStats::new(30, 6, 6))
    }

    #[test]
    fn player_adds_weapon_damage() {
        // (10 + 5) - 6 / 2
        assert_eq!(knight().calculate_damage(&goblin()), 12);
    }

    #[test]
    fn npc_adds_level() {
        // (6 + 3) - 4 / 2
        assert_eq!(goblin().calculate_damage(&knight()), 7);
    }

    #[test]
    fn options_on_both_sides_feed_the_formula() {
        let rules = StackingRules::default();
        let mut attacker = knight();
        let mut target = goblin();

        attacker
            .options_mut()
            .apply(&OptionItem::buff(OptionId(1), StatKind::Attack, 4), &rules)
            .unwrap();
        target
            .options_mut()
            .apply(&OptionItem::debuff(OptionId(2), StatKind::Defense, 6), &rules)
            .unwrap();

        // (14 + 5) - 0 / 2
        assert_eq!(attacker.calculate_damage(&target), 19);
    }

    #[test]
    fn calculate_damage_is_pure() {
        let attacker = knight();
        let target = goblin();
        let first = attacker.calculate_damage(&target);
        let second = attacker.calculate_damage(&target);
        assert_eq!(first, second);
        assert_eq!(target.stats().health(), 30);
    }

    #[test]
    fn liveness_tracks_health() {
        let mut target = goblin();
        assert!(target.is_alive());
        let report = target.take_damage(30);
        assert!(report.died);
        assert!(!target.is_alive());
        assert_eq!(target.take_damage(10).amount, 0);
    }
}
