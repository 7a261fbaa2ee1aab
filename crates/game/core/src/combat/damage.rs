//! Damage calculation.

use crate::config::CombatParams;

/// Calculate damage from an attack.
///
/// # Formula
///
/// ```text
/// base_damage = attack + bonus
/// reduced_damage = base_damage - (defense / defense_divisor)
/// final_damage = max(reduced_damage, minimum)
/// ```
///
/// Balance parameters come from [`CombatParams`]:
/// - Defense divisor (default: 2)
/// - Minimum damage (default: 1)
///
/// # Arguments
///
/// * `attack` - Attacker's effective attack (base + options)
/// * `bonus` - Attacker-specific flat bonus (weapon damage, NPC level)
/// * `defense` - Defender's effective defense (base + options)
/// * `params` - Balance parameters
///
/// # Returns
///
/// Damage before any attack-behavior adjustment
pub fn calculate_damage(attack: u32, bonus: u32, defense: u32, params: &CombatParams) -> u32 {
    let base_damage = attack.saturating_add(bonus);

    // A zero divisor would mean "defense does nothing"
    let reduction = defense.checked_div(params.defense_divisor).unwrap_or(0);
    let reduced_damage = base_damage.saturating_sub(reduction);

    reduced_damage.max(params.minimum)
}
