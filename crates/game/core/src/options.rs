//! Timed stat modifiers (buffs and debuffs) attached to combatants.
//!
//! An [`OptionItem`] is a plain value. Attaching it to a combatant copies it
//! into that combatant's [`OptionSet`], so every instance counts its own
//! duration down independently of the source it came from.
//!
//! # Stacking
//!
//! Stackable options append a new instance on every application. A
//! non-stackable option whose id is already present follows the
//! [`StackPolicy`] configured for its category:
//! - [`StackPolicy::Refresh`] replaces the existing instance's duration
//! - [`StackPolicy::Reject`] leaves the existing instance untouched

use arrayvec::ArrayVec;

use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::stats::StatKind;

/// Identifier shared by every instance of the same option.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionId(pub u32);

/// Remaining lifetime of an option instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionDuration {
    /// Never expires.
    Permanent,
    /// Milliseconds left before the option is removed.
    Timed(u64),
}

impl OptionDuration {
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent)
    }

    /// Counts down by `elapsed_ms`; returns true once the duration is spent.
    fn advance(&mut self, elapsed_ms: u64) -> bool {
        match self {
            Self::Permanent => false,
            Self::Timed(remaining) => {
                *remaining = remaining.saturating_sub(elapsed_ms);
                *remaining == 0
            }
        }
    }
}

/// Buff/debuff classification. Buffs raise the target stat, debuffs lower it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum OptionCategory {
    Buff,
    Debuff,
}

/// A single timed modifier.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionItem {
    pub id: OptionId,
    /// Magnitude applied to `stat`.
    pub param: i32,
    pub duration: OptionDuration,
    pub category: OptionCategory,
    pub stat: StatKind,
    pub stackable: bool,
}

impl OptionItem {
    /// Permanent, stackable buff.
    pub fn buff(id: OptionId, stat: StatKind, param: i32) -> Self {
        Self {
            id,
            param,
            duration: OptionDuration::Permanent,
            category: OptionCategory::Buff,
            stat,
            stackable: true,
        }
    }

    /// Permanent, stackable debuff.
    pub fn debuff(id: OptionId, stat: StatKind, param: i32) -> Self {
        Self {
            category: OptionCategory::Debuff,
            ..Self::buff(id, stat, param)
        }
    }

    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration = OptionDuration::Timed(ms);
        self
    }

    pub fn non_stackable(mut self) -> Self {
        self.stackable = false;
        self
    }

    /// Signed contribution to the target stat.
    pub fn modifier(&self) -> i64 {
        match self.category {
            OptionCategory::Buff => i64::from(self.param),
            OptionCategory::Debuff => -i64::from(self.param),
        }
    }
}

/// What to do with a non-stackable option that is already active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackPolicy {
    /// Replace the active instance's duration with the new one.
    #[default]
    Refresh,
    /// Keep the active instance, discard the new one.
    Reject,
}

impl core::str::FromStr for StackPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refresh" => Ok(Self::Refresh),
            "reject" => Ok(Self::Reject),
            _ => Err(()),
        }
    }
}

/// Per-category stacking policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackingRules {
    pub buff: StackPolicy,
    pub debuff: StackPolicy,
}

impl StackingRules {
    /// Same policy for every category.
    pub const fn uniform(policy: StackPolicy) -> Self {
        Self {
            buff: policy,
            debuff: policy,
        }
    }

    pub const fn policy_for(&self, category: OptionCategory) -> StackPolicy {
        match category {
            OptionCategory::Buff => self.buff,
            OptionCategory::Debuff => self.debuff,
        }
    }
}

/// Successful application result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ApplyOutcome {
    /// A new instance was attached.
    Added,
    /// An existing non-stackable instance had its duration replaced.
    Refreshed { previous: OptionDuration },
}

/// Option application failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("option {id:?} is already active and its category rejects duplicates")]
    Rejected { id: OptionId },

    #[error("option slots exhausted (capacity {capacity})")]
    Full { capacity: usize },
}

impl GameError for OptionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Rejected { .. } => ErrorSeverity::Validation,
            Self::Full { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "OPTION_REJECTED",
            Self::Full { .. } => "OPTION_FULL",
        }
    }
}

/// Options currently attached to one combatant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionSet {
    items: ArrayVec<OptionItem, { GameConfig::MAX_OPTIONS }>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a copy of `option` following the stacking rules.
    pub fn apply(
        &mut self,
        option: &OptionItem,
        rules: &StackingRules,
    ) -> Result<ApplyOutcome, OptionError> {
        if !option.stackable
            && let Some(existing) = self.items.iter_mut().find(|o| o.id == option.id)
        {
            return match rules.policy_for(option.category) {
                StackPolicy::Refresh => {
                    let previous = existing.duration;
                    existing.duration = option.duration;
                    Ok(ApplyOutcome::Refreshed { previous })
                }
                StackPolicy::Reject => Err(OptionError::Rejected { id: option.id }),
            };
        }

        self.items
            .try_push(option.clone())
            .map_err(|_| OptionError::Full {
                capacity: GameConfig::MAX_OPTIONS,
            })?;
        Ok(ApplyOutcome::Added)
    }

    /// Sum of active modifiers on `stat`.
    pub fn modifier(&self, stat: StatKind) -> i64 {
        self.items
            .iter()
            .filter(|o| o.stat == stat)
            .map(OptionItem::modifier)
            .sum()
    }

    /// `base` adjusted by every active option on `stat`, floored at zero.
    pub fn effective(&self, stat: StatKind, base: u32) -> u32 {
        let value = i64::from(base) + self.modifier(stat);
        value.clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Counts every timed option down and removes those whose duration is spent.
    ///
    /// Returns the removed instances in attachment order.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<OptionItem> {
        let mut expired = Vec::new();
        let mut index = 0;
        while index < self.items.len() {
            if self.items[index].duration.advance(elapsed_ms) {
                expired.push(self.items.remove(index));
            } else {
                index += 1;
            }
        }
        expired
    }

    /// Number of active instances of `id`.
    pub fn count(&self, id: OptionId) -> usize {
        self.items.iter().filter(|o| o.id == id).count()
    }

    /// First active instance of `id`.
    pub fn get(&self, id: OptionId) -> Option<&OptionItem> {
        self.items.iter().find(|o| o.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASTE: OptionId = OptionId(1);
    const SUNDER: OptionId = OptionId(2);

    fn haste(ms: u64) -> OptionItem {
        OptionItem::buff(HASTE, StatKind::Attack, 5)
            .with_duration_ms(ms)
            .non_stackable()
    }

    #[test]
    fn non_stackable_refresh_keeps_single_instance() {
        let mut set = OptionSet::new();
        let rules = StackingRules::default();

        assert_eq!(set.apply(&haste(1_000), &rules), Ok(ApplyOutcome::Added));
        assert_eq!(
            set.apply(&haste(3_000), &rules),
            Ok(ApplyOutcome::Refreshed {
                previous: OptionDuration::Timed(1_000)
            })
        );

        assert_eq!(set.count(HASTE), 1);
        assert_eq!(set.get(HASTE).unwrap().duration, OptionDuration::Timed(3_000));
    }

    #[test]
    fn non_stackable_reject_policy() {
        let mut set = OptionSet::new();
        let rules = StackingRules {
            buff: StackPolicy::Reject,
            debuff: StackPolicy::Refresh,
        };

        set.apply(&haste(1_000), &rules).unwrap();
        assert_eq!(
            set.apply(&haste(3_000), &rules),
            Err(OptionError::Rejected { id: HASTE })
        );
        assert_eq!(set.get(HASTE).unwrap().duration, OptionDuration::Timed(1_000));
    }

    #[test]
    fn stackable_options_accumulate() {
        let mut set = OptionSet::new();
        let rules = StackingRules::default();
        let sunder = OptionItem::debuff(SUNDER, StatKind::Defense, 3);

        set.apply(&sunder, &rules).unwrap();
        set.apply(&sunder, &rules).unwrap();

        assert_eq!(set.count(SUNDER), 2);
        assert_eq!(set.modifier(StatKind::Defense), -6);
        assert_eq!(set.effective(StatKind::Defense, 4), 0);
        assert_eq!(set.effective(StatKind::Defense, 10), 4);
    }

    #[test]
    fn applied_copies_do_not_alias() {
        let mut a = OptionSet::new();
        let mut b = OptionSet::new();
        let source = haste(500);
        let rules = StackingRules::default();

        a.apply(&source, &rules).unwrap();
        b.apply(&source, &rules).unwrap();
        a.advance(400);

        assert_eq!(a.get(HASTE).unwrap().duration, OptionDuration::Timed(100));
        assert_eq!(b.get(HASTE).unwrap().duration, OptionDuration::Timed(500));
        assert_eq!(source.duration, OptionDuration::Timed(500));
    }

    #[test]
    fn advance_expires_timed_but_not_permanent() {
        let mut set = OptionSet::new();
        let rules = StackingRules::default();
        set.apply(&haste(100), &rules).unwrap();
        set.apply(&OptionItem::buff(SUNDER, StatKind::Defense, 1), &rules)
            .unwrap();

        assert!(set.advance(99).is_empty());
        let expired = set.advance(1);

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, HASTE);
        assert_eq!(set.len(), 1);
        assert!(set.get(SUNDER).unwrap().duration.is_permanent());
    }

    #[test]
    fn full_set_reports_capacity() {
        let mut set = OptionSet::new();
        let rules = StackingRules::default();
        let item = OptionItem::buff(SUNDER, StatKind::Attack, 1);
        for _ in 0..GameConfig::MAX_OPTIONS {
            set.apply(&item, &rules).unwrap();
        }
        assert_eq!(
            set.apply(&item, &rules),
            Err(OptionError::Full {
                capacity: GameConfig::MAX_OPTIONS
            })
        );
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("Refresh".parse::<StackPolicy>(), Ok(StackPolicy::Refresh));
        assert_eq!(" reject ".parse::<StackPolicy>(), Ok(StackPolicy::Reject));
        assert!("merge".parse::<StackPolicy>().is_err());
    }
}
