//! Experience, levels, level drain, and hit points.
//!
//! XP tables are cumulative thresholds: `table[i]` is the XP required to hold
//! level `i + 1`. Two different "levels" exist and callers must pick the right
//! one:
//!
//! - the XP-earned level is computed purely from XP and is never reduced by
//!   level drain (it unlocks HP rows and raises the grimoire retain cap);
//! - the effective level subtracts drained levels and feeds saves, BTH, and
//!   anything else drain is supposed to weaken.

use crate::num;
use serde::{Deserialize, Serialize};

/// Flat XP surcharge per level for each class beyond the first.
pub const MULTICLASS_BONUS_PER_CLASS: u64 = 100;

/// One class and the XP table it levels on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassProgression {
    pub class_name: String,
    /// Cumulative XP thresholds, one per level.
    #[serde(default)]
    pub xp_table: Vec<u64>,
}

impl ClassProgression {
    pub fn new(class_name: impl Into<String>, xp_table: Vec<u64>) -> Self {
        Self {
            class_name: class_name.into(),
            xp_table,
        }
    }
}

/// How a character's class (or classes) consume XP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassConfig {
    Single(ClassProgression),
    /// Two or three full classes; every threshold is the sum of the class
    /// tables plus a flat surcharge per extra class per level.
    Multi { classes: Vec<ClassProgression> },
    /// Primary class in full; the support class advances at half cost, each
    /// support level spread across two consecutive primary levels.
    ClassAndHalf {
        primary: ClassProgression,
        support: ClassProgression,
    },
}

impl Default for ClassConfig {
    fn default() -> Self {
        ClassConfig::Single(ClassProgression::new("", Vec::new()))
    }
}

impl ClassConfig {
    /// Names of every class in the configuration.
    pub fn class_names(&self) -> Vec<&str> {
        match self {
            ClassConfig::Single(c) => vec![c.class_name.as_str()],
            ClassConfig::Multi { classes } => {
                classes.iter().map(|c| c.class_name.as_str()).collect()
            }
            ClassConfig::ClassAndHalf { primary, support } => {
                vec![primary.class_name.as_str(), support.class_name.as_str()]
            }
        }
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.class_names()
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name))
    }

    /// The single table that drives level lookup for this configuration.
    pub fn effective_table(&self) -> Vec<u64> {
        match self {
            ClassConfig::Single(c) => c.xp_table.clone(),
            ClassConfig::Multi { classes } => combined_multiclass_table(classes),
            ClassConfig::ClassAndHalf { primary, support } => {
                class_and_half_table(&primary.xp_table, &support.xp_table)
            }
        }
    }
}

/// Sum the class tables level by level and add the per-level surcharge
/// (200 XP/level for two classes, 300 for three; never at level 1).
pub fn combined_multiclass_table(classes: &[ClassProgression]) -> Vec<u64> {
    if classes.is_empty() {
        return Vec::new();
    }
    let levels = classes.iter().map(|c| c.xp_table.len()).min().unwrap_or(0);
    let bonus = classes.len() as u64 * MULTICLASS_BONUS_PER_CLASS;

    (0..levels)
        .map(|i| {
            let base: u64 = classes.iter().map(|c| c.xp_table[i]).sum();
            base + i as u64 * bonus
        })
        .collect()
}

/// Blend a support class at half XP into a primary table.
///
/// The support requirement for its own level L splits in half: the first half
/// lands on primary level 2L, the second on primary level 2L+1. Level 1 is
/// the primary requirement alone.
pub fn class_and_half_table(primary: &[u64], support: &[u64]) -> Vec<u64> {
    primary
        .iter()
        .enumerate()
        .map(|(idx, &base)| {
            let level = idx + 1;
            if level < 2 {
                return base;
            }
            let support_level = level / 2;
            let Some(&req) = support.get(support_level - 1) else {
                return base;
            };
            let first_half = req / 2;
            let second_half = req - first_half;
            base + if level % 2 == 0 { first_half } else { second_half }
        })
        .collect()
}

/// Greatest 1-indexed level whose threshold the XP meets, scanning from the
/// top. Defaults to level 1 on an absent or empty table.
pub fn level_from_table(table: &[u64], xp: u64) -> u32 {
    for (idx, &threshold) in table.iter().enumerate().rev() {
        if xp >= threshold {
            return idx as u32 + 1;
        }
    }
    1
}

/// Level earned purely from XP. Level drain never reduces this.
pub fn xp_earned_level(config: &ClassConfig, current_xp: u64) -> u32 {
    level_from_table(&config.effective_table(), current_xp)
}

/// Earned level minus drained levels, floored at 1.
pub fn effective_level(config: &ClassConfig, current_xp: u64, level_drained: &[bool]) -> u32 {
    let drained = level_drained.iter().filter(|&&d| d).count() as u32;
    xp_earned_level(config, current_xp).saturating_sub(drained).max(1)
}

/// True when the player has earned a level they have not yet rolled HP for.
pub fn can_level_up(config: &ClassConfig, current_xp: u64, hp_rolls_by_level: &[i32]) -> bool {
    let rolled = hp_rolls_by_level.iter().filter(|&&r| r > 0).count() as u32;
    xp_earned_level(config, current_xp) > rolled
}

/// Percentage progress from the current level's threshold to the next,
/// clamped to [0, 100]. At the table's top the last entry is both ends, which
/// reads as 100%.
pub fn progress_percent(config: &ClassConfig, current_xp: u64) -> f64 {
    let table = config.effective_table();
    if table.is_empty() {
        return 0.0;
    }
    let level = level_from_table(&table, current_xp) as usize;
    let at_current = table[level - 1];
    let at_next = *table.get(level).unwrap_or(table.last().unwrap_or(&0));
    if at_next <= at_current {
        return 100.0;
    }
    let progress =
        (current_xp.saturating_sub(at_current)) as f64 / (at_next - at_current) as f64 * 100.0;
    num::clamp(progress, 0.0, 100.0)
}

// ============================================================================
// Hit points
// ============================================================================

/// Per-level raw die results, CON applied live.
///
/// An unrolled level (roll <= 0) or a drained level contributes nothing;
/// every rolled, active level contributes at least 1 HP no matter how bad the
/// CON modifier is. Because CON is re-applied on every recomputation, raising
/// or lowering CON retroactively changes every level's contribution.
pub fn max_hp(hp_rolls_by_level: &[i32], level_drained: &[bool], con_mod: i32, hp_bonus: i32) -> i32 {
    let rolled: i32 = hp_rolls_by_level
        .iter()
        .enumerate()
        .map(|(idx, &roll)| {
            if roll <= 0 || level_drained.get(idx).copied().unwrap_or(false) {
                0
            } else {
                (roll + con_mod).max(1)
            }
        })
        .sum();
    rolled + hp_bonus
}
