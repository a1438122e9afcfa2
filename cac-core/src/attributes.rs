//! Attribute scores and the SIEGE modifier table.
//!
//! Castles & Crusades derives an ability modifier from a step table, not from
//! the linear `(score - 10) / 2` formula other d20 games use. The table here
//! is authoritative.

use crate::num;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Str => "STR",
            Ability::Dex => "DEX",
            Ability::Con => "CON",
            Ability::Int => "INT",
            Ability::Wis => "WIS",
            Ability::Cha => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Str => "Strength",
            Ability::Dex => "Dexterity",
            Ability::Con => "Constitution",
            Ability::Int => "Intelligence",
            Ability::Wis => "Wisdom",
            Ability::Cha => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Str,
            Ability::Dex,
            Ability::Con,
            Ability::Int,
            Ability::Wis,
            Ability::Cha,
        ]
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// The C&C attribute modifier step table.
///
/// Non-decreasing over all scores; approximating it with a formula produces
/// wrong values at several breakpoints.
pub fn attribute_modifier(total: i32) -> i32 {
    match total {
        i32::MIN..=1 => -4,
        2..=3 => -3,
        4..=5 => -2,
        6..=8 => -1,
        9..=12 => 0,
        13..=15 => 1,
        16..=17 => 2,
        18..=19 => 3,
        20..=21 => 4,
        22..=23 => 5,
        24..=25 => 6,
        26..=27 => 7,
        28 => 8,
        29 => 9,
        _ => 10,
    }
}

/// One ability score as stored on a character.
///
/// `rolled_score` is the raw roll; race/class/item contributions are applied
/// at derivation time so they follow the character's current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default = "default_score", deserialize_with = "num::int_or_zero")]
    pub rolled_score: i32,
    /// Manual bonus/penalty (bless, curse, etc.).
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub bonus_mod: i32,
    /// Prime attributes add a flat bonus to checks and saves.
    #[serde(default)]
    pub is_prime: bool,
    /// Manual per-attribute save modifier.
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub save_modifier: i32,
}

fn default_score() -> i32 {
    10
}

impl Default for Attribute {
    fn default() -> Self {
        Self {
            rolled_score: 10,
            bonus_mod: 0,
            is_prime: false,
            save_modifier: 0,
        }
    }
}

impl Attribute {
    pub fn with_score(rolled_score: i32) -> Self {
        Self {
            rolled_score,
            ..Self::default()
        }
    }

    pub fn prime(mut self) -> Self {
        self.is_prime = true;
        self
    }
}

/// All six attributes of a character.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AttributeSet {
    #[serde(default)]
    pub str: Attribute,
    #[serde(default)]
    pub dex: Attribute,
    #[serde(default)]
    pub con: Attribute,
    #[serde(default)]
    pub int: Attribute,
    #[serde(default)]
    pub wis: Attribute,
    #[serde(default)]
    pub cha: Attribute,
}

impl AttributeSet {
    pub fn get(&self, ability: Ability) -> &Attribute {
        match ability {
            Ability::Str => &self.str,
            Ability::Dex => &self.dex,
            Ability::Con => &self.con,
            Ability::Int => &self.int,
            Ability::Wis => &self.wis,
            Ability::Cha => &self.cha,
        }
    }

    pub fn get_mut(&mut self, ability: Ability) -> &mut Attribute {
        match ability {
            Ability::Str => &mut self.str,
            Ability::Dex => &mut self.dex,
            Ability::Con => &mut self.con,
            Ability::Int => &mut self.int,
            Ability::Wis => &mut self.wis,
            Ability::Cha => &mut self.cha,
        }
    }

    pub fn set(&mut self, ability: Ability, attribute: Attribute) {
        *self.get_mut(ability) = attribute;
    }
}

/// What a race or class modifier entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModTarget {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
    /// Flat armor class adjustment (e.g., small races).
    Ac,
}

impl ModTarget {
    pub fn ability(&self) -> Option<Ability> {
        match self {
            ModTarget::Str => Some(Ability::Str),
            ModTarget::Dex => Some(Ability::Dex),
            ModTarget::Con => Some(Ability::Con),
            ModTarget::Int => Some(Ability::Int),
            ModTarget::Wis => Some(Ability::Wis),
            ModTarget::Cha => Some(Ability::Cha),
            ModTarget::Ac => None,
        }
    }
}

impl From<Ability> for ModTarget {
    fn from(ability: Ability) -> Self {
        match ability {
            Ability::Str => ModTarget::Str,
            Ability::Dex => ModTarget::Dex,
            Ability::Con => ModTarget::Con,
            Ability::Int => ModTarget::Int,
            Ability::Wis => ModTarget::Wis,
            Ability::Cha => ModTarget::Cha,
        }
    }
}

/// A single race or class modifier line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierEntry {
    pub target: ModTarget,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub value: i32,
}

impl ModifierEntry {
    pub fn new(target: impl Into<ModTarget>, value: i32) -> Self {
        Self {
            target: target.into(),
            value,
        }
    }
}

/// Sum every modifier entry targeting the given ability.
pub fn ability_mod_sum(entries: &[ModifierEntry], ability: Ability) -> i32 {
    entries
        .iter()
        .filter(|e| e.target.ability() == Some(ability))
        .map(|e| e.value)
        .sum()
}

/// Sum every modifier entry targeting armor class.
pub fn ac_mod_sum(entries: &[ModifierEntry]) -> i32 {
    entries
        .iter()
        .filter(|e| e.target == ModTarget::Ac)
        .map(|e| e.value)
        .sum()
}

/// The fully derived value of one attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DerivedAttribute {
    pub total: i32,
    pub modifier: i32,
    pub is_prime: bool,
    pub save_modifier: i32,
}

/// Combine rolled score, race/class modifiers, the manual bonus, and the
/// equipped-item contribution into a total and its modifier.
pub fn derive_attribute(
    attribute: &Attribute,
    race_mods: &[ModifierEntry],
    class_mods: &[ModifierEntry],
    ability: Ability,
    item_bonus: i32,
) -> DerivedAttribute {
    let total = attribute.rolled_score
        + ability_mod_sum(race_mods, ability)
        + ability_mod_sum(class_mods, ability)
        + attribute.bonus_mod
        + item_bonus;
    DerivedAttribute {
        total,
        modifier: attribute_modifier(total),
        is_prime: attribute.is_prime,
        save_modifier: attribute.save_modifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_table_breakpoints() {
        assert_eq!(attribute_modifier(1), -4);
        assert_eq!(attribute_modifier(3), -3);
        assert_eq!(attribute_modifier(5), -2);
        assert_eq!(attribute_modifier(8), -1);
        assert_eq!(attribute_modifier(9), 0);
        assert_eq!(attribute_modifier(12), 0);
        assert_eq!(attribute_modifier(13), 1);
        assert_eq!(attribute_modifier(16), 2);
        assert_eq!(attribute_modifier(17), 2);
        assert_eq!(attribute_modifier(18), 3);
        assert_eq!(attribute_modifier(21), 4);
        assert_eq!(attribute_modifier(25), 6);
        assert_eq!(attribute_modifier(28), 8);
        assert_eq!(attribute_modifier(29), 9);
        assert_eq!(attribute_modifier(30), 10);
        assert_eq!(attribute_modifier(45), 10);
    }

    #[test]
    fn test_modifier_table_monotonic() {
        for s in -5..40 {
            assert!(
                attribute_modifier(s) <= attribute_modifier(s + 1),
                "table decreased between {} and {}",
                s,
                s + 1
            );
        }
    }

    #[test]
    fn test_derive_additivity() {
        let attr = Attribute {
            rolled_score: 14,
            bonus_mod: 1,
            ..Attribute::default()
        };
        let race = vec![ModifierEntry::new(Ability::Str, 1)];
        let class = vec![ModifierEntry::new(Ability::Str, -1), ModifierEntry::new(Ability::Dex, 2)];

        let derived = derive_attribute(&attr, &race, &class, Ability::Str, 2);
        assert_eq!(derived.total, 14 + 1 - 1 + 1 + 2);
        assert_eq!(derived.modifier, attribute_modifier(17));
    }

    #[test]
    fn test_ac_mod_sum_ignores_abilities() {
        let mods = vec![
            ModifierEntry::new(Ability::Dex, 1),
            ModifierEntry {
                target: ModTarget::Ac,
                value: 1,
            },
            ModifierEntry {
                target: ModTarget::Ac,
                value: -2,
            },
        ];
        assert_eq!(ac_mod_sum(&mods), -1);
        assert_eq!(ability_mod_sum(&mods, Ability::Dex), 1);
    }

    #[test]
    fn test_rolled_16_no_bonuses_gives_plus_2() {
        let derived = derive_attribute(&Attribute::with_score(16), &[], &[], Ability::Str, 0);
        assert_eq!(derived.total, 16);
        assert_eq!(derived.modifier, 2);
    }
}
