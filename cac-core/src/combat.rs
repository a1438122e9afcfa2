//! Armor class and attack resolution.

use crate::attributes::{self, Ability};
use crate::character::Character;
use crate::dice::{DiceExpression, DieType, RollResult};
use crate::encumbrance::{self, BurdenStatus};
use crate::inventory::{self, EffectSlot, ItemEffect};
use crate::num;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether the ability contribution to a value is derived live or entered by
/// hand. Exactly one of the two applies; a manual value is never combined
/// with the live modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AbilityModSource {
    #[default]
    Auto,
    Manual {
        #[serde(default)]
        value: i32,
    },
}

/// Melee attacks key off Strength, ranged off Dexterity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    #[default]
    Melee,
    Ranged,
}

/// A configured attack line on the character sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attack {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub mode: AttackMode,
    /// Unarmed attacks draw from the unarmed effect-item set instead of the
    /// weapon one.
    #[serde(default)]
    pub unarmed: bool,
    #[serde(default)]
    pub ability: AbilityModSource,
    /// Layered on top of the live ability modifier in auto mode.
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub extra_mod: i32,

    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub bth_bonus: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub to_hit_magic: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub to_hit_misc: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub weapon_to_hit_magic: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub weapon_to_hit_misc: i32,

    /// Damage dice notation, e.g. "1d8".
    #[serde(default)]
    pub damage_dice: String,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub damage_magic: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub damage_misc: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub weapon_damage_magic: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub weapon_damage_misc: i32,
}

impl Attack {
    pub fn new(name: impl Into<String>, mode: AttackMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            mode,
            unarmed: false,
            ability: AbilityModSource::Auto,
            extra_mod: 0,
            bth_bonus: 0,
            to_hit_magic: 0,
            to_hit_misc: 0,
            weapon_to_hit_magic: 0,
            weapon_to_hit_misc: 0,
            damage_dice: String::new(),
            damage_magic: 0,
            damage_misc: 0,
            weapon_damage_magic: 0,
            weapon_damage_misc: 0,
        }
    }

    pub fn with_damage(mut self, notation: impl Into<String>) -> Self {
        self.damage_dice = notation.into();
        self
    }
}

// ============================================================================
// Armor class
// ============================================================================

/// Every contribution to armor class, kept separate for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmorClassBreakdown {
    pub base: i32,
    pub armor: i32,
    pub shield: i32,
    /// DEX modifier (auto, zeroed when overburdened) or the manual value.
    pub dex: i32,
    pub magic: i32,
    pub misc: i32,
    pub race: i32,
    pub manual_bonus: i32,
    pub effect_items: i32,
}

impl ArmorClassBreakdown {
    pub fn total(&self) -> i32 {
        self.base
            + self.armor
            + self.shield
            + self.dex
            + self.magic
            + self.misc
            + self.race
            + self.manual_bonus
            + self.effect_items
    }
}

/// Derive armor class.
///
/// Multiple equipped armor pieces stack; being overburdened strips an
/// auto-derived DEX bonus but never overrides a manually entered one.
pub fn armor_class(character: &Character) -> ArmorClassBreakdown {
    let armor: i32 = character
        .equipped_armor_ids
        .iter()
        .filter_map(|id| inventory::find_item(&character.inventory, *id))
        .filter(|item| item.is_armor)
        .map(|item| item.ac_base + item.ac_magic)
        .sum();

    let shield: i32 = character
        .equipped_shield_id
        .and_then(|id| inventory::find_item(&character.inventory, id))
        .filter(|item| item.is_shield)
        .map(|item| item.ac_base + item.ac_magic)
        .unwrap_or(0);

    let dex = match character.ac_dex {
        AbilityModSource::Auto => {
            let status = encumbrance::encumbrance(character).status;
            if status == BurdenStatus::Overburdened {
                0
            } else {
                character.derived_attribute(Ability::Dex).modifier
            }
        }
        AbilityModSource::Manual { value } => value,
    };

    ArmorClassBreakdown {
        base: character.ac_base,
        armor,
        shield,
        dex,
        magic: character.ac_magic,
        misc: character.ac_misc,
        race: attributes::ac_mod_sum(&character.race_mods),
        manual_bonus: character.ac_bonus,
        effect_items: character.effect_item_ac_sum(),
    }
}

// ============================================================================
// Attack resolution
// ============================================================================

/// A resolved attack: final to-hit bonus and damage line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackProfile {
    pub name: String,
    pub mode: AttackMode,
    pub to_hit: i32,
    pub damage_dice: String,
    pub damage_bonus: i32,
}

impl AttackProfile {
    /// Display string for the damage line, e.g. "1d8+3".
    pub fn damage_display(&self) -> String {
        if self.damage_bonus > 0 {
            format!("{}+{}", self.damage_dice, self.damage_bonus)
        } else if self.damage_bonus < 0 {
            format!("{}{}", self.damage_dice, self.damage_bonus)
        } else {
            self.damage_dice.clone()
        }
    }

    /// Roll the attack: d20 plus the to-hit bonus. Natural 20/1 flags come
    /// back on the result.
    pub fn roll_to_hit<R: Rng>(&self, rng: &mut R) -> RollResult {
        let expr = DiceExpression {
            components: vec![crate::dice::DiceComponent {
                count: 1,
                die_type: DieType::D20,
            }],
            modifier: self.to_hit,
            original: format!("1d20{:+}", self.to_hit),
        };
        expr.roll_with_rng(rng)
    }

    /// Roll normal damage.
    pub fn roll_damage<R: Rng>(&self, rng: &mut R) -> Option<i32> {
        let expr = DiceExpression::parse(&self.damage_dice).ok()?;
        Some(expr.roll_with_rng(rng).total + self.damage_bonus)
    }

    /// Critical damage: maximum possible dice plus the bonus plus 1d4.
    pub fn roll_critical_damage<R: Rng>(&self, rng: &mut R) -> Option<i32> {
        let expr = DiceExpression::parse(&self.damage_dice).ok()?;
        let bonus_die = DieType::D4.roll_with_rng(rng) as i32;
        Some(expr.maximum() + self.damage_bonus + bonus_die)
    }
}

/// Resolve an attack against the character's current state.
pub fn resolve_attack(character: &Character, attack: &Attack) -> AttackProfile {
    let live_mod = match attack.mode {
        AttackMode::Melee => character.derived_attribute(Ability::Str).modifier,
        AttackMode::Ranged => character.derived_attribute(Ability::Dex).modifier,
    };
    let ability = match attack.ability {
        AbilityModSource::Auto => live_mod + attack.extra_mod,
        AbilityModSource::Manual { value } => value,
    };

    let slot = if attack.unarmed {
        EffectSlot::Unarmed
    } else {
        EffectSlot::Attack
    };
    let (effect_to_hit, effect_damage) = character.effect_item_attack_sums(slot);

    let to_hit = character.base_bth
        + attack.bth_bonus
        + ability
        + attack.to_hit_magic
        + attack.to_hit_misc
        + attack.weapon_to_hit_magic
        + attack.weapon_to_hit_misc
        + character.attack_bonus
        + effect_to_hit;

    // Ranged attacks never auto-add an ability damage bonus; thrown versus
    // projectile rules vary, so that stays in the manual fields.
    let melee_str = match attack.mode {
        AttackMode::Melee => character.derived_attribute(Ability::Str).modifier,
        AttackMode::Ranged => 0,
    };
    let damage_bonus = attack.damage_magic
        + attack.damage_misc
        + attack.weapon_damage_magic
        + attack.weapon_damage_misc
        + character.damage_bonus
        + effect_damage
        + melee_str;

    AttackProfile {
        name: attack.name.clone(),
        mode: attack.mode,
        to_hit,
        damage_dice: attack.damage_dice.clone(),
        damage_bonus,
    }
}

/// Sum the attack-effect contributions of the given items.
pub fn sum_attack_effects<'a>(
    items: impl Iterator<Item = &'a crate::inventory::InventoryItem>,
) -> (i32, i32) {
    let mut to_hit = 0;
    let mut damage = 0;
    for item in items {
        if let Some(ItemEffect::Attack {
            to_hit_magic,
            to_hit_misc,
            damage_magic,
            damage_misc,
        }) = item.effect
        {
            to_hit += to_hit_magic + to_hit_misc;
            damage += damage_magic + damage_misc;
        }
    }
    (to_hit, damage)
}

/// Sum the AC-effect contributions of the given items.
pub fn sum_ac_effects<'a>(
    items: impl Iterator<Item = &'a crate::inventory::InventoryItem>,
) -> i32 {
    items
        .filter_map(|item| match item.effect {
            Some(ItemEffect::ArmorClass { bonus }) => Some(bonus),
            _ => None,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_display() {
        let profile = AttackProfile {
            name: "Longsword".to_string(),
            mode: AttackMode::Melee,
            to_hit: 3,
            damage_dice: "1d8".to_string(),
            damage_bonus: 2,
        };
        assert_eq!(profile.damage_display(), "1d8+2");

        let negative = AttackProfile {
            damage_bonus: -1,
            ..profile.clone()
        };
        assert_eq!(negative.damage_display(), "1d8-1");

        let flat = AttackProfile {
            damage_bonus: 0,
            ..profile
        };
        assert_eq!(flat.damage_display(), "1d8");
    }

    #[test]
    fn test_critical_damage_range() {
        let profile = AttackProfile {
            name: "Longsword".to_string(),
            mode: AttackMode::Melee,
            to_hit: 0,
            damage_dice: "1d8".to_string(),
            damage_bonus: 2,
        };
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let crit = profile.roll_critical_damage(&mut rng).unwrap();
            // max(1d8)=8, +2 bonus, +1d4 in 1..=4
            assert!((11..=14).contains(&crit));
        }
    }

    #[test]
    fn test_ability_mod_source_serde() {
        let auto: AbilityModSource = serde_json::from_str(r#"{"mode":"auto"}"#).unwrap();
        assert_eq!(auto, AbilityModSource::Auto);
        let manual: AbilityModSource =
            serde_json::from_str(r#"{"mode":"manual","value":3}"#).unwrap();
        assert_eq!(manual, AbilityModSource::Manual { value: 3 });
    }
}
