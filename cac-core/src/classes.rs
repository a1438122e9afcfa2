//! Standard class records.
//!
//! Editable seed data for new characters, not enforced rules: a player can
//! rewrite any XP threshold after creation. Tables run twelve levels.

use crate::attributes::Ability;
use crate::dice::DieType;
use crate::progression::ClassProgression;

/// Seed data for one class.
#[derive(Debug, Clone)]
pub struct ClassRecord {
    pub name: &'static str,
    pub hit_die: DieType,
    /// Cumulative XP thresholds per level.
    pub xp_table: Vec<u64>,
    /// Suggested prime attribute.
    pub suggested_prime: Ability,
}

impl ClassRecord {
    pub fn progression(&self) -> ClassProgression {
        ClassProgression::new(self.name, self.xp_table.clone())
    }
}

fn twelve_levels(base: u64) -> Vec<u64> {
    // Doubling through 9th level, then a flat step per name level.
    let mut table = vec![0, base + 1];
    for _ in 2..9 {
        let next = (table.last().copied().unwrap_or(0) - 1) * 2 + 1;
        table.push(next);
    }
    let name_step = (base + 1) * 64;
    for i in 9..12 {
        let last = table[8];
        table.push(last + name_step * (i as u64 - 8));
    }
    table
}

lazy_static::lazy_static! {
    /// The standard classes.
    pub static ref CLASSES: Vec<ClassRecord> = vec![
        ClassRecord {
            name: "Fighter",
            hit_die: DieType::D10,
            xp_table: twelve_levels(2000),
            suggested_prime: Ability::Str,
        },
        ClassRecord {
            name: "Ranger",
            hit_die: DieType::D10,
            xp_table: twelve_levels(2250),
            suggested_prime: Ability::Str,
        },
        ClassRecord {
            name: "Rogue",
            hit_die: DieType::D6,
            xp_table: twelve_levels(1250),
            suggested_prime: Ability::Dex,
        },
        ClassRecord {
            name: "Assassin",
            hit_die: DieType::D6,
            xp_table: twelve_levels(1750),
            suggested_prime: Ability::Dex,
        },
        ClassRecord {
            name: "Barbarian",
            hit_die: DieType::D12,
            xp_table: twelve_levels(2500),
            suggested_prime: Ability::Con,
        },
        ClassRecord {
            name: "Monk",
            hit_die: DieType::D12,
            xp_table: twelve_levels(2000),
            suggested_prime: Ability::Dex,
        },
        ClassRecord {
            name: "Wizard",
            hit_die: DieType::D4,
            xp_table: twelve_levels(2600),
            suggested_prime: Ability::Int,
        },
        ClassRecord {
            name: "Illusionist",
            hit_die: DieType::D4,
            xp_table: twelve_levels(2500),
            suggested_prime: Ability::Int,
        },
        ClassRecord {
            name: "Cleric",
            hit_die: DieType::D8,
            xp_table: twelve_levels(2250),
            suggested_prime: Ability::Wis,
        },
        ClassRecord {
            name: "Druid",
            hit_die: DieType::D8,
            xp_table: twelve_levels(2000),
            suggested_prime: Ability::Wis,
        },
        ClassRecord {
            name: "Knight",
            hit_die: DieType::D10,
            xp_table: twelve_levels(2250),
            suggested_prime: Ability::Cha,
        },
        ClassRecord {
            name: "Paladin",
            hit_die: DieType::D10,
            xp_table: twelve_levels(2750),
            suggested_prime: Ability::Cha,
        },
        ClassRecord {
            name: "Bard",
            hit_die: DieType::D10,
            xp_table: twelve_levels(1750),
            suggested_prime: Ability::Cha,
        },
    ];
}

/// Look up a class record by name, case-insensitively.
pub fn get_class(name: &str) -> Option<&'static ClassRecord> {
    CLASSES.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}
