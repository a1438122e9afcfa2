//! Spells learned, spells prepared, grimoires, and magic items.
//!
//! Three layers of spell storage:
//! - the learned catalog is unbounded;
//! - prepared spells are bounded by per-level slots, and casting consumes one
//!   prepared instance;
//! - grimoires hold spells against a point budget, and magic items against an
//!   entry count. Entries in either may be permanent: cast once per day and
//!   retained, reset by the shared "new day" operation.

use crate::num;
use crate::progression::{self, ClassConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Default grimoire point budget.
pub const DEFAULT_GRIMOIRE_CAPACITY: u32 = 39;

#[derive(Debug, Error)]
pub enum SpellcastingError {
    #[error("No spell slots remain at level {level}")]
    NoSlots { level: u8 },
    #[error("No such spell")]
    SpellNotFound,
    #[error("{grimoire} has no room for {spell} ({needed} points, {free} free)")]
    GrimoireOverCapacity {
        grimoire: String,
        spell: String,
        needed: u32,
        free: u32,
    },
    #[error("{item} is full ({capacity} spells)")]
    MagicItemFull { item: String, capacity: u32 },
    #[error("Retain limit reached ({limit} permanent spells)")]
    RetainLimitReached { limit: u32 },
    #[error("{spell} has already been used today")]
    AlreadyUsedToday { spell: String },
}

/// Unique identifier for spells in the learned catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpellId(pub Uuid);

impl SpellId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpellId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A spell definition as it appears in the learned catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub id: SpellId,
    pub name: String,
    #[serde(default, deserialize_with = "num::uint_or_zero")]
    pub level: u32,
    #[serde(default)]
    pub damage_dice: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Spell {
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        Self {
            id: SpellId::new(),
            name: name.into(),
            level,
            damage_dice: None,
            range: None,
            duration: None,
            description: None,
        }
    }

    /// Whether `other` refers to the same spell: id match first, then
    /// case-insensitive name for entries created before ids existed.
    pub fn same_spell(&self, other: &Spell) -> bool {
        self.id == other.id || self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// Point cost of holding a spell in a grimoire. Levels 0 and 1 both cost one
/// point; everything else costs its level.
pub fn spell_point_cost(level: u32) -> u32 {
    level.max(1)
}

/// A prepared instance of a learned spell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedSpell {
    pub prep_id: Uuid,
    pub spell: Spell,
    #[serde(default, deserialize_with = "num::uint_or_zero")]
    pub num_dice: u32,
    #[serde(default)]
    pub concentrating: bool,
}

impl PreparedSpell {
    pub fn new(spell: Spell) -> Self {
        Self {
            prep_id: Uuid::new_v4(),
            spell,
            num_dice: 0,
            concentrating: false,
        }
    }
}

/// One spell held in a grimoire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrimoireEntry {
    pub entry_id: Uuid,
    pub spell: Spell,
    /// Permanent entries survive casting but are limited to once per day.
    #[serde(default)]
    pub permanent: bool,
    #[serde(default)]
    pub used_today: bool,
}

impl GrimoireEntry {
    pub fn new(spell: Spell) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            spell,
            permanent: false,
            used_today: false,
        }
    }
}

/// A point-budgeted spell store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grimoire {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_grimoire_capacity", deserialize_with = "num::uint_or_zero")]
    pub capacity: u32,
    #[serde(default)]
    pub entries: Vec<GrimoireEntry>,
}

fn default_grimoire_capacity() -> u32 {
    DEFAULT_GRIMOIRE_CAPACITY
}

impl Grimoire {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            capacity: DEFAULT_GRIMOIRE_CAPACITY,
            entries: Vec::new(),
        }
    }

    pub fn points_used(&self) -> u32 {
        self.entries
            .iter()
            .map(|e| spell_point_cost(e.spell.level))
            .sum()
    }

    pub fn points_free(&self) -> u32 {
        self.capacity.saturating_sub(self.points_used())
    }

    /// Add a spell, rejecting (without mutation) when the budget would be
    /// exceeded.
    pub fn add_spell(&mut self, spell: Spell) -> Result<(), SpellcastingError> {
        let needed = spell_point_cost(spell.level);
        let free = self.points_free();
        if needed > free {
            return Err(SpellcastingError::GrimoireOverCapacity {
                grimoire: self.name.clone(),
                spell: spell.name,
                needed,
                free,
            });
        }
        self.entries.push(GrimoireEntry::new(spell));
        Ok(())
    }

    /// Cast an entry: permanent entries are marked used for the day,
    /// everything else is consumed.
    pub fn cast(&mut self, entry_id: Uuid) -> Result<(), SpellcastingError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.entry_id == entry_id)
            .ok_or(SpellcastingError::SpellNotFound)?;
        let entry = &mut self.entries[index];
        if entry.permanent {
            if entry.used_today {
                return Err(SpellcastingError::AlreadyUsedToday {
                    spell: entry.spell.name.clone(),
                });
            }
            entry.used_today = true;
        } else {
            self.entries.remove(index);
        }
        Ok(())
    }

    pub fn permanent_count(&self) -> u32 {
        self.entries.iter().filter(|e| e.permanent).count() as u32
    }
}

/// A single spell entry inside a magic item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicItemEntry {
    pub entry_id: Uuid,
    pub spell: Spell,
    /// Permanent entries recharge daily instead of being consumed.
    #[serde(default)]
    pub permanent: bool,
    #[serde(default)]
    pub used_today: bool,
}

impl MagicItemEntry {
    pub fn new(spell: Spell) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            spell,
            permanent: false,
            used_today: false,
        }
    }
}

/// A capacity-limited spell-storage item (wand, staff, ring...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicItem {
    pub id: Uuid,
    pub name: String,
    /// Maximum number of spell entries.
    #[serde(default, deserialize_with = "num::uint_or_zero")]
    pub capacity: u32,
    #[serde(default)]
    pub entries: Vec<MagicItemEntry>,
}

impl MagicItem {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            capacity,
            entries: Vec::new(),
        }
    }

    pub fn add_spell(&mut self, spell: Spell) -> Result<(), SpellcastingError> {
        if self.entries.len() as u32 >= self.capacity {
            return Err(SpellcastingError::MagicItemFull {
                item: self.name.clone(),
                capacity: self.capacity,
            });
        }
        self.entries.push(MagicItemEntry::new(spell));
        Ok(())
    }

    pub fn cast(&mut self, entry_id: Uuid) -> Result<(), SpellcastingError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.entry_id == entry_id)
            .ok_or(SpellcastingError::SpellNotFound)?;
        let entry = &mut self.entries[index];
        if entry.permanent {
            if entry.used_today {
                return Err(SpellcastingError::AlreadyUsedToday {
                    spell: entry.spell.name.clone(),
                });
            }
            entry.used_today = true;
        } else {
            self.entries.remove(index);
        }
        Ok(())
    }
}

// ============================================================================
// Prepared spells
// ============================================================================

/// Prepare a spell, bounded by the slot count for its level.
pub fn prepare_spell(
    prepared: &mut Vec<PreparedSpell>,
    spell_slots: &[u32],
    spell: Spell,
) -> Result<Uuid, SpellcastingError> {
    let level = spell.level as usize;
    let slots = spell_slots.get(level).copied().unwrap_or(0);
    let in_use = prepared
        .iter()
        .filter(|p| p.spell.level == spell.level)
        .count() as u32;
    if in_use >= slots {
        return Err(SpellcastingError::NoSlots {
            level: spell.level as u8,
        });
    }
    let entry = PreparedSpell::new(spell);
    let prep_id = entry.prep_id;
    prepared.push(entry);
    Ok(prep_id)
}

/// Cast a prepared spell, removing exactly that instance.
pub fn cast_prepared(
    prepared: &mut Vec<PreparedSpell>,
    prep_id: Uuid,
) -> Result<Spell, SpellcastingError> {
    let index = prepared
        .iter()
        .position(|p| p.prep_id == prep_id)
        .ok_or(SpellcastingError::SpellNotFound)?;
    Ok(prepared.remove(index).spell)
}

// ============================================================================
// Edit cascade
// ============================================================================

/// Propagate an edited spell definition into every prepared instance,
/// grimoire entry, and magic-item entry referencing the same spell.
///
/// Per-instance state (num_dice, concentrating, permanent, used_today) is
/// left alone; only the definition is replaced.
pub fn cascade_spell_update(
    updated: &Spell,
    prepared: &mut [PreparedSpell],
    grimoires: &mut [Grimoire],
    magic_items: &mut [MagicItem],
) {
    for p in prepared.iter_mut() {
        if p.spell.same_spell(updated) {
            p.spell = updated.clone();
        }
    }
    for g in grimoires.iter_mut() {
        for e in g.entries.iter_mut() {
            if e.spell.same_spell(updated) {
                e.spell = updated.clone();
            }
        }
    }
    for m in magic_items.iter_mut() {
        for e in m.entries.iter_mut() {
            if e.spell.same_spell(updated) {
                e.spell = updated.clone();
            }
        }
    }
}

// ============================================================================
// Retain policy
// ============================================================================

/// How many permanent grimoire spells a character may hold.
///
/// The game rule is disputed, so the cap is configuration rather than code:
/// one variant scales with overall character level, the other with the level
/// of one named class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetainPolicy {
    /// `per_level` permanent spells per XP-earned character level.
    PerCharacterLevel { per_level: u32 },
    /// One permanent spell per level held in the named class; zero if the
    /// character does not have that class.
    ClassLevel { class_name: String },
}

impl Default for RetainPolicy {
    fn default() -> Self {
        RetainPolicy::PerCharacterLevel { per_level: 1 }
    }
}

impl RetainPolicy {
    /// The retain cap uses the XP-earned level: level drain does not lose
    /// already-retained spells.
    pub fn retain_limit(&self, config: &ClassConfig, current_xp: u64) -> u32 {
        match self {
            RetainPolicy::PerCharacterLevel { per_level } => {
                per_level * progression::xp_earned_level(config, current_xp)
            }
            RetainPolicy::ClassLevel { class_name } => {
                if config.has_class(class_name) {
                    progression::xp_earned_level(config, current_xp)
                } else {
                    0
                }
            }
        }
    }
}

/// Mark a grimoire entry permanent, subject to the retain cap counted across
/// all of the character's grimoires.
pub fn retain_entry(
    grimoires: &mut [Grimoire],
    grimoire_id: Uuid,
    entry_id: Uuid,
    limit: u32,
) -> Result<(), SpellcastingError> {
    let held: u32 = grimoires.iter().map(|g| g.permanent_count()).sum();
    let grimoire = grimoires
        .iter_mut()
        .find(|g| g.id == grimoire_id)
        .ok_or(SpellcastingError::SpellNotFound)?;
    let entry = grimoire
        .entries
        .iter_mut()
        .find(|e| e.entry_id == entry_id)
        .ok_or(SpellcastingError::SpellNotFound)?;
    if entry.permanent {
        return Ok(());
    }
    if held >= limit {
        return Err(SpellcastingError::RetainLimitReached { limit });
    }
    entry.permanent = true;
    Ok(())
}

/// Reset every once-per-day flag across all grimoires and magic items.
pub fn new_day(grimoires: &mut [Grimoire], magic_items: &mut [MagicItem]) {
    for grimoire in grimoires.iter_mut() {
        for entry in grimoire.entries.iter_mut() {
            entry.used_today = false;
        }
    }
    for item in magic_items.iter_mut() {
        for entry in item.entries.iter_mut() {
            entry.used_today = false;
        }
    }
}
