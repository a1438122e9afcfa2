//! The character aggregate and its derived snapshot.
//!
//! A `Character` owns every sub-collection by value; nothing references
//! across characters. Raw fields are mutated through named updater methods,
//! and everything displayed is re-derived from raw fields by [`Character::derive`],
//! which is pure, idempotent, and cheap enough to run on every edit.

use crate::attributes::{self, Ability, Attribute, AttributeSet, DerivedAttribute, ModifierEntry};
use crate::combat::{self, AbilityModSource, Attack, AttackProfile};
use crate::currency::{SpendReceipt, Wallet, WalletError};
use crate::dice::DieType;
use crate::encumbrance::{self, EncumbranceSummary};
use crate::inventory::{self, EffectSlot, InventoryItem, InventoryError, ItemId};
use crate::num;
use crate::progression::{self, ClassConfig};
use crate::spellcasting::{
    self, Grimoire, MagicItem, PreparedSpell, RetainPolicy, Spell, SpellId, SpellcastingError,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// Default Prime attribute bonus to checks and saves.
pub const DEFAULT_PRIME_BONUS: i32 = 6;

/// Unique identifier for characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A free-form note attached to a character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Note {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// An animal companion, henchman, or familiar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Companion {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub hp: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub ac: i32,
    #[serde(default)]
    pub notes: String,
}

impl Companion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: String::new(),
            hp: 0,
            ac: 0,
            notes: String::new(),
        }
    }
}

/// Biography and roleplay fields. Pure flavor, never derived from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Biography {
    #[serde(default)]
    pub alignment: String,
    #[serde(default)]
    pub deity: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub hair: String,
    #[serde(default)]
    pub eyes: String,
    #[serde(default)]
    pub backstory: String,
}

/// One player character and everything on their sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub class_config: ClassConfig,

    // Attributes
    #[serde(default)]
    pub attributes: AttributeSet,
    /// Flat bonus a Prime attribute grants to checks and saves.
    #[serde(default = "default_prime_bonus", deserialize_with = "num::int_or_zero")]
    pub prime_bonus: i32,
    #[serde(default)]
    pub race_mods: Vec<ModifierEntry>,
    #[serde(default)]
    pub class_mods: Vec<ModifierEntry>,

    // Progression
    #[serde(default, deserialize_with = "num::u64_or_zero")]
    pub current_xp: u64,
    /// Indexed by level: `true` marks the level drained.
    #[serde(default)]
    pub level_drained: Vec<bool>,

    // Hit points
    /// Raw per-level die results; CON is applied at derivation time.
    #[serde(default)]
    pub hp_rolls_by_level: Vec<i32>,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub hp_bonus: i32,
    #[serde(default = "default_hp_die")]
    pub hp_die: DieType,
    /// Current hit points; clamped into `[0, max_hp]` by the updaters.
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub hp: i32,

    // Defense
    #[serde(default = "default_ac_base", deserialize_with = "num::int_or_zero")]
    pub ac_base: i32,
    #[serde(default)]
    pub ac_dex: AbilityModSource,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub ac_magic: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub ac_misc: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub ac_bonus: i32,
    #[serde(default)]
    pub equipped_armor_ids: HashSet<ItemId>,
    #[serde(default)]
    pub equipped_shield_id: Option<ItemId>,
    #[serde(default)]
    pub equipped_effect_item_ids: HashMap<EffectSlot, HashSet<ItemId>>,
    #[serde(default)]
    pub equipped_attr_bonus_ids: HashMap<Ability, HashSet<ItemId>>,

    // Speed
    #[serde(default = "default_speed", deserialize_with = "num::int_or_zero")]
    pub speed: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub speed_bonus: i32,
    #[serde(default)]
    pub equipped_speed_item_ids: HashSet<ItemId>,

    // Combat
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub base_bth: i32,
    /// Temporary global bonuses (bless and the like).
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub attack_bonus: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub damage_bonus: i32,
    #[serde(default)]
    pub attacks: Vec<Attack>,

    // Inventory and money
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub wallet: Wallet,
    /// Pre-denomination builds carried money as one GP figure; migrated into
    /// the wallet on import.
    #[serde(default, deserialize_with = "num::float_or_zero")]
    pub money_gp: f64,
    #[serde(default)]
    pub include_coin_weight: bool,
    #[serde(default = "default_true")]
    pub encumbrance_enabled: bool,

    // Magic
    #[serde(default)]
    pub spells_learned: Vec<Spell>,
    /// Slots per spell level 0-9.
    #[serde(default = "default_spell_slots")]
    pub spell_slots: Vec<u32>,
    #[serde(default)]
    pub spells_prepared: Vec<PreparedSpell>,
    #[serde(default)]
    pub grimoires: Vec<Grimoire>,
    #[serde(default)]
    pub magic_items: Vec<MagicItem>,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub spell_save_dc: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub spell_attack_bonus: i32,
    #[serde(default)]
    pub retain_policy: RetainPolicy,

    // Narrative
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub race_abilities: Vec<String>,
    #[serde(default)]
    pub class_abilities: Vec<String>,
    #[serde(default)]
    pub advantages: Vec<String>,
    #[serde(default)]
    pub companions: Vec<Companion>,
    #[serde(default)]
    pub biography: Biography,
}

fn default_prime_bonus() -> i32 {
    DEFAULT_PRIME_BONUS
}

fn default_hp_die() -> DieType {
    DieType::D8
}

fn default_ac_base() -> i32 {
    10
}

fn default_speed() -> i32 {
    30
}

fn default_true() -> bool {
    true
}

fn default_spell_slots() -> Vec<u32> {
    vec![0; 10]
}

impl Character {
    /// A blank character with all-default state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            race: String::new(),
            class_config: ClassConfig::default(),
            attributes: AttributeSet::default(),
            prime_bonus: DEFAULT_PRIME_BONUS,
            race_mods: Vec::new(),
            class_mods: Vec::new(),
            current_xp: 0,
            level_drained: Vec::new(),
            hp_rolls_by_level: Vec::new(),
            hp_bonus: 0,
            hp_die: DieType::D8,
            hp: 0,
            ac_base: 10,
            ac_dex: AbilityModSource::Auto,
            ac_magic: 0,
            ac_misc: 0,
            ac_bonus: 0,
            equipped_armor_ids: HashSet::new(),
            equipped_shield_id: None,
            equipped_effect_item_ids: HashMap::new(),
            equipped_attr_bonus_ids: HashMap::new(),
            speed: 30,
            speed_bonus: 0,
            equipped_speed_item_ids: HashSet::new(),
            base_bth: 0,
            attack_bonus: 0,
            damage_bonus: 0,
            attacks: Vec::new(),
            inventory: Vec::new(),
            wallet: Wallet::new(),
            money_gp: 0.0,
            include_coin_weight: false,
            encumbrance_enabled: true,
            spells_learned: Vec::new(),
            spell_slots: vec![0; 10],
            spells_prepared: Vec::new(),
            grimoires: Vec::new(),
            magic_items: Vec::new(),
            spell_save_dc: 0,
            spell_attack_bonus: 0,
            retain_policy: RetainPolicy::default(),
            notes: Vec::new(),
            race_abilities: Vec::new(),
            class_abilities: Vec::new(),
            advantages: Vec::new(),
            companions: Vec::new(),
            biography: Biography::default(),
        }
    }

    // ========================================================================
    // Attribute derivation
    // ========================================================================

    /// Equipped-item contribution to one ability: per-unit bonus times stack
    /// quantity, summed over the equip set. Stale ids contribute nothing.
    pub fn attribute_item_bonus(&self, ability: Ability) -> i32 {
        let Some(ids) = self.equipped_attr_bonus_ids.get(&ability) else {
            return 0;
        };
        ids.iter()
            .filter_map(|id| inventory::find_item(&self.inventory, *id))
            .filter(|item| item.has_attr_bonus)
            .map(|item| item.attr_bonus * item.quantity as i32)
            .sum()
    }

    /// Derive one attribute's total and modifier from current state.
    pub fn derived_attribute(&self, ability: Ability) -> DerivedAttribute {
        attributes::derive_attribute(
            self.attributes.get(ability),
            &self.race_mods,
            &self.class_mods,
            ability,
            self.attribute_item_bonus(ability),
        )
    }

    /// Prime bonus for an ability, zero if not prime.
    pub fn prime_check_bonus(&self, ability: Ability) -> i32 {
        if self.attributes.get(ability).is_prime {
            self.prime_bonus
        } else {
            0
        }
    }

    /// Save bonus: ability modifier + prime bonus + manual save modifier +
    /// effective level (drained levels do not help saves).
    pub fn save_bonus(&self, ability: Ability) -> i32 {
        let derived = self.derived_attribute(ability);
        derived.modifier
            + self.prime_check_bonus(ability)
            + derived.save_modifier
            + self.effective_level() as i32
    }

    // ========================================================================
    // Effect-item resolution
    // ========================================================================

    fn effect_items(&self, slot: EffectSlot) -> impl Iterator<Item = &InventoryItem> {
        self.equipped_effect_item_ids
            .get(&slot)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| inventory::find_item(&self.inventory, *id))
    }

    /// (to-hit, damage) sums of the applied attack-effect items for a slot.
    pub fn effect_item_attack_sums(&self, slot: EffectSlot) -> (i32, i32) {
        combat::sum_attack_effects(self.effect_items(slot))
    }

    /// AC sum of the applied AC-effect items.
    pub fn effect_item_ac_sum(&self) -> i32 {
        combat::sum_ac_effects(self.effect_items(EffectSlot::ArmorClass))
    }

    // ========================================================================
    // Progression
    // ========================================================================

    /// Level earned purely from XP; unaffected by drain.
    pub fn xp_earned_level(&self) -> u32 {
        progression::xp_earned_level(&self.class_config, self.current_xp)
    }

    /// Earned level minus drained levels, floored at 1.
    pub fn effective_level(&self) -> u32 {
        progression::effective_level(&self.class_config, self.current_xp, &self.level_drained)
    }

    pub fn can_level_up(&self) -> bool {
        progression::can_level_up(&self.class_config, self.current_xp, &self.hp_rolls_by_level)
    }

    pub fn progress_percent(&self) -> f64 {
        progression::progress_percent(&self.class_config, self.current_xp)
    }

    /// Maximum hit points with the live CON modifier applied to every rolled,
    /// undrained level.
    pub fn max_hp(&self) -> i32 {
        progression::max_hp(
            &self.hp_rolls_by_level,
            &self.level_drained,
            self.derived_attribute(Ability::Con).modifier,
            self.hp_bonus,
        )
    }

    /// Retain cap for permanent grimoire spells under the configured policy.
    pub fn retain_limit(&self) -> u32 {
        self.retain_policy
            .retain_limit(&self.class_config, self.current_xp)
    }

    // ========================================================================
    // Money
    // ========================================================================

    /// Net worth in gold: wallet, sellable-worth items, and coins stored in
    /// magical containers.
    pub fn net_worth_gp(&self) -> f64 {
        let items: f64 = self
            .inventory
            .iter()
            .filter(|i| i.is_worth_item)
            .map(|i| i.worth_gp * i.quantity as f64)
            .sum();
        let stored_coins: f64 = self
            .inventory
            .iter()
            .filter(|i| i.is_magical_container)
            .map(|i| i.coins.total_gp())
            .sum();
        self.wallet.total_gp() + items + stored_coins
    }

    // ========================================================================
    // Updaters
    // ========================================================================

    /// Set current XP. Earned level may grow; drained flags are untouched.
    pub fn set_current_xp(&mut self, xp: u64) {
        self.current_xp = xp;
    }

    pub fn add_xp(&mut self, xp: u64) {
        self.current_xp = self.current_xp.saturating_add(xp);
    }

    /// Mark or clear a drained level (0-indexed), then clamp current HP to
    /// the possibly-lowered maximum.
    pub fn set_level_drained(&mut self, level_index: usize, drained: bool) {
        if self.level_drained.len() <= level_index {
            self.level_drained.resize(level_index + 1, false);
        }
        self.level_drained[level_index] = drained;
        self.clamp_hp();
    }

    /// Record the raw HP die result for a level (0-indexed).
    pub fn set_hp_roll(&mut self, level_index: usize, roll: i32) {
        if self.hp_rolls_by_level.len() <= level_index {
            self.hp_rolls_by_level.resize(level_index + 1, 0);
        }
        self.hp_rolls_by_level[level_index] = roll;
        self.clamp_hp();
    }

    /// Set current HP, clamped into `[0, max_hp]`.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = num::clamp(hp, 0, self.max_hp());
    }

    /// Re-clamp current HP after anything that may have lowered the maximum.
    pub fn clamp_hp(&mut self) {
        self.hp = num::clamp(self.hp, 0, self.max_hp());
    }

    /// Spend money from the wallet, making change across denominations.
    pub fn spend(&mut self, amount_gp: f64) -> Result<SpendReceipt, WalletError> {
        self.wallet.spend_gp(amount_gp)
    }

    pub fn add_item(&mut self, item: InventoryItem) -> ItemId {
        let id = item.id;
        self.inventory.push(item);
        id
    }

    /// Delete an item and scrub every reference to it: container children
    /// fall back to carried, equip sets drop the id.
    pub fn delete_item(&mut self, item_id: ItemId) {
        inventory::delete_item(&mut self.inventory, item_id);
        self.equipped_armor_ids.remove(&item_id);
        if self.equipped_shield_id == Some(item_id) {
            self.equipped_shield_id = None;
        }
        for ids in self.equipped_effect_item_ids.values_mut() {
            ids.remove(&item_id);
        }
        for ids in self.equipped_attr_bonus_ids.values_mut() {
            ids.remove(&item_id);
        }
        self.equipped_speed_item_ids.remove(&item_id);
        // Losing a CON-bonus item lowers max HP, so current HP must follow.
        self.clamp_hp();
    }

    pub fn store_in_container(
        &mut self,
        item_id: ItemId,
        container_id: ItemId,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        inventory::store_in_container(&mut self.inventory, item_id, container_id, quantity)
    }

    pub fn remove_from_container(
        &mut self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        inventory::remove_from_container(&mut self.inventory, item_id, quantity)
    }

    /// Toggle an item in the equip set for one ability. Unequipping a
    /// CON-bonus item lowers max HP, so current HP re-clamps.
    pub fn set_attr_bonus_equipped(&mut self, ability: Ability, item_id: ItemId, equipped: bool) {
        let ids = self.equipped_attr_bonus_ids.entry(ability).or_default();
        if equipped {
            ids.insert(item_id);
        } else {
            ids.remove(&item_id);
        }
        self.clamp_hp();
    }

    /// Replace one attribute wholesale, then re-clamp HP in case the CON
    /// modifier dropped.
    pub fn set_attribute(&mut self, ability: Ability, attribute: Attribute) {
        *self.attributes.get_mut(ability) = attribute;
        self.clamp_hp();
    }

    /// Toggle an item in an effect-item set.
    pub fn set_effect_item_equipped(&mut self, slot: EffectSlot, item_id: ItemId, equipped: bool) {
        let ids = self.equipped_effect_item_ids.entry(slot).or_default();
        if equipped {
            ids.insert(item_id);
        } else {
            ids.remove(&item_id);
        }
    }

    // ========================================================================
    // Spellcasting
    // ========================================================================

    pub fn learn_spell(&mut self, spell: Spell) -> SpellId {
        let id = spell.id;
        self.spells_learned.push(spell);
        id
    }

    /// Edit a learned spell and cascade the new definition into every
    /// prepared instance, grimoire entry, and magic-item entry.
    pub fn update_spell(&mut self, updated: Spell) -> Result<(), SpellcastingError> {
        let learned = self
            .spells_learned
            .iter_mut()
            .find(|s| s.same_spell(&updated))
            .ok_or(SpellcastingError::SpellNotFound)?;
        *learned = updated.clone();
        spellcasting::cascade_spell_update(
            &updated,
            &mut self.spells_prepared,
            &mut self.grimoires,
            &mut self.magic_items,
        );
        Ok(())
    }

    /// Prepare a learned spell, bounded by the slots for its level.
    pub fn prepare_spell(&mut self, spell: Spell) -> Result<Uuid, SpellcastingError> {
        spellcasting::prepare_spell(&mut self.spells_prepared, &self.spell_slots, spell)
    }

    /// Cast a prepared spell, consuming that instance.
    pub fn cast_prepared(&mut self, prep_id: Uuid) -> Result<Spell, SpellcastingError> {
        spellcasting::cast_prepared(&mut self.spells_prepared, prep_id)
    }

    /// Mark a grimoire entry permanent, subject to the retain cap.
    pub fn retain_grimoire_entry(
        &mut self,
        grimoire_id: Uuid,
        entry_id: Uuid,
    ) -> Result<(), SpellcastingError> {
        let limit = self.retain_limit();
        spellcasting::retain_entry(&mut self.grimoires, grimoire_id, entry_id, limit)
    }

    /// Reset every once-per-day flag across grimoires and magic items.
    pub fn new_day(&mut self) {
        spellcasting::new_day(&mut self.grimoires, &mut self.magic_items);
    }

    // ========================================================================
    // Derivation
    // ========================================================================

    /// Recompute every displayed statistic from raw fields.
    pub fn derive(&self) -> DerivedStats {
        let encumbrance = encumbrance::encumbrance(self);
        let armor_class = combat::armor_class(self);
        DerivedStats {
            attributes: DerivedAttributeSet {
                str: self.derived_attribute(Ability::Str),
                dex: self.derived_attribute(Ability::Dex),
                con: self.derived_attribute(Ability::Con),
                int: self.derived_attribute(Ability::Int),
                wis: self.derived_attribute(Ability::Wis),
                cha: self.derived_attribute(Ability::Cha),
            },
            armor_class_total: armor_class.total(),
            armor_class,
            xp_earned_level: self.xp_earned_level(),
            effective_level: self.effective_level(),
            can_level_up: self.can_level_up(),
            progress_percent: self.progress_percent(),
            max_hp: self.max_hp(),
            attacks: self
                .attacks
                .iter()
                .map(|a| combat::resolve_attack(self, a))
                .collect(),
            net_worth_gp: self.net_worth_gp(),
            retain_limit: self.retain_limit(),
            encumbrance,
        }
    }

    /// Repair state after an import: migrate legacy money fields into coin
    /// counts and clamp current HP.
    pub fn normalize(&mut self) {
        if self.money_gp > 0.0 && self.wallet.is_empty() {
            self.wallet = Wallet::from_legacy_gp(self.money_gp);
            self.money_gp = 0.0;
        }
        for item in self.inventory.iter_mut() {
            if item.legacy_coin_gp > 0.0 && item.coins.is_empty() {
                item.coins = Wallet::from_legacy_gp(item.legacy_coin_gp);
                item.legacy_coin_gp = 0.0;
            }
        }
        self.clamp_hp();
    }
}

/// The six derived attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedAttributeSet {
    pub str: DerivedAttribute,
    pub dex: DerivedAttribute,
    pub con: DerivedAttribute,
    pub int: DerivedAttribute,
    pub wis: DerivedAttribute,
    pub cha: DerivedAttribute,
}

impl DerivedAttributeSet {
    pub fn get(&self, ability: Ability) -> &DerivedAttribute {
        match ability {
            Ability::Str => &self.str,
            Ability::Dex => &self.dex,
            Ability::Con => &self.con,
            Ability::Int => &self.int,
            Ability::Wis => &self.wis,
            Ability::Cha => &self.cha,
        }
    }
}

/// Everything the sheet displays, derived in one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedStats {
    pub attributes: DerivedAttributeSet,
    pub encumbrance: EncumbranceSummary,
    pub armor_class: crate::combat::ArmorClassBreakdown,
    pub armor_class_total: i32,
    pub xp_earned_level: u32,
    pub effective_level: u32,
    pub can_level_up: bool,
    pub progress_percent: f64,
    pub max_hp: i32,
    pub attacks: Vec<AttackProfile>,
    pub net_worth_gp: f64,
    pub retain_limit: u32,
}
