//! Inventory items and container rules.
//!
//! Items reference their container by id. References are weak: a dangling
//! `stored_in` (container deleted without clearing children) means the item is
//! treated as carried normally, never as an error.
//!
//! Two container kinds:
//! - normal containers meter capacity in slots, where zero-EV "bulk" items
//!   aggregate at ten per slot;
//! - magical containers meter capacity in pounds and hide their contents
//!   (and any stored coins) from the carrier's totals entirely.

use crate::currency::Wallet;
use crate::num;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for inventory items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("No such item")]
    ItemNotFound,
    #[error("{0} is not a container")]
    NotAContainer(String),
    #[error("Cannot move a quantity of {requested} (stack has {available})")]
    BadQuantity { requested: u32, available: u32 },
    #[error("{item} does not fit in {container}")]
    OverCapacity { item: String, container: String },
    #[error("Containers cannot be nested")]
    NestedContainer,
}

/// Where an item's stored-in reference actually resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Carried directly (including dangling references).
    Carried,
    /// Inside a normal container: weight counts, EV does not.
    Normal,
    /// Inside a magical container: neither weight nor EV counts.
    Magical,
}

/// A combat or armor-class bonus bundled on an item. An item carries at most
/// one effect, and the variant decides which derivation sums it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemEffect {
    Attack {
        #[serde(default, deserialize_with = "num::int_or_zero")]
        to_hit_magic: i32,
        #[serde(default, deserialize_with = "num::int_or_zero")]
        to_hit_misc: i32,
        #[serde(default, deserialize_with = "num::int_or_zero")]
        damage_magic: i32,
        #[serde(default, deserialize_with = "num::int_or_zero")]
        damage_misc: i32,
    },
    ArmorClass {
        #[serde(default, deserialize_with = "num::int_or_zero")]
        bonus: i32,
    },
}

/// Which equip set an effect item is applied through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSlot {
    Attack,
    Unarmed,
    ArmorClass,
}

/// A single inventory line item (possibly a stack).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default, deserialize_with = "num::uint_or_zero")]
    pub quantity: u32,
    /// Weight per unit, in pounds.
    #[serde(default, deserialize_with = "num::float_or_zero")]
    pub weight_per: f64,
    /// Encumbrance value per unit. Zero marks a "bulk" item that aggregates
    /// at ten per EV.
    #[serde(default, deserialize_with = "num::uint_or_zero")]
    pub ev: u32,
    #[serde(default)]
    pub description: Option<String>,

    /// Container this stack sits inside, if any.
    #[serde(default)]
    pub stored_in: Option<ItemId>,
    #[serde(default)]
    pub is_container: bool,
    #[serde(default)]
    pub is_magical_container: bool,
    /// Slot count for normal containers, weight limit in pounds for magical.
    #[serde(default, deserialize_with = "num::uint_or_zero")]
    pub capacity: u32,
    /// Coins stored inside a magical container.
    #[serde(default)]
    pub coins: Wallet,
    /// Pre-denomination builds stored container money as one GP figure;
    /// migrated into `coins` on import.
    #[serde(default, deserialize_with = "num::float_or_zero")]
    pub legacy_coin_gp: f64,

    /// Per-unit attribute bonus granted while the item sits in the equip set
    /// for some ability.
    #[serde(default)]
    pub has_attr_bonus: bool,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub attr_bonus: i32,
    /// Per-unit speed bonus while in the speed equip set.
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub speed_bonus: i32,

    /// Armor/shield contribution while equipped.
    #[serde(default)]
    pub is_armor: bool,
    #[serde(default)]
    pub is_shield: bool,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub ac_base: i32,
    #[serde(default, deserialize_with = "num::int_or_zero")]
    pub ac_magic: i32,

    #[serde(default)]
    pub effect: Option<ItemEffect>,

    /// Sellable-worth item (gems and the like) counted into net worth.
    #[serde(default)]
    pub is_worth_item: bool,
    #[serde(default, deserialize_with = "num::float_or_zero")]
    pub worth_gp: f64,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            quantity: 1,
            weight_per: 0.0,
            ev: 0,
            description: None,
            stored_in: None,
            is_container: false,
            is_magical_container: false,
            capacity: 0,
            coins: Wallet::new(),
            legacy_coin_gp: 0.0,
            has_attr_bonus: false,
            attr_bonus: 0,
            speed_bonus: 0,
            is_armor: false,
            is_shield: false,
            ac_base: 0,
            ac_magic: 0,
            effect: None,
            is_worth_item: false,
            worth_gp: 0.0,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_weight(mut self, weight_per: f64) -> Self {
        self.weight_per = weight_per;
        self
    }

    pub fn with_ev(mut self, ev: u32) -> Self {
        self.ev = ev;
        self
    }

    pub fn container(mut self, capacity: u32) -> Self {
        self.is_container = true;
        self.capacity = capacity;
        self
    }

    pub fn magical_container(mut self, weight_capacity: u32) -> Self {
        self.is_container = true;
        self.is_magical_container = true;
        self.capacity = weight_capacity;
        self
    }

    pub fn total_weight(&self) -> f64 {
        self.weight_per * self.quantity as f64
    }

    /// Two stacks merge if they describe the same thing.
    pub fn stacks_with(&self, other: &InventoryItem) -> bool {
        !self.is_container
            && !other.is_container
            && self.name.eq_ignore_ascii_case(&other.name)
            && self.ev == other.ev
            && (self.weight_per - other.weight_per).abs() < 1e-9
            && self.effect == other.effect
    }
}

// ============================================================================
// Lookup helpers (silent-miss semantics)
// ============================================================================

pub fn find_item(inventory: &[InventoryItem], id: ItemId) -> Option<&InventoryItem> {
    inventory.iter().find(|i| i.id == id)
}

pub fn find_item_mut(inventory: &mut [InventoryItem], id: ItemId) -> Option<&mut InventoryItem> {
    inventory.iter_mut().find(|i| i.id == id)
}

/// Resolve where an item actually sits. A `stored_in` pointing at a missing
/// item or a non-container resolves to `Carried`.
pub fn containment(inventory: &[InventoryItem], item: &InventoryItem) -> Containment {
    match item.stored_in.and_then(|id| find_item(inventory, id)) {
        Some(container) if container.is_magical_container => Containment::Magical,
        Some(container) if container.is_container => Containment::Normal,
        _ => Containment::Carried,
    }
}

/// Items stored inside the given container.
pub fn contents<'a>(
    inventory: &'a [InventoryItem],
    container_id: ItemId,
) -> impl Iterator<Item = &'a InventoryItem> {
    inventory
        .iter()
        .filter(move |i| i.stored_in == Some(container_id))
}

// ============================================================================
// Capacity
// ============================================================================

/// Slots consumed inside a normal container, with bulk items aggregated at
/// ten per slot (ceiling: a part-filled bulk slot is still a slot).
pub fn slots_used(inventory: &[InventoryItem], container_id: ItemId) -> u32 {
    let mut slots = 0u32;
    let mut bulk = 0u32;
    for item in contents(inventory, container_id) {
        if item.ev > 0 {
            slots += item.quantity;
        } else {
            bulk += item.quantity;
        }
    }
    slots + bulk.div_ceil(10)
}

/// Weight stored inside a magical container, coins included.
pub fn stored_weight(inventory: &[InventoryItem], container: &InventoryItem) -> f64 {
    let items: f64 = contents(inventory, container.id)
        .map(|i| i.total_weight())
        .sum();
    items + coin_weight(container.coins.coin_count())
}

/// Sixteen coins weigh one pound.
pub fn coin_weight(coin_count: u64) -> f64 {
    coin_count as f64 / 16.0
}

/// One hundred sixty coins are one EV.
pub fn coin_ev(coin_count: u64) -> u32 {
    (coin_count / 160) as u32
}

/// Check whether `quantity` units of `item` fit into `container`, given the
/// container's current contents.
pub fn fits_in_container(
    inventory: &[InventoryItem],
    container: &InventoryItem,
    item: &InventoryItem,
    quantity: u32,
) -> Result<(), InventoryError> {
    if !container.is_container {
        return Err(InventoryError::NotAContainer(container.name.clone()));
    }

    if container.is_magical_container {
        let added = item.weight_per * quantity as f64;
        if stored_weight(inventory, container) + added > container.capacity as f64 {
            return Err(InventoryError::OverCapacity {
                item: item.name.clone(),
                container: container.name.clone(),
            });
        }
        return Ok(());
    }

    // Normal container: slot accounting. An item as bulky as the container
    // itself never fits, regardless of headroom.
    if item.ev >= container.capacity {
        return Err(InventoryError::OverCapacity {
            item: item.name.clone(),
            container: container.name.clone(),
        });
    }

    let current = slots_used(inventory, container.id);
    let marginal = if item.ev > 0 {
        quantity
    } else {
        // Adding bulk units may or may not cross a ten-unit slot boundary.
        let bulk_now: u32 = contents(inventory, container.id)
            .filter(|i| i.ev == 0)
            .map(|i| i.quantity)
            .sum();
        (bulk_now + quantity).div_ceil(10) - bulk_now.div_ceil(10)
    };

    if current + marginal > container.capacity {
        return Err(InventoryError::OverCapacity {
            item: item.name.clone(),
            container: container.name.clone(),
        });
    }
    Ok(())
}

// ============================================================================
// Moves
// ============================================================================

/// Move `quantity` units of a stack into a container.
///
/// Partial moves split the stack; the moved portion merges into an existing
/// matching stack in the destination when one exists. Total quantity across
/// stacks is preserved. Fails without mutating on any capacity violation.
pub fn store_in_container(
    inventory: &mut Vec<InventoryItem>,
    item_id: ItemId,
    container_id: ItemId,
    quantity: u32,
) -> Result<(), InventoryError> {
    let item = find_item(inventory, item_id)
        .ok_or(InventoryError::ItemNotFound)?
        .clone();
    let container = find_item(inventory, container_id)
        .ok_or(InventoryError::ItemNotFound)?
        .clone();

    if item.is_container {
        return Err(InventoryError::NestedContainer);
    }
    if quantity == 0 || quantity > item.quantity {
        return Err(InventoryError::BadQuantity {
            requested: quantity,
            available: item.quantity,
        });
    }

    fits_in_container(inventory, &container, &item, quantity)?;

    move_stack(inventory, item_id, Some(container_id), quantity);
    Ok(())
}

/// Move `quantity` units of a stored stack back out of its container.
pub fn remove_from_container(
    inventory: &mut Vec<InventoryItem>,
    item_id: ItemId,
    quantity: u32,
) -> Result<(), InventoryError> {
    let item = find_item(inventory, item_id).ok_or(InventoryError::ItemNotFound)?;
    if quantity == 0 || quantity > item.quantity {
        return Err(InventoryError::BadQuantity {
            requested: quantity,
            available: item.quantity,
        });
    }
    move_stack(inventory, item_id, None, quantity);
    Ok(())
}

/// Relocate part or all of a stack to a destination (container or carried),
/// merging into a matching stack there if one exists. Capacity must already
/// have been checked.
fn move_stack(
    inventory: &mut Vec<InventoryItem>,
    item_id: ItemId,
    destination: Option<ItemId>,
    quantity: u32,
) {
    let source_index = match inventory.iter().position(|i| i.id == item_id) {
        Some(i) => i,
        None => return,
    };

    let whole_stack = inventory[source_index].quantity == quantity;

    // Look for a stack to merge into at the destination.
    let merge_index = {
        let source = &inventory[source_index];
        inventory
            .iter()
            .position(|i| i.id != item_id && i.stored_in == destination && i.stacks_with(source))
    };

    match (whole_stack, merge_index) {
        (true, None) => {
            inventory[source_index].stored_in = destination;
        }
        (true, Some(merge)) => {
            inventory[merge].quantity += quantity;
            inventory.remove(source_index);
        }
        (false, None) => {
            let mut moved = inventory[source_index].clone();
            inventory[source_index].quantity -= quantity;
            moved.id = ItemId::new();
            moved.quantity = quantity;
            moved.stored_in = destination;
            inventory.push(moved);
        }
        (false, Some(merge)) => {
            inventory[source_index].quantity -= quantity;
            inventory[merge].quantity += quantity;
        }
    }
}

/// Delete an item. Children of a deleted container fall back to carried.
pub fn delete_item(inventory: &mut Vec<InventoryItem>, item_id: ItemId) {
    inventory.retain(|i| i.id != item_id);
    for item in inventory.iter_mut() {
        if item.stored_in == Some(item_id) {
            item.stored_in = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk_item(name: &str, quantity: u32) -> InventoryItem {
        InventoryItem::new(name).with_quantity(quantity).with_ev(0)
    }

    #[test]
    fn test_containment_dangling_reference() {
        let mut item = InventoryItem::new("Rope");
        item.stored_in = Some(ItemId::new());
        let inventory = vec![item.clone()];
        assert_eq!(containment(&inventory, &item), Containment::Carried);
    }

    #[test]
    fn test_containment_non_container_reference() {
        let plain = InventoryItem::new("Rock");
        let mut item = InventoryItem::new("Rope");
        item.stored_in = Some(plain.id);
        let inventory = vec![plain, item.clone()];
        assert_eq!(containment(&inventory, &item), Containment::Carried);
    }

    #[test]
    fn test_slots_bulk_aggregation() {
        let sack = InventoryItem::new("Sack").container(8);
        let sack_id = sack.id;
        let mut inventory = vec![sack];

        let mut bulk = bulk_item("Chalk", 9);
        bulk.stored_in = Some(sack_id);
        inventory.push(bulk);
        assert_eq!(slots_used(&inventory, sack_id), 1);

        inventory.last_mut().unwrap().quantity = 10;
        assert_eq!(slots_used(&inventory, sack_id), 1);

        inventory.last_mut().unwrap().quantity = 11;
        assert_eq!(slots_used(&inventory, sack_id), 2);
    }

    #[test]
    fn test_container_scenario_slots_and_ev_limit() {
        // Capacity 8: 8 bulk items take one slot; a 9th item with EV 3 takes
        // one more (2 of 8); an EV 7 item still fits (3 of 8); an EV 8 item
        // is rejected outright because its EV matches the capacity.
        let chest = InventoryItem::new("Chest").container(8);
        let chest_id = chest.id;
        let mut inventory = vec![chest];

        let candles = bulk_item("Candle", 8);
        let candles_id = candles.id;
        inventory.push(candles);
        store_in_container(&mut inventory, candles_id, chest_id, 8).unwrap();
        assert_eq!(slots_used(&inventory, chest_id), 1);

        let crowbar = InventoryItem::new("Crowbar").with_ev(3);
        let crowbar_id = crowbar.id;
        inventory.push(crowbar);
        store_in_container(&mut inventory, crowbar_id, chest_id, 1).unwrap();
        assert_eq!(slots_used(&inventory, chest_id), 2);

        let bedroll = InventoryItem::new("Bedroll").with_ev(7);
        let bedroll_id = bedroll.id;
        inventory.push(bedroll);
        store_in_container(&mut inventory, bedroll_id, chest_id, 1).unwrap();
        assert_eq!(slots_used(&inventory, chest_id), 3);

        let anvil = InventoryItem::new("Anvil").with_ev(8);
        let anvil_id = anvil.id;
        inventory.push(anvil);
        let err = store_in_container(&mut inventory, anvil_id, chest_id, 1).unwrap_err();
        assert!(matches!(err, InventoryError::OverCapacity { .. }));
        assert_eq!(find_item(&inventory, anvil_id).unwrap().stored_in, None);
    }

    #[test]
    fn test_magical_container_weight_limit() {
        let bag = InventoryItem::new("Bag of Holding").magical_container(100);
        let bag_id = bag.id;
        let mut inventory = vec![bag];

        let iron = InventoryItem::new("Iron Bars").with_weight(30.0).with_quantity(3);
        let iron_id = iron.id;
        inventory.push(iron);
        store_in_container(&mut inventory, iron_id, bag_id, 3).unwrap();

        let more = InventoryItem::new("Stone").with_weight(20.0);
        let more_id = more.id;
        inventory.push(more);
        let err = store_in_container(&mut inventory, more_id, bag_id, 1).unwrap_err();
        assert!(matches!(err, InventoryError::OverCapacity { .. }));
    }

    #[test]
    fn test_magical_container_coins_count_against_weight() {
        let mut bag = InventoryItem::new("Bag of Holding").magical_container(10);
        bag.coins.add(crate::currency::Denomination::Gold, 160);
        let bag_id = bag.id;
        let inventory = vec![bag];
        // 160 coins = 10 pounds, the bag is full.
        let item = InventoryItem::new("Feather").with_weight(0.1);
        let container = find_item(&inventory, bag_id).unwrap();
        assert!(fits_in_container(&inventory, container, &item, 1).is_err());
    }

    #[test]
    fn test_partial_move_splits_and_preserves_quantity() {
        let sack = InventoryItem::new("Sack").container(20);
        let sack_id = sack.id;
        let arrows = InventoryItem::new("Arrows").with_quantity(20).with_ev(1);
        let arrows_id = arrows.id;
        let mut inventory = vec![sack, arrows];

        store_in_container(&mut inventory, arrows_id, sack_id, 5).unwrap();

        let total: u32 = inventory
            .iter()
            .filter(|i| i.name == "Arrows")
            .map(|i| i.quantity)
            .sum();
        assert_eq!(total, 20);
        assert_eq!(find_item(&inventory, arrows_id).unwrap().quantity, 15);
        let moved = inventory
            .iter()
            .find(|i| i.name == "Arrows" && i.stored_in == Some(sack_id))
            .unwrap();
        assert_eq!(moved.quantity, 5);
    }

    #[test]
    fn test_move_merges_matching_stack() {
        let sack = InventoryItem::new("Sack").container(20);
        let sack_id = sack.id;
        let mut stored = InventoryItem::new("Arrows").with_quantity(5).with_ev(1);
        stored.stored_in = Some(sack_id);
        let carried = InventoryItem::new("arrows").with_quantity(10).with_ev(1);
        let carried_id = carried.id;
        let mut inventory = vec![sack, stored, carried];

        store_in_container(&mut inventory, carried_id, sack_id, 10).unwrap();

        // Whole stack merged into the stored one; the carried line is gone.
        let stacks: Vec<_> = inventory.iter().filter(|i| i.ev == 1).collect();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].quantity, 15);
        assert_eq!(stacks[0].stored_in, Some(sack_id));
    }

    #[test]
    fn test_round_trip_restores_state() {
        let sack = InventoryItem::new("Sack").container(20);
        let sack_id = sack.id;
        let rope = InventoryItem::new("Rope").with_quantity(2).with_ev(1).with_weight(10.0);
        let rope_id = rope.id;
        let mut inventory = vec![sack, rope];

        store_in_container(&mut inventory, rope_id, sack_id, 2).unwrap();
        assert_eq!(
            find_item(&inventory, rope_id).unwrap().stored_in,
            Some(sack_id)
        );
        remove_from_container(&mut inventory, rope_id, 2).unwrap();
        assert_eq!(find_item(&inventory, rope_id).unwrap().stored_in, None);
        assert_eq!(find_item(&inventory, rope_id).unwrap().quantity, 2);
    }

    #[test]
    fn test_delete_container_orphans_children() {
        let sack = InventoryItem::new("Sack").container(20);
        let sack_id = sack.id;
        let mut rope = InventoryItem::new("Rope");
        rope.stored_in = Some(sack_id);
        let rope_id = rope.id;
        let mut inventory = vec![sack, rope];

        delete_item(&mut inventory, sack_id);
        assert_eq!(inventory.len(), 1);
        assert_eq!(find_item(&inventory, rope_id).unwrap().stored_in, None);
    }
}
