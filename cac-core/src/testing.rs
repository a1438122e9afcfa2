//! Ready-made characters for tests and demos.

use crate::attributes::{Ability, Attribute};
use crate::character::Character;
use crate::classes::get_class;
use crate::combat::{Attack, AttackMode};
use crate::inventory::InventoryItem;
use crate::progression::ClassConfig;
use crate::spellcasting::{Grimoire, Spell};

/// A 3rd-level fighter with mundane gear, an equipped mail shirt and shield,
/// and a longsword attack line.
pub fn sample_fighter(name: impl Into<String>) -> Character {
    let mut ch = Character::new(name);
    ch.race = "Human".to_string();

    let fighter = get_class("Fighter").map(|c| c.progression());
    if let Some(progression) = fighter {
        ch.class_config = ClassConfig::Single(progression);
        ch.hp_die = crate::dice::DieType::D10;
    }
    ch.current_xp = 4500; // 3rd level on the standard fighter table
    ch.base_bth = 3;

    ch.attributes.str = Attribute::with_score(16).prime();
    ch.attributes.dex = Attribute::with_score(14);
    ch.attributes.con = Attribute::with_score(14).prime();
    ch.attributes.int = Attribute::with_score(10);
    ch.attributes.wis = Attribute::with_score(12);
    ch.attributes.cha = Attribute::with_score(10);

    ch.hp_rolls_by_level = vec![10, 6, 5];
    ch.hp = ch.max_hp();

    let mail = InventoryItem {
        is_armor: true,
        ac_base: 4,
        ..InventoryItem::new("Mail Shirt").with_weight(25.0).with_ev(3)
    };
    let mail_id = ch.add_item(mail);
    ch.equipped_armor_ids.insert(mail_id);

    let shield = InventoryItem {
        is_shield: true,
        ac_base: 1,
        ..InventoryItem::new("Medium Shield").with_weight(10.0).with_ev(2)
    };
    let shield_id = ch.add_item(shield);
    ch.equipped_shield_id = Some(shield_id);

    ch.add_item(InventoryItem::new("Longsword").with_weight(4.0).with_ev(1));
    let pack_id = ch.add_item(
        InventoryItem::new("Backpack")
            .with_weight(2.0)
            .with_ev(1)
            .container(4),
    );
    let rations_id = ch.add_item(
        InventoryItem::new("Rations (1 day)")
            .with_quantity(5)
            .with_weight(1.0),
    );
    let _ = ch.store_in_container(rations_id, pack_id, 5);

    ch.wallet.gold = 25;
    ch.wallet.silver = 14;

    ch.attacks
        .push(Attack::new("Longsword", AttackMode::Melee).with_damage("1d8"));

    ch
}

/// A 1st-level wizard with two learned spells, first-level slots, and a
/// grimoire holding a copy of each.
pub fn sample_wizard(name: impl Into<String>) -> Character {
    let mut ch = Character::new(name);
    ch.race = "Elf".to_string();

    if let Some(record) = get_class("Wizard") {
        ch.class_config = ClassConfig::Single(record.progression());
        ch.hp_die = record.hit_die;
    }
    ch.attributes.int = Attribute::with_score(17).prime();
    ch.attributes.dex = Attribute::with_score(13);
    ch.attributes.con = Attribute::with_score(9);

    ch.hp_rolls_by_level = vec![4];
    ch.hp = ch.max_hp();

    ch.spell_slots = vec![4, 2, 0, 0, 0, 0, 0, 0, 0, 0];
    let magic_missile = Spell::new("Magic Missile", 1);
    let light = Spell::new("Light", 0);

    let mut grimoire = Grimoire::new("Traveling Grimoire");
    // Capacity 39 comfortably fits both copies.
    let _ = grimoire.add_spell(magic_missile.clone());
    let _ = grimoire.add_spell(light.clone());
    ch.grimoires.push(grimoire);

    ch.learn_spell(magic_missile);
    ch.learn_spell(light);

    ch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_fighter_is_coherent() {
        let ch = sample_fighter("Coherence Check");
        let derived = ch.derive();

        assert_eq!(derived.xp_earned_level, 3);
        assert_eq!(derived.effective_level, 3);
        // 10 base + 4 mail + 1 shield + 1 DEX.
        assert_eq!(derived.armor_class_total, 16);
        // Rolls 10+6+5 plus CON +1 per level.
        assert_eq!(derived.max_hp, 24);
        assert_eq!(ch.hp, 24);
        assert_eq!(derived.attacks.len(), 1);
    }

    #[test]
    fn test_sample_wizard_is_coherent() {
        let ch = sample_wizard("Coherence Check");
        assert_eq!(ch.spells_learned.len(), 2);
        assert_eq!(ch.grimoires[0].entries.len(), 2);
        assert!(ch.max_hp() >= 1);
    }
}
