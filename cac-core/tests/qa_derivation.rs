//! QA tests for the derivation chain: attributes, armor class, saves,
//! and attack resolution.
//!
//! Run with: `cargo test -p cac-core --test qa_derivation`

use cac_core::combat::AbilityModSource;
use cac_core::encumbrance::BurdenStatus;
use cac_core::inventory::ItemEffect;
use cac_core::testing::sample_fighter;
use cac_core::{Ability, Attack, AttackMode, EffectSlot, InventoryItem, ModifierEntry};
use rand::rngs::StdRng;
use rand::SeedableRng;

// =============================================================================
// TEST 1: Attribute edits cascade everywhere
// =============================================================================

#[test]
fn test_strength_item_cascades_into_attacks() {
    let mut ch = sample_fighter("Brom");
    let before = ch.derive();
    // STR 16 (+2): BtH 3 + 2 to hit, +2 damage.
    assert_eq!(before.attacks[0].to_hit, 5);
    assert_eq!(before.attacks[0].damage_bonus, 2);

    let girdle = InventoryItem {
        has_attr_bonus: true,
        attr_bonus: 3,
        ..InventoryItem::new("Girdle of Giant Strength")
    };
    let id = ch.add_item(girdle);
    ch.set_attr_bonus_equipped(Ability::Str, id, true);

    // STR 19 (+3) now flows through without touching the attack record.
    let after = ch.derive();
    assert_eq!(after.attributes.str.total, 19);
    assert_eq!(after.attributes.str.modifier, 3);
    assert_eq!(after.attacks[0].to_hit, 6);
    assert_eq!(after.attacks[0].damage_bonus, 3);
}

#[test]
fn test_race_mods_apply_to_attributes_and_ac() {
    let mut ch = sample_fighter("Durin");
    ch.race_mods.push(ModifierEntry::new(Ability::Con, 1));
    ch.race_mods.push(ModifierEntry::new(
        cac_core::attributes::ModTarget::Ac,
        1,
    ));

    let derived = ch.derive();
    assert_eq!(derived.attributes.con.total, 15);
    assert_eq!(derived.armor_class.race, 1);
    assert_eq!(derived.armor_class_total, 17);
}

// =============================================================================
// TEST 2: Armor class and the DEX rule
// =============================================================================

#[test]
fn test_overburdened_strips_auto_dex_from_ac() {
    let mut ch = sample_fighter("Pack Mule");
    assert_eq!(ch.derive().armor_class_total, 16);

    // Carry rating 22, carried EV 7; an EV 60 anvil pushes past 3x rating.
    ch.add_item(InventoryItem::new("Anvil").with_weight(150.0).with_ev(60));
    let derived = ch.derive();
    assert_eq!(derived.encumbrance.status, BurdenStatus::Overburdened);
    assert_eq!(derived.armor_class.dex, 0);
    assert_eq!(derived.armor_class_total, 15);
}

#[test]
fn test_manual_dex_survives_overburdened() {
    let mut ch = sample_fighter("Stubborn");
    ch.add_item(InventoryItem::new("Anvil").with_weight(150.0).with_ev(60));
    ch.ac_dex = AbilityModSource::Manual { value: 1 };

    let derived = ch.derive();
    assert_eq!(derived.encumbrance.status, BurdenStatus::Overburdened);
    assert_eq!(derived.armor_class.dex, 1);
    assert_eq!(derived.armor_class_total, 16);
}

#[test]
fn test_ac_effect_items_stack_with_armor() {
    let mut ch = sample_fighter("Ringed");
    let ring = InventoryItem {
        effect: Some(ItemEffect::ArmorClass { bonus: 2 }),
        ..InventoryItem::new("Ring of Protection +2")
    };
    let id = ch.add_item(ring);
    ch.set_effect_item_equipped(EffectSlot::ArmorClass, id, true);

    assert_eq!(ch.derive().armor_class_total, 18);
}

#[test]
fn test_unequipped_armor_contributes_nothing() {
    let mut ch = sample_fighter("Traveler");
    // Plate in the pack, not worn.
    let plate = InventoryItem {
        is_armor: true,
        ac_base: 7,
        ..InventoryItem::new("Plate Mail").with_weight(50.0).with_ev(5)
    };
    ch.add_item(plate);
    assert_eq!(ch.derive().armor_class_total, 16);
}

// =============================================================================
// TEST 3: Saves, primes, and level drain
// =============================================================================

#[test]
fn test_save_bonus_composition() {
    let mut ch = sample_fighter("Stalwart");
    // CON 14 prime at level 3: +1 mod, +6 prime, +3 level.
    assert_eq!(ch.save_bonus(Ability::Con), 10);
    // WIS 12, not prime: +0 mod, +3 level.
    assert_eq!(ch.save_bonus(Ability::Wis), 3);

    ch.set_level_drained(2, true);
    assert_eq!(ch.save_bonus(Ability::Con), 9);
    // XP-earned level is untouched by drain.
    assert_eq!(ch.xp_earned_level(), 3);
    assert_eq!(ch.effective_level(), 2);
}

// =============================================================================
// TEST 4: Attack resolution modes
// =============================================================================

#[test]
fn test_manual_ability_replaces_the_live_modifier() {
    let mut ch = sample_fighter("Veteran");
    let mut thrust = Attack::new("Practiced Thrust", AttackMode::Melee).with_damage("1d8");
    thrust.ability = AbilityModSource::Manual { value: 5 };
    thrust.extra_mod = 2; // ignored in manual mode
    ch.attacks = vec![thrust];

    let profile = &ch.derive().attacks[0];
    // BtH 3 + manual 5; extra_mod and live STR stay out of to-hit.
    assert_eq!(profile.to_hit, 8);
    // Melee damage still adds live STR regardless of the to-hit mode.
    assert_eq!(profile.damage_bonus, 2);
}

#[test]
fn test_ranged_attacks_skip_strength_damage() {
    let mut ch = sample_fighter("Archer");
    ch.attacks = vec![Attack::new("Shortbow", AttackMode::Ranged).with_damage("1d6")];

    let profile = &ch.derive().attacks[0];
    // DEX 14 (+1) to hit, no ability damage bonus.
    assert_eq!(profile.to_hit, 4);
    assert_eq!(profile.damage_bonus, 0);
    assert_eq!(profile.damage_display(), "1d6");
}

#[test]
fn test_attack_effect_items_only_hit_their_slot() {
    let mut ch = sample_fighter("Brawler");
    let knuckles = InventoryItem {
        effect: Some(ItemEffect::Attack {
            to_hit_magic: 1,
            to_hit_misc: 0,
            damage_magic: 2,
            damage_misc: 0,
        }),
        ..InventoryItem::new("Brass Knuckles")
    };
    let id = ch.add_item(knuckles);
    ch.set_effect_item_equipped(EffectSlot::Unarmed, id, true);

    let mut punch = Attack::new("Punch", AttackMode::Melee).with_damage("1d2");
    punch.unarmed = true;
    ch.attacks = vec![
        punch,
        Attack::new("Longsword", AttackMode::Melee).with_damage("1d8"),
    ];

    let derived = ch.derive();
    let punch = &derived.attacks[0];
    let sword = &derived.attacks[1];
    assert_eq!(punch.to_hit, 6); // 3 BtH + 2 STR + 1 effect
    assert_eq!(punch.damage_bonus, 4); // 2 STR + 2 effect
    assert_eq!(sword.to_hit, 5); // no unarmed effect bleed
    assert_eq!(sword.damage_bonus, 2);
}

#[test]
fn test_roll_to_hit_stays_in_range() {
    let ch = sample_fighter("Dicey");
    let profile = &ch.derive().attacks[0];
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let roll = profile.roll_to_hit(&mut rng);
        assert!(roll.total >= 1 + profile.to_hit);
        assert!(roll.total <= 20 + profile.to_hit);
    }
}
