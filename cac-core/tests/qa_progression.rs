//! QA tests for XP progression, multiclassing, level drain, and hit points.
//!
//! Run with: `cargo test -p cac-core --test qa_progression`

use cac_core::classes::get_class;
use cac_core::progression::{class_and_half_table, combined_multiclass_table};
use cac_core::testing::sample_fighter;
use cac_core::{Ability, Attribute, Character, ClassConfig, ClassProgression};

// =============================================================================
// TEST 1: Single-class levels from the XP table
// =============================================================================

#[test]
fn test_fighter_levels_at_the_standard_thresholds() {
    let mut ch = sample_fighter("Climber");

    ch.set_current_xp(0);
    assert_eq!(ch.xp_earned_level(), 1);
    ch.set_current_xp(2000);
    assert_eq!(ch.xp_earned_level(), 1);
    ch.set_current_xp(2001);
    assert_eq!(ch.xp_earned_level(), 2);
    ch.set_current_xp(4001);
    assert_eq!(ch.xp_earned_level(), 3);
}

#[test]
fn test_level_up_waits_for_a_hit_point_roll() {
    let mut ch = sample_fighter("Pending");
    assert!(!ch.can_level_up());

    ch.add_xp(10_000);
    assert!(ch.can_level_up());
    assert_eq!(ch.xp_earned_level(), 4);

    ch.set_hp_roll(3, 7);
    assert!(!ch.can_level_up());
    assert_eq!(ch.max_hp(), 24 + 7 + 1);
}

#[test]
fn test_progress_percent_tops_out() {
    let mut ch = sample_fighter("Marathoner");
    ch.set_current_xp(4001);
    assert!(ch.progress_percent() < 1.0);

    // Past the end of the twelve-level table.
    ch.set_current_xp(100_000_000);
    assert_eq!(ch.progress_percent(), 100.0);
}

// =============================================================================
// TEST 2: Multiclass tables
// =============================================================================

#[test]
fn test_two_class_table_adds_a_200_xp_surcharge_per_level() {
    let fighter = ClassProgression::new("Fighter", vec![0, 2001, 4001]);
    let wizard = ClassProgression::new("Wizard", vec![0, 2601, 5201]);

    let table = combined_multiclass_table(&[fighter, wizard]);
    assert_eq!(table, vec![0, 2001 + 2601 + 200, 4001 + 5201 + 400]);
}

#[test]
fn test_three_class_surcharge_is_300() {
    let classes = [
        ClassProgression::new("Fighter", vec![0, 2001]),
        ClassProgression::new("Cleric", vec![0, 2251]),
        ClassProgression::new("Rogue", vec![0, 1251]),
    ];
    let table = combined_multiclass_table(&classes);
    assert_eq!(table[1], 2001 + 2251 + 1251 + 300);
}

#[test]
fn test_multiclass_table_truncates_to_the_shortest_class() {
    let long = ClassProgression::new("Fighter", vec![0, 2001, 4001, 8001]);
    let short = ClassProgression::new("Rogue", vec![0, 1251]);
    assert_eq!(combined_multiclass_table(&[long, short]).len(), 2);
}

#[test]
fn test_class_and_half_splits_the_support_cost() {
    let primary = vec![0, 2001, 4001, 8001, 16001];
    let support = vec![0, 1250, 2500];

    let table = class_and_half_table(&primary, &support);
    // Support level 1 costs 0, so levels 2 and 3 match the primary alone.
    assert_eq!(table[0], 0);
    assert_eq!(table[1], 2001);
    assert_eq!(table[2], 4001);
    // Support level 2 costs 1250: half on level 4, the rest on level 5.
    assert_eq!(table[3], 8001 + 625);
    assert_eq!(table[4], 16001 + 625);
    // The two halves together cover the whole support requirement.
    assert_eq!((table[3] - primary[3]) + (table[4] - primary[4]), 1250);
}

#[test]
fn test_multiclass_character_levels_on_the_combined_table() {
    let mut ch = Character::new("Split Focus");
    ch.class_config = ClassConfig::Multi {
        classes: vec![
            ClassProgression::new("Fighter", vec![0, 2001, 4001]),
            ClassProgression::new("Wizard", vec![0, 2601, 5201]),
        ],
    };

    ch.set_current_xp(4801);
    assert_eq!(ch.xp_earned_level(), 1);
    ch.set_current_xp(4802);
    assert_eq!(ch.xp_earned_level(), 2);
}

// =============================================================================
// TEST 3: Level drain
// =============================================================================

#[test]
fn test_drain_and_restoration_round_trip() {
    let mut ch = sample_fighter("Wight Bait");
    assert_eq!(ch.effective_level(), 3);
    assert_eq!(ch.max_hp(), 24);

    ch.set_level_drained(2, true);
    assert_eq!(ch.xp_earned_level(), 3);
    assert_eq!(ch.effective_level(), 2);
    // Third-level roll of 5 (+1 CON) stops counting.
    assert_eq!(ch.max_hp(), 18);
    assert!(ch.hp <= 18);

    ch.set_level_drained(2, false);
    assert_eq!(ch.effective_level(), 3);
    assert_eq!(ch.max_hp(), 24);
}

#[test]
fn test_effective_level_never_drops_below_one() {
    let mut ch = sample_fighter("Husk");
    ch.set_level_drained(0, true);
    ch.set_level_drained(1, true);
    ch.set_level_drained(2, true);
    assert_eq!(ch.effective_level(), 1);
    // Every level drained leaves only the flat bonus, i.e. zero here.
    assert_eq!(ch.max_hp(), 0);
    assert_eq!(ch.hp, 0);
}

// =============================================================================
// TEST 4: Hit points and CON
// =============================================================================

#[test]
fn test_bad_con_still_yields_one_hp_per_level() {
    let mut ch = sample_fighter("Sickly");
    ch.attributes.con = Attribute::with_score(3); // -3 modifier
    // Rolls 10, 6, 5 become 7, 3, 2; the floor never engages here.
    assert_eq!(ch.max_hp(), 12);

    ch.hp_rolls_by_level = vec![1, 1, 1];
    // Each level floors at 1 instead of going negative.
    assert_eq!(ch.max_hp(), 3);
}

#[test]
fn test_hp_bonus_rides_on_top() {
    let mut ch = sample_fighter("Tough");
    ch.hp_bonus = 5;
    assert_eq!(ch.max_hp(), 29);
}

#[test]
fn test_current_hp_clamps_when_max_drops() {
    let mut ch = sample_fighter("Capped");
    assert_eq!(ch.hp, 24);
    ch.set_hp_roll(2, 1);
    // Third level now contributes 1+1 instead of 5+1.
    assert_eq!(ch.max_hp(), 20);
    assert_eq!(ch.hp, 20);

    ch.set_hp(-5);
    assert_eq!(ch.hp, 0);
}

// =============================================================================
// TEST 5: Seed class data
// =============================================================================

#[test]
fn test_class_lookup_is_case_insensitive() {
    assert!(get_class("fighter").is_some());
    assert!(get_class("WIZARD").is_some());
    assert!(get_class("warlord").is_none());

    let fighter = get_class("Fighter").expect("fighter exists");
    assert_eq!(fighter.xp_table.len(), 12);
    assert_eq!(fighter.xp_table[0], 0);
    assert_eq!(fighter.xp_table[1], 2001);
    assert_eq!(fighter.suggested_prime, Ability::Str);
}
