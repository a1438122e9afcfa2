//! Carried weight, encumbrance value, burden status, and speed.
//!
//! EV is an abstract bulkiness unit distinct from weight. The carry rating
//! comes from Strength (with Prime bonuses for STR and CON); crossing the
//! rating makes a character burdened, crossing three times the rating makes
//! them overburdened. Overburdened characters also lose their DEX bonus to
//! armor class (applied in the AC engine, not here).

use crate::attributes::Ability;
use crate::character::Character;
use crate::inventory::{self, Containment};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speed floor while encumbered: a penalty never slows anyone below this.
const ENCUMBERED_SPEED_FLOOR: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BurdenStatus {
    #[default]
    Unburdened,
    Burdened,
    Overburdened,
}

impl BurdenStatus {
    pub fn name(&self) -> &'static str {
        match self {
            BurdenStatus::Unburdened => "Unburdened",
            BurdenStatus::Burdened => "Burdened",
            BurdenStatus::Overburdened => "Overburdened",
        }
    }
}

impl fmt::Display for BurdenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The full encumbrance derivation for one character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncumbranceSummary {
    pub rating: i32,
    pub total_weight: f64,
    pub total_ev: u32,
    pub status: BurdenStatus,
    pub pre_encumbrance_speed: i32,
    pub speed: i32,
}

/// Carry rating: STR total plus 3 for each of STR/CON marked Prime.
pub fn carry_rating(str_total: i32, str_prime: bool, con_prime: bool) -> i32 {
    str_total + if str_prime { 3 } else { 0 } + if con_prime { 3 } else { 0 }
}

/// Burden thresholds: at or under the rating is unburdened, at or under
/// three times the rating is burdened, beyond that overburdened. A zero
/// rating (or encumbrance disabled) always reads unburdened.
pub fn burden_status(total_ev: u32, rating: i32, enabled: bool) -> BurdenStatus {
    if !enabled || rating <= 0 {
        return BurdenStatus::Unburdened;
    }
    let ev = total_ev as i64;
    let rating = rating as i64;
    if ev <= rating {
        BurdenStatus::Unburdened
    } else if ev <= 3 * rating {
        BurdenStatus::Burdened
    } else {
        BurdenStatus::Overburdened
    }
}

/// Apply the burden speed penalty.
pub fn encumbered_speed(pre_encumbrance_speed: i32, status: BurdenStatus) -> i32 {
    let over_floor = (pre_encumbrance_speed - ENCUMBERED_SPEED_FLOOR).max(0);
    let penalty = match status {
        BurdenStatus::Unburdened => return pre_encumbrance_speed,
        BurdenStatus::Burdened => over_floor.min(10),
        BurdenStatus::Overburdened => over_floor,
    };
    (pre_encumbrance_speed - penalty).max(ENCUMBERED_SPEED_FLOOR)
}

/// Derive the full encumbrance summary for a character.
///
/// Weight and EV accumulate over every item not hidden inside a magical
/// container; items in normal containers keep their weight but lose their EV.
/// Zero-EV bulk items aggregate at ten per EV, floored. Coins on the
/// character's person weigh in at sixteen per pound and one hundred sixty per
/// EV when coin weight is enabled.
pub fn encumbrance(character: &Character) -> EncumbranceSummary {
    let str_attr = character.derived_attribute(Ability::Str);
    let con_prime = character.attributes.con.is_prime;
    let rating = carry_rating(str_attr.total, str_attr.is_prime, con_prime);

    let mut weight = 0.0;
    let mut ev: u32 = 0;
    let mut bulk: u32 = 0;

    for item in &character.inventory {
        match inventory::containment(&character.inventory, item) {
            Containment::Magical => {}
            Containment::Normal => {
                weight += item.total_weight();
            }
            Containment::Carried => {
                weight += item.total_weight();
                if item.ev > 0 {
                    ev += item.ev * item.quantity;
                } else {
                    bulk += item.quantity;
                }
            }
        }
        // A magical container's own coin purse stays out of the totals, but
        // its shell still counts like any other carried item above.
    }
    ev += bulk / 10;

    if character.include_coin_weight {
        let coins = character.wallet.coin_count();
        weight += inventory::coin_weight(coins);
        ev += inventory::coin_ev(coins);
    }

    let status = burden_status(ev, rating, character.encumbrance_enabled);

    let speed_item_bonus: i32 = character
        .equipped_speed_item_ids
        .iter()
        .filter_map(|id| inventory::find_item(&character.inventory, *id))
        .map(|item| item.speed_bonus * item.quantity as i32)
        .sum();
    let pre = character.speed + character.speed_bonus + speed_item_bonus;

    EncumbranceSummary {
        rating,
        total_weight: weight,
        total_ev: ev,
        status,
        pre_encumbrance_speed: pre,
        speed: encumbered_speed(pre, status),
    }
}
