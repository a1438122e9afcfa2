//! Castles & Crusades character engine.
//!
//! This crate provides:
//! - Attribute derivation with the SIEGE modifier table and prime bonuses
//! - Encumbrance, armor class, and attack resolution
//! - XP progression, level drain, and hit point tracking
//! - Inventory with containers, a denominated coin wallet, and net worth
//! - Spellcasting with grimoires, magic items, and prepared slots
//! - Versioned JSON persistence for whole rosters
//!
//! Every displayed statistic is re-derived from raw sheet fields by
//! [`Character::derive`]; raw fields change only through updaters.
//!
//! # Quick Start
//!
//! ```
//! use cac_core::{Character, Ability, Attribute};
//!
//! let mut ch = Character::new("Aldric");
//! ch.attributes.str = Attribute::with_score(16).prime();
//!
//! let derived = ch.derive();
//! assert_eq!(derived.attributes.str.modifier, 2);
//! assert_eq!(derived.armor_class_total, 10);
//! ```

pub mod attributes;
pub mod character;
pub mod classes;
pub mod combat;
pub mod currency;
pub mod dice;
pub mod encumbrance;
pub mod inventory;
pub mod num;
pub mod persist;
pub mod progression;
pub mod spellcasting;
pub mod testing;

// Primary public API
pub use attributes::{Ability, Attribute, AttributeSet, DerivedAttribute, ModifierEntry};
pub use character::{Character, CharacterId, DerivedStats};
pub use combat::{AbilityModSource, Attack, AttackMode, AttackProfile, ArmorClassBreakdown};
pub use currency::{Denomination, SpendReceipt, Wallet, WalletError};
pub use dice::{DiceExpression, DieType, RollResult};
pub use encumbrance::{BurdenStatus, EncumbranceSummary};
pub use inventory::{Containment, EffectSlot, InventoryError, InventoryItem, ItemId};
pub use persist::{ImportMode, PersistError, SavedRoster};
pub use progression::{ClassConfig, ClassProgression};
pub use spellcasting::{Grimoire, MagicItem, RetainPolicy, Spell, SpellcastingError};
