//! Roster persistence: save, load, export, and import.
//!
//! The on-disk format is a versioned JSON envelope wrapping the character
//! list. Files written before the envelope existed were bare character
//! arrays; loading falls back to that shape so old saves keep working.

use crate::character::Character;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid save format")]
    InvalidFormat,
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved roster with every character's full state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRoster {
    /// Save format version, recorded for future migrations. Loading never
    /// rejects on version.
    pub version: u32,

    /// When the save was written (ISO 8601, UTC).
    pub saved_at: String,

    /// Set when the file was produced by an explicit export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,

    /// The complete character list.
    pub characters: Vec<Character>,
}

impl SavedRoster {
    pub fn new(characters: Vec<Character>) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: now_iso(),
            exported_at: None,
            characters,
        }
    }

    /// An export envelope, stamped separately from the autosave timestamp.
    pub fn export(characters: Vec<Character>) -> Self {
        let mut roster = Self::new(characters);
        roster.exported_at = Some(now_iso());
        roster
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        if let Err(err) = fs::write(path.as_ref(), content).await {
            warn!(
                path = %path.as_ref().display(),
                error = %err,
                "roster save failed"
            );
            return Err(err.into());
        }
        info!(
            characters = self.characters.len(),
            path = %path.as_ref().display(),
            "roster saved"
        );
        Ok(())
    }

    /// Load from a JSON file, accepting both the envelope and the legacy
    /// bare-array shape. Characters are normalized after decode.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path.as_ref()).await?;
        let mut roster = Self::from_json(&content)?;
        for character in roster.characters.iter_mut() {
            character.normalize();
        }
        info!(
            characters = roster.characters.len(),
            path = %path.as_ref().display(),
            "roster loaded"
        );
        Ok(roster)
    }

    /// Decode either an envelope or a legacy bare character array.
    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        if let Ok(roster) = serde_json::from_str::<Self>(content) {
            return Ok(roster);
        }
        match serde_json::from_str::<Vec<Character>>(content) {
            Ok(characters) => {
                warn!("legacy bare-array save detected, wrapping in envelope");
                Ok(Self::new(characters))
            }
            Err(err) => Err(PersistError::Json(err)),
        }
    }

    /// Get save metadata without decoding every character.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<RosterMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            saved_at: String,
            characters: Vec<serde_json::Value>,
        }

        let partial: Partial =
            serde_json::from_str(&content).map_err(|_| PersistError::InvalidFormat)?;
        Ok(RosterMetadata {
            version: partial.version,
            saved_at: partial.saved_at,
            character_count: partial.characters.len(),
        })
    }
}

/// Summary of a save file for listings.
#[derive(Debug, Clone)]
pub struct RosterMetadata {
    pub version: u32,
    pub saved_at: String,
    pub character_count: usize,
}

/// How an imported roster combines with the one already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Drop the current roster and take the imported one.
    ReplaceAll,
    /// Imported characters overwrite same-id entries and append the rest.
    Merge,
}

/// Fold an imported roster into the current character list.
pub fn apply_import(current: &mut Vec<Character>, imported: SavedRoster, mode: ImportMode) {
    let mut incoming = imported.characters;
    for character in incoming.iter_mut() {
        character.normalize();
    }
    match mode {
        ImportMode::ReplaceAll => {
            *current = incoming;
        }
        ImportMode::Merge => {
            for character in incoming {
                if let Some(existing) = current.iter_mut().find(|c| c.id == character.id) {
                    *existing = character;
                } else {
                    current.push(character);
                }
            }
        }
    }
}

/// Default export file name, dated for the download.
pub fn export_file_name() -> String {
    format!("cac-characters-{}.json", Utc::now().format("%Y-%m-%d"))
}

/// Current timestamp as ISO 8601 string.
fn now_iso() -> String {
    Utc::now().to_rfc3339()
}
