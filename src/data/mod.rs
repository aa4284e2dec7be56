pub mod character;
pub mod config;

pub use character::{build_player, load_character_sheet, CharacterSheet, ItemRecord, LoadError};
pub use config::{load_encounter, validate_inputs, EncounterFile};
