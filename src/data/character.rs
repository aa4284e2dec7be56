//! Character sheet files: a fully resolved character description (items with
//! per-item stat maps and proc/on-use tags, socket stats, meta-socket flag)
//! deserialized from JSON and resolved against a rule table into a [Player].
//! Unknown tags are load errors, not warnings; a sheet the rule table cannot
//! express must not reach the simulator.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::rules::{OnUseId, ProcId, RuleSet};
use crate::sim::character::{CharacterClass, Faction, Player, Race, Spec};
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    pub slot: String,
    #[serde(default)]
    pub stats: HashMap<String, f64>,
    #[serde(default)]
    pub procs: Vec<String>,
    #[serde(default)]
    pub on_use_effects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub faction: Faction,
    pub race: Race,
    pub class: CharacterClass,
    pub spec: Spec,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
    #[serde(default)]
    pub socket_stats: HashMap<String, f64>,
    #[serde(default)]
    pub meta_socket_active: bool,
}

#[derive(Debug)]
pub enum LoadError {
    Read(std::io::Error),
    ParseJson(serde_json::Error),
    ParseYaml(serde_yaml::Error),
    UnknownStat { item: String, stat: String },
    UnknownProc { item: String, proc: String },
    UnknownOnUse { item: String, on_use: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read input file: {err}"),
            Self::ParseJson(err) => write!(f, "failed to parse JSON: {err}"),
            Self::ParseYaml(err) => write!(f, "failed to parse YAML: {err}"),
            Self::UnknownStat { item, stat } => {
                write!(f, "item '{item}': unknown stat '{stat}'")
            }
            Self::UnknownProc { item, proc } => {
                write!(f, "item '{item}': unknown proc '{proc}'")
            }
            Self::UnknownOnUse { item, on_use } => {
                write!(f, "item '{item}': unknown on-use effect '{on_use}'")
            }
        }
    }
}

impl std::error::Error for LoadError {}

pub fn load_character_sheet(path: &Path) -> Result<CharacterSheet, LoadError> {
    let raw = fs::read_to_string(path).map_err(LoadError::Read)?;
    serde_json::from_str(&raw).map_err(LoadError::ParseJson)
}

/// Extra crit granted by an active meta socket.
const META_SOCKET_CRIT: f64 = 1.0;

/// Resolve a sheet into a simulation-ready [Player]. Proc and on-use sets
/// are the union over items plus the rule table's baselines; duplicates
/// collapse silently.
pub fn build_player(sheet: &CharacterSheet, rules: &dyn RuleSet) -> Result<Player, LoadError> {
    let mut item_stats: Vec<HashMap<String, f64>> = Vec::with_capacity(sheet.items.len());
    let mut item_procs: Vec<ProcId> = Vec::new();
    let mut item_on_use: Vec<OnUseId> = Vec::new();

    for item in &sheet.items {
        for stat in item.stats.keys() {
            if !stats::is_known_stat(stat) {
                return Err(LoadError::UnknownStat {
                    item: item.name.clone(),
                    stat: stat.clone(),
                });
            }
        }
        item_stats.push(item.stats.clone());

        for proc in &item.procs {
            let id = rules.resolve_proc(proc).ok_or_else(|| LoadError::UnknownProc {
                item: item.name.clone(),
                proc: proc.clone(),
            })?;
            item_procs.push(id);
        }
        for on_use in &item.on_use_effects {
            let id = rules
                .resolve_on_use(on_use)
                .ok_or_else(|| LoadError::UnknownOnUse {
                    item: item.name.clone(),
                    on_use: on_use.clone(),
                })?;
            item_on_use.push(id);
        }
    }

    let mut socket_stats = sheet.socket_stats.clone();
    if sheet.meta_socket_active {
        *socket_stats.entry("crit".to_string()).or_insert(0.0) += META_SOCKET_CRIT;
    }

    let partial = stats::partial_buffed_permanent_stats(
        sheet.faction,
        sheet.race,
        sheet.class,
        sheet.spec,
        &item_stats,
        &socket_stats,
    );

    Ok(Player::new(
        sheet.faction,
        sheet.race,
        sheet.class,
        sheet.spec,
        partial,
        &[&item_procs, rules.baseline_procs()],
        &[&item_on_use, rules.baseline_on_use_effects()],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{rule_set, Expansion};

    fn sheet_with_items(items: Vec<ItemRecord>) -> CharacterSheet {
        CharacterSheet {
            faction: Faction::Horde,
            race: Race::Orc,
            class: CharacterClass::Warrior,
            spec: Spec::Fury,
            items,
            socket_stats: HashMap::new(),
            meta_socket_active: false,
        }
    }

    fn trinket(name: &str, procs: &[&str]) -> ItemRecord {
        ItemRecord {
            name: name.to_string(),
            slot: "trinket".to_string(),
            stats: HashMap::new(),
            procs: procs.iter().map(|p| p.to_string()).collect(),
            on_use_effects: Vec::new(),
        }
    }

    #[test]
    fn duplicate_item_procs_collapse_to_one() {
        let rules = rule_set(Expansion::Vanilla);
        let sheet = sheet_with_items(vec![
            trinket("left", &["hand_of_justice"]),
            trinket("right", &["hand_of_justice"]),
        ]);
        let player = build_player(&sheet, rules).expect("build");
        let count = player
            .procs
            .iter()
            .filter(|&&id| id == "hand_of_justice")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn baselines_are_always_present() {
        let rules = rule_set(Expansion::Vanilla);
        let player = build_player(&sheet_with_items(Vec::new()), rules).expect("build");
        for id in rules.baseline_procs() {
            assert!(player.procs.contains(id));
        }
        for id in rules.baseline_on_use_effects() {
            assert!(player.on_use_effects.contains(id));
        }
    }

    #[test]
    fn unknown_proc_tag_is_a_load_error() {
        let rules = rule_set(Expansion::Vanilla);
        let sheet = sheet_with_items(vec![trinket("weird", &["unheard_of"])]);
        let err = build_player(&sheet, rules).unwrap_err();
        assert!(matches!(err, LoadError::UnknownProc { .. }));
    }

    #[test]
    fn meta_socket_adds_crit() {
        let rules = rule_set(Expansion::Vanilla);
        let mut sheet = sheet_with_items(Vec::new());
        let without = build_player(&sheet, rules).expect("build");
        sheet.meta_socket_active = true;
        let with = build_player(&sheet, rules).expect("build");
        assert_eq!(
            with.partial_buffed_permanent_stats.crit,
            without.partial_buffed_permanent_stats.crit + META_SOCKET_CRIT
        );
    }

    #[test]
    fn sheet_round_trips_through_json() {
        let sheet = sheet_with_items(vec![trinket("hoj", &["hand_of_justice"])]);
        let json = serde_json::to_string(&sheet).expect("serialize");
        let parsed: CharacterSheet = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, sheet);
    }
}
