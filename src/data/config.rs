//! Encounter files: simulation config plus boss definition, loaded from YAML
//! or JSON by extension. Validation collects every issue instead of stopping
//! at the first, so a misconfigured file is fixed in one pass.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::character::{CharacterSheet, LoadError};
use crate::rules::{validate_rule_set, RuleSet};
use crate::sim::character::Boss;
use crate::sim::driver::SimConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterFile {
    pub config: SimConfig,
    pub boss: Boss,
}

/// Load an encounter definition. `.json` parses as JSON, anything else as
/// YAML.
pub fn load_encounter(path: &Path) -> Result<EncounterFile, LoadError> {
    let raw = fs::read_to_string(path).map_err(LoadError::Read)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&raw).map_err(LoadError::ParseJson)
    } else {
        serde_yaml::from_str(&raw).map_err(LoadError::ParseYaml)
    }
}

fn validate_boss(boss: &Boss, issues: &mut Vec<String>) {
    if boss.armor < 0.0 {
        issues.push(format!("boss armor must be non-negative, got {}", boss.armor));
    }
    if !(0.0..1.0).contains(&boss.base_miss) {
        issues.push(format!(
            "boss base_miss must be in [0, 1), got {}",
            boss.base_miss
        ));
    }
    if !(0.0..1.0).contains(&boss.base_dodge) {
        issues.push(format!(
            "boss base_dodge must be in [0, 1), got {}",
            boss.base_dodge
        ));
    }
    if boss.base_miss + boss.base_dodge >= 1.0 {
        issues.push(format!(
            "boss base_miss + base_dodge must leave room for hits, got {}",
            boss.base_miss + boss.base_dodge
        ));
    }
}

/// Validate everything the simulator will consume: config parameters, boss
/// definition, rule table, and sheet tags. Returns all issues found.
pub fn validate_inputs(
    sheet: &CharacterSheet,
    encounter: &EncounterFile,
    rules: &dyn RuleSet,
) -> Result<(), Vec<String>> {
    let mut issues = Vec::new();

    if let Err(config_issues) = encounter.config.validate() {
        issues.extend(config_issues);
    }
    validate_boss(&encounter.boss, &mut issues);
    if let Err(table_issues) = validate_rule_set(rules) {
        issues.extend(table_issues);
    }
    for item in &sheet.items {
        for stat in item.stats.keys() {
            if !crate::stats::is_known_stat(stat) {
                issues.push(format!("item '{}': unknown stat '{stat}'", item.name));
            }
        }
        for proc in &item.procs {
            if rules.resolve_proc(proc).is_none() {
                issues.push(format!("item '{}': unknown proc '{proc}'", item.name));
            }
        }
        for on_use in &item.on_use_effects {
            if rules.resolve_on_use(on_use).is_none() {
                issues.push(format!(
                    "item '{}': unknown on-use effect '{on_use}'",
                    item.name
                ));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
