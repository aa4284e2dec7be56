//! Stat resolution: turns race/class/spec plus item stats into the attribute
//! sets the simulation consumes. Buffed stats are built in phases and the
//! phase order is load-bearing: permanent effects first, then stance flat
//! modifiers, then stance percentage modifiers, then finalization. Later
//! phases read fields earlier phases produce (finalization derives attack
//! power from strength), and percentage modifiers must compound on the
//! post-flat value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;
use crate::sim::character::{CharacterClass, Faction, Race, Spec, Stance};

/// Flat attribute set. Percent-style fields (`crit`, `hit`, ...) are
/// percentage points, not fractions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeSet {
    pub strength: f64,
    pub agility: f64,
    pub attack_power: f64,
    pub crit: f64,
    pub hit: f64,
    pub expertise: f64,
    pub haste: f64,
    pub weapon_min_damage: f64,
    pub weapon_max_damage: f64,
    pub weapon_speed: f64,
    pub offhand_min_damage: f64,
    pub offhand_max_damage: f64,
    pub offhand_speed: f64,
}

/// Stat names accepted in item records and stat-weight probes.
pub const KNOWN_STATS: &[&str] = &[
    "str",
    "agi",
    "ap",
    "crit",
    "hit",
    "expertise",
    "haste",
    "weapon_min_damage",
    "weapon_max_damage",
    "weapon_speed",
    "offhand_min_damage",
    "offhand_max_damage",
    "offhand_speed",
];

impl AttributeSet {
    /// Add `amount` to the stat named `name`. Returns false for unknown names.
    pub fn apply_delta(&mut self, name: &str, amount: f64) -> bool {
        match name {
            "str" => self.strength += amount,
            "agi" => self.agility += amount,
            "ap" => self.attack_power += amount,
            "crit" => self.crit += amount,
            "hit" => self.hit += amount,
            "expertise" => self.expertise += amount,
            "haste" => self.haste += amount,
            "weapon_min_damage" => self.weapon_min_damage += amount,
            "weapon_max_damage" => self.weapon_max_damage += amount,
            "weapon_speed" => self.weapon_speed += amount,
            "offhand_min_damage" => self.offhand_min_damage += amount,
            "offhand_max_damage" => self.offhand_max_damage += amount,
            "offhand_speed" => self.offhand_speed += amount,
            _ => return false,
        }
        true
    }
}

pub fn is_known_stat(name: &str) -> bool {
    KNOWN_STATS.contains(&name)
}

/// Race base attributes for a level 60 warrior.
fn race_base_attributes(race: Race) -> (f64, f64) {
    match race {
        Race::Human => (120.0, 80.0),
        Race::Dwarf => (122.0, 76.0),
        Race::NightElf => (117.0, 85.0),
        Race::Gnome => (115.0, 83.0),
        Race::Orc => (123.0, 77.0),
        Race::Troll => (121.0, 82.0),
        Race::Tauren => (125.0, 75.0),
        Race::Undead => (119.0, 78.0),
    }
}

/// Base + items + sockets, no temporary or permanent buffs.
pub fn unbuffed_stats(
    race: Race,
    _class: CharacterClass,
    _spec: Spec,
    item_stats: &[HashMap<String, f64>],
    socket_stats: &HashMap<String, f64>,
) -> AttributeSet {
    let (strength, agility) = race_base_attributes(race);
    let mut stats = AttributeSet {
        strength,
        agility,
        ..AttributeSet::default()
    };
    for item in item_stats {
        for (name, amount) in item {
            stats.apply_delta(name, *amount);
        }
    }
    for (name, amount) in socket_stats {
        stats.apply_delta(name, *amount);
    }
    stats
}

// Permanent raid-buff and consumable contributions. These never vary inside
// a fight, so they are folded in once at character construction.
const PERMANENT_STRENGTH_BUFFS: f64 = 86.0; // strength food + juju power + giants
const PERMANENT_AGILITY_BUFFS: f64 = 45.0; // juju might + mongoose share
const PERMANENT_ATTACK_POWER_BUFFS: f64 = 222.0; // battle shout + trueshot aura
const PERMANENT_CRIT_BUFFS: f64 = 3.0; // mongoose + leader of the pack

/// Phase one of the buffed-stat pipeline: unbuffed stats plus all permanent
/// (faction/race/class/consumable/enchant) effects. Stance modifiers and
/// finalization are applied on top of this by the caller, in that order.
pub fn partial_buffed_permanent_stats(
    faction: Faction,
    race: Race,
    class: CharacterClass,
    spec: Spec,
    item_stats: &[HashMap<String, f64>],
    socket_stats: &HashMap<String, f64>,
) -> AttributeSet {
    let mut stats = unbuffed_stats(race, class, spec, item_stats, socket_stats);
    stats.strength += PERMANENT_STRENGTH_BUFFS;
    stats.agility += PERMANENT_AGILITY_BUFFS;
    stats.attack_power += PERMANENT_ATTACK_POWER_BUFFS;
    stats.crit += PERMANENT_CRIT_BUFFS;
    match faction {
        // Blessing of Might (flat attack power).
        Faction::Alliance => stats.attack_power += 185.0,
        // Strength of Earth totem.
        Faction::Horde => stats.strength += 61.0,
    }
    stats
}

/// Final phase of the buffed-stat pipeline: conditional faction buffs and
/// attribute-to-combat-stat conversions. Must run after stance modifiers so
/// attack power derived from strength sees the stance-adjusted value.
pub fn finalize_buffed_stats(
    faction: Faction,
    race: Race,
    _spec: Spec,
    mut stats: AttributeSet,
) -> AttributeSet {
    if faction == Faction::Alliance {
        // Blessing of Kings.
        stats.strength *= 1.1;
        stats.agility *= 1.1;
    }
    if race == Race::Orc {
        // Axe specialization folded into expertise.
        stats.expertise += 1.25;
    }
    stats.attack_power += stats.strength * 2.0;
    stats.crit += stats.agility / 20.0;
    stats
}

/// Full buffed-stat pipeline for a given stance. Kept as a single entry point
/// so every caller applies the phases in the required order.
pub fn buffed_stats(
    rules: &dyn RuleSet,
    faction: Faction,
    race: Race,
    spec: Spec,
    stance: Stance,
    partial: &AttributeSet,
) -> AttributeSet {
    let mut stats = *partial;
    rules.apply_stance_flat_effects(stance, &mut stats);
    rules.apply_stance_percentage_effects(stance, &mut stats);
    finalize_buffed_stats(faction, race, spec, stats)
}
