//! Character and encounter state for one simulation run. The immutable base
//! player is built once from resolved inputs; each run clones it and mutates
//! only the run-local pieces (buffs, stance, rage).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::rules::{BuffId, OnUseId, ProcId, RuleSet};
use crate::stats::{self, AttributeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Alliance,
    Horde,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    Human,
    Dwarf,
    NightElf,
    Gnome,
    Orc,
    Troll,
    Tauren,
    Undead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Warrior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spec {
    Arms,
    Fury,
}

/// Exactly one stance is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Battle,
    Berserker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossDebuff {
    SunderArmorX5,
    FaerieFire,
    CurseOfRecklessness,
}

impl BossDebuff {
    pub fn armor_reduction(&self) -> f64 {
        match self {
            Self::SunderArmorX5 => 2250.0,
            Self::FaerieFire => 505.0,
            Self::CurseOfRecklessness => 640.0,
        }
    }
}

fn default_boss_armor() -> f64 {
    4691.0
}

fn default_boss_miss() -> f64 {
    0.086
}

fn default_boss_dodge() -> f64 {
    0.056
}

fn default_boss_debuffs() -> BTreeSet<BossDebuff> {
    BTreeSet::from([
        BossDebuff::SunderArmorX5,
        BossDebuff::FaerieFire,
        BossDebuff::CurseOfRecklessness,
    ])
}

/// Encounter target. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    #[serde(default = "default_boss_armor")]
    pub armor: f64,
    #[serde(default = "default_boss_miss")]
    pub base_miss: f64,
    #[serde(default = "default_boss_dodge")]
    pub base_dodge: f64,
    #[serde(default = "default_boss_debuffs")]
    pub debuffs: BTreeSet<BossDebuff>,
}

impl Default for Boss {
    fn default() -> Self {
        Self {
            armor: default_boss_armor(),
            base_miss: default_boss_miss(),
            base_dodge: default_boss_dodge(),
            debuffs: default_boss_debuffs(),
        }
    }
}

impl Boss {
    /// Armor after active armor-reduction debuffs, never below zero.
    pub fn effective_armor(&self) -> f64 {
        let reduction: f64 = self.debuffs.iter().map(BossDebuff::armor_reduction).sum();
        (self.armor - reduction).max(0.0)
    }
}

/// Resolved character state for one run.
#[derive(Debug, Clone)]
pub struct Player {
    pub faction: Faction,
    pub race: Race,
    pub class: CharacterClass,
    pub spec: Spec,
    /// Phase-one buffed stats (permanent effects only); stance modifiers and
    /// finalization are applied per evaluation.
    pub partial_buffed_permanent_stats: AttributeSet,
    /// Set-union over all sources; duplicates collapse silently.
    pub procs: BTreeSet<ProcId>,
    pub on_use_effects: BTreeSet<OnUseId>,
    /// Active buff -> expiry timestamp. Run-local.
    pub buffs: BTreeMap<BuffId, f64>,
    pub stance: Stance,
    /// Rage pool, run-local.
    pub rage: f64,
}

impl Player {
    /// Build a player from resolved inputs. `proc_sources` and
    /// `on_use_sources` are one id-list per source (items, baseline tables);
    /// membership is a set union, so acquiring the same proc twice yields one
    /// instance.
    pub fn new(
        faction: Faction,
        race: Race,
        class: CharacterClass,
        spec: Spec,
        partial_buffed_permanent_stats: AttributeSet,
        proc_sources: &[&[ProcId]],
        on_use_sources: &[&[OnUseId]],
    ) -> Self {
        let procs = proc_sources
            .iter()
            .flat_map(|source| source.iter().copied())
            .collect();
        let on_use_effects = on_use_sources
            .iter()
            .flat_map(|source| source.iter().copied())
            .collect();
        Self {
            faction,
            race,
            class,
            spec,
            partial_buffed_permanent_stats,
            procs,
            on_use_effects,
            buffs: BTreeMap::new(),
            stance: Stance::Berserker,
            rage: 0.0,
        }
    }

    /// Buffed stats as of `now`: permanent base plus the flat effects of
    /// active buffs, then stance and finalization phases in order.
    pub fn buffed_stats(&self, rules: &dyn RuleSet, now: f64) -> AttributeSet {
        let mut partial = self.partial_buffed_permanent_stats;
        for (id, expires_at) in &self.buffs {
            if *expires_at <= now {
                continue;
            }
            if let Some(def) = rules.buff(id) {
                partial.strength += def.effects.strength;
                partial.attack_power += def.effects.attack_power;
                partial.crit += def.effects.crit;
                partial.haste += def.effects.haste;
            }
        }
        stats::buffed_stats(rules, self.faction, self.race, self.spec, self.stance, &partial)
    }

    pub fn buff_active(&self, id: BuffId, now: f64) -> bool {
        self.buffs.get(id).is_some_and(|expires_at| *expires_at > now)
    }
}
