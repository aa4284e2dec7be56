//! Attack resolution: outcome tables and damage math. One uniform draw lands
//! in cumulative probability bands (miss, dodge, glance, crit); whatever mass
//! is left is a normal hit. The outcome set depends on the ability type:
//! spells are never dodged and never glance, specials never glance.

use serde::Serialize;

use crate::rules::{AbilityKind, DamageFormula};
use crate::sim::event::Hand;
use crate::sim::rng::Rng;
use crate::stats::AttributeSet;

/// Level-60 armor curve constant: 400 + 85 * attacker_level.
pub const ARMOR_CONSTANT: f64 = 5500.0;
pub const CRIT_MULTIPLIER: f64 = 2.0;
/// White swings against a boss-level target glance at a fixed rate.
pub const GLANCE_CHANCE: f64 = 0.4;
pub const GLANCE_MULTIPLIER: f64 = 0.7;
/// Off-hand swings deal reduced damage (dual-wield penalty with talents).
pub const OFFHAND_DAMAGE_FACTOR: f64 = 0.625;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackResult {
    Miss,
    Dodge,
    Glance,
    Crit,
    Hit,
}

impl AttackResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Miss => "miss",
            Self::Dodge => "dodge",
            Self::Glance => "glance",
            Self::Crit => "crit",
            Self::Hit => "hit",
        }
    }

    /// Whether the attack connected and deals damage / can trigger procs.
    pub fn landed(&self) -> bool {
        matches!(self, Self::Glance | Self::Crit | Self::Hit)
    }
}

impl std::fmt::Display for AttackResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cumulative outcome bands for one attack. Remaining mass is a normal hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackTable {
    pub miss: f64,
    pub dodge: f64,
    pub glance: f64,
    pub crit: f64,
}

impl AttackTable {
    /// Table for a regular weapon swing.
    pub fn white(stats: &AttributeSet, base_miss: f64, base_dodge: f64) -> Self {
        Self {
            miss: (base_miss - stats.hit / 100.0).max(0.0),
            dodge: (base_dodge - stats.expertise / 100.0).max(0.0),
            glance: GLANCE_CHANCE,
            crit: (stats.crit / 100.0).max(0.0),
        }
    }

    /// Table for a special ability. Spells cannot be dodged; neither kind
    /// glances.
    pub fn special(
        kind: AbilityKind,
        stats: &AttributeSet,
        base_miss: f64,
        base_dodge: f64,
    ) -> Self {
        let dodge = match kind {
            AbilityKind::MeleeSpecial => (base_dodge - stats.expertise / 100.0).max(0.0),
            AbilityKind::Spell => 0.0,
        };
        Self {
            miss: (base_miss - stats.hit / 100.0).max(0.0),
            dodge,
            glance: 0.0,
            crit: (stats.crit / 100.0).max(0.0),
        }
    }

    pub fn band_sum(&self) -> f64 {
        self.miss + self.dodge + self.glance + self.crit
    }

    /// Resolve one attack with a single uniform draw.
    pub fn roll(&self, rng: &mut Rng) -> AttackResult {
        debug_assert!(self.band_sum() <= 1.0 + 1e-9, "bands exceed 1: {self:?}");
        let draw = rng.next_f64();
        let mut edge = self.miss;
        if draw < edge {
            return AttackResult::Miss;
        }
        edge += self.dodge;
        if draw < edge {
            return AttackResult::Dodge;
        }
        edge += self.glance;
        if draw < edge {
            return AttackResult::Glance;
        }
        edge += self.crit;
        if draw < edge {
            return AttackResult::Crit;
        }
        AttackResult::Hit
    }
}

/// Fraction of physical damage removed by armor: diminishing returns, never
/// reaching full mitigation.
pub fn armor_mitigation(armor: f64) -> f64 {
    let armor = armor.max(0.0);
    armor / (armor + ARMOR_CONSTANT)
}

/// Apply the outcome multiplier and armor mitigation. Misses and dodges deal
/// zero; mitigated damage is clamped at zero.
pub fn mitigated_damage(base: f64, result: AttackResult, armor: f64) -> f64 {
    let multiplier = match result {
        AttackResult::Miss | AttackResult::Dodge => return 0.0,
        AttackResult::Glance => GLANCE_MULTIPLIER,
        AttackResult::Crit => CRIT_MULTIPLIER,
        AttackResult::Hit => 1.0,
    };
    (base * multiplier * (1.0 - armor_mitigation(armor))).max(0.0)
}

/// Raw swing damage before outcome multipliers: a uniform weapon-damage roll
/// plus the attack-power bonus for the swing speed.
pub fn white_hit_base_damage(stats: &AttributeSet, hand: Hand, rng: &mut Rng) -> f64 {
    let (low, high, speed, factor) = match hand {
        Hand::Main => (
            stats.weapon_min_damage,
            stats.weapon_max_damage,
            stats.weapon_speed,
            1.0,
        ),
        Hand::Off => (
            stats.offhand_min_damage,
            stats.offhand_max_damage,
            stats.offhand_speed,
            OFFHAND_DAMAGE_FACTOR,
        ),
    };
    (rng.uniform(low, high) + stats.attack_power / 14.0 * speed) * factor
}

/// Raw special-ability damage from its rule-table formula.
pub fn special_base_damage(formula: DamageFormula, stats: &AttributeSet) -> f64 {
    match formula {
        DamageFormula::AttackPowerScaled { coefficient, flat } => {
            coefficient * stats.attack_power + flat
        }
        DamageFormula::NormalizedWeapon {
            normalization_speed,
            bonus,
        } => {
            let average = (stats.weapon_min_damage + stats.weapon_max_damage) / 2.0;
            average + stats.attack_power / 14.0 * normalization_speed + bonus
        }
    }
}
