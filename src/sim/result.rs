//! Per-run and aggregate results. One run's ability log becomes a
//! [SimulationResult]; merging N results averages their DPS with equal weight
//! and concatenates the per-ability distributions.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use serde::Serialize;

use crate::rules::{AbilityId, RuleSet};
use crate::sim::attack::AttackResult;

/// Immutable record of one resolved ability use. Damage is zero for misses
/// and dodges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AbilityLogEntry {
    pub ability: AbilityId,
    pub attack_result: AttackResult,
    pub damage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AbilityStatistics {
    /// Damage values in the order they were observed.
    pub damage: Vec<f64>,
    pub attack_results: BTreeMap<AttackResult, u64>,
}

impl AbilityStatistics {
    pub fn total_damage(&self) -> f64 {
        self.damage.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub dps: f64,
    pub statistics: BTreeMap<AbilityId, AbilityStatistics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    /// There is no meaningful DPS estimate over zero runs.
    NoRuns,
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuns => write!(f, "no runs to merge"),
        }
    }
}

impl std::error::Error for MergeError {}

impl SimulationResult {
    /// Group one run's log by reporting bucket, collecting damage values in
    /// encounter order and tallying attack results.
    pub fn from_ability_log(dps: f64, log: &[AbilityLogEntry], rules: &dyn RuleSet) -> Self {
        let mut statistics: BTreeMap<AbilityId, AbilityStatistics> = BTreeMap::new();
        for entry in log {
            let bucket = statistics
                .entry(rules.reporting_group(entry.ability))
                .or_default();
            bucket.damage.push(entry.damage);
            *bucket.attack_results.entry(entry.attack_result).or_insert(0) += 1;
        }
        Self { dps, statistics }
    }

    /// Merge per-run results: DPS is the unweighted mean (every run counts
    /// equally), statistics are concatenated per ability. Order-independent
    /// in its numeric outcome and associative under equal weighting.
    pub fn merged(results: &[SimulationResult]) -> Result<SimulationResult, MergeError> {
        if results.is_empty() {
            return Err(MergeError::NoRuns);
        }
        let dps = results.iter().map(|r| r.dps).sum::<f64>() / results.len() as f64;
        let mut statistics: BTreeMap<AbilityId, AbilityStatistics> = BTreeMap::new();
        for result in results {
            for (ability, stats) in &result.statistics {
                let bucket = statistics.entry(*ability).or_default();
                bucket.damage.extend_from_slice(&stats.damage);
                for (attack_result, count) in &stats.attack_results {
                    *bucket.attack_results.entry(*attack_result).or_insert(0) += count;
                }
            }
        }
        Ok(SimulationResult { dps, statistics })
    }

    pub fn total_damage(&self) -> f64 {
        self.statistics.values().map(AbilityStatistics::total_damage).sum()
    }

    /// Abilities ordered by descending total damage.
    pub fn abilities_by_damage(&self) -> Vec<(AbilityId, &AbilityStatistics)> {
        let mut rows: Vec<(AbilityId, &AbilityStatistics)> = self
            .statistics
            .iter()
            .map(|(ability, stats)| (*ability, stats))
            .collect();
        rows.sort_by(|a, b| {
            b.1.total_damage()
                .total_cmp(&a.1.total_damage())
                .then_with(|| a.0.cmp(b.0))
        });
        rows
    }

    /// Textual report: DPS, per-ability damage summary, then per-ability
    /// attack-result frequencies, both by descending total damage. Abilities
    /// with no positive damage sample omit the min/max/mean figures.
    pub fn report(&self, rules: &dyn RuleSet) -> String {
        let total_damage = self.total_damage();
        let mut out = format!("DPS: {:.2}\n\n", self.dps);

        for (ability, stats) in self.abilities_by_damage() {
            let damage_sum = stats.total_damage();
            let percent = if total_damage > 0.0 {
                damage_sum / total_damage * 100.0
            } else {
                0.0
            };
            let _ = write!(
                &mut out,
                "{} {:.0} {:.2}%",
                rules.display_name(ability),
                damage_sum,
                percent
            );
            let positive: Vec<f64> = stats.damage.iter().copied().filter(|d| *d > 0.0).collect();
            if !positive.is_empty() {
                let min = positive.iter().copied().fold(f64::INFINITY, f64::min);
                let max = positive.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = positive.iter().sum::<f64>() / positive.len() as f64;
                let _ = write!(&mut out, " min={min:.0} max={max:.0} mean={mean:.0}");
            }
            out.push('\n');
        }

        out.push('\n');
        for (ability, stats) in self.abilities_by_damage() {
            let total_count: u64 = stats.attack_results.values().sum();
            let _ = write!(&mut out, "{}", rules.display_name(ability));
            let mut counts: Vec<(AttackResult, u64)> = stats
                .attack_results
                .iter()
                .map(|(result, count)| (*result, *count))
                .collect();
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            for (attack_result, count) in counts {
                let percent = if total_count > 0 {
                    count as f64 / total_count as f64 * 100.0
                } else {
                    0.0
                };
                let _ = write!(&mut out, " {attack_result} {count} {percent:.2}%");
            }
            out.push('\n');
        }

        out
    }
}
