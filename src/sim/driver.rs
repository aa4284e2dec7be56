//! Simulation driver: N independent runs, each with its own sampled fight
//! duration and random stream, merged into one aggregate result. Runs are
//! embarrassingly parallel and distributed over Rayon when requested.
//! Optionally re-runs the whole set per configured stat delta to estimate
//! stat weights.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::parallel::WorkerPool;
use crate::rules::{validate_rule_set, RuleSet};
use crate::sim::attack::AttackTable;
use crate::sim::character::{Boss, Player};
use crate::sim::engine::{run_fight, RunOutput, SimError};
use crate::sim::result::{AbilityLogEntry, SimulationResult};
use crate::sim::rng::Rng;
use crate::stats;

/// Shortest fight the scheduler will accept when duration draws keep coming
/// up non-positive.
pub const MIN_FIGHT_DURATION_SECONDS: f64 = 1.0;
const MAX_DURATION_RESAMPLES: u32 = 32;

fn default_n_runs() -> usize {
    1000
}

fn default_duration_mu() -> f64 {
    180.0
}

fn default_duration_sigma() -> f64 {
    20.0
}

/// A stat-delta probe for stat-weight estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatProbe {
    pub stat: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub n_runs: usize,
    /// When set, the first run's ability log is retained on the outcome.
    pub logging: bool,
    pub fight_duration_seconds_mu: f64,
    pub fight_duration_seconds_sigma: f64,
    pub stat_probes: Vec<StatProbe>,
    /// Base seed; drawn from OS entropy when absent.
    pub seed: Option<u64>,
    /// Worker threads for the run set; 0 uses the Rayon default.
    pub workers: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            n_runs: default_n_runs(),
            logging: false,
            fight_duration_seconds_mu: default_duration_mu(),
            fight_duration_seconds_sigma: default_duration_sigma(),
            stat_probes: Vec::new(),
            seed: None,
            workers: 0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();
        if self.n_runs == 0 {
            issues.push("n_runs must be at least 1".to_string());
        }
        if self.fight_duration_seconds_mu <= 0.0 {
            issues.push(format!(
                "fight_duration_seconds_mu must be positive, got {}",
                self.fight_duration_seconds_mu
            ));
        }
        if self.fight_duration_seconds_sigma < 0.0 {
            issues.push(format!(
                "fight_duration_seconds_sigma must be non-negative, got {}",
                self.fight_duration_seconds_sigma
            ));
        }
        for probe in &self.stat_probes {
            if !stats::is_known_stat(&probe.stat) {
                issues.push(format!("unknown probe stat '{}'", probe.stat));
            }
            if probe.amount == 0.0 {
                issues.push(format!("probe '{}' has zero delta", probe.stat));
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Marginal DPS per point of a stat, estimated by differential simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatWeight {
    pub stat: String,
    pub delta: f64,
    pub dps_per_point: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub result: SimulationResult,
    pub stat_weights: Vec<StatWeight>,
    /// First run's ability log, when `SimConfig.logging` is set.
    pub first_run_log: Option<Vec<AbilityLogEntry>>,
    /// Seed the run set was derived from, for reproduction.
    pub seed: u64,
}

/// Sample a fight duration, resampling non-positive draws and falling back
/// to a clamped minimum. Never returns a non-positive value.
pub fn sample_fight_duration(rng: &mut Rng, mu: f64, sigma: f64) -> f64 {
    for _ in 0..MAX_DURATION_RESAMPLES {
        let draw = rng.normal(mu, sigma);
        if draw > 0.0 {
            return draw;
        }
    }
    mu.max(MIN_FIGHT_DURATION_SECONDS)
}

fn entropy_seed() -> u64 {
    let mut bytes = [0u8; 8];
    // Zero seed on entropy failure still yields a valid (fixed) stream.
    let _ = getrandom::getrandom(&mut bytes);
    u64::from_le_bytes(bytes)
}

/// Reject misconfigured probability bands before any run starts. Uses the
/// player's starting buffed stats; temporary buffs only add crit through the
/// validated buff tables.
fn preflight_attack_tables(
    player: &Player,
    boss: &Boss,
    rules: &dyn RuleSet,
) -> Result<(), SimError> {
    let stats = player.buffed_stats(rules, 0.0);
    let white = AttackTable::white(&stats, boss.base_miss, boss.base_dodge);
    if white.band_sum() > 1.0 {
        return Err(SimError::ProbabilityOverflow {
            sum: white.band_sum(),
        });
    }
    for def in rules.abilities() {
        let table = AttackTable::special(def.kind, &stats, boss.base_miss, boss.base_dodge);
        if table.band_sum() > 1.0 {
            return Err(SimError::ProbabilityOverflow {
                sum: table.band_sum(),
            });
        }
    }
    Ok(())
}

/// Execute one full run set: `n_runs` independent fights merged into one
/// result. Any per-run failure aborts the whole set; a partially-run Monte
/// Carlo set would corrupt the aggregate mean.
fn run_set(
    player: &Player,
    boss: &Boss,
    config: &SimConfig,
    rules: &dyn RuleSet,
    base_seed: u64,
) -> Result<(SimulationResult, Option<Vec<AbilityLogEntry>>), SimError> {
    let mu = config.fight_duration_seconds_mu;
    let sigma = config.fight_duration_seconds_sigma;

    let run_one = |run_index: usize| -> Result<RunOutput, SimError> {
        let mut rng = Rng::new(base_seed.wrapping_add(run_index as u64));
        let duration = sample_fight_duration(&mut rng, mu, sigma);
        run_fight(player, boss, rules, duration, rng)
    };

    let pool = WorkerPool::with_workers(config.workers);
    let outputs: Result<Vec<RunOutput>, SimError> = pool.install(|| {
        (0..config.n_runs)
            .into_par_iter()
            .map(run_one)
            .collect::<Result<Vec<_>, _>>()
    });
    let mut outputs = outputs?;

    let results: Vec<SimulationResult> = outputs.iter().map(|o| o.result.clone()).collect();
    let merged = SimulationResult::merged(&results).map_err(|_| SimError::NoRuns)?;
    let first_run_log = if config.logging && !outputs.is_empty() {
        Some(std::mem::take(&mut outputs[0].log))
    } else {
        None
    };
    Ok((merged, first_run_log))
}

/// Run the configured simulation set, plus one full re-run per stat probe.
pub fn run_simulation(
    player: &Player,
    boss: &Boss,
    config: &SimConfig,
    rules: &dyn RuleSet,
) -> Result<SimulationOutcome, SimError> {
    config.validate().map_err(SimError::InvalidConfig)?;
    validate_rule_set(rules).map_err(SimError::RuleTable)?;
    preflight_attack_tables(player, boss, rules)?;

    let base_seed = config.seed.unwrap_or_else(entropy_seed);
    let (result, first_run_log) = run_set(player, boss, config, rules, base_seed)?;

    let mut stat_weights = Vec::with_capacity(config.stat_probes.len());
    for (index, probe) in config.stat_probes.iter().enumerate() {
        let mut probed = player.clone();
        probed
            .partial_buffed_permanent_stats
            .apply_delta(&probe.stat, probe.amount);
        let probe_seed = base_seed.wrapping_add(((index as u64) + 1) << 32);
        let (probe_result, _) = run_set(&probed, boss, config, rules, probe_seed)?;
        stat_weights.push(StatWeight {
            stat: probe.stat.clone(),
            delta: probe.amount,
            dps_per_point: (probe_result.dps - result.dps) / probe.amount,
        });
    }

    Ok(SimulationOutcome {
        result,
        stat_weights,
        first_run_log,
        seed: base_seed,
    })
}
