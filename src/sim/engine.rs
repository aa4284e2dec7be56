//! One fight: dispatches queued events in timestamp order until the sampled
//! fight duration, resolving swings and special attacks, applying proc and
//! buff side effects, and appending one log entry per resolved ability use.
//! Event handling is strictly sequential; all effects of an event complete
//! before the next event is dispatched.

use std::collections::BTreeMap;
use std::fmt;

use crate::rules::{
    AbilityId, AbilityKind, OnUseDef, ProcDef, ProcEffect, ProcTrigger, RuleSet, WHITE_HIT_MAIN,
    WHITE_HIT_OFF,
};
use crate::sim::attack::{
    mitigated_damage, special_base_damage, white_hit_base_damage, AttackResult, AttackTable,
};
use crate::sim::character::{Boss, Player};
use crate::sim::event::{EventKind, EventQueue, Hand};
use crate::sim::result::{AbilityLogEntry, SimulationResult};
use crate::sim::rng::Rng;

pub const RAGE_CAP: f64 = 100.0;
/// Rage generated per point of white-hit damage dealt.
pub const RAGE_PER_DAMAGE: f64 = 7.5 / 230.6;

/// Expiry comparisons tolerate float noise from repeated scheduling.
const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    UnknownAbility(&'static str),
    UnknownProc(&'static str),
    UnknownOnUse(&'static str),
    /// Outcome bands sum past 1.0; the rule table or character inputs are
    /// misconfigured. Rejected before any run starts, never clamped away.
    ProbabilityOverflow { sum: f64 },
    InvalidConfig(Vec<String>),
    RuleTable(Vec<String>),
    NoRuns,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAbility(id) => write!(f, "unknown ability '{id}'"),
            Self::UnknownProc(id) => write!(f, "unknown proc '{id}'"),
            Self::UnknownOnUse(id) => write!(f, "unknown on-use effect '{id}'"),
            Self::ProbabilityOverflow { sum } => {
                write!(f, "attack outcome bands sum to {sum}, expected <= 1")
            }
            Self::InvalidConfig(issues) => write!(f, "invalid config: {}", issues.join("; ")),
            Self::RuleTable(issues) => write!(f, "rule table rejected: {}", issues.join("; ")),
            Self::NoRuns => write!(f, "no runs to merge"),
        }
    }
}

impl std::error::Error for SimError {}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub result: SimulationResult,
    pub log: Vec<AbilityLogEntry>,
}

struct Fight<'a> {
    rules: &'a dyn RuleSet,
    boss: &'a Boss,
    player: Player,
    queue: EventQueue,
    rng: Rng,
    now: f64,
    duration: f64,
    cooldown_ready: BTreeMap<AbilityId, f64>,
    /// Proc definitions in deterministic trigger order (sorted by id), fixed
    /// for the whole run.
    proc_defs: Vec<ProcDef>,
    on_use_defs: BTreeMap<&'static str, OnUseDef>,
    log: Vec<AbilityLogEntry>,
}

/// Simulate one fight of `fight_duration` seconds. `rng` carries the run's
/// whole random stream; identical inputs produce an identical log.
pub fn run_fight(
    base: &Player,
    boss: &Boss,
    rules: &dyn RuleSet,
    fight_duration: f64,
    rng: Rng,
) -> Result<RunOutput, SimError> {
    debug_assert!(fight_duration > 0.0, "driver must not hand over a non-positive duration");

    let mut player = base.clone();
    player.buffs.clear();
    player.rage = 0.0;

    let proc_defs = player
        .procs
        .iter()
        .map(|id| rules.proc(id).copied().ok_or(SimError::UnknownProc(id)))
        .collect::<Result<Vec<_>, _>>()?;
    let on_use_defs = player
        .on_use_effects
        .iter()
        .map(|id| {
            rules
                .on_use(id)
                .copied()
                .map(|def| (*id, def))
                .ok_or(SimError::UnknownOnUse(id))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let mut fight = Fight {
        rules,
        boss,
        player,
        queue: EventQueue::new(),
        rng,
        now: 0.0,
        duration: fight_duration,
        cooldown_ready: BTreeMap::new(),
        proc_defs,
        on_use_defs,
        log: Vec::new(),
    };
    fight.run()?;

    let total_damage: f64 = fight.log.iter().map(|entry| entry.damage).sum();
    let dps = total_damage / fight_duration;
    let result = SimulationResult::from_ability_log(dps, &fight.log, rules);
    Ok(RunOutput {
        result,
        log: fight.log,
    })
}

impl Fight<'_> {
    fn run(&mut self) -> Result<(), SimError> {
        self.queue.schedule(
            0.0,
            EventKind::WhiteHit {
                hand: Hand::Main,
                bonus_attack: false,
            },
        );
        if self.player.partial_buffed_permanent_stats.offhand_speed > 0.0 {
            // Stagger the off hand so the swing timers interleave.
            self.queue.schedule(
                self.player.partial_buffed_permanent_stats.offhand_speed * 0.5,
                EventKind::WhiteHit {
                    hand: Hand::Off,
                    bonus_attack: false,
                },
            );
        }
        let on_use_ids: Vec<&'static str> = self.on_use_defs.keys().copied().collect();
        for id in on_use_ids {
            self.queue.schedule(0.0, EventKind::OnUseReady(id));
        }

        while let Some(event) = self.queue.pop() {
            if event.time >= self.duration {
                // The fight ends strictly at the deadline; no partial
                // execution of later events.
                break;
            }
            self.now = event.time;
            match event.kind {
                EventKind::WhiteHit { hand, bonus_attack } => {
                    self.handle_white_hit(hand, bonus_attack);
                }
                EventKind::BuffExpires(buff) => {
                    let expired = self
                        .player
                        .buffs
                        .get(buff)
                        .is_some_and(|expires_at| *expires_at <= self.now + TIME_EPSILON);
                    if expired {
                        self.player.buffs.remove(buff);
                    }
                }
                EventKind::OnUseReady(id) => self.activate_on_use(id)?,
                EventKind::CooldownEnd(_) => {}
            }
            self.run_rotation()?;
        }
        Ok(())
    }

    fn handle_white_hit(&mut self, hand: Hand, bonus_attack: bool) {
        let stats = self.player.buffed_stats(self.rules, self.now);
        let table = AttackTable::white(&stats, self.boss.base_miss, self.boss.base_dodge);
        let result = table.roll(&mut self.rng);
        let base = white_hit_base_damage(&stats, hand, &mut self.rng);
        let damage = mitigated_damage(base, result, self.boss.effective_armor());

        let ability = match hand {
            Hand::Main => WHITE_HIT_MAIN,
            Hand::Off => WHITE_HIT_OFF,
        };
        self.log.push(AbilityLogEntry {
            ability,
            attack_result: result,
            damage,
        });
        if result.landed() {
            self.player.rage = (self.player.rage + damage * RAGE_PER_DAMAGE).min(RAGE_CAP);
        }
        self.roll_procs(result, true);

        if !bonus_attack {
            // Procs from this swing (e.g. a fresh haste buff) affect the
            // next swing interval, so haste is read after proc resolution.
            let haste = self.player.buffed_stats(self.rules, self.now).haste;
            let speed = match hand {
                Hand::Main => stats.weapon_speed,
                Hand::Off => stats.offhand_speed,
            };
            if speed > 0.0 {
                let interval = speed / (1.0 + haste / 100.0);
                self.queue.schedule(
                    self.now + interval,
                    EventKind::WhiteHit {
                        hand,
                        bonus_attack: false,
                    },
                );
            }
        }
    }

    fn activate_on_use(&mut self, id: &'static str) -> Result<(), SimError> {
        let def = *self.on_use_defs.get(id).ok_or(SimError::UnknownOnUse(id))?;
        self.grant_buff(def.buff, def.duration);
        self.queue
            .schedule(self.now + def.cooldown, EventKind::OnUseReady(def.id));
        Ok(())
    }

    /// Cast the highest-priority affordable ability until none applies.
    fn run_rotation(&mut self) -> Result<(), SimError> {
        'retry: loop {
            for id in self.rules.rotation() {
                let def = *self.rules.ability(id).ok_or(SimError::UnknownAbility(id))?;
                let ready_at = self.cooldown_ready.get(id).copied().unwrap_or(0.0);
                if ready_at > self.now + TIME_EPSILON || self.player.rage < def.rage_cost {
                    continue;
                }

                let stats = self.player.buffed_stats(self.rules, self.now);
                let table =
                    AttackTable::special(def.kind, &stats, self.boss.base_miss, self.boss.base_dodge);
                let result = table.roll(&mut self.rng);
                let base = special_base_damage(def.formula, &stats);
                let armor = match def.kind {
                    AbilityKind::MeleeSpecial => self.boss.effective_armor(),
                    AbilityKind::Spell => 0.0,
                };
                let damage = mitigated_damage(base, result, armor);

                self.log.push(AbilityLogEntry {
                    ability: def.id,
                    attack_result: result,
                    damage,
                });
                self.player.rage -= def.rage_cost;
                self.cooldown_ready.insert(def.id, self.now + def.cooldown);
                self.queue
                    .schedule(self.now + def.cooldown, EventKind::CooldownEnd(def.id));
                self.roll_procs(result, false);
                continue 'retry;
            }
            return Ok(());
        }
    }

    /// Independent trigger roll per eligible proc, in the fixed per-run
    /// order, all within the current dispatch step.
    fn roll_procs(&mut self, result: AttackResult, is_white_hit: bool) {
        for index in 0..self.proc_defs.len() {
            let def = self.proc_defs[index];
            let eligible = match def.trigger {
                ProcTrigger::AnyLandedHit => result.landed(),
                ProcTrigger::CritOnly => result == AttackResult::Crit,
                ProcTrigger::WhiteHitLanded => is_white_hit && result.landed(),
            };
            if !eligible || self.rng.next_f64() >= def.chance {
                continue;
            }
            match def.effect {
                ProcEffect::GrantBuff { buff, duration } => self.grant_buff(buff, duration),
                ProcEffect::ExtraAttack => self.queue.schedule(
                    self.now,
                    EventKind::WhiteHit {
                        hand: Hand::Main,
                        bonus_attack: true,
                    },
                ),
            }
        }
    }

    fn grant_buff(&mut self, buff: &'static str, duration: f64) {
        let expires_at = self.now + duration;
        // Refresh semantics: the later expiry wins; the stale expiry event
        // is ignored when it fires.
        let entry = self.player.buffs.entry(buff).or_insert(expires_at);
        if *entry < expires_at {
            *entry = expires_at;
        }
        self.queue.schedule(expires_at, EventKind::BuffExpires(buff));
    }
}
