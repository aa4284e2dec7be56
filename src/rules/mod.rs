//! Expansion rule tables behind a single trait. The simulation core only ever
//! sees [RuleSet]; concrete expansions are selected by the [Expansion] tag at
//! registration time, never resolved by module name at runtime.

pub mod vanilla;

use crate::sim::character::Stance;
use crate::stats::AttributeSet;

pub use vanilla::VanillaRules;

/// Identifiers are the canonical table keys. They stay `&'static str` because
/// rule tables are compiled in; input files carry the same strings and are
/// resolved against the table at load time.
pub type AbilityId = &'static str;
pub type ProcId = &'static str;
pub type OnUseId = &'static str;
pub type BuffId = &'static str;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityKind {
    /// Physical special attack: can miss, be dodged, crit; mitigated by armor.
    MeleeSpecial,
    /// Spell: can miss or crit, never dodged; ignores armor.
    Spell,
}

/// Damage formula for a special ability, evaluated against buffed stats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageFormula {
    /// `coefficient * attack_power + flat`.
    AttackPowerScaled { coefficient: f64, flat: f64 },
    /// Average weapon damage normalized to `normalization_speed`, plus `bonus`.
    NormalizedWeapon { normalization_speed: f64, bonus: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbilityDef {
    pub id: AbilityId,
    pub name: &'static str,
    pub kind: AbilityKind,
    pub rage_cost: f64,
    pub cooldown: f64,
    pub formula: DamageFormula,
}

/// Which resolved outcomes qualify as a proc trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcTrigger {
    /// Any landed hit (normal, glancing, or critical) from any attack.
    AnyLandedHit,
    /// Critical hits only.
    CritOnly,
    /// Landed white hits only.
    WhiteHitLanded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcEffect {
    /// Grant a timed buff; refreshes the expiry if already active.
    GrantBuff { buff: BuffId, duration: f64 },
    /// Schedule one flagged bonus white hit at the triggering instant.
    ExtraAttack,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcDef {
    pub id: ProcId,
    pub name: &'static str,
    pub trigger: ProcTrigger,
    pub chance: f64,
    pub effect: ProcEffect,
}

/// Manually activated effect with a cooldown. The simulation activates these
/// greedily whenever they come off cooldown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnUseDef {
    pub id: OnUseId,
    pub name: &'static str,
    pub buff: BuffId,
    pub duration: f64,
    pub cooldown: f64,
}

/// Flat stat contributions of an active buff, added before the stance and
/// finalization phases so percentage modifiers compound over them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BuffEffects {
    pub strength: f64,
    pub attack_power: f64,
    pub crit: f64,
    pub haste: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuffDef {
    pub id: BuffId,
    pub name: &'static str,
    pub effects: BuffEffects,
}

/// One labelled stat group for display (base/primary/secondary).
pub type StatGroup = Vec<(&'static str, f64)>;

#[derive(Debug, Clone, Default)]
pub struct DisplayableStats {
    pub base: StatGroup,
    pub primary: StatGroup,
    pub secondary: StatGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expansion {
    Vanilla,
}

impl Expansion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vanilla => "vanilla",
        }
    }
}

/// Select a rule table by expansion tag.
pub fn rule_set(expansion: Expansion) -> &'static dyn RuleSet {
    match expansion {
        Expansion::Vanilla => &vanilla::VANILLA_RULES,
    }
}

/// White swings are engine-driven rather than table-driven, but they still
/// need stable ids for logging and reporting.
pub const WHITE_HIT_MAIN: AbilityId = "white_hit_main";
pub const WHITE_HIT_OFF: AbilityId = "white_hit_off";
pub const WHITE_HIT: AbilityId = "white_hit";

pub trait RuleSet: Sync {
    fn expansion(&self) -> Expansion;

    /// Special-ability definitions. White swings are resolved by the engine
    /// and only appear in the reporting mapping.
    fn abilities(&self) -> &[AbilityDef];
    /// Special-attack priority, highest first.
    fn rotation(&self) -> &[AbilityId];
    fn procs(&self) -> &[ProcDef];
    fn on_use_effects(&self) -> &[OnUseDef];
    fn buffs(&self) -> &[BuffDef];

    /// Procs every character has regardless of items (baseline enchants,
    /// spec-granted triggers).
    fn baseline_procs(&self) -> &[ProcId];
    /// On-use effects every character has (baseline consumables).
    fn baseline_on_use_effects(&self) -> &[OnUseId];

    /// Collapse an ability id into its reporting bucket (e.g. main-hand and
    /// off-hand swings report as one white-hit row).
    fn reporting_group(&self, id: AbilityId) -> AbilityId;
    fn display_name(&self, id: AbilityId) -> &'static str;

    fn apply_stance_flat_effects(&self, stance: Stance, stats: &mut AttributeSet);
    fn apply_stance_percentage_effects(&self, stance: Stance, stats: &mut AttributeSet);

    /// Group buffed stats into displayable base/primary/secondary triples.
    fn displayable_stats(&self, stats: &AttributeSet) -> DisplayableStats;

    fn ability(&self, id: AbilityId) -> Option<&AbilityDef> {
        self.abilities().iter().find(|def| def.id == id)
    }

    fn proc(&self, id: ProcId) -> Option<&ProcDef> {
        self.procs().iter().find(|def| def.id == id)
    }

    fn on_use(&self, id: OnUseId) -> Option<&OnUseDef> {
        self.on_use_effects().iter().find(|def| def.id == id)
    }

    fn buff(&self, id: BuffId) -> Option<&BuffDef> {
        self.buffs().iter().find(|def| def.id == id)
    }

    /// Resolve an input-file tag to the canonical table id.
    fn resolve_proc(&self, name: &str) -> Option<ProcId> {
        self.procs().iter().find(|def| def.id == name).map(|def| def.id)
    }

    fn resolve_on_use(&self, name: &str) -> Option<OnUseId> {
        self.on_use_effects()
            .iter()
            .find(|def| def.id == name)
            .map(|def| def.id)
    }
}

/// Structural validation of a rule table. Misconfigured tables (probabilities
/// outside `[0, 1]`, dangling buff references, rotation entries without a
/// definition) are rejected here, before any simulation starts.
pub fn validate_rule_set(rules: &dyn RuleSet) -> Result<(), Vec<String>> {
    let mut issues = Vec::new();

    for def in rules.abilities() {
        if def.rage_cost < 0.0 {
            issues.push(format!("ability '{}': negative rage cost", def.id));
        }
        if def.cooldown < 0.0 {
            issues.push(format!("ability '{}': negative cooldown", def.id));
        }
    }
    for id in rules.rotation() {
        if rules.ability(id).is_none() {
            issues.push(format!("rotation references unknown ability '{id}'"));
        }
    }
    for def in rules.procs() {
        if !(0.0..=1.0).contains(&def.chance) {
            issues.push(format!(
                "proc '{}': trigger chance {} outside [0, 1]",
                def.id, def.chance
            ));
        }
        if let ProcEffect::GrantBuff { buff, duration } = def.effect {
            if rules.buff(buff).is_none() {
                issues.push(format!("proc '{}': unknown buff '{buff}'", def.id));
            }
            if duration <= 0.0 {
                issues.push(format!("proc '{}': non-positive buff duration", def.id));
            }
        }
    }
    for def in rules.on_use_effects() {
        if rules.buff(def.buff).is_none() {
            issues.push(format!("on-use '{}': unknown buff '{}'", def.id, def.buff));
        }
        if def.duration <= 0.0 {
            issues.push(format!("on-use '{}': non-positive duration", def.id));
        }
        if def.cooldown <= 0.0 {
            issues.push(format!("on-use '{}': non-positive cooldown", def.id));
        }
    }
    for id in rules.baseline_procs() {
        if rules.proc(id).is_none() {
            issues.push(format!("baseline proc '{id}' has no definition"));
        }
    }
    for id in rules.baseline_on_use_effects() {
        if rules.on_use(id).is_none() {
            issues.push(format!("baseline on-use '{id}' has no definition"));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanilla_rule_table_validates() {
        assert!(validate_rule_set(rule_set(Expansion::Vanilla)).is_ok());
    }

    #[test]
    fn rotation_abilities_resolve() {
        let rules = rule_set(Expansion::Vanilla);
        for id in rules.rotation() {
            assert!(rules.ability(id).is_some(), "missing rotation ability {id}");
        }
    }

    #[test]
    fn resolve_proc_matches_table_ids() {
        let rules = rule_set(Expansion::Vanilla);
        assert!(rules.resolve_proc("crusader").is_some());
        assert!(rules.resolve_proc("not-a-proc").is_none());
    }
}
