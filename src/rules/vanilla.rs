//! Vanilla rule tables for a fury warrior: special-attack formulas, baseline
//! enchant procs, baseline consumable on-use effects, and Berserker/Battle
//! stance modifiers.

use crate::sim::character::Stance;
use crate::stats::AttributeSet;

use super::{
    AbilityDef, AbilityId, AbilityKind, BuffDef, BuffEffects, DamageFormula, DisplayableStats,
    Expansion, OnUseDef, OnUseId, ProcDef, ProcId, ProcTrigger, RuleSet, WHITE_HIT,
    WHITE_HIT_MAIN, WHITE_HIT_OFF,
};
use super::ProcEffect;

pub const BLOODTHIRST: AbilityId = "bloodthirst";
pub const WHIRLWIND: AbilityId = "whirlwind";

const ABILITIES: &[AbilityDef] = &[
    AbilityDef {
        id: BLOODTHIRST,
        name: "Bloodthirst",
        kind: AbilityKind::MeleeSpecial,
        rage_cost: 30.0,
        cooldown: 6.0,
        formula: DamageFormula::AttackPowerScaled {
            coefficient: 0.45,
            flat: 0.0,
        },
    },
    AbilityDef {
        id: WHIRLWIND,
        name: "Whirlwind",
        kind: AbilityKind::MeleeSpecial,
        rage_cost: 25.0,
        cooldown: 10.0,
        formula: DamageFormula::NormalizedWeapon {
            normalization_speed: 2.4,
            bonus: 0.0,
        },
    },
];

const ROTATION: &[AbilityId] = &[BLOODTHIRST, WHIRLWIND];

const PROCS: &[ProcDef] = &[
    ProcDef {
        id: "crusader",
        name: "Crusader",
        trigger: ProcTrigger::AnyLandedHit,
        chance: 0.08,
        effect: ProcEffect::GrantBuff {
            buff: "holy_strength",
            duration: 15.0,
        },
    },
    ProcDef {
        id: "flurry",
        name: "Flurry",
        trigger: ProcTrigger::CritOnly,
        chance: 1.0,
        effect: ProcEffect::GrantBuff {
            buff: "flurry_haste",
            duration: 8.0,
        },
    },
    ProcDef {
        id: "hand_of_justice",
        name: "Hand of Justice",
        trigger: ProcTrigger::WhiteHitLanded,
        chance: 0.02,
        effect: ProcEffect::ExtraAttack,
    },
    ProcDef {
        id: "thrash_blade",
        name: "Thrash Blade",
        trigger: ProcTrigger::AnyLandedHit,
        chance: 0.04,
        effect: ProcEffect::ExtraAttack,
    },
];

const ON_USE_EFFECTS: &[OnUseDef] = &[
    OnUseDef {
        id: "mighty_rage_potion",
        name: "Mighty Rage Potion",
        buff: "mighty_rage",
        duration: 20.0,
        cooldown: 120.0,
    },
    OnUseDef {
        id: "earthstrike",
        name: "Earthstrike",
        buff: "earthstrike_ap",
        duration: 20.0,
        cooldown: 120.0,
    },
];

const BUFFS: &[BuffDef] = &[
    BuffDef {
        id: "holy_strength",
        name: "Holy Strength",
        effects: BuffEffects {
            strength: 100.0,
            attack_power: 0.0,
            crit: 0.0,
            haste: 0.0,
        },
    },
    BuffDef {
        id: "flurry_haste",
        name: "Flurry",
        effects: BuffEffects {
            strength: 0.0,
            attack_power: 0.0,
            crit: 0.0,
            haste: 30.0,
        },
    },
    BuffDef {
        id: "mighty_rage",
        name: "Mighty Rage",
        effects: BuffEffects {
            strength: 60.0,
            attack_power: 0.0,
            crit: 0.0,
            haste: 0.0,
        },
    },
    BuffDef {
        id: "earthstrike_ap",
        name: "Earthstrike",
        effects: BuffEffects {
            strength: 0.0,
            attack_power: 280.0,
            crit: 0.0,
            haste: 0.0,
        },
    },
];

const BASELINE_PROCS: &[ProcId] = &["crusader", "flurry"];
const BASELINE_ON_USE: &[OnUseId] = &["mighty_rage_potion"];

pub static VANILLA_RULES: VanillaRules = VanillaRules;

#[derive(Debug, Clone, Copy)]
pub struct VanillaRules;

impl RuleSet for VanillaRules {
    fn expansion(&self) -> Expansion {
        Expansion::Vanilla
    }

    fn abilities(&self) -> &[AbilityDef] {
        ABILITIES
    }

    fn rotation(&self) -> &[AbilityId] {
        ROTATION
    }

    fn procs(&self) -> &[ProcDef] {
        PROCS
    }

    fn on_use_effects(&self) -> &[OnUseDef] {
        ON_USE_EFFECTS
    }

    fn buffs(&self) -> &[BuffDef] {
        BUFFS
    }

    fn baseline_procs(&self) -> &[ProcId] {
        BASELINE_PROCS
    }

    fn baseline_on_use_effects(&self) -> &[OnUseId] {
        BASELINE_ON_USE
    }

    fn reporting_group(&self, id: AbilityId) -> AbilityId {
        match id {
            WHITE_HIT_MAIN | WHITE_HIT_OFF => WHITE_HIT,
            other => other,
        }
    }

    fn display_name(&self, id: AbilityId) -> &'static str {
        match id {
            WHITE_HIT | WHITE_HIT_MAIN | WHITE_HIT_OFF => "White Hit",
            BLOODTHIRST => "Bloodthirst",
            WHIRLWIND => "Whirlwind",
            other => other,
        }
    }

    fn apply_stance_flat_effects(&self, stance: Stance, stats: &mut AttributeSet) {
        if stance == Stance::Berserker {
            stats.crit += 3.0;
            stats.attack_power += 60.0;
        }
    }

    fn apply_stance_percentage_effects(&self, stance: Stance, stats: &mut AttributeSet) {
        if stance == Stance::Berserker {
            // Improved Berserker Stance, compounding on the post-flat value.
            stats.attack_power *= 1.10;
        }
    }

    fn displayable_stats(&self, stats: &AttributeSet) -> DisplayableStats {
        DisplayableStats {
            base: vec![("Strength", stats.strength), ("Agility", stats.agility)],
            primary: vec![
                ("Attack Power", stats.attack_power),
                ("Crit %", stats.crit),
                ("Hit %", stats.hit),
            ],
            secondary: vec![
                ("Expertise %", stats.expertise),
                ("Haste %", stats.haste),
                ("Main Hand Speed", stats.weapon_speed),
                ("Off Hand Speed", stats.offhand_speed),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_hits_collapse_into_one_reporting_group() {
        let rules = VanillaRules;
        assert_eq!(rules.reporting_group(WHITE_HIT_MAIN), WHITE_HIT);
        assert_eq!(rules.reporting_group(WHITE_HIT_OFF), WHITE_HIT);
        assert_eq!(rules.reporting_group(BLOODTHIRST), BLOODTHIRST);
    }

    #[test]
    fn berserker_stance_effects_apply_in_both_phases() {
        let rules = VanillaRules;
        let mut stats = AttributeSet {
            attack_power: 100.0,
            ..AttributeSet::default()
        };
        rules.apply_stance_flat_effects(Stance::Berserker, &mut stats);
        assert_eq!(stats.attack_power, 160.0);
        assert_eq!(stats.crit, 3.0);
        rules.apply_stance_percentage_effects(Stance::Berserker, &mut stats);
        assert!((stats.attack_power - 176.0).abs() < 1e-12);
    }

    #[test]
    fn battle_stance_leaves_stats_unchanged() {
        let rules = VanillaRules;
        let mut stats = AttributeSet {
            attack_power: 100.0,
            crit: 5.0,
            ..AttributeSet::default()
        };
        let before = stats;
        rules.apply_stance_flat_effects(Stance::Battle, &mut stats);
        rules.apply_stance_percentage_effects(Stance::Battle, &mut stats);
        assert_eq!(stats, before);
    }
}
