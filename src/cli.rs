use std::path::Path;

use serde::Serialize;

use crate::data::{build_player, load_character_sheet, load_encounter, validate_inputs, EncounterFile};
use crate::rules::{rule_set, Expansion, RuleSet as _};
use crate::sim::driver::{run_simulation, StatProbe, StatWeight};
use crate::sim::export_csv::export_result_csv;
use crate::sim::SimulationResult;
use crate::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Weights,
    Stats,
    Validate,
    Export,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("simulate") => Some(Command::Simulate),
        Some("weights") => Some(Command::Weights),
        Some("stats") => Some(Command::Stats),
        Some("validate") => Some(Command::Validate),
        Some("export") => Some(Command::Export),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Weights) => handle_weights(args),
        Some(Command::Stats) => handle_stats(args),
        Some(Command::Validate) => handle_validate(args),
        Some(Command::Export) => handle_export(args),
        None => {
            eprintln!("usage: furysim <simulate|weights|stats|validate|export>");
            2
        }
    }
}

fn load_inputs(
    character_path: &str,
    encounter_path: Option<&String>,
) -> Result<(crate::data::CharacterSheet, EncounterFile), String> {
    let sheet = load_character_sheet(Path::new(character_path))
        .map_err(|err| format!("character sheet: {err}"))?;
    let encounter = match encounter_path {
        Some(path) => load_encounter(Path::new(path)).map_err(|err| format!("encounter: {err}"))?,
        None => EncounterFile::default(),
    };
    Ok((sheet, encounter))
}

#[derive(Debug, Serialize)]
struct SimulateOutput<'a> {
    seed: u64,
    result: &'a SimulationResult,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    stat_weights: &'a [StatWeight],
}

fn handle_simulate(args: &[String]) -> i32 {
    let Some(character_path) = args.get(2) else {
        eprintln!("usage: furysim simulate <character.json> [encounter.yaml] [--json]");
        return 2;
    };
    let as_json = args.iter().any(|arg| arg == "--json");
    let encounter_path = args.get(3).filter(|arg| !arg.starts_with("--"));

    let (sheet, encounter) = match load_inputs(character_path, encounter_path) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let rules = rule_set(Expansion::Vanilla);
    let player = match build_player(&sheet, rules) {
        Ok(player) => player,
        Err(err) => {
            eprintln!("character sheet: {err}");
            return 1;
        }
    };

    let outcome = match run_simulation(&player, &encounter.boss, &encounter.config, rules) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };

    if as_json {
        let payload = SimulateOutput {
            seed: outcome.seed,
            result: &outcome.result,
            stat_weights: &outcome.stat_weights,
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("failed to serialize simulation result: {err}");
                return 1;
            }
        }
        return 0;
    }

    println!("seed: {}", outcome.seed);
    print!("{}", outcome.result.report(rules));
    if !outcome.stat_weights.is_empty() {
        println!();
        print_stat_weights(&outcome.stat_weights);
    }
    if let Some(log) = &outcome.first_run_log {
        println!("\nfirst run log ({} entries):", log.len());
        for entry in log {
            println!(
                "{} {} {:.0}",
                rules.display_name(entry.ability),
                entry.attack_result,
                entry.damage
            );
        }
    }
    0
}

/// Probe set used when the encounter file does not configure any.
fn default_probes() -> Vec<StatProbe> {
    [
        ("hit", 1.0),
        ("crit", 1.0),
        ("agi", 20.0),
        ("ap", 30.0),
        ("str", 15.0),
        ("haste", 1.0),
    ]
    .into_iter()
    .map(|(stat, amount)| StatProbe {
        stat: stat.to_string(),
        amount,
    })
    .collect()
}

fn print_stat_weights(weights: &[StatWeight]) {
    println!("stat weights (DPS per point):");
    for weight in weights {
        println!(
            "  {:<14} {:+.4} (delta {})",
            weight.stat, weight.dps_per_point, weight.delta
        );
    }
}

fn handle_weights(args: &[String]) -> i32 {
    let Some(character_path) = args.get(2) else {
        eprintln!("usage: furysim weights <character.json> [encounter.yaml]");
        return 2;
    };
    let (sheet, encounter) = match load_inputs(character_path, args.get(3)) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let rules = rule_set(Expansion::Vanilla);
    let player = match build_player(&sheet, rules) {
        Ok(player) => player,
        Err(err) => {
            eprintln!("character sheet: {err}");
            return 1;
        }
    };

    let mut config = encounter.config.clone();
    if config.stat_probes.is_empty() {
        config.stat_probes = default_probes();
    }

    match run_simulation(&player, &encounter.boss, &config, rules) {
        Ok(outcome) => {
            println!(
                "baseline DPS: {:.2} (seed {})",
                outcome.result.dps, outcome.seed
            );
            print_stat_weights(&outcome.stat_weights);
            0
        }
        Err(err) => {
            eprintln!("simulation failed: {err}");
            1
        }
    }
}

fn print_stat_group(label: &str, group: &[(&str, f64)]) {
    println!("{label}:");
    for (name, value) in group {
        println!("  {name:<16} {value:.1}");
    }
}

fn handle_stats(args: &[String]) -> i32 {
    let Some(character_path) = args.get(2) else {
        eprintln!("usage: furysim stats <character.json>");
        return 2;
    };
    let sheet = match load_character_sheet(Path::new(character_path)) {
        Ok(sheet) => sheet,
        Err(err) => {
            eprintln!("character sheet: {err}");
            return 1;
        }
    };
    let rules = rule_set(Expansion::Vanilla);
    let player = match build_player(&sheet, rules) {
        Ok(player) => player,
        Err(err) => {
            eprintln!("character sheet: {err}");
            return 1;
        }
    };

    let item_stats: Vec<_> = sheet.items.iter().map(|item| item.stats.clone()).collect();
    let unbuffed = stats::unbuffed_stats(
        sheet.race,
        sheet.class,
        sheet.spec,
        &item_stats,
        &sheet.socket_stats,
    );
    let unbuffed_display = rules.displayable_stats(&unbuffed);
    println!("unbuffed");
    print_stat_group("base", &unbuffed_display.base);
    print_stat_group("primary", &unbuffed_display.primary);
    print_stat_group("secondary", &unbuffed_display.secondary);

    let buffed = player.buffed_stats(rules, 0.0);
    let buffed_display = rules.displayable_stats(&buffed);
    println!("\nbuffed ({:?} stance)", player.stance);
    print_stat_group("base", &buffed_display.base);
    print_stat_group("primary", &buffed_display.primary);
    print_stat_group("secondary", &buffed_display.secondary);
    0
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(character_path) = args.get(2) else {
        eprintln!("usage: furysim validate <character.json> [encounter.yaml]");
        return 2;
    };
    let (sheet, encounter) = match load_inputs(character_path, args.get(3)) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let rules = rule_set(Expansion::Vanilla);

    match validate_inputs(&sheet, &encounter, rules) {
        Ok(()) => {
            println!("validation passed: {character_path}");
            0
        }
        Err(issues) => {
            eprintln!("validation failed: {} issue(s)", issues.len());
            for issue in issues {
                eprintln!("- {issue}");
            }
            1
        }
    }
}

fn handle_export(args: &[String]) -> i32 {
    let (Some(character_path), Some(output_path)) = (args.get(2), args.get(3)) else {
        eprintln!("usage: furysim export <character.json> <out.csv> [encounter.yaml]");
        return 2;
    };
    let (sheet, encounter) = match load_inputs(character_path, args.get(4)) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let rules = rule_set(Expansion::Vanilla);
    let player = match build_player(&sheet, rules) {
        Ok(player) => player,
        Err(err) => {
            eprintln!("character sheet: {err}");
            return 1;
        }
    };

    let outcome = match run_simulation(&player, &encounter.boss, &encounter.config, rules) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };
    match export_result_csv(Path::new(output_path), &outcome.result, rules) {
        Ok(()) => {
            println!(
                "exported {} abilities to {output_path} (seed {})",
                outcome.result.statistics.len(),
                outcome.seed
            );
            0
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn parse_command_recognizes_subcommands() {
        assert_eq!(
            parse_command(&args(&["furysim", "simulate"])),
            Some(Command::Simulate)
        );
        assert_eq!(
            parse_command(&args(&["furysim", "weights"])),
            Some(Command::Weights)
        );
        assert_eq!(
            parse_command(&args(&["furysim", "export"])),
            Some(Command::Export)
        );
        assert_eq!(parse_command(&args(&["furysim", "bogus"])), None);
        assert_eq!(parse_command(&args(&["furysim"])), None);
    }

    #[test]
    fn missing_paths_return_usage_exit_code() {
        assert_eq!(run_with_args(&args(&["furysim", "simulate"])), 2);
        assert_eq!(run_with_args(&args(&["furysim", "validate"])), 2);
        assert_eq!(run_with_args(&args(&["furysim", "export", "only.json"])), 2);
    }
}
