//! Export merged per-ability statistics as CSV for spreadsheet comparison.
//! One row per reporting bucket, ordered by descending total damage.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::rules::RuleSet;
use crate::sim::attack::AttackResult;
use crate::sim::result::SimulationResult;

const ATTACK_RESULT_COLUMNS: &[AttackResult] = &[
    AttackResult::Miss,
    AttackResult::Dodge,
    AttackResult::Glance,
    AttackResult::Crit,
    AttackResult::Hit,
];

#[derive(Debug)]
pub enum ExportError {
    Create(std::io::Error),
    Write(csv::Error),
    Flush(std::io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(err) => write!(f, "failed to create export file: {err}"),
            Self::Write(err) => write!(f, "failed to write export row: {err}"),
            Self::Flush(err) => write!(f, "failed to flush export file: {err}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Serialize the per-ability breakdown to `writer`. Distribution columns are
/// left empty for abilities with no positive damage sample.
pub fn write_result_csv<W: Write>(
    result: &SimulationResult,
    rules: &dyn RuleSet,
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![
        "ability".to_string(),
        "total_damage".to_string(),
        "percent_of_total".to_string(),
        "uses".to_string(),
        "min".to_string(),
        "max".to_string(),
        "mean".to_string(),
    ];
    header.extend(ATTACK_RESULT_COLUMNS.iter().map(|r| r.as_str().to_string()));
    csv_writer.write_record(&header)?;

    let total_damage = result.total_damage();
    for (ability, stats) in result.abilities_by_damage() {
        let damage_sum = stats.total_damage();
        let percent = if total_damage > 0.0 {
            damage_sum / total_damage * 100.0
        } else {
            0.0
        };
        let positive: Vec<f64> = stats.damage.iter().copied().filter(|d| *d > 0.0).collect();
        let (min, max, mean) = if positive.is_empty() {
            (String::new(), String::new(), String::new())
        } else {
            let min = positive.iter().copied().fold(f64::INFINITY, f64::min);
            let max = positive.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = positive.iter().sum::<f64>() / positive.len() as f64;
            (
                format!("{min:.1}"),
                format!("{max:.1}"),
                format!("{mean:.1}"),
            )
        };

        let mut record = vec![
            rules.display_name(ability).to_string(),
            format!("{damage_sum:.1}"),
            format!("{percent:.2}"),
            stats.damage.len().to_string(),
            min,
            max,
            mean,
        ];
        for column in ATTACK_RESULT_COLUMNS {
            let count = stats.attack_results.get(column).copied().unwrap_or(0);
            record.push(count.to_string());
        }
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the breakdown to a file at `path`.
pub fn export_result_csv(
    path: &Path,
    result: &SimulationResult,
    rules: &dyn RuleSet,
) -> Result<(), ExportError> {
    let mut file = File::create(path).map_err(ExportError::Create)?;
    write_result_csv(result, rules, &mut file).map_err(ExportError::Write)?;
    file.flush().map_err(ExportError::Flush)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::vanilla::BLOODTHIRST;
    use crate::rules::{rule_set, Expansion, WHITE_HIT_MAIN};
    use crate::sim::result::AbilityLogEntry;

    #[test]
    fn csv_contains_one_row_per_reporting_bucket() {
        let rules = rule_set(Expansion::Vanilla);
        let log = vec![
            AbilityLogEntry {
                ability: WHITE_HIT_MAIN,
                attack_result: AttackResult::Hit,
                damage: 200.0,
            },
            AbilityLogEntry {
                ability: BLOODTHIRST,
                attack_result: AttackResult::Miss,
                damage: 0.0,
            },
        ];
        let result = SimulationResult::from_ability_log(40.0, &log, rules);

        let mut buffer = Vec::new();
        write_result_csv(&result, rules, &mut buffer).expect("csv");
        let text = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3, "header plus two rows: {text}");
        assert!(lines[0].starts_with("ability,total_damage,percent_of_total"));
        assert!(lines[1].starts_with("White Hit,200.0,100.00,1,200.0,200.0,200.0"));
        // All-miss row keeps the distribution columns empty.
        assert!(lines[2].starts_with("Bloodthirst,0.0,0.00,1,,,"));
    }
}
