pub mod attack;
pub mod character;
pub mod driver;
pub mod engine;
pub mod event;
pub mod export_csv;
pub mod result;
pub mod rng;

pub use attack::{
    armor_mitigation, mitigated_damage, special_base_damage, white_hit_base_damage, AttackResult,
    AttackTable, ARMOR_CONSTANT, CRIT_MULTIPLIER, GLANCE_CHANCE, GLANCE_MULTIPLIER,
    OFFHAND_DAMAGE_FACTOR,
};
pub use character::{Boss, BossDebuff, CharacterClass, Faction, Player, Race, Spec, Stance};
pub use driver::{
    run_simulation, sample_fight_duration, SimConfig, SimulationOutcome, StatProbe, StatWeight,
    MIN_FIGHT_DURATION_SECONDS,
};
pub use engine::{run_fight, RunOutput, SimError, RAGE_CAP, RAGE_PER_DAMAGE};
pub use event::{Event, EventKind, EventQueue, Hand};
pub use export_csv::{export_result_csv, write_result_csv, ExportError};
pub use result::{AbilityLogEntry, AbilityStatistics, MergeError, SimulationResult};
pub use rng::Rng;
