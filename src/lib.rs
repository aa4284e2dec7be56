//! Monte Carlo DPS simulator for a fury warrior: N independent seeded
//! fights driven by a discrete-event queue, merged into one aggregate
//! result, with optional differential stat-weight estimation.

pub mod cli;
pub mod data;
pub mod parallel;
pub mod rules;
pub mod sim;
pub mod stats;
