pub mod athlete;
pub mod calibration;
pub mod reports;
pub mod season;
pub mod seeds;
pub mod tester;

pub use athlete::{AthleteProfile, WeekPlan};
pub use calibration::{
    CalibrationAggregate, CalibrationRecord, aggregate_calibration, run_calibration,
    validate_calibration_targets,
};
pub use season::{Opponent, SeasonPlan, SeasonRunner, SeasonSummary};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
