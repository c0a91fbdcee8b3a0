//! Energy terms, planner state, and the planning facade.
//!
//! [`StaffingEnergy`] and [`ComfortEnergy`] price a weekly plan; both
//! expose a full evaluation, an incremental delta for one mutated agent,
//! and a per-letter fitness used by the guided resampling move.
//! [`PlannerState`] glues the per-agent samplers to the plan and
//! implements the annealer's mutation protocol. [`StaffPlanner`] wires
//! everything together: weight calibration, temperature calibration,
//! annealing, and the final report.

mod energy;
mod runner;
mod state;

pub use energy::{ComfortEnergy, StaffingEnergy};
pub use runner::StaffPlanner;
pub use state::PlannerState;
