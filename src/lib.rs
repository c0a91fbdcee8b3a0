//! Workforce shift planning core.
//!
//! Given a set of agents, a per-agent assignment rule expressed as a
//! regular expression over shifts, and a target staffing curve sampled
//! on 5-minute slots, this crate searches for a weekly assignment of one
//! shift per agent per day minimizing a composite energy: squared error
//! against the target curve plus an ergonomic penalty on day-to-day
//! start-time jumps.
//!
//! The crate is organized bottom-up:
//!
//! - [`regex`]: symbolic regular expressions over a generic letter type,
//!   with normalizing smart constructors and Brzozowski derivatives.
//! - [`dfa`]: minimal deterministic automata built by iterated
//!   derivatives, and random samplers of accepted words.
//! - [`anneal`]: a simulated-annealing driver with automatic calibration
//!   of the initial and final temperatures.
//! - [`plan`]: shifts, target staffing curves, and the weekly plan.
//! - [`planner`]: the incremental energy terms and the planner state
//!   gluing samplers, plan, and annealer together.
//!
//! # Example
//!
//! ```no_run
//! use shiftplan::plan::{Plan, Shift, Target};
//! use shiftplan::planner::StaffPlanner;
//! use shiftplan::regex::Regex;
//!
//! # fn main() -> Result<(), shiftplan::Error> {
//! let morning = Shift::new("M", &[(9 * 60, 13 * 60)])?;
//! let evening = Shift::new("E", &[(14 * 60, 18 * 60)])?;
//! let rest = Shift::rest("R");
//!
//! // Five working days, two days of rest, any of the two shifts per day.
//! let day = Regex::lit(morning) + Regex::lit(evening);
//! let rule = day.repeat(5) * Regex::lit(rest).repeat(2);
//!
//! let target = Target::new(15, 7, &vec![4.0; 7 * 96])?;
//! let plan = Plan::new(0, &["alice".into(), "bob".into()], &target)?;
//!
//! let mut planner = StaffPlanner::new("demo", plan, 0.9, 0.2)?;
//! planner.set_agent_rule("alice", &rule)?;
//! planner.set_agent_rule("bob", &rule)?;
//! planner.run()?;
//! println!("{}", planner.report());
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! The whole optimization core is single-threaded. [`regex::Regex`] and
//! [`dfa::Dfa`] values are immutable and freely shareable; samplers, plans,
//! and planner state are owned by one optimization run.

pub mod anneal;
pub mod dfa;
pub mod error;
pub mod plan;
pub mod planner;
mod random;
pub mod regex;

pub use error::Error;

/// Slot length in minutes. The whole time grid is fixed to 5-minute slots.
pub const SLOT_LENGTH: u32 = 5;

/// Number of 5-minute slots in a day.
pub const SLOTS_DAY: usize = (24 * 60 / SLOT_LENGTH) as usize;

/// Annealing iteration budget for each agent day.
pub(crate) const NOVER: usize = 100;
