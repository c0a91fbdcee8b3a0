//! Shifts, target staffing curves, and the weekly plan.
//!
//! All time quantities at the boundary are integral minutes from
//! midnight; intervals are half-open `[start, end)`. Internally
//! everything lives on the fixed 5-minute slot grid
//! ([`crate::SLOT_LENGTH`], [`crate::SLOTS_DAY`]).

mod shift;
mod staffing;
mod target;

pub use staffing::{Plan, PlanHours};
pub use shift::{shift_epp, Shift};
pub use target::Target;
