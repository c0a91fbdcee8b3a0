//! The staffing plan.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::Error;
use crate::{SLOTS_DAY, SLOT_LENGTH};

use super::shift::Shift;
use super::target::Target;

/// Hour totals for a plan window.
#[derive(Debug, Clone, Copy)]
pub struct PlanHours {
    /// Target hours.
    pub target: f64,
    /// Planned staffing hours.
    pub staffing: f64,
    /// Shortfall as a percentage of the target.
    pub difference: f64,
}

/// The staffing plan: the target curve, the cumulative staffing curve,
/// and one line of shift assignments per agent.
///
/// The curves are exposed directly; the planner state updates them
/// incrementally and keeps them consistent with the assignment matrix.
pub struct Plan {
    /// Target staffing curve (rescaled).
    pub target: Vec<f64>,
    /// Target staffing curve (unrescaled).
    pub target_unrescaled: Vec<f64>,
    /// Planned staffing curve.
    pub staffing: Vec<f64>,
    /// Shift assignments, one row per agent, one column per day.
    pub assignments: Vec<Vec<Shift>>,

    days: u32,
    offset_slots: u32,
    agents: Vec<String>,
    agent_idx: BTreeMap<String, usize>,
}

impl Plan {
    /// Creates an empty plan (everyone at rest) for `agents` against
    /// `target`. `offset_minutes` extends each day's slot window past
    /// midnight for shifts crossing a day boundary.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `agents` is empty or contains duplicates,
    /// or when `offset_minutes` exceeds 24·60.
    pub fn new(offset_minutes: u32, agents: &[String], target: &Target) -> Result<Self, Error> {
        if agents.is_empty() {
            return Err(Error::InvalidArgument(
                "you must add agents to create a plan".into(),
            ));
        }
        if offset_minutes > 24 * 60 {
            return Err(Error::InvalidArgument(
                "invalid offset (should be less than 24*60)".into(),
            ));
        }

        let mut agent_idx = BTreeMap::new();
        for (i, code) in agents.iter().enumerate() {
            if agent_idx.insert(code.clone(), i).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "duplicate agent code {code}"
                )));
            }
        }

        let rescaled = target.rescaled();
        let staffing = vec![0.0; rescaled.len()];
        let line = vec![Shift::default(); target.days() as usize];

        Ok(Plan {
            target: rescaled,
            target_unrescaled: target.unrescaled().to_vec(),
            staffing,
            assignments: vec![line; agents.len()],
            days: target.days(),
            offset_slots: offset_minutes / SLOT_LENGTH,
            agents: agents.to_vec(),
            agent_idx,
        })
    }

    /// Plan length in days.
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Number of agents.
    pub fn agents(&self) -> usize {
        self.agents.len()
    }

    /// Time slots covered by one day plan, including the midnight
    /// overflow window.
    pub fn day_slots(&self) -> usize {
        SLOTS_DAY + self.offset_slots as usize
    }

    /// Time slots covered by one week plan, including the midnight
    /// overflow window.
    pub fn week_slots(&self) -> usize {
        7 * SLOTS_DAY + self.offset_slots as usize
    }

    /// Hour totals over the whole plan.
    pub fn hours(&self) -> PlanHours {
        self.hours_over(0, self.target.len())
    }

    /// Hour totals over one week.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the week starts past the plan length.
    pub fn hours_week(&self, week: u32) -> Result<PlanHours, Error> {
        if week * 7 > self.days {
            return Err(Error::InvalidArgument("week exceeds plan length".into()));
        }
        let i0 = week as usize * 7 * SLOTS_DAY;
        Ok(self.hours_over(i0, i0 + 7 * SLOTS_DAY))
    }

    /// Hour totals over one day.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `day` lies past the plan length.
    pub fn hours_day(&self, day: u32) -> Result<PlanHours, Error> {
        if day > self.days {
            return Err(Error::InvalidArgument("day exceeds plan length".into()));
        }
        let i0 = day as usize * SLOTS_DAY;
        Ok(self.hours_over(i0, i0 + SLOTS_DAY))
    }

    fn hours_over(&self, i0: usize, i1: usize) -> PlanHours {
        let mut s_trg = 0.0;
        let mut s_stf = 0.0;
        for i in i0..i1.min(self.target.len()) {
            s_trg += self.target[i] * f64::from(SLOT_LENGTH);
            s_stf += self.staffing[i] * f64::from(SLOT_LENGTH);
        }
        PlanHours {
            target: s_trg / 60.0,
            staffing: s_stf / 60.0,
            difference: 100.0 * (s_trg - s_stf) / s_trg,
        }
    }

    /// Mean squared staffing error over one day.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `day` lies past the plan length.
    pub fn energy(&self, day: u32) -> Result<f64, Error> {
        if day > self.days {
            return Err(Error::InvalidArgument("day exceeds plan length".into()));
        }
        let i0 = day as usize * SLOTS_DAY;
        let i1 = (i0 + SLOTS_DAY).min(self.staffing.len());
        let mut e = 0.0;
        for i in i0..i1 {
            let d = self.target[i] - self.staffing[i];
            e += d * d;
        }
        Ok(e / SLOTS_DAY as f64)
    }

    /// Row index of an agent.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for unknown codes.
    pub fn agent_index(&self, agent_code: &str) -> Result<usize, Error> {
        self.agent_idx
            .get(agent_code)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("agent {agent_code} not found in plan")))
    }

    /// Code of the agent at row `idx`.
    pub fn agent_code(&self, idx: usize) -> &str {
        &self.agents[idx]
    }

    /// Overwrites the agent's assignments for consecutive days starting
    /// at `day`, clipped to the plan length.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `day` lies past the plan length.
    pub fn update_plan(&mut self, agent_idx: usize, day: usize, line: &[Shift]) -> Result<(), Error> {
        if day > self.days as usize {
            return Err(Error::InvalidArgument("day exceeds plan length".into()));
        }
        for (i, shift) in line.iter().enumerate() {
            if day + i >= self.days as usize {
                break;
            }
            self.assignments[agent_idx][day + i] = shift.clone();
        }
        Ok(())
    }

    /// The full assignment line of an agent.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for unknown codes.
    pub fn agent_plan(&self, agent_code: &str) -> Result<&[Shift], Error> {
        Ok(&self.assignments[self.agent_index(agent_code)?])
    }

    /// Renders the plan as text: one line per agent,
    /// `code: S1 S2 ... Sn`, agents in code order.
    pub fn render_plan(&self) -> String {
        let mut out = String::new();
        for (code, &idx) in &self.agent_idx {
            let _ = write!(out, "{code}:");
            for shift in &self.assignments[idx] {
                let _ = write!(out, " {:>10}", shift.code());
            }
            out.push('\n');
        }
        out
    }

    /// Renders the staffing curves as text: rows of
    /// `slot target_rescaled target_unrescaled planned`.
    pub fn render_staffing(&self) -> String {
        let mut out = String::new();
        let n = self
            .target
            .len()
            .min(self.target_unrescaled.len())
            .min(self.staffing.len());
        for i in 0..n {
            let _ = writeln!(
                out,
                "{i} {:.4} {:.4} {:.4}",
                self.target[i], self.target_unrescaled[i], self.staffing[i]
            );
        }
        out
    }

    /// Saves the whole plan to a file, one line per agent.
    pub fn save_plan(&self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, self.render_plan())
    }

    /// Saves the staffing curves to a file, one row per slot.
    pub fn save_staffing(&self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, self.render_staffing())
    }
}
