//! The staff planning facade.

use std::fmt::Write as _;
use std::time::Instant;

use tracing::info;

use crate::anneal::{AnnealConfig, Annealer};
use crate::dfa::{Dfa, Sampler};
use crate::error::Error;
use crate::plan::{shift_epp, Plan, Shift};
use crate::regex::Regex;
use crate::{NOVER, SLOT_LENGTH};

use super::state::PlannerState;

/// Runs the whole planning process: weight calibration, temperature
/// calibration, simulated annealing, and reporting.
///
/// # Examples
///
/// ```no_run
/// use shiftplan::plan::{Plan, Shift, Target};
/// use shiftplan::planner::StaffPlanner;
/// use shiftplan::regex::Regex;
///
/// # fn main() -> Result<(), shiftplan::Error> {
/// let shift = Shift::new("A", &[(9 * 60, 17 * 60)])?;
/// let rest = Shift::rest("R");
/// let rule = (Regex::lit(shift) + Regex::lit(rest)).repeat(7);
///
/// let target = Target::new(15, 7, &vec![1.0; 7 * 96])?;
/// let plan = Plan::new(0, &["ann".into()], &target)?;
/// let mut planner = StaffPlanner::new("one agent", plan, 0.9, 0.2)?;
/// planner.set_agent_rule("ann", &rule)?;
/// planner.run()?;
/// println!("{}", planner.report());
/// # Ok(())
/// # }
/// ```
pub struct StaffPlanner {
    description: String,
    temp_sched: f64,
    comfort_weight: f64,
    week: u32,
    plan: Plan,
    samplers: Vec<Option<Sampler<Shift>>>,
    report: String,
    seed: Option<u64>,
}

impl StaffPlanner {
    /// Creates a planner over `plan`.
    ///
    /// `temp_sched` is the annealing temperature schedule (the geometric
    /// cooling factor) and must lie in `[0.5, 1.0)`; `comfort_weight` is
    /// the comfort energy weight relative to the staffing energy and must
    /// be non-negative.
    pub fn new(
        description: impl Into<String>,
        plan: Plan,
        temp_sched: f64,
        comfort_weight: f64,
    ) -> Result<Self, Error> {
        if !(0.5..1.0).contains(&temp_sched) {
            return Err(Error::InvalidArgument(
                "invalid temperature schedule (must be between 0.5 and 1.0)".into(),
            ));
        }
        if comfort_weight < 0.0 {
            return Err(Error::InvalidArgument(
                "comfort energy weight must be positive".into(),
            ));
        }
        let samplers = (0..plan.agents()).map(|_| None).collect();
        Ok(StaffPlanner {
            description: description.into(),
            temp_sched,
            comfort_weight,
            week: 0,
            plan,
            samplers,
            report: String::new(),
            seed: None,
        })
    }

    /// Seeds every random component deterministically.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Selects the week to plan.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the week does not fit the plan.
    pub fn set_week(&mut self, week: u32) -> Result<(), Error> {
        if (week + 1) * 7 > self.plan.days() {
            return Err(Error::InvalidArgument("week exceeds plan length".into()));
        }
        self.week = week;
        Ok(())
    }

    /// Sets the assignment rule for an agent: a regular expression over
    /// shifts whose words are 7-day lines. The rule is compiled into a
    /// sampler with the standard shift partition.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for unknown agent codes.
    pub fn set_agent_rule(&mut self, agent: &str, rule: &Regex<Shift>) -> Result<(), Error> {
        let idx = self.plan.agent_index(agent)?;
        let dfa = Dfa::with_partition(rule, shift_epp);
        self.samplers[idx] = Some(match self.seed {
            Some(seed) => Sampler::with_seed(dfa, seed.wrapping_add(idx as u64)),
            None => Sampler::new(dfa),
        });
        Ok(())
    }

    /// Runs the planning process on the selected week.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when some agent has no rule, plus anything the
    /// annealer's temperature preconditions reject (a fully degenerate
    /// energy landscape calibrates `tf` to zero).
    pub fn run(&mut self) -> Result<(), Error> {
        if (self.week + 1) * 7 > self.plan.days() {
            return Err(Error::InvalidArgument("week exceeds plan length".into()));
        }
        if let Some(idx) = self.samplers.iter().position(Option::is_none) {
            return Err(Error::InvalidArgument(format!(
                "agent {} has no rule",
                self.plan.agent_code(idx)
            )));
        }
        let samplers: Vec<Sampler<Shift>> =
            self.samplers.iter_mut().filter_map(Option::take).collect();

        let started = Instant::now();
        let week = self.week;
        let agents = samplers.len();

        let mut state = match self.seed {
            Some(seed) => PlannerState::with_seed(samplers, week, &mut self.plan, seed)?,
            None => PlannerState::new(samplers, week, &mut self.plan)?,
        };
        state.calibrate(self.comfort_weight);

        let mut config = AnnealConfig::new(10 * NOVER * agents);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        let mut annealer = Annealer::new(&config, state)?;

        let ti = annealer.calibrate_ti();
        let tf = annealer.calibrate_tf();

        let e0 = (
            annealer.state().energy(),
            annealer.state().staffing_energy(),
            annealer.state().comfort_energy(),
        );
        let annealed = annealer.anneal(ti, tf, self.temp_sched);
        let e1 = (
            annealer.state().energy(),
            annealer.state().staffing_energy(),
            annealer.state().comfort_energy(),
        );

        // Hand the samplers back before reporting the outcome, so a
        // degenerate run (tf calibrated to zero) leaves the planner usable.
        let samplers = annealer.into_state().into_samplers();
        for (slot, sampler) in self.samplers.iter_mut().zip(samplers) {
            *slot = Some(sampler);
        }
        annealed?;

        let elapsed = started.elapsed().as_secs_f64();
        info!(elapsed, "planning run finished");
        self.report = self.build_report(e0, e1, ti, tf, elapsed)?;
        Ok(())
    }

    /// The plan (optimized in place by [`run`](StaffPlanner::run)).
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Consumes the planner and returns the plan.
    pub fn into_plan(self) -> Plan {
        self.plan
    }

    /// The report of the last run; empty before the first run.
    pub fn report(&self) -> &str {
        &self.report
    }

    /// A one-paragraph description of the planner setup.
    pub fn summary(&self) -> String {
        let mut out = String::from("Planner:\n");
        let _ = writeln!(out, "           description: {}", self.description);
        let _ = writeln!(out, "        turning length: {}", self.plan.days());
        let _ = writeln!(out, "           slot length: {SLOT_LENGTH} minutes");
        let _ = writeln!(out, "             agents n°: {}", self.samplers.len());
        let _ = writeln!(out, "       target staffing: {:.2} hrs", self.plan.hours().target);
        let _ = writeln!(out, " comfort energy weight: {:.5}", self.comfort_weight);
        let _ = writeln!(out, "  temperature schedule: {:.2}", self.temp_sched);
        out
    }

    /// Graphviz rendering of an agent's sampler.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for unknown agents or agents without a rule.
    pub fn sampler_dot(&self, agent: &str) -> Result<String, Error> {
        let idx = self.plan.agent_index(agent)?;
        match &self.samplers[idx] {
            Some(sampler) => Ok(sampler.dfa().to_dot()),
            None => Err(Error::InvalidArgument(format!(
                "agent {agent} has no rule"
            ))),
        }
    }

    fn build_report(
        &self,
        e0: (f64, f64, f64),
        e1: (f64, f64, f64),
        ti: f64,
        tf: f64,
        elapsed: f64,
    ) -> Result<String, Error> {
        let week = self.week;
        let steps = ((tf.ln() - ti.ln()) / self.temp_sched.ln()).round() as usize;
        let week_hours = self.plan.hours_week(week)?;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "===========================================================================",
        );
        let _ = writeln!(out, "{}", self.description);
        let _ = writeln!(out, "          turning length: {}", self.plan.days());
        let _ = writeln!(out, "                 week n°: {week}");
        let _ = writeln!(out, "             slot length: {SLOT_LENGTH} minutes");
        let _ = writeln!(out, "               agents n°: {}", self.samplers.len());
        let _ = writeln!(out, "         target staffing: {:.2} hrs", week_hours.target);
        let _ = writeln!(out, "      simulated staffing: {:.2} hrs", week_hours.staffing);
        let _ = writeln!(out);
        let _ = writeln!(out, "   comfort energy weight: {:.5}", self.comfort_weight);
        let _ = writeln!(out);
        let _ = writeln!(out, "         annealing steps: {steps}");
        let _ = writeln!(out, "       temperature range: {ti:.5} -> {tf:.5}");
        let _ = writeln!(out, "    temperature schedule: {:.2}", self.temp_sched);
        let _ = writeln!(out, "       optimization time: {:.1} minutes", elapsed / 60.0);
        let _ = writeln!(out);
        let _ = writeln!(out, "         staffing energy: {:.5} -> {:.5}", e0.1, e1.1);
        let _ = writeln!(out, "          comfort energy: {:.5} -> {:.5}", e0.2, e1.2);
        let _ = writeln!(out, "            TOTAL ENERGY: {:.5} -> {:.5}", e0.0, e1.0);
        let _ = writeln!(out);
        let _ = writeln!(out, "     day by day staffing:");

        let mut trg_tot = 0.0;
        let mut stf_tot = 0.0;
        for day in week * 7..(week + 1) * 7 {
            let hrs = self.plan.hours_day(day)?;
            let _ = writeln!(
                out,
                "                 day {:>3}: {:.2} hrs (target {:.2} hrs error {:.2}%)",
                day + 1,
                hrs.staffing,
                hrs.target,
                hrs.difference,
            );
            trg_tot += hrs.target;
            stf_tot += hrs.staffing;
        }
        let _ = writeln!(
            out,
            "                   TOTAL: {:.2} hrs (target {:.2} hrs error {:.2}%)",
            stf_tot,
            trg_tot,
            100.0 * (trg_tot - stf_tot) / trg_tot,
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "       day by day energy:");
        for day in week * 7..(week + 1) * 7 {
            let _ = writeln!(
                out,
                "                 day {:>3}: {:.2}",
                day + 1,
                self.plan.energy(day)?,
            );
        }
        let _ = writeln!(
            out,
            "---------------------------------------------------------------------------",
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Target;

    fn agents(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    fn week_plan(level: f64, codes: &[&str]) -> Plan {
        let target = Target::new(15, 7, &vec![level; 7 * 96]).unwrap();
        Plan::new(0, &agents(codes), &target).unwrap()
    }

    fn work(code: &str, t0: u32, t1: u32) -> Shift {
        Shift::new(code, &[(t0, t1)]).unwrap()
    }

    #[test]
    fn test_new_validates_parameters() {
        assert!(StaffPlanner::new("p", week_plan(1.0, &["a"]), 0.4, 0.2).is_err());
        assert!(StaffPlanner::new("p", week_plan(1.0, &["a"]), 1.0, 0.2).is_err());
        assert!(StaffPlanner::new("p", week_plan(1.0, &["a"]), 0.9, -0.1).is_err());
        assert!(StaffPlanner::new("p", week_plan(1.0, &["a"]), 0.5, 0.0).is_ok());
    }

    #[test]
    fn test_set_week_bounds() {
        let mut planner = StaffPlanner::new("p", week_plan(1.0, &["a"]), 0.9, 0.2).unwrap();
        assert!(planner.set_week(0).is_ok());
        assert!(planner.set_week(1).is_err());
    }

    #[test]
    fn test_set_agent_rule_requires_known_agent() {
        let mut planner = StaffPlanner::new("p", week_plan(1.0, &["a"]), 0.9, 0.2).unwrap();
        let rule = Regex::lit(work("A", 540, 1020)).repeat(7);
        assert!(planner.set_agent_rule("a", &rule).is_ok());
        assert!(planner.set_agent_rule("zz", &rule).is_err());
    }

    #[test]
    fn test_run_requires_rules_for_every_agent() {
        let mut planner = StaffPlanner::new("p", week_plan(1.0, &["a", "b"]), 0.9, 0.0).unwrap();
        let rule = Regex::lit(work("A", 540, 1020)).repeat(7);
        planner.set_agent_rule("a", &rule).unwrap();
        let err = planner.run().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(msg) if msg.contains('b')));
    }

    #[test]
    fn test_sampler_dot() {
        let mut planner = StaffPlanner::new("p", week_plan(1.0, &["a"]), 0.9, 0.2).unwrap();
        assert!(planner.sampler_dot("a").is_err());
        let rule = Regex::lit(work("A", 540, 1020)).repeat(7);
        planner.set_agent_rule("a", &rule).unwrap();
        let dot = planner.sampler_dot("a").unwrap();
        assert!(dot.starts_with("digraph FSM {"));
        assert!(dot.contains("A"));
    }

    #[test]
    fn test_summary_mentions_setup() {
        let planner = StaffPlanner::new("demo", week_plan(1.0, &["a", "b"]), 0.9, 0.2).unwrap();
        let summary = planner.summary();
        assert!(summary.contains("demo"));
        assert!(summary.contains("agents n°: 2"));
    }

    #[test]
    fn test_full_run_pipeline() {
        // Two agents choosing daily between an around-the-clock shift and
        // rest, against a constant one-agent target.
        let mut planner = StaffPlanner::new("run", week_plan(1.0, &["a", "b"]), 0.5, 0.0)
            .unwrap()
            .with_seed(4242);
        let day = Regex::lit(work("D", 0, 24 * 60)) + Regex::lit(Shift::rest("R"));
        let rule = day.repeat(7);
        planner.set_agent_rule("a", &rule).unwrap();
        planner.set_agent_rule("b", &rule).unwrap();
        planner.run().unwrap();

        // The cumulative staffing curve stays consistent with the
        // committed assignments.
        let plan = planner.plan();
        let mut expected = vec![0.0; plan.staffing.len()];
        for line in &plan.assignments {
            for (day, shift) in line.iter().enumerate() {
                shift.add_staff(day, 1.0, &mut expected);
            }
        }
        for (i, (got, want)) in plan.staffing.iter().zip(&expected).enumerate() {
            assert!((got - want).abs() < 1e-9, "staffing differs at slot {i}");
        }

        // Annealing cannot leave the plan pessimal (every day doubly
        // staffed or empty).
        let e: f64 = (0..7).map(|d| plan.energy(d).unwrap()).sum::<f64>() / 7.0;
        assert!(e < 1.0, "final daily error too high: {e}");
        assert!(planner.report().contains("TOTAL ENERGY"));

        // The run hands the samplers back.
        assert!(planner.sampler_dot("a").is_ok());
    }
}
