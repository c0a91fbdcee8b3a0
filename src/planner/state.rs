//! Planner state: the annealer's view of the search space.

use rand::Rng;
use rand_mt::Mt64;
use tracing::{debug, info};

use crate::anneal::AnnealState;
use crate::dfa::Sampler;
use crate::error::Error;
use crate::plan::{Plan, Shift};
use crate::random::{create_rng, entropy_seed};
use crate::SLOTS_DAY;

use super::energy::{ComfortEnergy, StaffingEnergy};

/// Iterations used to calibrate the comfort weight.
const CALIBRATION_ITERATIONS: usize = 200_000;

/// A sampler over the set of all plannings of one week.
///
/// The state keeps one word [`Sampler`] per agent and a mutable borrow of
/// the plan. [`mutate`](PlannerState::mutate) picks an agent at random and
/// proposes a fresh weekly line for it, either sampled from scratch or
/// refined with the combined energy fitness; the pre- and post-mutation
/// staffing contributions of that agent are kept alongside so
/// [`delta_energy`](PlannerState::delta_energy) prices the proposal
/// incrementally. [`apply_mutation`](PlannerState::apply_mutation) commits
/// the proposal into the plan and its cumulative staffing curve.
pub struct PlannerState<'a> {
    rng: Mt64,
    samplers: Vec<Sampler<Shift>>,
    week: u32,
    plan: &'a mut Plan,

    mutd_idx: usize,
    mutd_pln: Vec<Shift>,
    prev_stf: Vec<f64>,
    mutd_stf: Vec<f64>,

    w1: f64,
    staffing: StaffingEnergy,
    comfort: ComfortEnergy,
}

impl<'a> PlannerState<'a> {
    /// Creates the state with entropy seeding.
    pub fn new(
        samplers: Vec<Sampler<Shift>>,
        week: u32,
        plan: &'a mut Plan,
    ) -> Result<Self, Error> {
        Self::with_seed(samplers, week, plan, entropy_seed())
    }

    /// Creates the state with a deterministic seed.
    ///
    /// Every agent is seeded with an initial random line (agent index
    /// ascending) whose staffing is accumulated into the plan, then one
    /// mutation is proposed so the energy delta is defined before the
    /// first annealing step.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when no samplers are given, their number does
    /// not match the plan's agents, or the week lies outside the plan.
    pub fn with_seed(
        samplers: Vec<Sampler<Shift>>,
        week: u32,
        plan: &'a mut Plan,
        seed: u64,
    ) -> Result<Self, Error> {
        if samplers.is_empty() {
            return Err(Error::InvalidArgument(
                "you must provide some samplers".into(),
            ));
        }
        if samplers.len() != plan.agents() {
            return Err(Error::InvalidArgument(format!(
                "{} samplers for {} agents",
                samplers.len(),
                plan.agents()
            )));
        }
        if (week + 1) * 7 > plan.days() {
            return Err(Error::InvalidArgument("week exceeds plan length".into()));
        }

        let week_slots = plan.week_slots();
        let staffing = StaffingEnergy::new(plan, week);
        let comfort = ComfortEnergy::new(plan, week);
        let mut state = PlannerState {
            rng: create_rng(seed),
            samplers,
            week,
            plan,
            mutd_idx: 0,
            mutd_pln: Vec::new(),
            prev_stf: vec![0.0; week_slots],
            mutd_stf: vec![0.0; week_slots],
            w1: 1.0,
            staffing,
            comfort,
        };

        for i in 0..state.samplers.len() {
            let line = state.samplers[i].sample();
            state.plan.update_plan(i, (week * 7) as usize, &line)?;
            for (day, shift) in line.iter().enumerate() {
                shift.add_staff((week * 7) as usize + day, 1.0, &mut state.plan.staffing);
            }
        }
        state.mutate();
        Ok(state)
    }

    /// Energy of the current plan.
    pub fn energy(&self) -> f64 {
        self.staffing.energy(self.plan) + self.w1 * self.comfort.energy(self.plan)
    }

    /// Energy change of the pending mutation.
    pub fn delta_energy(&self) -> f64 {
        self.staffing.delta(self.plan, &self.prev_stf, &self.mutd_stf)
            + self.w1 * self.comfort.delta(self.plan, self.mutd_idx, &self.mutd_pln)
    }

    /// Staffing term of the current energy.
    pub fn staffing_energy(&self) -> f64 {
        self.staffing.energy(self.plan)
    }

    /// Staffing term of the pending delta.
    pub fn staffing_delta_energy(&self) -> f64 {
        self.staffing.delta(self.plan, &self.prev_stf, &self.mutd_stf)
    }

    /// Comfort term of the current energy (unweighted).
    pub fn comfort_energy(&self) -> f64 {
        self.comfort.energy(self.plan)
    }

    /// Comfort term of the pending delta (unweighted).
    pub fn comfort_delta_energy(&self) -> f64 {
        self.comfort.delta(self.plan, self.mutd_idx, &self.mutd_pln)
    }

    /// Calibrates the comfort weight so a user-supplied `w1` expresses a
    /// ratio between the two energy terms: 200 000 committed mutations
    /// estimate the mean of each term and the weight becomes
    /// `w1 · mean_staffing / mean_comfort`. A zero `w1` disables the
    /// comfort term outright.
    pub fn calibrate(&mut self, w1: f64) {
        if w1 == 0.0 {
            self.w1 = 0.0;
            return;
        }
        let n = CALIBRATION_ITERATIONS;
        debug!(iterations = n, "calibrating energy weights");

        let mut sum0 = 0.0;
        let mut sum_sq0 = 0.0;
        let mut sum1 = 0.0;
        let mut sum_sq1 = 0.0;
        for _ in 1..n {
            self.mutate();
            self.apply_mutation();

            let e0 = self.staffing.energy(self.plan);
            sum0 += e0;
            sum_sq0 += e0 * e0;

            let e1 = self.comfort.energy(self.plan);
            sum1 += e1;
            sum_sq1 += e1 * e1;
        }

        let n = n as f64;
        let mean0 = sum0 / n;
        let stddev0 = ((sum_sq0 - sum0 * sum0 / n) / (n - 1.0)).sqrt();
        let mean1 = sum1 / n;
        let stddev1 = ((sum_sq1 - sum1 * sum1 / n) / (n - 1.0)).sqrt();
        info!(mean0, stddev0, mean1, stddev1, "energy statistics");

        self.w1 = w1 * mean0 / mean1;
        info!(w1, calibrated = self.w1, "comfort weight updated");
    }

    /// Proposes a new candidate: picks an agent uniformly and draws a
    /// fresh weekly line with probability 0.8, or refines the recorded
    /// path with the combined staffing+comfort fitness with probability
    /// 0.2. Rebuilds the agent's pre- and post-mutation staffing
    /// contributions.
    ///
    /// # Panics
    ///
    /// Panics when the agent's rule produces a line that is not exactly
    /// 7 days long.
    pub fn mutate(&mut self) {
        self.mutd_idx = self.rng.random_range(0..self.samplers.len());

        let week0 = (self.week * 7) as usize;
        let line = if self.rng.random_range(0.0..1.0) < 0.8 {
            self.samplers[self.mutd_idx].sample()
        } else {
            let idx = self.mutd_idx;
            let plan = &*self.plan;
            let staffing = &self.staffing;
            let comfort = &self.comfort;
            let w1 = self.w1;
            self.samplers[idx].resample_fittest(|day, partial, cand| {
                let current = &plan.assignments[idx][week0 + day];
                staffing.fitness(plan, (week0 + day) as u32, current, cand)
                    + w1 * comfort.fitness(partial, current, cand)
            })
        };
        self.mutd_pln = line;
        assert_eq!(
            self.mutd_pln.len(),
            7,
            "agent rule must produce 7-day lines, got {} shifts",
            self.mutd_pln.len()
        );

        self.prev_stf.fill(0.0);
        self.mutd_stf.fill(0.0);
        for day in 0..7 {
            self.plan.assignments[self.mutd_idx][week0 + day].add_staff(
                day,
                1.0,
                &mut self.prev_stf,
            );
            self.mutd_pln[day].add_staff(day, 1.0, &mut self.mutd_stf);
        }
    }

    /// Commits the pending candidate: writes the line into the plan and
    /// shifts the cumulative staffing curve by the contribution change.
    pub fn apply_mutation(&mut self) {
        let week0 = (self.week * 7) as usize;
        for day in 0..7 {
            self.plan.assignments[self.mutd_idx][week0 + day] = self.mutd_pln[day].clone();
        }
        let base = week0 * SLOTS_DAY;
        for i in 0..self.plan.week_slots() {
            self.plan.staffing[base + i] += self.mutd_stf[i] - self.prev_stf[i];
        }
    }

    /// The plan being optimized.
    pub fn plan(&self) -> &Plan {
        self.plan
    }

    /// Releases the per-agent samplers.
    pub fn into_samplers(self) -> Vec<Sampler<Shift>> {
        self.samplers
    }
}

impl AnnealState for PlannerState<'_> {
    fn energy(&self) -> f64 {
        PlannerState::energy(self)
    }

    fn mutate(&mut self) {
        PlannerState::mutate(self);
    }

    fn delta_energy(&self) -> f64 {
        PlannerState::delta_energy(self)
    }

    fn apply_mutation(&mut self) {
        PlannerState::apply_mutation(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfa::Dfa;
    use crate::plan::{shift_epp, Target};
    use crate::regex::Regex;

    fn agents(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    fn work(code: &str, t0: u32, t1: u32) -> Shift {
        Shift::new(code, &[(t0, t1)]).unwrap()
    }

    fn week_rule(shifts: &[Shift]) -> Regex<Shift> {
        Regex::any_of(shifts).repeat(7)
    }

    fn sampler(rule: &Regex<Shift>, seed: u64) -> Sampler<Shift> {
        Sampler::with_seed(Dfa::with_partition(rule, shift_epp), seed)
    }

    fn week_plan(level: f64, codes: &[&str]) -> Plan {
        let target = Target::new(15, 7, &vec![level; 7 * 96]).unwrap();
        Plan::new(0, &agents(codes), &target).unwrap()
    }

    fn staffing_from_scratch(plan: &Plan) -> Vec<f64> {
        let mut curve = vec![0.0; plan.staffing.len()];
        for line in &plan.assignments {
            for (day, shift) in line.iter().enumerate() {
                shift.add_staff(day, 1.0, &mut curve);
            }
        }
        curve
    }

    fn assert_curves_match(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() < 1e-9, "curves differ at slot {i}: {x} vs {y}");
        }
    }

    #[test]
    fn test_construction_seeds_every_agent() {
        let mut plan = week_plan(1.0, &["a", "b", "c"]);
        let shifts = [work("A", 9 * 60, 17 * 60), work("B", 13 * 60, 21 * 60)];
        let rule = week_rule(&shifts);
        let samplers = (0..3).map(|i| sampler(&rule, i)).collect();
        let state = PlannerState::with_seed(samplers, 0, &mut plan, 99).unwrap();

        let expected = staffing_from_scratch(state.plan());
        assert_curves_match(&state.plan().staffing, &expected);
        // Every agent works all seven days under this rule
        assert!(state
            .plan()
            .assignments
            .iter()
            .all(|line| line.iter().all(Shift::work)));
    }

    #[test]
    fn test_construction_validations() {
        let mut plan = week_plan(1.0, &["a", "b"]);
        let rule = week_rule(&[work("A", 9 * 60, 17 * 60)]);
        assert!(PlannerState::with_seed(vec![], 0, &mut plan, 1).is_err());
        let samplers = vec![sampler(&rule, 1)];
        assert!(PlannerState::with_seed(samplers, 0, &mut plan, 1).is_err());
        let samplers = (0..2).map(|i| sampler(&rule, i)).collect();
        assert!(PlannerState::with_seed(samplers, 1, &mut plan, 1).is_err());
    }

    #[test]
    fn test_apply_mutation_keeps_staffing_consistent() {
        let mut plan = week_plan(1.0, &["a", "b"]);
        let shifts = [
            work("A", 9 * 60, 17 * 60),
            work("B", 13 * 60, 21 * 60),
            Shift::rest("R"),
        ];
        let rule = week_rule(&shifts);
        let samplers = (0..2).map(|i| sampler(&rule, 10 + i)).collect();
        let mut state = PlannerState::with_seed(samplers, 0, &mut plan, 5).unwrap();

        for _ in 0..50 {
            state.mutate();
            state.apply_mutation();
        }
        let expected = staffing_from_scratch(state.plan());
        assert_curves_match(&state.plan().staffing, &expected);
    }

    #[test]
    fn test_delta_energy_matches_energy_difference() {
        let mut plan = week_plan(2.0, &["a", "b", "c"]);
        let shifts = [
            work("A", 8 * 60, 16 * 60),
            work("B", 12 * 60, 20 * 60),
            Shift::rest("R"),
        ];
        let rule = week_rule(&shifts);
        let samplers = (0..3).map(|i| sampler(&rule, 20 + i)).collect();
        let mut state = PlannerState::with_seed(samplers, 0, &mut plan, 8).unwrap();

        for _ in 0..50 {
            state.mutate();
            let e0 = state.energy();
            let de = state.delta_energy();
            state.apply_mutation();
            let e1 = state.energy();
            assert!(
                (e1 - e0 - de).abs() < 1e-9,
                "delta {de} does not match {e0} -> {e1}"
            );
        }
    }

    #[test]
    fn test_calibrate_zero_disables_comfort() {
        let mut plan = week_plan(1.0, &["a"]);
        let rule = week_rule(&[work("A", 9 * 60, 17 * 60), work("B", 13 * 60, 21 * 60)]);
        let samplers = vec![sampler(&rule, 2)];
        let mut state = PlannerState::with_seed(samplers, 0, &mut plan, 3).unwrap();
        state.calibrate(0.0);
        assert_eq!(state.energy(), state.staffing_energy());
        assert_eq!(state.delta_energy(), state.staffing_delta_energy());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut plan = week_plan(1.0, &["a", "b"]);
            let rule = week_rule(&[
                work("A", 9 * 60, 17 * 60),
                work("B", 13 * 60, 21 * 60),
                Shift::rest("R"),
            ]);
            let samplers = (0..2).map(|i| sampler(&rule, 30 + i)).collect();
            let mut state = PlannerState::with_seed(samplers, 0, &mut plan, 17).unwrap();
            for _ in 0..20 {
                state.mutate();
                state.apply_mutation();
            }
            (state.energy(), state.plan().staffing.clone())
        };
        let (e1, s1) = run();
        let (e2, s2) = run();
        assert_eq!(e1, e2);
        assert_eq!(s1, s2);
    }
}
