//! End-to-end planning scenarios on literal inputs.

use shiftplan::anneal::{AnnealConfig, Annealer};
use shiftplan::dfa::{Dfa, Sampler};
use shiftplan::plan::{shift_epp, Plan, Shift, Target};
use shiftplan::planner::PlannerState;
use shiftplan::regex::Regex;
use shiftplan::SLOTS_DAY;

fn agents(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|s| s.to_string()).collect()
}

fn sampler(rule: &Regex<Shift>, seed: u64) -> Sampler<Shift> {
    Sampler::with_seed(Dfa::with_partition(rule, shift_epp), seed)
}

#[test]
fn trivial_rest_plan_has_zero_energy() {
    // One agent forced to rest all week against an all-zero target.
    let rest = Shift::rest("R");
    let rule = Regex::lit(rest.clone()).repeat(7);

    let target = Target::new(5, 7, &vec![0.0; 7 * SLOTS_DAY]).unwrap();
    let mut plan = Plan::new(0, &agents(&["solo"]), &target).unwrap();

    let state = PlannerState::with_seed(vec![sampler(&rule, 1)], 0, &mut plan, 2).unwrap();
    assert_eq!(state.energy(), 0.0);

    // A short annealing run cannot make a perfect plan worse.
    let mut annealer = Annealer::new(&AnnealConfig::new(100).with_seed(3), state).unwrap();
    annealer.anneal(1.0, 0.5, 0.9).unwrap();
    let state = annealer.into_state();
    assert_eq!(state.energy(), 0.0);
    assert_eq!(state.plan().agent_plan("solo").unwrap(), vec![rest; 7].as_slice());
}

#[test]
fn alternation_covers_the_target_spike() {
    // One agent choosing between two one-hour shifts each day; the target
    // wants staff only at slot 120 (10:00 on day one), which only shift A
    // covers.
    let a = Shift::new("A", &[(10 * 60, 11 * 60)]).unwrap();
    let b = Shift::new("B", &[(14 * 60, 15 * 60)]).unwrap();
    let rule = (Regex::lit(a.clone()) + Regex::lit(b)).repeat(7);

    let mut points = vec![0.0; 7 * SLOTS_DAY];
    points[120] = 1.0;
    let target = Target::new(5, 7, &points).unwrap();
    let mut plan = Plan::new(0, &agents(&["solo"]), &target).unwrap();

    let state = PlannerState::with_seed(vec![sampler(&rule, 5)], 0, &mut plan, 6).unwrap();
    let mut annealer = Annealer::new(&AnnealConfig::new(1000).with_seed(7), state).unwrap();
    annealer.anneal(1.0, 1e-5, 0.8).unwrap();

    let state = annealer.into_state();
    assert_eq!(state.plan().staffing[120], 1.0);
    let line = state.plan().agent_plan("solo").unwrap();
    assert_eq!(line[0], a);
    assert_eq!(line[0].staff(10 * 60), 1);
}

#[test]
fn delta_energy_prices_accepted_mutations_exactly() {
    // Mixed work/rest rule over a stepped target: the incremental deltas
    // the annealer trusts must match full re-evaluations.
    let early = Shift::new("E", &[(6 * 60, 14 * 60)]).unwrap();
    let late = Shift::new("L", &[(13 * 60, 21 * 60)]).unwrap();
    let rest = Shift::rest("R");
    let day = Regex::any_of(&[early, late, rest]);
    let rule = day.repeat(7);

    let mut points = vec![0.0; 7 * SLOTS_DAY];
    for (i, p) in points.iter_mut().enumerate() {
        let minute = (i % SLOTS_DAY) * 5;
        if (8 * 60..20 * 60).contains(&minute) {
            *p = 2.0;
        }
    }
    let target = Target::new(5, 7, &points).unwrap();
    let mut plan = Plan::new(0, &agents(&["x", "y", "z"]), &target).unwrap();

    let samplers = (0..3).map(|i| sampler(&rule, 40 + i)).collect();
    let mut state = PlannerState::with_seed(samplers, 0, &mut plan, 41).unwrap();

    for _ in 0..100 {
        state.mutate();
        let e0 = state.energy();
        let de = state.delta_energy();
        state.apply_mutation();
        assert!((state.energy() - e0 - de).abs() < 1e-9);
    }
}
