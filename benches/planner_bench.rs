//! Criterion benchmarks for the planning core.
//!
//! Measures the three hot paths: DFA construction from a weekly rule,
//! word sampling, and the planner state's mutate/delta/apply cycle.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use shiftplan::dfa::{Dfa, Sampler};
use shiftplan::plan::{shift_epp, Plan, Shift, Target};
use shiftplan::planner::PlannerState;
use shiftplan::regex::Regex;

fn shifts() -> Vec<Shift> {
    let mut shifts: Vec<Shift> = (6..18)
        .map(|h| Shift::new(format!("S{h}"), &[(h * 60, (h + 8) * 60)]).unwrap())
        .collect();
    shifts.push(Shift::rest("R"));
    shifts
}

fn weekly_rule() -> Regex<Shift> {
    Regex::any_of(&shifts()).repeat(7)
}

fn bench_dfa_build(c: &mut Criterion) {
    let rule = weekly_rule();
    c.bench_function("dfa_build_weekly_rule", |b| {
        b.iter(|| Dfa::with_partition(black_box(&rule), shift_epp))
    });
}

fn bench_sampling(c: &mut Criterion) {
    let rule = weekly_rule();
    let mut sampler = Sampler::with_seed(Dfa::with_partition(&rule, shift_epp), 42);
    c.bench_function("sample_weekly_line", |b| b.iter(|| sampler.sample()));
    sampler.sample();
    c.bench_function("resample_weekly_line", |b| b.iter(|| sampler.resample()));
}

fn bench_mutation_cycle(c: &mut Criterion) {
    let rule = weekly_rule();
    let agents: Vec<String> = (0..20).map(|i| format!("agent{i}")).collect();
    let target = Target::new(15, 7, &vec![6.0; 7 * 96]).unwrap();
    let mut plan = Plan::new(120, &agents, &target).unwrap();
    let samplers = (0..agents.len() as u64)
        .map(|i| Sampler::with_seed(Dfa::with_partition(&rule, shift_epp), i))
        .collect();
    let mut state = PlannerState::with_seed(samplers, 0, &mut plan, 7).unwrap();

    c.bench_function("mutate_delta_apply", |b| {
        b.iter(|| {
            state.mutate();
            let de = state.delta_energy();
            state.apply_mutation();
            black_box(de)
        })
    });
}

criterion_group!(
    benches,
    bench_dfa_build,
    bench_sampling,
    bench_mutation_cycle
);
criterion_main!(benches);
