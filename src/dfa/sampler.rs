//! Random sampling of accepted words.

use std::hash::Hash;

use rand::Rng;
use rand_mt::Mt64;

use super::automaton::{Dfa, StateId};
use crate::random::{create_rng, entropy_seed};

/// Draws random accepted words from a [`Dfa`].
///
/// The sampler records the sequence of states visited by the last
/// [`sample`](Sampler::sample); [`resample`](Sampler::resample) and
/// [`resample_fittest`](Sampler::resample_fittest) re-walk that exact
/// path choosing different letters. The generator and the trace are
/// owned mutable state: a sampler must not be shared across threads.
///
/// # Panics
///
/// Sampling panics if it reaches a non-accepting state with no outgoing
/// edges. The derivative construction never produces such states; hitting
/// one means the automaton was corrupted and the run cannot continue.
pub struct Sampler<L> {
    dfa: Dfa<L>,
    rng: Mt64,
    trace: Vec<StateId>,
}

impl<L: Clone + Eq + Ord + Hash> Sampler<L> {
    /// Wraps `dfa` with a generator seeded from OS entropy.
    pub fn new(dfa: Dfa<L>) -> Self {
        Self::with_seed(dfa, entropy_seed())
    }

    /// Wraps `dfa` with a deterministic seed.
    pub fn with_seed(dfa: Dfa<L>, seed: u64) -> Self {
        Sampler {
            dfa,
            rng: create_rng(seed),
            trace: Vec::new(),
        }
    }

    /// The underlying automaton.
    pub fn dfa(&self) -> &Dfa<L> {
        &self.dfa
    }

    /// Walks a random path through the automaton and returns the word it
    /// spells. At accepting states the walk stops with probability 1/2;
    /// otherwise it picks a successor uniformly, then a letter bucket
    /// uniformly, then a letter uniformly within the bucket.
    pub fn sample(&mut self) -> Vec<L> {
        let mut word = Vec::new();
        let mut q0: StateId = 1;
        self.trace.clear();
        self.trace.push(q0);
        loop {
            let stop = self.dfa.finals.contains(&q0);
            if stop && self.rng.random_range(0..=1u32) == 0 {
                break;
            }

            let q1 = match self.dfa.state_states.get(&q0) {
                Some(succs) if !succs.is_empty() => {
                    if succs.len() > 1 {
                        succs[self.rng.random_range(0..succs.len())]
                    } else {
                        succs[0]
                    }
                }
                _ => {
                    if stop {
                        break;
                    }
                    panic!("dangling state {q0} in dfa");
                }
            };

            match self.dfa.trans_letters.get(&(q0, q1)) {
                Some(buckets) if !buckets.is_empty() => {
                    let bucket = if buckets.len() > 1 {
                        &buckets[self.rng.random_range(0..buckets.len())]
                    } else {
                        &buckets[0]
                    };
                    let l_idx = if bucket.len() > 1 {
                        bucket[self.rng.random_range(0..bucket.len())]
                    } else {
                        bucket[0]
                    };
                    word.push(self.dfa.alphabet[l_idx].clone());
                }
                _ => {
                    if stop {
                        break;
                    }
                    panic!("dangling state {q0} in dfa");
                }
            }

            q0 = q1;
            self.trace.push(q1);
        }
        word
    }

    /// Re-walks the path recorded by the last [`sample`](Sampler::sample),
    /// drawing a fresh bucket-uniform letter at each step. Falls back to
    /// `sample` when no path has been recorded yet.
    pub fn resample(&mut self) -> Vec<L> {
        if self.trace.len() < 2 {
            return self.sample();
        }
        let mut word = Vec::with_capacity(self.trace.len() - 1);
        for step in self.trace.windows(2) {
            let (q0, q1) = (step[0], step[1]);
            let buckets = match self.dfa.trans_letters.get(&(q0, q1)) {
                Some(buckets) if !buckets.is_empty() => buckets,
                _ => panic!("dangling state {q0} in dfa resampling"),
            };
            let bucket = if buckets.len() > 1 {
                &buckets[self.rng.random_range(0..buckets.len())]
            } else {
                &buckets[0]
            };
            let l_idx = if bucket.len() > 1 {
                bucket[self.rng.random_range(0..bucket.len())]
            } else {
                bucket[0]
            };
            word.push(self.dfa.alphabet[l_idx].clone());
        }
        word
    }

    /// Re-walks the recorded path choosing at each step the letter
    /// minimizing `fitness(step, partial_word, letter)` over every bucket
    /// of the traversed edge. The first strictly smaller fitness wins, so
    /// ties break in bucket-then-letter order. Falls back to `sample`
    /// when no path has been recorded yet.
    pub fn resample_fittest<F>(&mut self, mut fitness: F) -> Vec<L>
    where
        F: FnMut(usize, &[L], &L) -> f64,
    {
        if self.trace.len() < 2 {
            return self.sample();
        }
        let mut word: Vec<L> = Vec::with_capacity(self.trace.len() - 1);
        for (i, step) in self.trace.windows(2).enumerate() {
            let (q0, q1) = (step[0], step[1]);
            let buckets = match self.dfa.trans_letters.get(&(q0, q1)) {
                Some(buckets) if !buckets.is_empty() => buckets,
                _ => panic!("dangling state {q0} in dfa resampling"),
            };
            let mut fit_min = 0.0;
            let mut fit_idx: Option<usize> = None;
            for bucket in buckets {
                for &l_idx in bucket {
                    let f = fitness(i, &word, &self.dfa.alphabet[l_idx]);
                    if fit_idx.is_none() || f < fit_min {
                        fit_min = f;
                        fit_idx = Some(l_idx);
                    }
                }
            }
            match fit_idx {
                Some(l_idx) => word.push(self.dfa.alphabet[l_idx].clone()),
                None => panic!("could not determine fittest letter in resampling"),
            }
        }
        word
    }
}
