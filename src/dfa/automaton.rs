//! DFA construction from regex derivatives.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;
use std::hash::Hash;

use crate::regex::Regex;

pub(crate) type StateId = usize;
pub(crate) type LetterId = usize;

/// A deterministic finite automaton over letters of type `L`.
///
/// State ids start at 1 (the initial state). Transitions are kept in two
/// redundant views: `(state, letter) → state` for matching and
/// `state → successors` plus per-edge letter buckets for sampling. The
/// buckets group the letters labeling one edge by an equi-probable
/// partition, so a sampler first picks a bucket uniformly and then a
/// letter uniformly within it.
pub struct Dfa<L> {
    pub(crate) alphabet: Vec<L>,
    alphabet_map: HashMap<L, LetterId>,
    pub(crate) finals: BTreeSet<StateId>,
    trans_state: BTreeMap<(StateId, LetterId), StateId>,
    pub(crate) state_states: BTreeMap<StateId, Vec<StateId>>,
    pub(crate) trans_letters: BTreeMap<(StateId, StateId), Vec<Vec<LetterId>>>,
}

impl<L: Clone + Eq + Ord + Hash> Dfa<L> {
    /// Builds the automaton of `regex` with all letters in one bucket.
    pub fn new(regex: &Regex<L>) -> Self {
        Self::with_partition(regex, |_| 1)
    }

    /// Builds the automaton of `regex`, grouping the letters of each
    /// transition into equi-probable buckets according to `epp`.
    pub fn with_partition<F>(regex: &Regex<L>, epp: F) -> Self
    where
        F: Fn(&L) -> u32,
    {
        let alphabet: Vec<L> = regex.alphabet().into_iter().collect();
        let alphabet_map: HashMap<L, LetterId> = alphabet
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();

        let mut dfa = Dfa {
            alphabet,
            alphabet_map,
            finals: BTreeSet::new(),
            trans_state: BTreeMap::new(),
            state_states: BTreeMap::new(),
            trans_letters: BTreeMap::new(),
        };

        // Derivative expansion keyed on structural regex identity.
        let mut states: HashMap<Regex<L>, StateId> = HashMap::new();
        states.insert(regex.clone(), 1);
        if regex.nullable() {
            dfa.finals.insert(1);
        }
        dfa.expand(regex, 1, &mut states);

        // Sampling views: successor lists (one entry per transition) and
        // letter buckets per edge, indexed by ((q0, q1), bucket id).
        let mut bucket_idx: BTreeMap<((StateId, StateId), u32), usize> = BTreeMap::new();
        for (&(q0, l_idx), &q1) in &dfa.trans_state {
            let bucket = epp(&dfa.alphabet[l_idx]);
            dfa.state_states.entry(q0).or_default().push(q1);

            let edge = (q0, q1);
            match dfa.trans_letters.entry(edge) {
                Entry::Vacant(vacant) => {
                    vacant.insert(vec![vec![l_idx]]);
                    bucket_idx.insert((edge, bucket), 0);
                }
                Entry::Occupied(mut occupied) => {
                    let buckets = occupied.get_mut();
                    match bucket_idx.get(&(edge, bucket)).copied() {
                        None => {
                            buckets.push(vec![l_idx]);
                            bucket_idx.insert((edge, bucket), buckets.len() - 1);
                        }
                        Some(i) => buckets[i].push(l_idx),
                    }
                }
            }
        }

        // Deterministic letter order within each bucket.
        let alphabet = &dfa.alphabet;
        for buckets in dfa.trans_letters.values_mut() {
            for bucket in buckets.iter_mut() {
                bucket.sort_by(|&a, &b| alphabet[a].cmp(&alphabet[b]));
            }
        }

        dfa
    }

    fn expand(&mut self, q0: &Regex<L>, q0_idx: StateId, states: &mut HashMap<Regex<L>, StateId>) {
        for l_idx in 0..self.alphabet.len() {
            let l = self.alphabet[l_idx].clone();
            let q1 = q0.derivative(&l);
            if q1 == Regex::zero() {
                continue;
            }
            match states.get(&q1) {
                Some(&q1_idx) => {
                    if q1.nullable() {
                        self.finals.insert(q1_idx);
                    }
                    self.trans_state.insert((q0_idx, l_idx), q1_idx);
                }
                None => {
                    let q1_idx = states.len() + 1;
                    states.insert(q1.clone(), q1_idx);
                    if q1.nullable() {
                        self.finals.insert(q1_idx);
                    }
                    self.trans_state.insert((q0_idx, l_idx), q1_idx);
                    self.expand(&q1, q1_idx, states);
                }
            }
        }
    }

    /// Whether `w` is accepted, following transitions from state 1.
    /// Unknown letters and missing transitions reject.
    pub fn matches(&self, w: &[L]) -> bool {
        let mut state: StateId = 1;
        for l in w {
            let Some(&l_idx) = self.alphabet_map.get(l) else {
                return false;
            };
            let Some(&next) = self.trans_state.get(&(state, l_idx)) else {
                return false;
            };
            state = next;
        }
        self.finals.contains(&state)
    }

    /// Number of states.
    pub fn states(&self) -> usize {
        let mut ids: BTreeSet<StateId> = BTreeSet::new();
        ids.insert(1);
        for (&(q0, _), &q1) in &self.trans_state {
            ids.insert(q0);
            ids.insert(q1);
        }
        ids.len()
    }

    /// The automaton's alphabet in index order.
    pub fn alphabet(&self) -> &[L] {
        &self.alphabet
    }
}

impl<L: std::fmt::Display> Dfa<L> {
    /// Renders the automaton in Graphviz dot format. Accepting states are
    /// double circles; multi-bucket edges are summarized with their size.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str("digraph FSM {\n");
        out.push_str("  rankdir = LR;\n");
        out.push_str("  node [shape = plain];\n");
        out.push_str("  start;\n");
        out.push_str("  node [shape = doublecircle];\n");
        for q in &self.finals {
            let _ = writeln!(out, "  {q};");
        }
        out.push_str("  node [shape = circle];\n");
        out.push_str("  start -> 1;\n");
        for (&(q0, q1), buckets) in &self.trans_letters {
            if buckets.len() == 1 {
                for &l_idx in &buckets[0] {
                    let _ = writeln!(
                        out,
                        "  {q0} -> {q1} [label=\"{}\"];",
                        self.alphabet[l_idx]
                    );
                }
            } else {
                for bucket in buckets {
                    let _ = writeln!(
                        out,
                        "  {q0} -> {q1} [label=\"{}... ({})\"];",
                        self.alphabet[bucket[0]],
                        bucket.len()
                    );
                }
            }
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(c: char) -> Regex<char> {
        Regex::lit(c)
    }

    #[test]
    fn test_match_single_word() {
        let dfa = Dfa::new(&Regex::word(&['a', 'b']));
        assert!(dfa.matches(&['a', 'b']));
        assert!(!dfa.matches(&['a']));
        assert!(!dfa.matches(&['b', 'a']));
        assert!(!dfa.matches(&[]));
    }

    #[test]
    fn test_match_star_of_sum() {
        let r = Regex::sum(&lit('a'), &lit('b')).kstar();
        let dfa = Dfa::new(&r);
        assert!(dfa.matches(&['a', 'b', 'a', 'a', 'b']));
        assert!(dfa.matches(&[]));
        assert!(!dfa.matches(&['a', 'c']));
    }

    #[test]
    fn test_unknown_letter_rejects() {
        let dfa = Dfa::new(&lit('a'));
        assert!(!dfa.matches(&['z']));
    }

    #[test]
    fn test_nullable_root_is_accepting() {
        let dfa = Dfa::new(&lit('a').kstar());
        assert!(dfa.finals.contains(&1));
        assert!(dfa.matches(&[]));
    }

    #[test]
    fn test_derivative_states_collapse() {
        // (a+b)* has a single state looping on both letters
        let r = Regex::sum(&lit('a'), &lit('b')).kstar();
        let dfa = Dfa::new(&r);
        assert_eq!(dfa.states(), 1);
    }

    #[test]
    fn test_word_regex_is_a_chain() {
        let dfa = Dfa::new(&Regex::word(&['a', 'b', 'c']));
        assert_eq!(dfa.states(), 4);
        assert_eq!(dfa.finals.len(), 1);
    }

    #[test]
    fn test_partition_buckets() {
        // Letters split into vowels (bucket 1) and consonants (bucket 2)
        let r = Regex::any_of(&['a', 'e', 'x', 'y']);
        let dfa = Dfa::with_partition(&r, |c| if "ae".contains(*c) { 1 } else { 2 });
        let buckets = dfa
            .trans_letters
            .values()
            .next()
            .expect("one edge expected");
        assert_eq!(buckets.len(), 2);
        let sizes: Vec<usize> = buckets.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2]);
    }

    #[test]
    fn test_successor_list_has_one_entry_per_transition() {
        // Both letters lead to the same successor: two list entries.
        let r = Regex::concat(&Regex::any_of(&['a', 'b']), &lit('c'));
        let dfa = Dfa::new(&r);
        assert_eq!(dfa.state_states[&1].len(), 2);
    }

    #[test]
    fn test_to_dot_shape() {
        let dfa = Dfa::new(&Regex::word(&['a', 'b']));
        let dot = dfa.to_dot();
        assert!(dot.starts_with("digraph FSM {"));
        assert!(dot.contains("start -> 1;"));
        assert!(dot.contains("doublecircle"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
