//! Deterministic automata and random word sampling.
//!
//! A [`Dfa`] is built from a [`crate::regex::Regex`] by iterated
//! Brzozowski derivatives: every distinct derivative becomes a state,
//! every letter producing a non-empty derivative a transition. States are
//! keyed on structural regex identity, so expressions the smart
//! constructors identify collapse and the automaton is minimal up to the
//! implemented simplification laws.
//!
//! A [`Sampler`] walks random paths through a `Dfa` to generate accepted
//! words, and can re-walk the recorded path either with fresh random
//! letters or guided by a fitness oracle.
//!
//! Samplers carry their own generator and path trace and are not safe for
//! concurrent use; the automaton itself is immutable and shareable.

mod automaton;
mod sampler;

pub use automaton::Dfa;
pub use sampler::Sampler;
