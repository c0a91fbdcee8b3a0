//! Core trait for simulated annealing.

/// A mutable configuration the annealer can explore.
///
/// The protocol is propose-then-commit: `mutate` prepares a candidate
/// change and `delta_energy` prices it without touching the current
/// configuration; `apply_mutation` commits the pending candidate. A new
/// `mutate` discards an uncommitted candidate.
///
/// # Minimization
///
/// The annealer minimizes `energy`. For maximization, negate it.
pub trait AnnealState {
    /// Energy of the current configuration. Lower is better.
    fn energy(&self) -> f64;

    /// Proposes a new candidate mutation, replacing any pending one.
    fn mutate(&mut self);

    /// Energy change the pending mutation would cause if committed.
    fn delta_energy(&self) -> f64;

    /// Commits the pending mutation into the configuration.
    fn apply_mutation(&mut self);
}
