//! Crate error type.

use thiserror::Error;

/// Errors surfaced by the planning core.
///
/// Input-validation failures are returned to the caller of the offending
/// operation. Internal invariant violations (a non-accepting automaton
/// state with no outgoing edges reached during sampling) are unrecoverable
/// and abort via panic; [`Error::Invariant`] exists so host-language
/// wrappers can translate such aborts at the boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied value is out of contract (annealer bounds,
    /// unknown agent code, week index out of range, malformed time span,
    /// bad slot length, insufficient target points, excessive offset).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A letter was requested from a non-literal expression.
    #[error("cannot extract letter from non-literal expression")]
    InvalidShape,

    /// An internal invariant does not hold. Fatal.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// The operation is recognized but not implemented (regex complement,
    /// intersection automata). Callers must not rely on it.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
