//! Symbolic regular expressions over a generic letter type.
//!
//! Expressions are immutable DAGs built exclusively through smart
//! constructors that keep every value in normal form: identities for
//! `∅`/`ε` are removed, nested sums/products/intersections are flattened,
//! duplicate summands are collapsed, and the Kleene star absorbs itself.
//! Equality and hashing are structural, with sum and intersection treated
//! as unordered sets.
//!
//! The algebra supports the Brzozowski derivative, from which matching
//! falls out directly and on which the [`crate::dfa`] builder is based.
//!
//! # References
//!
//! - Brzozowski (1964), "Derivatives of Regular Expressions"
//! - Owens, Reppy & Turon (2009), "Regular-expression derivatives re-examined"

mod expr;

pub use expr::Regex;
