//! Simulated annealing with automatic temperature calibration.
//!
//! The driver is parametric over an [`AnnealState`]: a mutable
//! configuration exposing its energy, a mutation proposal, the energy
//! delta of the pending proposal, and a commit. The annealer runs the
//! Metropolis acceptance loop over a geometric temperature schedule and
//! can calibrate the initial temperature (doubling until the acceptance
//! ratio is high enough) and the final temperature (the smallest observed
//! non-zero energy delta).
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Aarts & Korst (1989), *Simulated Annealing and Boltzmann Machines*

mod config;
mod runner;
mod types;

pub use config::AnnealConfig;
pub use runner::Annealer;
pub use types::AnnealState;
