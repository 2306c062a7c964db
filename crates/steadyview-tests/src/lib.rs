//! Integration test crate for SteadyView.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every steadyview crate to verify they work together.

pub mod fixtures;

#[cfg(test)]
mod estimator;


#[cfg(test)]
mod warp;
