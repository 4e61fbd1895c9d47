//! Numerical helpers shared by the validator and the quality-control tasks.

pub mod geometry;
pub mod statistics;
