//! # Workflows Module
//!
//! Top-level entry points. Each workflow validates its input, reports
//! progress through a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and returns a typed outcome.
//!
//! - **Sampling** ([`sample`]) - bounded rejection sampling of perturbed structures
//! - **Quality Control** ([`qc`]) - ordered overlap, force and energy checks over a batch
//! - **Collection** ([`collect`]) - reads many input files, skipping unreadable ones

pub mod collect;
pub mod qc;
pub mod sample;
