//! # Engine Module
//!
//! The decision-making layer: everything that judges, perturbs or records
//! frames lives here, while file handling stays in [`crate::core::io`] and
//! end-to-end orchestration in [`crate::workflows`].
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - validated sampler and quality-control parameters
//! - **Structure Validation** ([`validator`]) - radius-scaled minimum-distance acceptance test
//! - **Perturbation** ([`perturbation`]) - random cell strain and atomic displacement
//! - **Quality-Control Checks** ([`tasks`]) - overlap, force bound and energy outlier checks
//! - **State Tracking** ([`state`]) - per-frame status, rejection log and run outcome
//! - **Reporting** ([`report`]) - summary counts and retained-frame statistics
//! - **Progress Monitoring** ([`progress`]) - callback-based progress events
//! - **Error Handling** ([`error`]) - engine-level error type
//!
//! Rejected frames and an exhausted sampler are ordinary results, not errors.
//! An [`error::EngineError`] always means malformed input or a broken invariant.

pub mod config;
pub mod error;
pub mod perturbation;
pub mod progress;
pub mod report;
pub mod state;
pub mod tasks;
pub mod validator;
