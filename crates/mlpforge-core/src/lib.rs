//! # MLPForge Core Library
//!
//! Perturbation sampling and quality control of atomic configurations for
//! machine-learned interatomic potential datasets.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Cell`,
//!   `AtomicConfiguration`, `ConfigurationBatch`), exact minimum-image
//!   geometry for triclinic cells, element radius tables and extended XYZ I/O.
//!
//! - **[`engine`]: The Logic Core.** Validated configuration, the structure
//!   validator, the random perturber, the individual quality-control checks,
//!   per-frame status tracking and reporting.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures built from the
//!   two layers below: perturbation sampling ([`workflows::sample`]), the
//!   quality-control filter ([`workflows::qc`]) and tolerant multi-file input
//!   collection ([`workflows::collect`]).
//!
//! ## Feature flags
//!
//! - `parallel` (default): evaluates per-frame quality-control checks with rayon.

pub mod core;
pub mod engine;
pub mod workflows;
