//! Provides input/output functionality for multi-frame structure files.
//!
//! The [`traits::ConfigurationFile`] trait is the common interface; [`extxyz`]
//! implements the extended XYZ format used to hand frames to and from the
//! simulation and training stages of the pipeline.

pub mod extxyz;
pub mod traits;
