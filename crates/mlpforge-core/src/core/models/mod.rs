//! Data models for periodic atomic configurations.
//!
//! - [`cell`] holds the periodic lattice and coordinate conversions.
//! - [`configuration`] holds single frames, labeled or not.
//! - [`batch`] holds ordered collections of labeled frames.

pub mod batch;
pub mod cell;
pub mod configuration;
