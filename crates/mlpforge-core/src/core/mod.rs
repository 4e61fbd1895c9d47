//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Data models** ([`models`]) - periodic cells, frames and batches of labeled frames
//! - **Geometry** ([`utils::geometry`]) - exact minimum-image distances in triclinic cells
//! - **Reference radii** ([`radii`]) - per-element radius tables used by overlap tests
//! - **File I/O** ([`io`]) - extended XYZ reading and writing
//!
//! Nothing in this module keeps state between calls; every function is a
//! deterministic function of its arguments.

pub mod io;
pub mod models;
pub mod radii;
pub mod utils;
