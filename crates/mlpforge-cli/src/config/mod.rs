mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_qc_config, build_sample_config};
