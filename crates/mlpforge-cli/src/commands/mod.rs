pub mod qc;
pub mod sample;
