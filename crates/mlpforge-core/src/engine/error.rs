use super::config::ConfigError;
use crate::core::models::cell::GeometryError;
use crate::core::models::configuration::ShapeError;
use crate::core::radii::RadiusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed frame {frame}: {source}")]
    MalformedFrame {
        frame: usize,
        #[source]
        source: ShapeError,
    },

    #[error("Malformed structure: {0}")]
    MalformedStructure(#[from] ShapeError),

    #[error("Atom {atom}: no reference radius for element '{element}'")]
    UnknownElement { atom: usize, element: String },

    #[error("Reference radius table error: {0}")]
    Radius(#[from] RadiusError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Perturbation failed on attempt {attempt}: {message}")]
    Perturbation { attempt: usize, message: String },

    #[error("Frame {frame} is already rejected ({existing})")]
    AlreadyRejected { frame: usize, existing: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
