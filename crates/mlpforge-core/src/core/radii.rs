use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Single-bond covalent radii in Angstrom (Cordero et al., Dalton Trans. 2008).
///
/// Carbon uses the sp3 value and the high-spin values are used for Mn, Fe and Co.
static COVALENT_RADII: Map<&'static str, f64> = phf_map! {
    "H" => 0.31, "He" => 0.28,
    "Li" => 1.28, "Be" => 0.96, "B" => 0.84, "C" => 0.76, "N" => 0.71, "O" => 0.66,
    "F" => 0.57, "Ne" => 0.58,
    "Na" => 1.66, "Mg" => 1.41, "Al" => 1.21, "Si" => 1.11, "P" => 1.07, "S" => 1.05,
    "Cl" => 1.02, "Ar" => 1.06,
    "K" => 2.03, "Ca" => 1.76, "Sc" => 1.70, "Ti" => 1.60, "V" => 1.53, "Cr" => 1.39,
    "Mn" => 1.61, "Fe" => 1.52, "Co" => 1.50, "Ni" => 1.24, "Cu" => 1.32, "Zn" => 1.22,
    "Ga" => 1.22, "Ge" => 1.20, "As" => 1.19, "Se" => 1.20, "Br" => 1.20, "Kr" => 1.16,
    "Rb" => 2.20, "Sr" => 1.95, "Y" => 1.90, "Zr" => 1.75, "Nb" => 1.64, "Mo" => 1.54,
    "Tc" => 1.47, "Ru" => 1.46, "Rh" => 1.42, "Pd" => 1.39, "Ag" => 1.45, "Cd" => 1.44,
    "In" => 1.42, "Sn" => 1.39, "Sb" => 1.39, "Te" => 1.38, "I" => 1.39, "Xe" => 1.40,
    "Cs" => 2.44, "Ba" => 2.15, "La" => 2.07, "Ce" => 2.04, "Pr" => 2.03, "Nd" => 2.01,
    "Pm" => 1.99, "Sm" => 1.98, "Eu" => 1.98, "Gd" => 1.96, "Tb" => 1.94, "Dy" => 1.92,
    "Ho" => 1.92, "Er" => 1.89, "Tm" => 1.90, "Yb" => 1.87, "Lu" => 1.87, "Hf" => 1.75,
    "Ta" => 1.70, "W" => 1.62, "Re" => 1.51, "Os" => 1.44, "Ir" => 1.41, "Pt" => 1.36,
    "Au" => 1.36, "Hg" => 1.32, "Tl" => 1.45, "Pb" => 1.46, "Bi" => 1.48, "Po" => 1.40,
    "At" => 1.50, "Rn" => 1.50,
};

#[derive(Debug, Error)]
pub enum RadiusError {
    #[error("No reference radius for element '{0}'")]
    UnknownElement(String),
    #[error("Reference radius for element '{element}' must be positive and finite, got {radius}")]
    InvalidRadius { element: String, radius: f64 },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RadiusFile {
    radii: HashMap<String, f64>,
}

/// Reference atomic radii keyed by element symbol.
///
/// Lookups never fall back to a default value: an element missing from the
/// table is an error, since a silent guess would corrupt every overlap
/// threshold derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusTable {
    radii: HashMap<String, f64>,
}

impl RadiusTable {
    pub fn covalent() -> Self {
        let radii = COVALENT_RADII
            .entries()
            .map(|(symbol, radius)| (symbol.to_string(), *radius))
            .collect();
        Self { radii }
    }

    pub fn from_map(radii: HashMap<String, f64>) -> Result<Self, RadiusError> {
        for (element, &radius) in &radii {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(RadiusError::InvalidRadius {
                    element: element.clone(),
                    radius,
                });
            }
        }
        Ok(Self { radii })
    }

    /// Loads a `[radii]` table from TOML, e.g. `[radii]\nCa = 1.76`.
    pub fn load(path: &Path) -> Result<Self, RadiusError> {
        let content = std::fs::read_to_string(path).map_err(|e| RadiusError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: RadiusFile = toml::from_str(&content).map_err(|e| RadiusError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_map(file.radii)
    }

    /// Returns a copy of `self` with entries from `overrides` replacing or extending it.
    pub fn with_overrides(&self, overrides: &HashMap<String, f64>) -> Result<Self, RadiusError> {
        let mut radii = self.radii.clone();
        radii.extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        Self::from_map(radii)
    }

    pub fn radius(&self, element: &str) -> Result<f64, RadiusError> {
        self.radii
            .get(element)
            .copied()
            .ok_or_else(|| RadiusError::UnknownElement(element.to_string()))
    }

    pub fn contains(&self, element: &str) -> bool {
        self.radii.contains_key(element)
    }

    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }
}

impl Default for RadiusTable {
    fn default() -> Self {
        Self::covalent()
    }
}
