//! Material density lookup

// standard library
use std::collections::BTreeMap;

// internal modules
use crate::error::{Error, Result};

// external crates
use serde::{Deserialize, Serialize};

/// Anything able to turn a material name into a density
pub trait MaterialResolver {
    /// Density of the named material, in the caller's mass/volume units
    fn density(&self, name: &str) -> Result<f64>;
}

/// Simple name to density table
///
/// Serialises as a plain JSON object of `"name": density` pairs.
///
/// ```rust
/// # use doselmass::geometry::{MaterialDatabase, MaterialResolver};
/// let materials = MaterialDatabase::new()
///     .with("G4_WATER", 1.0)
///     .with("G4_BONE_COMPACT_ICRU", 1.85);
///
/// assert_eq!(materials.density("G4_WATER").unwrap(), 1.0);
/// assert!(materials.density("Unobtainium").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialDatabase {
    densities: BTreeMap<String, f64>,
}

impl MaterialDatabase {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Add or replace a material
    pub fn insert(&mut self, name: &str, density: f64) {
        self.densities.insert(name.to_string(), density);
    }

    /// Builder flavour of [MaterialDatabase::insert]
    pub fn with(mut self, name: &str, density: f64) -> Self {
        self.insert(name, density);
        self
    }

    /// Number of known materials
    pub fn len(&self) -> usize {
        self.densities.len()
    }

    /// True if no material is known
    pub fn is_empty(&self) -> bool {
        self.densities.is_empty()
    }
}

impl MaterialResolver for MaterialDatabase {
    fn density(&self, name: &str) -> Result<f64> {
        self.densities
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownMaterial(name.to_string()))
    }
}
