//! Dosel mass and volume reconstruction
//!
//! # Overview
//!
//! [VoxelizedMass] is the entry point. It is initialised once for a scene,
//! the name of the volume the dosel grid is attached to, and the dosel grid
//! itself. Every query after that is served from a per-dosel cache, computing
//! the dosel on first access.
//!
//! ```rust
//! # use doselmass::geometry::{MaterialDatabase, PhysicalVolume, Scene, Shape};
//! # use doselmass::grid::Grid;
//! # use doselmass::mass::{GeometryMode, VoxelizedMass};
//! let materials = MaterialDatabase::new().with("Water", 1.0);
//! let world = PhysicalVolume::new("world", "Water", Shape::cuboid([1.0, 1.0, 1.0]));
//! let scene = Scene::new(materials, world);
//!
//! let dosels = Grid::new([2, 2, 2], [1.0, 1.0, 1.0]);
//! let mut mass = VoxelizedMass::initialize(&scene, "world", dosels, None).unwrap();
//! mass.disable_progress();
//!
//! assert_eq!(mass.mode(), GeometryMode::Hierarchical);
//! assert_eq!(mass.voxel_mass(0).unwrap(), 1.0);
//! assert_eq!(mass.mass_vector().unwrap().iter().sum::<f64>(), 8.0);
//! ```
//!
//! # Details
//!
//! The geometry mode is decided once, from the structure of the attached
//! volume:
//!
//! | Mode                            | Attached volume                               | Breakdown |
//! | ------------------------------- | --------------------------------------------- | --------- |
//! | [GeometryMode::Parameterised]   | exactly one daughter, a regular voxel array   | none      |
//! | [GeometryMode::Hierarchical]    | anything else                                 | per name  |
//!
//! In the parameterised mode, dosel masses are weighted sums over the voxels
//! they overlap. In the hierarchical mode every volume of the tree is
//! intersected with the dosel, with daughters carved out of their mother
//! before recursing into them.
//!
//! An external mass image replaces both: its values are returned as they
//! are and no breakdown exists.

// Split into subfiles for development, but anything important is re-exported
mod dosel;
mod hierarchy;
mod parameterised;
mod table;
mod voxelized;

#[doc(inline)]
pub use crate::mass::dosel::DoselResult;

#[doc(inline)]
pub use crate::mass::hierarchy::HierarchicalReconstructor;

#[doc(inline)]
pub use crate::mass::parameterised::ParameterisedReconstructor;

#[doc(inline)]
pub use crate::mass::table::VoxelMassTable;

#[doc(inline)]
pub use crate::mass::voxelized::VoxelizedMass;

// internal modules
use crate::error::Result;

// external crates
use serde::{Deserialize, Serialize};

/// How dosel masses are reconstructed from the geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryMode {
    /// Weighted resampling of a regular voxel array
    Parameterised,
    /// Boolean solid operations over the volume tree
    Hierarchical,
}

impl std::fmt::Display for GeometryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Parameterised => write!(f, "parameterised"),
            Self::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

/// Mass and volume of one named sub-volume inside a dosel
#[derive(Debug, Clone, PartialEq)]
pub struct PartialContribution {
    /// Name of the sub-volume
    pub name: String,
    /// Cubic volume of the sub-volume's own region, daughters excluded
    pub cubic_volume: f64,
    /// Mass of that region
    pub mass: f64,
}

/// Result of reconstructing a single dosel
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// Total mass
    pub mass: f64,
    /// Total cubic volume
    pub cubic_volume: f64,
    /// Per sub-volume breakdown, in the order the volumes were completed
    pub partials: Vec<PartialContribution>,
}

/// Common interface of the two reconstruction strategies
pub trait Reconstructor: std::fmt::Debug {
    /// Strategy implemented
    fn mode(&self) -> GeometryMode;

    /// Number of voxels behind the reconstruction, if there is such a thing
    fn number_of_voxels(&self) -> Option<usize>;

    /// Mass, volume, and breakdown of dosel `index`
    fn reconstruct(&self, index: usize) -> Result<Reconstruction>;
}
