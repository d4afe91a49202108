//! Scene description consumed by the mass reconstruction
//!
//! # Overview
//!
//! A [Scene] is a material table plus a tree of [PhysicalVolume]s. Every
//! volume has a primitive [Shape], a [Placement] relative to its mother, a
//! material, and an ordered list of daughters. A volume may instead carry a
//! [VoxelArray], in which case it is a regular parameterised array of voxels
//! with one material label per voxel.
//!
//! Scenes are usually read from JSON, see
//! [read_scene()](crate::readers::read_scene).
//!
//! ```json
//! {
//!   "materials": { "G4_AIR": 0.0012, "G4_WATER": 1.0 },
//!   "world": {
//!     "name": "world",
//!     "material": "G4_AIR",
//!     "solid": { "type": "box", "half_lengths": [50.0, 50.0, 50.0] },
//!     "daughters": [
//!       {
//!         "name": "phantom",
//!         "material": "G4_WATER",
//!         "solid": { "type": "sphere", "radius": 10.0 },
//!         "placement": { "translation": [0.0, 0.0, 5.0] }
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! # Details
//!
//! The solid volume engine in [Solid] only knows enough geometry to answer
//! cubic volume and containment queries on boolean expressions of primitives.
//! It is not meant for rendering or tracking.
//!
//! | Shape  | Parameters                                    |
//! | ------ | --------------------------------------------- |
//! | box    | `half_lengths`                                |
//! | sphere | `radius`                                      |
//! | tube   | `inner_radius`, `outer_radius`, `half_length` |
//!
//! Volumes with overlapping daughters, or daughters protruding from their
//! mother, are not supported and will silently over count.

// Split into subfiles for development, but anything important is re-exported
mod material;
mod solid;

#[doc(inline)]
pub use crate::geometry::material::{MaterialDatabase, MaterialResolver};

#[doc(inline)]
pub use crate::geometry::solid::{Aabb, Shape, Solid, LATTICE_SAMPLES};

// internal modules
use crate::error::{Error, Result};
use crate::grid::Grid;

// external crates
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// Rigid placement of a volume inside its mother
///
/// Rotations are Euler angles in radians, applied as roll (x), pitch (y),
/// then yaw (z).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Translation of the volume origin in the mother frame
    #[serde(default)]
    pub translation: [f64; 3],
    /// Roll, pitch, and yaw in radians
    #[serde(default)]
    pub rotation: [f64; 3],
}

impl Placement {
    /// Pure translation
    pub fn translated(translation: [f64; 3]) -> Self {
        Self {
            translation,
            rotation: [0.0; 3],
        }
    }

    /// Rigid transform from the volume frame to the mother frame
    pub fn isometry(&self) -> Isometry3<f64> {
        let [x, y, z] = self.translation;
        let [roll, pitch, yaw] = self.rotation;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
    }
}

/// Regular voxel parameterisation of a volume
///
/// `labels` holds one entry per voxel, `x` varying fastest, and each label
/// is an index into `materials`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelArray {
    /// Number of voxels along x, y, and z
    pub resolution: [usize; 3],
    /// Size of a voxel along x, y, and z
    pub voxel_size: [f64; 3],
    /// Material label of every voxel
    pub labels: Vec<u16>,
    /// Material names, indexed by label
    pub materials: Vec<String>,
}

impl VoxelArray {
    /// Uniform array with every voxel made of the same material
    pub fn uniform(resolution: [usize; 3], voxel_size: [f64; 3], material: &str) -> Self {
        Self {
            resolution,
            voxel_size,
            labels: vec![0; resolution.iter().product()],
            materials: vec![material.to_string()],
        }
    }

    /// Total number of voxels declared by the resolution
    pub fn number_of_values(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Voxel grid of the array once placed in its mother
    pub fn grid(&self, placement: &Placement) -> Grid {
        Grid {
            resolution: self.resolution,
            voxel_size: self.voxel_size,
            transform: placement.isometry(),
        }
    }

    /// Material name of voxel `index`
    pub fn material_name(&self, index: usize) -> Result<&str> {
        let label = *self.labels.get(index).ok_or(Error::LabelCount {
            expected: self.number_of_values(),
            found: self.labels.len(),
        })?;

        self.materials
            .get(label as usize)
            .map(|name| name.as_str())
            .ok_or(Error::UnknownLabel {
                voxel: index,
                label,
            })
    }
}

/// Named volume placed in the geometry tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalVolume {
    /// Name, used as the key of the per-dosel breakdown
    pub name: String,
    /// Material name, ignored for parameterised volumes
    #[serde(default)]
    pub material: String,
    /// Primitive solid in the volume's own frame
    pub solid: Shape,
    /// Placement in the mother volume
    #[serde(default)]
    pub placement: Placement,
    /// Daughters in declaration order
    #[serde(default)]
    pub daughters: Vec<PhysicalVolume>,
    /// Optional regular voxel parameterisation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voxels: Option<VoxelArray>,
}

impl PhysicalVolume {
    /// Unplaced volume with no daughters
    pub fn new(name: &str, material: &str, solid: Shape) -> Self {
        Self {
            name: name.to_string(),
            material: material.to_string(),
            solid,
            placement: Placement::default(),
            daughters: Vec::new(),
            voxels: None,
        }
    }

    /// Voxelised volume, the container box follows from the array extent
    pub fn voxelised(name: &str, voxels: VoxelArray) -> Self {
        let half_lengths = [0, 1, 2].map(|i| voxels.resolution[i] as f64 * voxels.voxel_size[i] / 2.0);
        Self {
            voxels: Some(voxels),
            ..Self::new(name, "", Shape::cuboid(half_lengths))
        }
    }

    /// Set the placement
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Append a daughter
    pub fn with_daughter(mut self, daughter: PhysicalVolume) -> Self {
        self.daughters.push(daughter);
        self
    }

    /// Whether this is a regular voxel array rather than a plain solid
    pub fn is_parameterised(&self) -> bool {
        self.voxels.is_some()
    }

    /// Depth first search of this volume and its descendants
    pub fn find(&self, name: &str) -> Option<&PhysicalVolume> {
        if self.name == name {
            return Some(self);
        }
        self.daughters.iter().find_map(|d| d.find(name))
    }

    /// Number of volumes in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.daughters.iter().map(|d| d.count()).sum::<usize>()
    }
}

/// Materials and the volume tree they are used in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Material name to density
    #[serde(default)]
    pub materials: MaterialDatabase,
    /// Top of the volume tree
    pub world: PhysicalVolume,
}

impl Scene {
    /// New scene from its parts
    pub fn new(materials: MaterialDatabase, world: PhysicalVolume) -> Self {
        Self { materials, world }
    }

    /// Find a volume anywhere in the tree by name
    pub fn find_volume(&self, name: &str) -> Result<&PhysicalVolume> {
        self.world
            .find(name)
            .ok_or_else(|| Error::VolumeNotFound(name.to_string()))
    }
}
