//! # The Doselmass crate
//!
//! Mass and volume of every cell of a dose grid overlaid on a geometry
//!
//! ## Overview
//!
//! Dose is energy per unit mass, so scoring dose on a regular grid of
//! *dosels* needs the mass of material inside each of them. When the dosels
//! do not line up with the geometry this is not trivial, and this crate
//! reconstructs those masses from the geometry itself.
//!
//! Two kinds of geometry are supported:
//!
//! | Geometry                     | Method                                        |
//! | ---------------------------- | --------------------------------------------- |
//! | Regular voxel array          | Overlap weighted sums of voxel masses         |
//! | Nested tree of solid volumes | Boolean intersection and subtraction of solids |
//!
//! The voxel path also works when dosels are larger than voxels and not
//! aligned with them, splitting boundary voxels by the fraction of them
//! covered. The tree path additionally keeps the volume and mass of every
//! named sub-volume inside a dosel, so that energy deposited in a specific
//! volume can be turned into a dose.
//!
//! ## Command line
//!
//! | Command line | Description                                            |
//! | ------------ | ------------------------------------------------------ |
//! | `doselmass`  | Compute the dosel masses of a scene and write an image |
//!
//! The tool is fully documented with a detailed `--help` message.
//!
//! ## Library use
//!
//! ```rust
//! use doselmass::geometry::{MaterialDatabase, PhysicalVolume, Scene, Shape};
//! use doselmass::grid::Grid;
//! use doselmass::VoxelizedMass;
//!
//! // a 4x4x4 water cube in air
//! let materials = MaterialDatabase::new()
//!     .with("Air", 0.0)
//!     .with("Water", 1.0);
//!
//! let world = PhysicalVolume::new("world", "Air", Shape::cuboid([4.0, 4.0, 4.0]))
//!     .with_daughter(PhysicalVolume::new("cube", "Water", Shape::cuboid([2.0, 2.0, 2.0])));
//!
//! let scene = Scene::new(materials, world);
//!
//! // one big dosel covering the whole world
//! let dosels = Grid::new([1, 1, 1], [8.0, 8.0, 8.0]);
//! let mut mass = VoxelizedMass::initialize(&scene, "world", dosels, None).unwrap();
//!
//! assert_eq!(mass.voxel_mass(0).unwrap(), 64.0);
//! assert_eq!(mass.partial_volume(0, "world").unwrap(), 512.0 - 64.0);
//! ```
//!
//! As an overview:
//! - The [mass] module holds the reconstruction itself and the per-dosel
//! cache, [VoxelizedMass] being the entry point.
//! - The [grid] module describes regular grids and the overlap of dosels
//! with voxels.
//! - The [geometry] module is the scene description, with solids, volumes,
//! materials, and voxel arrays.
//! - The [image] module stores per-cell values, used for external mass
//! images and outputs.
//!
//! In the background, `nalgebra` handles the rigid transforms, `nom` parses
//! MetaImage headers, `serde` reads scene descriptions, and `kdam` reports
//! progress over large grids.
//!
//! All of the useful functionality from the file readers and core data
//! structures are re-exported for convenience.

// Public facing modules
pub mod error;
pub mod geometry;
pub mod grid;
pub mod image;
pub mod mass;
pub mod readers;
pub mod utils;

// Re-exports of useful data structures
#[doc(inline)]
pub use crate::error::{Error, Result};

#[doc(inline)]
pub use crate::mass::{GeometryMode, VoxelizedMass};

#[doc(inline)]
pub use crate::readers::{read_mass_image, read_scene};
