//! Regular grids and the mapping between dosels and voxels
//!
//! # Overview
//!
//! A [Grid] describes a regular 3D array of cells: the number of cells on each
//! axis, the size of a cell, and a rigid transform placing the centre of the
//! grid in its parent frame. The same type is used for both grids involved in
//! a reconstruction:
//!
//! - the *dosel grid*, coarse, over which mass and dose are aggregated
//! - the *voxel grid*, fine, describing the material distribution
//!
//! Cells are ordered with `x` varying fastest, then `y`, then `z`, so a flat
//! index is `i + nx * (j + ny * k)`.
//!
//! ```rust
//! # use doselmass::grid::Grid;
//! let grid = Grid::new([2, 2, 2], [1.0, 1.0, 1.0]);
//! assert_eq!(grid.number_of_values(), 8);
//! assert_eq!(grid.index_to_ijk(5), [1, 0, 1]);
//! assert_eq!(grid.voxel_centre(0).coords.as_slice(), &[-0.5, -0.5, -0.5]);
//! ```
//!
//! The [GridMapper] converts a dosel into fractional bounds in voxel index
//! space, and [OverlapWeights] turns those bounds into per-voxel contribution
//! weights.

// Split into subfiles for development, but anything important is re-exported
mod mapper;
mod overlap;

#[doc(inline)]
pub use crate::grid::mapper::{DoselBounds, GridMapper};

#[doc(inline)]
pub use crate::grid::overlap::{axis_weights, OverlapWeights, ALIGNMENT_TOLERANCE};

// internal modules
use crate::utils::*;

// external crates
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};

/// Abstract 3D array descriptor
///
/// The transform places the *centre* of the grid in the parent frame, which
/// is the frame of the volume the grid is attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Number of cells along x, y, and z
    pub resolution: [usize; 3],
    /// Cell size along x, y, and z
    pub voxel_size: [f64; 3],
    /// Pose of the grid centre in the parent frame
    pub transform: Isometry3<f64>,
}

impl Grid {
    /// New grid centred on the parent origin with no rotation
    pub fn new(resolution: [usize; 3], voxel_size: [f64; 3]) -> Self {
        Self {
            resolution,
            voxel_size,
            transform: Isometry3::identity(),
        }
    }

    /// Move the centre of the grid
    pub fn with_translation(mut self, translation: [f64; 3]) -> Self {
        self.transform.translation =
            Translation3::new(translation[0], translation[1], translation[2]);
        self
    }

    /// Rotate the grid about its centre
    pub fn with_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.transform.rotation = rotation;
        self
    }

    /// Total number of cells
    pub fn number_of_values(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Cubic volume of a single cell
    pub fn voxel_volume(&self) -> f64 {
        product(&self.voxel_size)
    }

    /// Half of the full grid extent on every axis
    pub fn half_extent(&self) -> [f64; 3] {
        [0, 1, 2].map(|axis| self.resolution[axis] as f64 * self.voxel_size[axis] / 2.0)
    }

    /// Half of a single cell on every axis
    pub fn half_voxel(&self) -> [f64; 3] {
        self.voxel_size.map(|size| size / 2.0)
    }

    /// Whether the grid is rotated at all relative to its parent
    pub fn is_rotated(&self) -> bool {
        self.transform.rotation.angle() > 1e-12
    }

    /// Split a flat index into (i, j, k) cell coordinates
    pub fn index_to_ijk(&self, index: usize) -> [usize; 3] {
        let [nx, ny, _] = self.resolution;
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    /// Flatten (i, j, k) cell coordinates into an index
    pub fn ijk_to_index(&self, ijk: [usize; 3]) -> usize {
        let [nx, ny, _] = self.resolution;
        ijk[0] + nx * (ijk[1] + ny * ijk[2])
    }

    /// Centre of a cell in the grid's own frame
    pub fn local_voxel_centre(&self, index: usize) -> Point3<f64> {
        let ijk = self.index_to_ijk(index);
        let half = self.half_extent();
        let c = [0, 1, 2]
            .map(|axis| (ijk[axis] as f64 + 0.5) * self.voxel_size[axis] - half[axis]);
        Point3::new(c[0], c[1], c[2])
    }

    /// Centre of a cell in the parent frame
    pub fn voxel_centre(&self, index: usize) -> Point3<f64> {
        self.transform
            .transform_point(&self.local_voxel_centre(index))
    }

    /// Full pose of a cell in the parent frame, sharing the grid rotation
    pub fn voxel_pose(&self, index: usize) -> Isometry3<f64> {
        let centre = self.voxel_centre(index);
        Isometry3::from_parts(Translation3::from(centre.coords), self.transform.rotation)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new([1, 1, 1], [1.0, 1.0, 1.0])
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let t = &self.transform.translation.vector;
        write!(
            f,
            "{}x{}x{} cells of {} x {} x {} centred on ({}, {}, {})",
            self.resolution[0],
            self.resolution[1],
            self.resolution[2],
            self.voxel_size[0].sci(3, 2),
            self.voxel_size[1].sci(3, 2),
            self.voxel_size[2].sci(3, 2),
            t[0].sci(3, 2),
            t[1].sci(3, 2),
            t[2].sci(3, 2),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, [0, 0, 0])]
    #[case(1, [1, 0, 0])]
    #[case(3, [0, 1, 0])]
    #[case(12, [0, 0, 1])]
    #[case(23, [2, 3, 1])]
    fn index_round_trip(#[case] index: usize, #[case] ijk: [usize; 3]) {
        let grid = Grid::new([3, 4, 2], [1.0, 1.0, 1.0]);
        assert_eq!(grid.index_to_ijk(index), ijk);
        assert_eq!(grid.ijk_to_index(ijk), index);
    }

    #[test]
    fn centres_follow_translation() {
        let grid = Grid::new([2, 1, 1], [2.0, 1.0, 1.0]).with_translation([10.0, 0.0, -1.0]);
        assert_eq!(grid.voxel_centre(0), Point3::new(9.0, 0.0, -1.0));
        assert_eq!(grid.voxel_centre(1), Point3::new(11.0, 0.0, -1.0));
        assert_eq!(grid.half_extent(), [2.0, 0.5, 0.5]);
        assert!(!grid.is_rotated());
    }

    #[test]
    fn voxel_volume() {
        let grid = Grid::new([4, 4, 4], [2.0, 0.5, 3.0]);
        assert_eq!(grid.voxel_volume(), 3.0);
        assert_eq!(grid.number_of_values(), 64);
    }
}
