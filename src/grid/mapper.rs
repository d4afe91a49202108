//! Mapping of dosels onto fractional voxel coordinates

// internal modules
use crate::error::{Error, Result};
use crate::grid::Grid;

// external crates
use log::{trace, warn};

/// Fractional bounds of a dosel in voxel index space
///
/// Each axis covers `[min, max)` in units of voxel cells, where `0.0` is the
/// lower face of the first voxel. Built fresh for every query and never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoselBounds {
    /// Lower bound on each axis
    pub min: [f64; 3],
    /// Upper bound on each axis
    pub max: [f64; 3],
}

impl DoselBounds {
    /// Covered extent along one axis, in voxels
    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }
}

/// Converts dosel indices into fractional voxel coordinates
///
/// Both grids are expressed in the same parent frame. Only translations are
/// supported between them, so a rotated grid is rejected up front.
///
/// ```rust
/// # use doselmass::grid::{Grid, GridMapper};
/// let dosels = Grid::new([2, 1, 1], [2.0, 4.0, 4.0]);
/// let voxels = Grid::new([4, 4, 4], [1.0, 1.0, 1.0]);
/// let mapper = GridMapper::new(dosels, voxels).unwrap();
///
/// let bounds = mapper.bounds(1);
/// assert_eq!(bounds.min, [2.0, 0.0, 0.0]);
/// assert_eq!(bounds.max, [4.0, 4.0, 4.0]);
/// ```
#[derive(Debug, Clone)]
pub struct GridMapper {
    dosel_grid: Grid,
    voxel_grid: Grid,
}

impl GridMapper {
    /// Set up the mapping, rejecting rotated grids
    pub fn new(dosel_grid: Grid, voxel_grid: Grid) -> Result<Self> {
        if dosel_grid.is_rotated() {
            return Err(Error::NonAxisAligned("the dosel grid".to_string()));
        }
        if voxel_grid.is_rotated() {
            return Err(Error::NonAxisAligned("the voxel grid".to_string()));
        }

        let dosel_extent = dosel_grid.half_extent();
        let voxel_extent = voxel_grid.half_extent();
        for axis in 0..3 {
            if (dosel_extent[axis] - voxel_extent[axis]).abs() > 1e-6 {
                warn!(
                    "Dosel and voxel grids differ in extent on axis {axis} ({} vs {})",
                    2.0 * dosel_extent[axis],
                    2.0 * voxel_extent[axis]
                );
            }
        }

        Ok(Self {
            dosel_grid,
            voxel_grid,
        })
    }

    /// The coarse output grid
    pub fn dosel_grid(&self) -> &Grid {
        &self.dosel_grid
    }

    /// The fine geometry grid
    pub fn voxel_grid(&self) -> &Grid {
        &self.voxel_grid
    }

    /// Fractional `[min, max)` voxel coordinates covered by a dosel
    pub fn bounds(&self, index: usize) -> DoselBounds {
        let centre = self.dosel_grid.voxel_centre(index);
        let offset = self.voxel_grid.transform.translation.vector;
        let voxel_half = self.voxel_grid.half_extent();
        let dosel_half = self.dosel_grid.half_voxel();
        let size = self.voxel_grid.voxel_size;

        let mut bounds = DoselBounds {
            min: [0.0; 3],
            max: [0.0; 3],
        };

        for axis in 0..3 {
            let relative = centre[axis] - offset[axis];
            bounds.min[axis] = (voxel_half[axis] + relative - dosel_half[axis]) / size[axis];
            bounds.max[axis] = (voxel_half[axis] + relative + dosel_half[axis]) / size[axis];
        }

        trace!("Dosel {index} bounds {:?} -> {:?}", bounds.min, bounds.max);
        bounds
    }
}
