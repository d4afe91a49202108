//! Dense per-voxel mass lookup

// internal modules
use crate::error::{Error, Result};
use crate::geometry::{MaterialResolver, VoxelArray};
use crate::grid::Grid;

// external crates
use log::{debug, trace};

/// Mass of every voxel of a parameterised volume
///
/// Built once from the voxel labels and a material resolver, then only ever
/// read. Values are `density * voxel volume` and are guaranteed to be
/// strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelMassTable {
    resolution: [usize; 3],
    voxel_volume: f64,
    masses: Vec<f64>,
}

impl VoxelMassTable {
    /// Build the table for a voxel array placed as `voxel_grid`
    ///
    /// `container` is the half extent of the volume the dosel grid is
    /// attached to. It fixes how many dosels the container could hold, which
    /// can not be more than the number of voxels on any axis.
    pub fn build(
        voxels: &VoxelArray,
        voxel_grid: &Grid,
        dosel_grid: &Grid,
        container: [f64; 3],
        materials: &dyn MaterialResolver,
    ) -> Result<Self> {
        let resolution = voxel_grid.resolution;

        for axis in 0..3 {
            let dosels = (container[axis] / (dosel_grid.voxel_size[axis] / 2.0)).round() as usize;
            if dosels > resolution[axis] {
                return Err(Error::DoselFinerThanVoxel {
                    axis,
                    dosels,
                    voxels: resolution[axis],
                });
            }
        }

        let voxel_volume = voxel_grid.voxel_volume();
        if voxel_volume <= 0.0 {
            return Err(Error::NonPositiveVoxelVolume(voxel_volume));
        }

        let expected = voxel_grid.number_of_values();
        if voxels.labels.len() != expected {
            return Err(Error::LabelCount {
                expected,
                found: voxels.labels.len(),
            });
        }

        debug!("Building the mass table of {expected} voxels");
        let mut masses = vec![0.0; expected];
        let offset = voxel_grid.transform.translation.vector;
        let half = voxel_grid.half_extent();
        let size = voxel_grid.voxel_size;

        for i in 0..expected {
            let centre = voxel_grid.voxel_centre(i);
            let coordinate = [0, 1, 2].map(|axis| {
                ((half[axis] + centre[axis] - offset[axis] - size[axis] / 2.0) / size[axis]).round()
                    as i64
            });

            let ijk = match Self::checked(coordinate, resolution) {
                Some(ijk) => ijk,
                None => {
                    return Err(Error::VoxelOutOfBounds {
                        coordinate,
                        resolution,
                    })
                }
            };

            let material = voxels.material_name(i)?;
            let mass = materials.density(material)? * voxel_volume;
            if mass <= 0.0 {
                return Err(Error::NonPositiveVoxelMass { index: i, mass });
            }

            trace!("Voxel {i} {ijk:?} {material} mass={mass}");
            masses[voxel_grid.ijk_to_index(ijk)] = mass;
        }

        Ok(Self {
            resolution,
            voxel_volume,
            masses,
        })
    }

    fn checked(coordinate: [i64; 3], resolution: [usize; 3]) -> Option<[usize; 3]> {
        let mut ijk = [0; 3];
        for axis in 0..3 {
            let c = usize::try_from(coordinate[axis]).ok()?;
            if c >= resolution[axis] {
                return None;
            }
            ijk[axis] = c;
        }
        Some(ijk)
    }

    /// Mass of the voxel at `(x, y, z)`
    pub fn mass(&self, ijk: [usize; 3]) -> f64 {
        let [nx, ny, _] = self.resolution;
        self.masses[ijk[0] + nx * (ijk[1] + ny * ijk[2])]
    }

    /// Cubic volume shared by every voxel
    pub fn voxel_volume(&self) -> f64 {
        self.voxel_volume
    }

    /// Number of voxels along x, y, and z
    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// Total number of voxels
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    /// True if there are no voxels at all
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Sum of every voxel mass
    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MaterialDatabase;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_2;

    fn materials() -> MaterialDatabase {
        MaterialDatabase::new()
            .with("Water", 1.0)
            .with("Bone", 1.85)
            .with("Vacuum", 0.0)
    }

    #[test]
    fn masses_follow_labels() {
        let mut voxels = VoxelArray::uniform([2, 1, 1], [2.0, 1.0, 1.0], "Water");
        voxels.materials.push("Bone".to_string());
        voxels.labels[1] = 1;

        let grid = voxels.grid(&Default::default());
        let dosels = Grid::new([1, 1, 1], [4.0, 1.0, 1.0]);
        let table = VoxelMassTable::build(&voxels, &grid, &dosels, [2.0, 0.5, 0.5], &materials())
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.voxel_volume(), 2.0);
        assert_eq!(table.mass([0, 0, 0]), 2.0);
        assert_eq!(table.mass([1, 0, 0]), 3.7);
        assert!((table.total_mass() - 5.7).abs() < 1e-12);
    }

    #[test]
    fn dosels_finer_than_voxels() {
        let voxels = VoxelArray::uniform([2, 2, 2], [1.0; 3], "Water");
        let grid = voxels.grid(&Default::default());
        let dosels = Grid::new([4, 2, 2], [0.5, 1.0, 1.0]);
        let result = VoxelMassTable::build(&voxels, &grid, &dosels, [1.0; 3], &materials());
        assert!(matches!(
            result,
            Err(Error::DoselFinerThanVoxel {
                axis: 0,
                dosels: 4,
                voxels: 2
            })
        ));
    }

    #[test]
    fn zero_density_is_fatal() {
        let voxels = VoxelArray::uniform([1, 1, 1], [1.0; 3], "Vacuum");
        let grid = voxels.grid(&Default::default());
        let result = VoxelMassTable::build(&voxels, &grid, &grid, [0.5; 3], &materials());
        assert!(matches!(
            result,
            Err(Error::NonPositiveVoxelMass { index: 0, .. })
        ));
    }

    #[test]
    fn zero_voxel_volume_is_fatal() {
        let voxels = VoxelArray::uniform([1, 1, 1], [1.0, 0.0, 1.0], "Water");
        let grid = voxels.grid(&Default::default());
        let dosels = Grid::new([1, 1, 1], [1.0; 3]);
        let result = VoxelMassTable::build(&voxels, &grid, &dosels, [0.0; 3], &materials());
        assert!(matches!(result, Err(Error::NonPositiveVoxelVolume(_))));
    }

    #[test]
    fn missing_labels() {
        let mut voxels = VoxelArray::uniform([2, 2, 1], [1.0; 3], "Water");
        voxels.labels.pop();
        let grid = voxels.grid(&Default::default());
        let result = VoxelMassTable::build(&voxels, &grid, &grid, [1.0, 1.0, 0.5], &materials());
        assert!(matches!(
            result,
            Err(Error::LabelCount {
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn turned_voxels_fall_out_of_bounds() {
        // a quarter turn about z swaps the long axis onto y
        let voxels = VoxelArray::uniform([3, 1, 1], [1.0; 3], "Water");
        let grid = voxels
            .grid(&Default::default())
            .with_rotation(UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2));
        let dosels = Grid::new([1, 1, 1], [3.0, 1.0, 1.0]);
        let result =
            VoxelMassTable::build(&voxels, &grid, &dosels, [1.5, 0.5, 0.5], &materials());
        assert!(matches!(
            result,
            Err(Error::VoxelOutOfBounds {
                resolution: [3, 1, 1],
                ..
            })
        ));
    }

    #[test]
    fn unknown_material() {
        let voxels = VoxelArray::uniform([1, 1, 1], [1.0; 3], "Lead");
        let grid = voxels.grid(&Default::default());
        let result = VoxelMassTable::build(&voxels, &grid, &grid, [0.5; 3], &materials());
        assert!(matches!(result, Err(Error::UnknownMaterial(_))));
    }
}
