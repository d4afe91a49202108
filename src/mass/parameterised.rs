//! Weighted resampling of a regular voxel array onto dosels

// internal modules
use crate::error::{Error, Result};
use crate::grid::{GridMapper, OverlapWeights};
use crate::mass::{GeometryMode, Reconstruction, Reconstructor, VoxelMassTable};

// external crates
use log::trace;

/// Dosel mass from the voxels of a parameterised volume
///
/// Every covered voxel contributes its mass and volume scaled by the
/// fraction of it lying inside the dosel. Individual materials are summed
/// together, so no breakdown is produced.
#[derive(Debug, Clone)]
pub struct ParameterisedReconstructor {
    mapper: GridMapper,
    table: VoxelMassTable,
}

impl ParameterisedReconstructor {
    /// Combine a dosel to voxel mapping with the voxel masses
    pub fn new(mapper: GridMapper, table: VoxelMassTable) -> Self {
        Self { mapper, table }
    }

    /// The voxel mass table in use
    pub fn table(&self) -> &VoxelMassTable {
        &self.table
    }
}

impl Reconstructor for ParameterisedReconstructor {
    fn mode(&self) -> GeometryMode {
        GeometryMode::Parameterised
    }

    fn number_of_voxels(&self) -> Option<usize> {
        Some(self.table.len())
    }

    fn reconstruct(&self, index: usize) -> Result<Reconstruction> {
        let bounds = self.mapper.bounds(index);
        let overlap = OverlapWeights::resolve(index, &bounds, self.table.resolution())?;
        let voxel_volume = self.table.voxel_volume();

        let mut mass = 0.0;
        let mut cubic_volume = 0.0;

        for (ijk, weight) in overlap.iter() {
            mass += self.table.mass(ijk) * weight;
            cubic_volume += voxel_volume * weight;

            // unreachable while weights and table masses are non-negative
            if mass < 0.0 {
                return Err(Error::NegativeMass { index, mass });
            }
            if cubic_volume < 0.0 {
                return Err(Error::NegativeVolume {
                    index,
                    volume: cubic_volume,
                });
            }
        }

        trace!(
            "Dosel {index} covers {} voxels, mass={mass} volume={cubic_volume}",
            overlap.len()
        );

        Ok(Reconstruction {
            mass,
            cubic_volume,
            partials: Vec::new(),
        })
    }
}
