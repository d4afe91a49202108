//! Result cache and aggregation over the whole dosel grid

// standard library
use std::time::Instant;

// internal modules
use crate::error::{Error, Result};
use crate::geometry::{PhysicalVolume, Scene};
use crate::grid::{Grid, GridMapper};
use crate::image::Image;
use crate::mass::{
    DoselResult, GeometryMode, HierarchicalReconstructor, ParameterisedReconstructor,
    Reconstructor, VoxelMassTable,
};
use crate::utils::*;

// external crates
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, info, warn};

/// Tolerance on the voxel volume of an external mass image
const VOLUME_TOLERANCE: f64 = 1e-4;

/// Where dosel masses come from
#[derive(Debug)]
enum MassSource {
    /// Computed on demand from the geometry
    Reconstructed(Box<dyn Reconstructor>),
    /// Read as is from an external image
    External(Vec<f64>),
}

/// Dosel mass engine for one attached volume and dosel grid
///
/// Everything is set up by [VoxelizedMass::initialize], which either returns
/// a fully usable instance or an error. Dosels are reconstructed lazily and
/// cached, so repeated queries are cheap.
#[derive(Debug)]
pub struct VoxelizedMass {
    dosel_grid: Grid,
    mode: GeometryMode,
    source: MassSource,
    dosels: Vec<DoselResult>,
    mass_vector: Option<Vec<f64>>,
    disable_progress: bool,
}

impl VoxelizedMass {
    /// Set up the reconstruction for the dosel grid attached to `volume_name`
    ///
    /// The dosel grid is expressed in the frame of the attached volume. If a
    /// mass image is given it must have the same resolution and voxel volume
    /// as the dosel grid, and its values are used instead of any geometry.
    pub fn initialize(
        scene: &Scene,
        volume_name: &str,
        dosel_grid: Grid,
        mass_image: Option<&Image>,
    ) -> Result<Self> {
        let root = scene.find_volume(volume_name)?;
        if root.is_parameterised() {
            return Err(Error::ParameterisedVolume(root.name.clone()));
        }

        let mode = Self::detect_mode(root);
        debug!("Dosels attached to {volume_name}, {mode} geometry");
        debug!("Dosel grid: {dosel_grid}");

        let source = match mass_image {
            Some(image) => MassSource::External(Self::validate_mass_image(&dosel_grid, image)?),
            None => MassSource::Reconstructed(match mode {
                GeometryMode::Parameterised => {
                    Box::new(Self::parameterised(scene, root, &dosel_grid)?)
                }
                GeometryMode::Hierarchical => Box::new(HierarchicalReconstructor::new(
                    root,
                    dosel_grid.clone(),
                    &scene.materials,
                )?),
            }),
        };

        Ok(Self {
            dosels: vec![DoselResult::default(); dosel_grid.number_of_values()],
            dosel_grid,
            mode,
            source,
            mass_vector: None,
            disable_progress: false,
        })
    }

    /// A single voxel array daughter means a regular parameterised geometry
    fn detect_mode(root: &PhysicalVolume) -> GeometryMode {
        match root.daughters.as_slice() {
            [daughter] if daughter.is_parameterised() => GeometryMode::Parameterised,
            _ => GeometryMode::Hierarchical,
        }
    }

    fn parameterised(
        scene: &Scene,
        root: &PhysicalVolume,
        dosel_grid: &Grid,
    ) -> Result<ParameterisedReconstructor> {
        let daughter = &root.daughters[0];
        let voxels = daughter
            .voxels
            .as_ref()
            .ok_or_else(|| Error::ParameterisedVolume(daughter.name.clone()))?;

        let voxel_grid = voxels.grid(&daughter.placement);
        debug!("Voxel grid: {voxel_grid}");

        let mapper = GridMapper::new(dosel_grid.clone(), voxel_grid.clone())?;
        let table = VoxelMassTable::build(
            voxels,
            &voxel_grid,
            dosel_grid,
            root.solid.local_bounds().max,
            &scene.materials,
        )?;

        Ok(ParameterisedReconstructor::new(mapper, table))
    }

    fn validate_mass_image(dosel_grid: &Grid, image: &Image) -> Result<Vec<f64>> {
        if (image.voxel_volume() - dosel_grid.voxel_volume()).abs() > VOLUME_TOLERANCE
            || image.resolution() != dosel_grid.resolution
            || image.number_of_values() != dosel_grid.number_of_values()
        {
            return Err(Error::MassImageMismatch {
                expected_resolution: dosel_grid.resolution,
                found_resolution: image.resolution(),
                expected_volume: dosel_grid.voxel_volume(),
                found_volume: image.voxel_volume(),
                expected_values: dosel_grid.number_of_values(),
                found_values: image.number_of_values(),
            });
        }

        debug!("Using {} external dosel masses", image.number_of_values());
        Ok(image.values.clone())
    }

    /// Do not print the progress bar during whole grid computations
    pub fn disable_progress(&mut self) {
        debug!("Progress bar disabled");
        self.disable_progress = true;
    }

    /// Geometry mode chosen at initialisation
    pub fn mode(&self) -> GeometryMode {
        self.mode
    }

    /// The dosel grid
    pub fn dosel_grid(&self) -> &Grid {
        &self.dosel_grid
    }

    /// Whether masses come from an external image
    pub fn is_external(&self) -> bool {
        matches!(self.source, MassSource::External(_))
    }

    /// Number of dosels
    pub fn number_of_dosels(&self) -> usize {
        self.dosels.len()
    }

    /// Nominal cubic volume of one dosel
    pub fn total_volume(&self) -> f64 {
        self.dosel_grid.voxel_volume()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        match index < self.dosels.len() {
            true => Ok(()),
            false => Err(Error::DoselIndex {
                index,
                count: self.dosels.len(),
            }),
        }
    }

    /// Reconstruct dosel `index` if it is not cached yet
    fn compute(&mut self, index: usize) -> Result<&DoselResult> {
        self.check_index(index)?;
        if !self.dosels[index].is_computed() {
            if let MassSource::Reconstructed(reconstructor) = &self.source {
                let reconstruction = reconstructor.reconstruct(index)?;
                self.dosels[index].store(reconstruction);
            }
        }
        Ok(&self.dosels[index])
    }

    /// Mass of dosel `index`
    pub fn voxel_mass(&mut self, index: usize) -> Result<f64> {
        self.check_index(index)?;
        if let MassSource::External(masses) = &self.source {
            return Ok(masses[index]);
        }
        Ok(self.compute(index)?.mass.unwrap_or_default())
    }

    /// Cubic volume of dosel `index`
    ///
    /// External mass images only know the nominal dosel volume.
    pub fn cubic_volume(&mut self, index: usize) -> Result<f64> {
        self.check_index(index)?;
        if self.is_external() {
            return Ok(self.total_volume());
        }
        Ok(self.compute(index)?.cubic_volume.unwrap_or_default())
    }

    /// Mass of every dosel, computing whatever is missing
    pub fn mass_vector(&mut self) -> Result<&[f64]> {
        if self.mass_vector.is_none() {
            let masses = match &self.source {
                MassSource::External(masses) => masses.clone(),
                MassSource::Reconstructed(_) => self.generate_vectors()?,
            };
            self.mass_vector = Some(masses);
        }

        Ok(self.mass_vector.as_deref().unwrap_or_default())
    }

    /// Sum of the mass of every dosel
    pub fn total_mass(&mut self) -> Result<f64> {
        Ok(self.mass_vector()?.iter().sum())
    }

    /// Whole grid computation with progress and a summary
    fn generate_vectors(&mut self) -> Result<Vec<f64>> {
        let start = Instant::now();
        let n = self.dosels.len();
        info!("Computing the mass of {n} dosels");

        let mut progress_bar = self.init_progress_bar(n)?;
        if !self.disable_progress {
            progress_bar.refresh()?;
        }

        let mut masses = Vec::with_capacity(n);
        let mut total_volume = 0.0;
        for i in 0..n {
            let dosel = self.compute(i)?;
            masses.push(dosel.mass.unwrap_or_default());
            total_volume += dosel.cubic_volume.unwrap_or_default();
            progress_bar.update(1)?;
        }

        if !self.disable_progress {
            eprintln!()
        }

        let total_mass: f64 = masses.iter().sum();
        let expected_volume = self.total_volume() * n as f64;
        if (total_volume - expected_volume).abs() > VOLUME_TOLERANCE * expected_volume {
            warn!(
                "Reconstructed volume {} differs from the dosel grid volume {}",
                total_volume.sci(5, 2),
                expected_volume.sci(5, 2)
            );
        }

        info!("Mass calculation summary");
        info!("  - elapsed time  {:.3} s", start.elapsed().as_secs_f64());
        if let MassSource::Reconstructed(reconstructor) = &self.source {
            if let Some(voxels) = reconstructor.number_of_voxels() {
                info!("  - voxels        {voxels}");
            }
        }
        info!("  - dosels        {n}");
        info!("  - total mass    {}", total_mass.sci(5, 2));
        info!("  - total volume  {}", total_volume.sci(5, 2));

        Ok(masses)
    }

    /// Initialise the progress bar, if wanted
    fn init_progress_bar(&self, total: usize) -> Result<Bar> {
        BarBuilder::default()
            .total(total)
            .delay(0.0)
            .mininterval(0.5)
            .unit(" dosels")
            .unit_scale(true)
            .disable(self.disable_progress)
            .build()
            .map_err(Error::Progress)
    }

    /// Breakdown of dosel `index`, failing for external masses
    fn breakdown(&mut self, index: usize) -> Result<&DoselResult> {
        self.check_index(index)?;
        if self.is_external() {
            return Err(Error::NoBreakdown(index));
        }
        self.compute(index)
    }

    /// Cubic volume of the sub-volume `name` inside dosel `index`
    pub fn partial_volume(&mut self, index: usize, name: &str) -> Result<f64> {
        self.breakdown(index)?
            .partial_volumes
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSubVolume {
                index,
                name: name.to_string(),
            })
    }

    /// Mass of the sub-volume `name` inside dosel `index`
    pub fn partial_mass(&mut self, index: usize, name: &str) -> Result<f64> {
        self.breakdown(index)?
            .partial_masses
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSubVolume {
                index,
                name: name.to_string(),
            })
    }

    /// Number of sub-volumes in the breakdown of dosel `index`
    pub fn number_of_volumes(&mut self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        if self.is_external() {
            return Ok(0);
        }
        Ok(self.compute(index)?.partial_masses.len())
    }

    /// Full cached state of dosel `index`, reconstructing it if needed
    pub fn dosel(&mut self, index: usize) -> Result<&DoselResult> {
        self.compute(index)
    }

    /// Add deposited energy to sub-volume `name` of dosel `index`
    pub fn accumulate_energy(&mut self, index: usize, name: &str, energy: f64) -> Result<()> {
        self.check_index(index)?;
        self.dosels[index].accumulate(name, energy);
        Ok(())
    }

    /// Dose of the sub-volume with the most deposited energy in dosel `index`
    ///
    /// This is the energy divided by the partial mass of that sub-volume, or
    /// zero if nothing was ever deposited.
    pub fn max_dose_fraction(&mut self, index: usize) -> Result<f64> {
        self.check_index(index)?;
        let (name, energy) = match self.dosels[index].max_energy() {
            Some((name, energy)) => (name.to_string(), energy),
            None => return Ok(0.0),
        };
        Ok(energy / self.partial_mass(index, &name)?)
    }

    /// Add the mass of every dosel into an image over the dosel grid
    pub fn update_image(&mut self, image: &mut Image) -> Result<()> {
        if image.resolution() != self.dosel_grid.resolution {
            return Err(Error::ImageMismatch {
                expected: self.dosel_grid.resolution,
                found: image.resolution(),
            });
        }

        for (i, mass) in self.mass_vector()?.iter().enumerate() {
            image.add_value(i, *mass);
        }
        Ok(())
    }
}
