//! Dense per-cell values over a regular grid
//!
//! Used both for the optional external mass image read at initialisation
//! and as the output sink the reconstructed masses are added into. Reading
//! and writing of MetaImage files lives in [readers](crate::readers) and
//! [Image::write_metaimage].

// standard library
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// internal modules
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::utils::*;

// external crates
use log::debug;

/// Values stored per cell of a [Grid]
///
/// ```rust
/// # use doselmass::grid::Grid;
/// # use doselmass::image::Image;
/// let mut image = Image::new(Grid::new([2, 1, 1], [1.0, 1.0, 1.0]));
/// image.set_value(0, 2.0);
/// image.add_value(0, 0.5);
/// assert_eq!(image.value(0), 2.5);
/// assert_eq!(image.value(1), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// Geometry of the image
    pub grid: Grid,
    /// One value per cell, `x` varying fastest
    pub values: Vec<f64>,
}

impl Image {
    /// Zero filled image over a grid
    pub fn new(grid: Grid) -> Self {
        let values = vec![0.0; grid.number_of_values()];
        Self { grid, values }
    }

    /// Image from existing values, which must match the grid
    pub fn with_values(grid: Grid, values: Vec<f64>) -> Result<Self> {
        if values.len() != grid.number_of_values() {
            return Err(Error::ImageFormat(f!(
                "{} values for a {:?} grid",
                values.len(),
                grid.resolution
            )));
        }
        Ok(Self { grid, values })
    }

    /// Value of cell `index`
    pub fn value(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Overwrite cell `index`
    pub fn set_value(&mut self, index: usize, value: f64) {
        self.values[index] = value;
    }

    /// Add to cell `index`
    pub fn add_value(&mut self, index: usize, value: f64) {
        self.values[index] += value;
    }

    /// Number of cells
    pub fn number_of_values(&self) -> usize {
        self.values.len()
    }

    /// Cubic volume of a single cell
    pub fn voxel_volume(&self) -> f64 {
        self.grid.voxel_volume()
    }

    /// Number of cells along x, y, and z
    pub fn resolution(&self) -> [usize; 3] {
        self.grid.resolution
    }

    /// Write as a MetaImage, `path.mhd` header next to `path.raw` data
    ///
    /// Any extension on `path` is replaced. Values are stored as little
    /// endian doubles.
    pub fn write_metaimage(&self, path: impl AsRef<Path>) -> Result<()> {
        let header_path = path.as_ref().with_extension("mhd");
        let data_path = path.as_ref().with_extension("raw");
        let data_name = data_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| Error::ImageFormat(f!("invalid path {}", data_path.display())))?;

        debug!("Writing {}", header_path.display());
        let mut header = BufWriter::new(File::create(&header_path)?);
        header.write_all(self.header(&data_name).as_bytes())?;
        header.flush()?;

        debug!("Writing {}", data_path.display());
        let mut data = BufWriter::new(File::create(&data_path)?);
        for value in &self.values {
            data.write_all(&value.to_le_bytes())?;
        }
        data.flush()?;

        Ok(())
    }

    /// MetaImage header text pointing at `data_file`
    pub fn header(&self, data_file: &str) -> String {
        let [nx, ny, nz] = self.grid.resolution;
        let [dx, dy, dz] = self.grid.voxel_size;
        let half = self.grid.half_extent();
        let t = self.grid.transform.translation.vector;
        let m = self.grid.transform.rotation.to_rotation_matrix();
        let m = m.matrix();

        // origin is the centre of the first cell
        let origin = [0, 1, 2].map(|axis| t[axis] - half[axis] + self.grid.voxel_size[axis] / 2.0);

        [
            "ObjectType = Image".to_string(),
            "NDims = 3".to_string(),
            "BinaryData = True".to_string(),
            "BinaryDataByteOrderMSB = False".to_string(),
            "CompressedData = False".to_string(),
            f!(
                "TransformMatrix = {} {} {} {} {} {} {} {} {}",
                m[(0, 0)],
                m[(1, 0)],
                m[(2, 0)],
                m[(0, 1)],
                m[(1, 1)],
                m[(2, 1)],
                m[(0, 2)],
                m[(1, 2)],
                m[(2, 2)]
            ),
            f!("Offset = {} {} {}", origin[0], origin[1], origin[2]),
            "CenterOfRotation = 0 0 0".to_string(),
            "AnatomicalOrientation = RAI".to_string(),
            f!("ElementSpacing = {dx} {dy} {dz}"),
            f!("DimSize = {nx} {ny} {nz}"),
            "ElementType = MET_DOUBLE".to_string(),
            f!("ElementDataFile = {data_file}"),
            String::new(),
        ]
        .join("\n")
    }
}
