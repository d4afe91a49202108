//! Error type shared by every module of the crate
//!
//! Every variant is a configuration or consistency problem between the dosel
//! grid and the geometry. None of them are transient, so nothing is retried
//! and no partially initialised state is ever returned alongside an error.

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while reconstructing dosel masses
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// External mass image does not describe the same grid as the dosels
    #[error(
        "mass image has the wrong voxel volume and resolution (found {found_resolution:?} \
         with volume {found_volume}, expected {expected_resolution:?} with volume \
         {expected_volume}, {found_values} values for {expected_values} dosels)"
    )]
    MassImageMismatch {
        expected_resolution: [usize; 3],
        found_resolution: [usize; 3],
        expected_volume: f64,
        found_volume: f64,
        expected_values: usize,
        found_values: usize,
    },

    /// Dosels are smaller than the voxels they are reconstructed from
    #[error("the dosel resolution is finer than the voxel resolution on axis {axis} ({dosels} dosels for {voxels} voxels)")]
    DoselFinerThanVoxel {
        axis: usize,
        dosels: usize,
        voxels: usize,
    },

    /// Voxel cubic volume must be strictly positive
    #[error("voxel cubic volume is less or equal to zero (cubic volume={0})")]
    NonPositiveVoxelVolume(f64),

    /// Voxel mass must be strictly positive
    #[error("voxel {index} mass is less or equal to zero (mass={mass})")]
    NonPositiveVoxelMass { index: usize, mass: f64 },

    /// A voxel maps outside of the mass table
    #[error("voxel coordinate {coordinate:?} is outside of the table bounds {resolution:?}")]
    VoxelOutOfBounds {
        coordinate: [i64; 3],
        resolution: [usize; 3],
    },

    /// A dosel reaches outside of the voxel grid
    #[error("dosel {index} covers [{min}, {max}) on axis {axis}, outside of the {voxels} voxels available")]
    DoselOutsideVoxelGrid {
        index: usize,
        axis: usize,
        min: f64,
        max: f64,
        voxels: usize,
    },

    /// Running mass total became negative
    #[error("reconstructed mass of dosel {index} is negative (mass={mass})")]
    NegativeMass { index: usize, mass: f64 },

    /// Running volume total became negative
    #[error("reconstructed cubic volume of dosel {index} is negative (cubic volume={volume})")]
    NegativeVolume { index: usize, volume: f64 },

    /// The generic hierarchy walk reached a voxel parameterisation
    #[error("the volume {0} is parameterised, attach the dose grid directly to this volume")]
    ParameterisedVolume(String),

    /// Name-keyed breakdown lookup missed
    #[error("can't find {name} inside the dosel {index}")]
    UnknownSubVolume { index: usize, name: String },

    /// Breakdown requested on dosels that come from an external mass image
    #[error("dosel {0} mass comes from an external image, no sub-volume breakdown exists")]
    NoBreakdown(usize),

    /// Dosel index beyond the grid
    #[error("dosel index {index} is out of range for {count} dosels")]
    DoselIndex { index: usize, count: usize },

    /// Volume name not in the scene
    #[error("no volume named {0} in the geometry")]
    VolumeNotFound(String),

    /// Material name not in the database
    #[error("no material named {0} in the material database")]
    UnknownMaterial(String),

    /// Voxel label without a material
    #[error("voxel {voxel} has label {label} with no associated material")]
    UnknownLabel { voxel: usize, label: u16 },

    /// Label array does not match the voxel resolution
    #[error("expected {expected} voxel labels, found {found}")]
    LabelCount { expected: usize, found: usize },

    /// The regular grid path only supports axis-aligned grids
    #[error("{0} is rotated, voxel and dosel grids must be axis-aligned")]
    NonAxisAligned(String),

    /// Output image does not share the dosel grid
    #[error("image resolution {found:?} does not match the dosel resolution {expected:?}")]
    ImageMismatch {
        expected: [usize; 3],
        found: [usize; 3],
    },

    /// Malformed image header or data
    #[error("invalid image: {0}")]
    ImageFormat(String),

    /// Progress bar could not be built
    #[error("unable to build progress bar: {0}")]
    Progress(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
