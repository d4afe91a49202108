//! Library of readers and common functions for the supported file formats

// internal modules
use crate::error::Result;
use crate::geometry::Scene;
use crate::image::Image;

// standard library
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// external crates
use log::debug;

// files under the readers module
mod image_file;
pub mod parsers;

// inline important the reader modules for a nice API
#[doc(inline)]
pub use crate::readers::image_file::MetaImageReader;

/// Read a scene description from a JSON file
///
/// Returns a result containing the [Scene] deserialised from the file at
/// `path`. See the [geometry](crate::geometry) module for the layout.
///
/// - `path` - Path to the JSON file, can be [&str], [String], [Path], etc...
///
/// Example
/// ```ignore
/// // Read the materials and volume tree
/// let scene: Scene = doselmass::read_scene("path/to/scene.json")?;
/// ```
pub fn read_scene<P: AsRef<Path>>(path: P) -> Result<Scene> {
    let path: &Path = Path::new(path.as_ref());
    debug!("Reading scene from {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let scene: Scene = serde_json::from_reader(reader)?;
    debug!(
        "Scene has {} materials and {} volumes",
        scene.materials.len(),
        scene.world.count()
    );
    Ok(scene)
}

/// Read a MetaImage file, typically a dosel mass image
///
/// Returns a result containing the [Image] described by the `.mhd` header
/// at `path`, with the values converted to `f64`.
///
/// Example
/// ```ignore
/// // Read precomputed dosel masses
/// let masses: Image = doselmass::read_mass_image("path/to/mass.mhd")?;
/// ```
pub fn read_mass_image<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path: &Path = Path::new(path.as_ref());
    debug!("Reading image from {}", path.display());
    let reader = MetaImageReader::new();
    reader.parse(path)
}
