//! MetaImage (`.mhd`/`.raw`) reader

// internal modules
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::image::Image;
use crate::readers::parsers;
use crate::utils::*;

// standard library
use std::fs;
use std::path::{Path, PathBuf};

// external crates
use log::{debug, trace};
use nalgebra::{Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Supported MetaImage element types
#[derive(Debug, Clone, Copy, PartialEq)]
enum ElementType {
    Double,
    Float,
}

impl ElementType {
    fn size(&self) -> usize {
        match self {
            Self::Double => 8,
            Self::Float => 4,
        }
    }
}

/// Everything collected from a MetaImage header
#[derive(Debug, Clone)]
struct Header {
    resolution: Option<[usize; 3]>,
    spacing: [f64; 3],
    offset: [f64; 3],
    direction: [f64; 9],
    element_type: Option<ElementType>,
    big_endian: bool,
    data_file: Option<String>,
    data_start: usize,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            resolution: None,
            spacing: [1.0; 3],
            offset: [0.0; 3],
            direction: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            element_type: None,
            big_endian: false,
            data_file: None,
            data_start: 0,
        }
    }
}

/// A simple reader for MetaImage `.mhd` files
///
/// Only 3D, single channel, uncompressed `MET_DOUBLE` or `MET_FLOAT` images
/// are supported. The data is either a separate file named relative to the
/// header, or `LOCAL` binary data directly after the header.
#[derive(Debug, Default)]
pub struct MetaImageReader;

impl MetaImageReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Read the header and the data it points to
    pub fn parse(&self, path: &Path) -> Result<Image> {
        let bytes = fs::read(path)?;
        let header = Self::parse_header(&bytes)?;

        let resolution = header
            .resolution
            .ok_or_else(|| Error::ImageFormat("missing DimSize".to_string()))?;
        let element_type = header
            .element_type
            .ok_or_else(|| Error::ImageFormat("missing ElementType".to_string()))?;
        let data_file = header
            .data_file
            .as_deref()
            .ok_or_else(|| Error::ImageFormat("missing ElementDataFile".to_string()))?;

        let count = resolution
            .iter()
            .try_fold(1usize, |n, &r| n.checked_mul(r))
            .ok_or_else(|| Error::ImageFormat(f!("DimSize {resolution:?} is too large")))?;
        let grid = Self::grid(&header, resolution);

        let data = match data_file {
            "LOCAL" => bytes[header.data_start..].to_vec(),
            name => {
                let data_path = Self::data_path(path, name);
                debug!("Reading image data from {}", data_path.display());
                fs::read(&data_path)?
            }
        };

        let values = Self::decode(&data, count, element_type, header.big_endian)?;
        debug!("Read {count} values over {grid}");
        Image::with_values(grid, values)
    }

    /// Data files are relative to the header unless absolute
    fn data_path(header_path: &Path, name: &str) -> PathBuf {
        match header_path.parent() {
            Some(directory) => directory.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Collect every known key up to and including `ElementDataFile`
    fn parse_header(bytes: &[u8]) -> Result<Header> {
        let mut header = Header::default();
        let mut position = 0;

        while position < bytes.len() {
            let end = bytes[position..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|n| position + n + 1)
                .unwrap_or(bytes.len());

            let line = std::str::from_utf8(&bytes[position..end])
                .map_err(|_| Error::ImageFormat("non text header line".to_string()))?
                .trim();
            position = end;

            if line.is_empty() {
                continue;
            }

            let (key, value) = match parsers::header_entry(line) {
                Ok((_, entry)) => entry,
                Err(_) => return Err(Error::ImageFormat(f!("unexpected header line \"{line}\""))),
            };
            trace!("[Header] {key} = {value}");

            match key {
                "NDims" => {
                    if value != "3" {
                        return Err(Error::ImageFormat(f!("{value} dimensions, expected 3")));
                    }
                }
                "DimSize" => {
                    header.resolution = Some(Self::triplet(key, parsers::usize_list(value))?)
                }
                "ElementSpacing" | "ElementSize" => {
                    header.spacing = Self::triplet(key, parsers::float_list(value))?
                }
                "Offset" | "Position" | "Origin" => {
                    header.offset = Self::triplet(key, parsers::float_list(value))?
                }
                "TransformMatrix" | "Rotation" | "Orientation" => {
                    header.direction = Self::values(key, parsers::float_list(value))?
                }
                "ElementType" => {
                    header.element_type = Some(match value {
                        "MET_DOUBLE" => ElementType::Double,
                        "MET_FLOAT" => ElementType::Float,
                        other => {
                            return Err(Error::ImageFormat(f!("unsupported element type {other}")))
                        }
                    })
                }
                "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => {
                    header.big_endian = Self::flag(key, value)?
                }
                "CompressedData" => {
                    if Self::flag(key, value)? {
                        return Err(Error::ImageFormat("compressed data".to_string()));
                    }
                }
                "ElementNumberOfChannels" => {
                    if value != "1" {
                        return Err(Error::ImageFormat(f!("{value} channels, expected 1")));
                    }
                }
                "ElementDataFile" => {
                    header.data_file = Some(value.to_string());
                    header.data_start = position;
                    return Ok(header);
                }
                _ => trace!("Ignoring header key {key}"),
            }
        }

        Ok(header)
    }

    fn flag(key: &str, value: &str) -> Result<bool> {
        parsers::boolean(value)
            .map(|(_, b)| b)
            .map_err(|_| Error::ImageFormat(f!("{key} should be True or False, found {value}")))
    }

    fn values<const N: usize>(
        key: &str,
        parsed: nom::IResult<&str, Vec<f64>>,
    ) -> Result<[f64; N]> {
        match parsed {
            Ok(("", list)) => list.try_into().map_err(|list: Vec<f64>| {
                Error::ImageFormat(f!("{key} has {} values, expected {N}", list.len()))
            }),
            _ => Err(Error::ImageFormat(f!("invalid {key} values"))),
        }
    }

    fn triplet<T>(
        key: &str,
        parsed: nom::IResult<&str, Vec<T>>,
    ) -> Result<[T; 3]> {
        match parsed {
            Ok(("", list)) => list.try_into().map_err(|list: Vec<T>| {
                Error::ImageFormat(f!("{key} has {} values, expected 3", list.len()))
            }),
            _ => Err(Error::ImageFormat(f!("invalid {key} values"))),
        }
    }

    /// Grid centred on the middle of the image
    fn grid(header: &Header, resolution: [usize; 3]) -> Grid {
        let matrix = Matrix3::from_column_slice(&header.direction);
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix(&matrix));

        let half = Vector3::from_fn(|axis, _| {
            (resolution[axis] as f64 - 1.0) * header.spacing[axis] / 2.0
        });
        let centre = Vector3::from(header.offset) + rotation * half;

        let mut grid = Grid::new(resolution, header.spacing);
        grid.transform.translation = Translation3::from(centre);
        grid.transform.rotation = rotation;
        grid
    }

    fn decode(
        data: &[u8],
        count: usize,
        element: ElementType,
        big_endian: bool,
    ) -> Result<Vec<f64>> {
        let size = element.size();
        let length = count
            .checked_mul(size)
            .ok_or_else(|| Error::ImageFormat(f!("{count} values of {size} bytes is too large")))?;
        if data.len() < length {
            return Err(Error::ImageFormat(f!(
                "{} bytes of data for {count} values of {size} bytes",
                data.len()
            )));
        }

        let values = data[..length]
            .chunks_exact(size)
            .map(|chunk| match (element, big_endian) {
                (ElementType::Double, false) => f64::from_le_bytes(Self::bytes(chunk)),
                (ElementType::Double, true) => f64::from_be_bytes(Self::bytes(chunk)),
                (ElementType::Float, false) => f32::from_le_bytes(Self::bytes(chunk)) as f64,
                (ElementType::Float, true) => f32::from_be_bytes(Self::bytes(chunk)) as f64,
            })
            .collect();

        Ok(values)
    }

    /// Fixed size copy of a chunk, which always has the element size
    fn bytes<const N: usize>(chunk: &[u8]) -> [u8; N] {
        let mut array = [0; N];
        array.copy_from_slice(chunk);
        array
    }
}
