use doselmass::geometry::{MaterialDatabase, PhysicalVolume, Scene, Shape};
use doselmass::grid::Grid;
use doselmass::image::Image;
use doselmass::{read_mass_image, read_scene, Error, VoxelizedMass};

use rstest::{fixture, rstest};
use std::fs;
use std::path::PathBuf;

/// Fresh scratch directory per test
#[fixture]
fn scratch(#[default("scratch")] name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("doselmass-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[rstest]
fn external_masses_from_disk(#[with("external")] scratch: PathBuf) {
    let grid = Grid::new([2, 1, 1], [1.0, 2.0, 2.0]).with_translation([0.5, 0.0, 0.0]);
    let image = Image::with_values(grid.clone(), vec![1.5, 2.5]).unwrap();
    image.write_metaimage(scratch.join("mass")).unwrap();

    let read = read_mass_image(scratch.join("mass.mhd")).unwrap();
    assert_eq!(read.resolution(), [2, 1, 1]);
    assert_eq!(read.values, vec![1.5, 2.5]);
    assert!((read.voxel_volume() - 4.0).abs() < 1e-12);
    assert!((read.grid.transform.translation.vector.x - 0.5).abs() < 1e-12);

    let world = PhysicalVolume::new("world", "Water", Shape::cuboid([10.0; 3]));
    let scene = Scene::new(MaterialDatabase::new().with("Water", 1.0), world);

    let mut mass = VoxelizedMass::initialize(&scene, "world", grid, Some(&read)).unwrap();
    assert_eq!(mass.mass_vector().unwrap(), &[1.5, 2.5]);
    assert_eq!(mass.number_of_volumes(1).unwrap(), 0);

    fs::remove_dir_all(scratch).unwrap();
}

#[rstest]
fn local_float_data(#[with("local")] scratch: PathBuf) {
    let mut bytes = b"ObjectType = Image\n\
                      NDims = 3\n\
                      DimSize = 1 1 2\n\
                      ElementSpacing = 2 2 2\n\
                      ElementType = MET_FLOAT\n\
                      ElementDataFile = LOCAL\n"
        .to_vec();
    bytes.extend_from_slice(&0.25f32.to_le_bytes());
    bytes.extend_from_slice(&8.0f32.to_le_bytes());

    let path = scratch.join("local.mhd");
    fs::write(&path, bytes).unwrap();

    let image = read_mass_image(&path).unwrap();
    assert_eq!(image.values, vec![0.25, 8.0]);
    assert_eq!(image.voxel_volume(), 8.0);

    fs::remove_dir_all(scratch).unwrap();
}

#[rstest]
fn missing_data_file(#[with("missing")] scratch: PathBuf) {
    let path = scratch.join("broken.mhd");
    fs::write(
        &path,
        "NDims = 3\nDimSize = 2 2 2\nElementType = MET_DOUBLE\nElementDataFile = nowhere.raw\n",
    )
    .unwrap();

    assert!(read_mass_image(&path).is_err());
    fs::remove_dir_all(scratch).unwrap();
}

#[rstest]
fn oversized_dimensions(#[with("oversized")] scratch: PathBuf) {
    let path = scratch.join("huge.mhd");
    fs::write(
        &path,
        "NDims = 3\nDimSize = 4294967296 4294967296 2\nElementType = MET_DOUBLE\n\
         ElementDataFile = LOCAL\n",
    )
    .unwrap();

    assert!(matches!(
        read_mass_image(&path),
        Err(Error::ImageFormat(_))
    ));
    fs::remove_dir_all(scratch).unwrap();
}

#[rstest]
fn scene_from_json(#[with("scene")] scratch: PathBuf) {
    let json = r#"{
        "materials": { "G4_AIR": 0.0012, "G4_WATER": 1.0 },
        "world": {
            "name": "world",
            "material": "G4_AIR",
            "solid": { "type": "box", "half_lengths": [2.0, 2.0, 2.0] },
            "daughters": [
                {
                    "name": "phantom",
                    "material": "G4_WATER",
                    "solid": { "type": "box", "half_lengths": [1.0, 1.0, 1.0] }
                }
            ]
        }
    }"#;

    let path = scratch.join("scene.json");
    fs::write(&path, json).unwrap();

    let scene = read_scene(&path).unwrap();
    assert_eq!(scene.world.daughters.len(), 1);

    let grid = Grid::new([1, 1, 1], [2.0; 3]);
    let mut mass = VoxelizedMass::initialize(&scene, "world", grid, None).unwrap();
    assert_eq!(mass.voxel_mass(0).unwrap(), 8.0);
    assert_eq!(mass.partial_volume(0, "world").unwrap(), 0.0);

    fs::remove_dir_all(scratch).unwrap();
}

#[test]
fn missing_scene_file() {
    assert!(read_scene("/definitely/not/a/scene.json").is_err());
}
