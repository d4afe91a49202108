use doselmass::geometry::{
    MaterialDatabase, PhysicalVolume, Placement, Scene, Shape, VoxelArray,
};
use doselmass::grid::{Grid, GridMapper, OverlapWeights};
use doselmass::image::Image;
use doselmass::{Error, GeometryMode, VoxelizedMass};

use rstest::{fixture, rstest};

fn materials() -> MaterialDatabase {
    MaterialDatabase::new()
        .with("Air", 0.001)
        .with("Water", 1.0)
        .with("Bone", 1.85)
}

/// Container holding a single voxel array of the same extent
fn voxel_scene(voxels: VoxelArray) -> Scene {
    let half = [0, 1, 2].map(|i| voxels.resolution[i] as f64 * voxels.voxel_size[i] / 2.0);
    let world = PhysicalVolume::new("world", "Air", Shape::cuboid([100.0; 3])).with_daughter(
        PhysicalVolume::new("container", "Air", Shape::cuboid(half))
            .with_daughter(PhysicalVolume::voxelised("ct", voxels)),
    );
    Scene::new(materials(), world)
}

/// 4x4x4 water box holding a 2x2x2 bone cube in its +x+y+z corner
#[fixture]
fn nested_scene() -> Scene {
    let world = PhysicalVolume::new("world", "Water", Shape::cuboid([2.0; 3])).with_daughter(
        PhysicalVolume::new("cube", "Bone", Shape::cuboid([1.0; 3]))
            .with_placement(Placement::translated([1.0, 1.0, 1.0])),
    );
    Scene::new(materials(), world)
}

#[test]
fn uniform_voxels_give_unit_masses() {
    // 2x2x2 unit voxels of unit density, one dosel per voxel
    let scene = voxel_scene(VoxelArray::uniform([2, 2, 2], [1.0; 3], "Water"));
    let grid = Grid::new([2, 2, 2], [1.0; 3]);

    let mut mass = VoxelizedMass::initialize(&scene, "container", grid, None).unwrap();
    mass.disable_progress();

    assert_eq!(mass.mode(), GeometryMode::Parameterised);
    assert_eq!(mass.mass_vector().unwrap(), &[1.0; 8]);
    assert_eq!(mass.total_mass().unwrap(), 8.0);
    assert_eq!(mass.total_volume(), 1.0);
}

#[test]
fn uniform_solid_gives_unit_masses() {
    let world = PhysicalVolume::new("world", "Water", Shape::cuboid([1.0; 3]));
    let scene = Scene::new(materials(), world);
    let grid = Grid::new([2, 2, 2], [1.0; 3]);

    let mut mass = VoxelizedMass::initialize(&scene, "world", grid, None).unwrap();
    mass.disable_progress();

    assert_eq!(mass.mode(), GeometryMode::Hierarchical);
    assert_eq!(mass.mass_vector().unwrap(), &[1.0; 8]);
    assert_eq!(mass.total_mass().unwrap(), 8.0);
}

#[test]
fn mass_is_conserved_and_idempotent() {
    // 6x6x6 voxels of alternating materials covered by 4x4x4 dosels of 1.5
    let mut voxels = VoxelArray::uniform([6, 6, 6], [1.0; 3], "Water");
    voxels.materials.push("Bone".to_string());
    for (i, label) in voxels.labels.iter_mut().enumerate() {
        *label = ((i * 7) % 3 == 0) as u16;
    }
    let expected: f64 = voxels
        .labels
        .iter()
        .map(|&l| if l == 1 { 1.85 } else { 1.0 })
        .sum();

    let scene = voxel_scene(voxels);
    let grid = Grid::new([4, 4, 4], [1.5; 3]);
    let mut mass = VoxelizedMass::initialize(&scene, "container", grid, None).unwrap();
    mass.disable_progress();

    let first = mass.mass_vector().unwrap().to_vec();
    let second = mass.mass_vector().unwrap().to_vec();
    assert_eq!(first, second);

    let total: f64 = first.iter().sum();
    assert!((total - expected).abs() < 1e-9, "{total} != {expected}");

    for i in 0..64 {
        assert!((mass.cubic_volume(i).unwrap() - 3.375).abs() < 1e-12);
    }
}

#[rstest]
#[case([0.0, 0.0, 0.0])]
#[case([1.0, 0.0, 0.0])]
#[case([1.0, -1.0, 2.0])]
fn aligned_grids_use_whole_voxels(#[case] translation: [f64; 3]) {
    let dosels = Grid::new([2, 2, 2], [2.0; 3]).with_translation(translation);
    let voxels = Grid::new([8, 8, 8], [1.0; 3]);
    let mapper = GridMapper::new(dosels.clone(), voxels).unwrap();

    for i in 0..dosels.number_of_values() {
        let overlap = OverlapWeights::resolve(i, &mapper.bounds(i), [8, 8, 8]).unwrap();
        assert_eq!(overlap.len(), 8);
        assert!(overlap.iter().all(|(_, w)| w == 1.0));
        assert_eq!((0..3).map(|a| overlap.axis_sum(a)).product::<f64>(), 8.0);
    }
}

#[test]
fn offset_dosels_keep_their_volume() {
    // dosels shifted by a quarter voxel inside a larger voxel array
    let scene = voxel_scene(VoxelArray::uniform([8, 8, 8], [1.0; 3], "Water"));
    let grid = Grid::new([3, 3, 3], [2.0; 3]).with_translation([0.25, -0.25, 0.0]);

    let mut mass = VoxelizedMass::initialize(&scene, "container", grid, None).unwrap();
    mass.disable_progress();

    for i in 0..27 {
        assert!((mass.cubic_volume(i).unwrap() - 8.0).abs() < 1e-12);
        assert!((mass.voxel_mass(i).unwrap() - 8.0).abs() < 1e-12);
    }
}

#[rstest]
fn dosel_outside_a_volume_has_no_entry(nested_scene: Scene) {
    // 2x2x2 dosels of 2, the cube fills dosel 7 exactly
    let grid = Grid::new([2, 2, 2], [2.0; 3]);
    let mut mass = VoxelizedMass::initialize(&nested_scene, "world", grid, None).unwrap();

    assert_eq!(mass.voxel_mass(0).unwrap(), 8.0);
    assert_eq!(mass.number_of_volumes(0).unwrap(), 1);
    assert!(matches!(
        mass.partial_volume(0, "cube"),
        Err(Error::UnknownSubVolume { index: 0, .. })
    ));

    // entirely inside a leaf volume
    assert_eq!(mass.partial_volume(7, "cube").unwrap(), 8.0);
    assert_eq!(mass.partial_mass(7, "cube").unwrap(), 1.85 * 8.0);
    assert_eq!(mass.partial_volume(7, "world").unwrap(), 0.0);
    assert_eq!(mass.voxel_mass(7).unwrap(), 1.85 * 8.0);
}

#[rstest]
fn partial_lookup_miss_is_an_error(nested_scene: Scene) {
    let grid = Grid::new([1, 1, 1], [4.0; 3]);
    let mut mass = VoxelizedMass::initialize(&nested_scene, "world", grid, None).unwrap();

    assert_eq!(mass.partial_volume(0, "world").unwrap(), 56.0);
    assert!(mass.partial_mass(0, "nowhere").is_err());
    assert!(mass.partial_volume(0, "nowhere").is_err());
}

#[rstest]
fn energy_and_dose(nested_scene: Scene) {
    let grid = Grid::new([1, 1, 1], [4.0; 3]);
    let mut mass = VoxelizedMass::initialize(&nested_scene, "world", grid, None).unwrap();

    // nothing deposited yet
    assert_eq!(mass.max_dose_fraction(0).unwrap(), 0.0);

    mass.accumulate_energy(0, "cube", 0.25).unwrap();
    mass.accumulate_energy(0, "cube", 0.5).unwrap();
    assert_eq!(mass.dosel(0).unwrap().energy["cube"], 0.75);

    let cube_mass = mass.partial_mass(0, "cube").unwrap();
    assert_eq!(mass.max_dose_fraction(0).unwrap(), 0.75 / cube_mass);

    // more energy in the water takes over
    mass.accumulate_energy(0, "world", 3.0).unwrap();
    assert_eq!(mass.max_dose_fraction(0).unwrap(), 3.0 / 56.0);
}

#[test]
fn mismatched_mass_image_is_fatal() {
    let scene = voxel_scene(VoxelArray::uniform([2, 2, 2], [1.0; 3], "Water"));
    let grid = Grid::new([2, 2, 2], [1.0; 3]);
    let image = Image::new(Grid::new([3, 3, 3], [1.0; 3]));

    let result = VoxelizedMass::initialize(&scene, "container", grid, Some(&image));
    assert!(matches!(
        result,
        Err(Error::MassImageMismatch {
            expected_resolution: [2, 2, 2],
            found_resolution: [3, 3, 3],
            ..
        })
    ));
}

#[test]
fn mismatched_mass_image_volume_is_fatal() {
    let scene = voxel_scene(VoxelArray::uniform([2, 2, 2], [1.0; 3], "Water"));
    let grid = Grid::new([2, 2, 2], [1.0; 3]);
    let image = Image::new(Grid::new([2, 2, 2], [1.0, 1.0, 1.001]));
    assert!(VoxelizedMass::initialize(&scene, "container", grid, Some(&image)).is_err());
}

#[test]
fn dosels_finer_than_voxels_are_fatal() {
    let scene = voxel_scene(VoxelArray::uniform([2, 2, 2], [1.0; 3], "Water"));
    let grid = Grid::new([4, 4, 4], [0.5; 3]);
    assert!(matches!(
        VoxelizedMass::initialize(&scene, "container", grid, None),
        Err(Error::DoselFinerThanVoxel { .. })
    ));
}

#[test]
fn unknown_volume() {
    let scene = voxel_scene(VoxelArray::uniform([2, 2, 2], [1.0; 3], "Water"));
    let grid = Grid::new([2, 2, 2], [1.0; 3]);
    assert!(matches!(
        VoxelizedMass::initialize(&scene, "patient", grid, None),
        Err(Error::VolumeNotFound(_))
    ));
}
