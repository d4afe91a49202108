//! Recursive constructive solid geometry accounting over a volume tree

// internal modules
use crate::error::{Error, Result};
use crate::geometry::{MaterialResolver, PhysicalVolume, Shape, Solid};
use crate::grid::Grid;
use crate::mass::{GeometryMode, PartialContribution, Reconstruction, Reconstructor};

// external crates
use log::{debug, trace};
use nalgebra::Isometry3;

/// Volume tree with every material already resolved to a density
#[derive(Debug, Clone)]
struct Node {
    name: String,
    shape: Shape,
    placement: Isometry3<f64>,
    density: f64,
    parameterised: bool,
    daughters: Vec<Node>,
}

impl Node {
    fn build(volume: &PhysicalVolume, materials: &dyn MaterialResolver) -> Result<Self> {
        let parameterised = volume.is_parameterised();
        let density = match parameterised {
            true => 0.0,
            false => materials.density(&volume.material)?,
        };

        Ok(Self {
            name: volume.name.clone(),
            shape: volume.solid,
            placement: volume.placement.isometry(),
            density,
            parameterised,
            daughters: volume
                .daughters
                .iter()
                .map(|d| Node::build(d, materials))
                .collect::<Result<Vec<Node>>>()?,
        })
    }
}

/// Dosel mass from an arbitrary tree of nested solids
///
/// Each volume is intersected with the dosel box, its daughters are carved
/// out of it, and the daughters are then processed recursively. The root
/// volume is the frame of the dosel grid.
///
/// Daughters are assumed to be fully contained in their mother and not to
/// overlap each other.
#[derive(Debug, Clone)]
pub struct HierarchicalReconstructor {
    root: Node,
    dosel_grid: Grid,
    dosel_box: Shape,
}

impl HierarchicalReconstructor {
    /// Resolve the densities of every volume below `root`
    pub fn new(
        root: &PhysicalVolume,
        dosel_grid: Grid,
        materials: &dyn MaterialResolver,
    ) -> Result<Self> {
        let root = Node::build(root, materials)?;
        let dosel_box = Shape::cuboid(dosel_grid.half_voxel());
        debug!("Hierarchy below {} resolved", root.name);

        Ok(Self {
            root,
            dosel_grid,
            dosel_box,
        })
    }

    /// Mass and volume of one node and all of its progeny inside the dosel
    ///
    /// `cumulative` takes the node frame to the root frame.
    fn iterate(
        &self,
        node: &Node,
        depth: usize,
        cumulative: &Isometry3<f64>,
        index: usize,
        partials: &mut Vec<PartialContribution>,
    ) -> Result<(f64, f64)> {
        if node.parameterised {
            return Err(Error::ParameterisedVolume(node.name.clone()));
        }

        // everything is evaluated in the dosel frame, so the bounds of the
        // clipped solid never exceed the dosel box
        let to_dosel = self.dosel_grid.voxel_pose(index).inverse() * cumulative;
        let mut clipped =
            Solid::placed(node.shape, to_dosel).intersect(Solid::new(self.dosel_box));

        if clipped.cubic_volume() == 0.0 {
            return Ok((0.0, 0.0));
        }

        let mut progeny_mass = 0.0;
        let mut progeny_volume = 0.0;

        for daughter in &node.daughters {
            clipped = clipped.subtract(Solid::placed(
                daughter.shape,
                to_dosel * daughter.placement,
            ));

            let (mass, volume) = self.iterate(
                daughter,
                depth + 1,
                &(cumulative * daughter.placement),
                index,
                partials,
            )?;
            progeny_mass += mass;
            progeny_volume += volume;
        }

        let cubic_volume = clipped.cubic_volume();
        let mass = cubic_volume * node.density;
        progeny_mass += mass;
        progeny_volume += cubic_volume;

        if progeny_mass < 0.0 {
            return Err(Error::NegativeMass {
                index,
                mass: progeny_mass,
            });
        }
        // unreachable while solid volumes are non-negative
        if progeny_volume < 0.0 {
            return Err(Error::NegativeVolume {
                index,
                volume: progeny_volume,
            });
        }

        trace!(
            "Dosel {index} depth {depth} {}: volume={cubic_volume} mass={mass}",
            node.name
        );

        partials.push(PartialContribution {
            name: node.name.clone(),
            cubic_volume,
            mass,
        });

        Ok((progeny_mass, progeny_volume))
    }
}

impl Reconstructor for HierarchicalReconstructor {
    fn mode(&self) -> GeometryMode {
        GeometryMode::Hierarchical
    }

    fn number_of_voxels(&self) -> Option<usize> {
        None
    }

    fn reconstruct(&self, index: usize) -> Result<Reconstruction> {
        let mut partials = Vec::new();
        let (mass, cubic_volume) =
            self.iterate(&self.root, 0, &Isometry3::identity(), index, &mut partials)?;

        Ok(Reconstruction {
            mass,
            cubic_volume,
            partials,
        })
    }
}
