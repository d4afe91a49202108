//! Primitive shapes and the boolean solid expressions built from them
//!
//! Reconstruction only ever needs one question answered about a boolean
//! solid: its cubic volume. [Solid::cubic_volume] is exact whenever every
//! primitive is a box with an axis-aligned orientation, which covers dosels
//! over box-built geometries. Anything else falls back to a deterministic
//! midpoint lattice estimate over the bounding box of the expression.

// internal modules
use crate::utils::product;

// external crates
use itertools::iproduct;
use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};

/// Lattice points per axis used by [Solid::cubic_volume] when no exact
/// decomposition exists
pub const LATTICE_SAMPLES: usize = 64;

/// Primitive shapes, centred on their own origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Rectangular box
    Box {
        /// Half of the side length on each axis
        half_lengths: [f64; 3],
    },
    /// Full sphere
    Sphere {
        /// Outer radius
        radius: f64,
    },
    /// Cylinder or cylindrical shell along z
    Tube {
        /// Inner radius, zero for a full cylinder
        #[serde(default)]
        inner_radius: f64,
        /// Outer radius
        outer_radius: f64,
        /// Half of the length along z
        half_length: f64,
    },
}

impl Shape {
    /// Box from its half lengths
    pub fn cuboid(half_lengths: [f64; 3]) -> Self {
        Self::Box { half_lengths }
    }

    /// Point containment in the shape's own frame, boundaries included
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        match *self {
            Self::Box { half_lengths: h } => {
                p.x.abs() <= h[0] && p.y.abs() <= h[1] && p.z.abs() <= h[2]
            }
            Self::Sphere { radius } => p.coords.norm_squared() <= radius * radius,
            Self::Tube {
                inner_radius,
                outer_radius,
                half_length,
            } => {
                let r2 = p.x * p.x + p.y * p.y;
                p.z.abs() <= half_length
                    && r2 <= outer_radius * outer_radius
                    && r2 >= inner_radius * inner_radius
            }
        }
    }

    /// Bounding box in the shape's own frame
    pub fn local_bounds(&self) -> Aabb {
        let h = match *self {
            Self::Box { half_lengths } => half_lengths,
            Self::Sphere { radius } => [radius; 3],
            Self::Tube {
                outer_radius,
                half_length,
                ..
            } => [outer_radius, outer_radius, half_length],
        };
        Aabb::new([-h[0], -h[1], -h[2]], h)
    }

    /// Analytic cubic volume of the whole shape
    ///
    /// ```rust
    /// # use doselmass::geometry::Shape;
    /// assert_eq!(Shape::cuboid([1.0, 2.0, 0.5]).cubic_volume(), 8.0);
    /// ```
    pub fn cubic_volume(&self) -> f64 {
        match *self {
            Self::Box { half_lengths } => 8.0 * product(&half_lengths),
            Self::Sphere { radius } => 4.0 / 3.0 * std::f64::consts::PI * radius.powi(3),
            Self::Tube {
                inner_radius,
                outer_radius,
                half_length,
            } => {
                std::f64::consts::PI
                    * (outer_radius * outer_radius - inner_radius * inner_radius)
                    * 2.0
                    * half_length
            }
        }
    }
}

/// Axis-aligned box given by its two opposite corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower corner
    pub min: [f64; 3],
    /// Upper corner
    pub max: [f64; 3],
}

impl Aabb {
    /// Box from its two corners
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// True when the box has no thickness on at least one axis
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.max[axis] <= self.min[axis])
    }

    /// Cubic volume, zero for empty boxes
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            product(&[0, 1, 2].map(|axis| self.max[axis] - self.min[axis]))
        }
    }

    /// Common region of two boxes, if it has any volume
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let overlap = Aabb::new(
            [0, 1, 2].map(|axis| self.min[axis].max(other.min[axis])),
            [0, 1, 2].map(|axis| self.max[axis].min(other.max[axis])),
        );
        (!overlap.is_empty()).then_some(overlap)
    }

    /// Disjoint boxes covering `self` minus `cut`
    ///
    /// At most six slabs are produced, peeled off one axis at a time.
    ///
    /// ```rust
    /// # use doselmass::geometry::Aabb;
    /// let outer = Aabb::new([0.0; 3], [3.0; 3]);
    /// let inner = Aabb::new([1.0; 3], [2.0; 3]);
    /// let pieces = outer.subtract(&inner);
    /// assert_eq!(pieces.len(), 6);
    /// assert_eq!(pieces.iter().map(|p| p.volume()).sum::<f64>(), 26.0);
    /// ```
    pub fn subtract(&self, cut: &Aabb) -> Vec<Aabb> {
        let Some(common) = self.intersection(cut) else {
            return vec![*self];
        };

        let mut pieces = Vec::with_capacity(6);
        let mut rest = *self;
        for axis in 0..3 {
            if rest.min[axis] < common.min[axis] {
                let mut lower = rest;
                lower.max[axis] = common.min[axis];
                pieces.push(lower);
            }
            if common.max[axis] < rest.max[axis] {
                let mut upper = rest;
                upper.min[axis] = common.max[axis];
                pieces.push(upper);
            }
            rest.min[axis] = common.min[axis];
            rest.max[axis] = common.max[axis];
        }
        pieces
    }

    /// Bounding box of this box after a rigid transform
    pub fn transformed(&self, pose: &Isometry3<f64>) -> Aabb {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for (&x, &y, &z) in iproduct!(
            &[self.min[0], self.max[0]],
            &[self.min[1], self.max[1]],
            &[self.min[2], self.max[2]]
        ) {
            let p = pose.transform_point(&Point3::new(x, y, z));
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Aabb::new(min, max)
    }
}

/// Boolean expression of placed primitives, all in one common frame
///
/// ```rust
/// # use doselmass::geometry::{Shape, Solid};
/// # use nalgebra::Isometry3;
/// let block = Solid::new(Shape::cuboid([2.0, 2.0, 2.0]));
/// let probe = Solid::placed(
///     Shape::cuboid([1.0, 1.0, 1.0]),
///     Isometry3::translation(2.0, 0.0, 0.0),
/// );
///
/// // half of the probe sticks out of the block
/// assert_eq!(block.clone().intersect(probe.clone()).cubic_volume(), 4.0);
/// assert_eq!(block.subtract(probe).cubic_volume(), 60.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Solid {
    /// A primitive shape under a rigid transform
    Placed {
        /// The primitive
        shape: Shape,
        /// Pose of the primitive's centre
        pose: Isometry3<f64>,
    },
    /// Region common to both solids
    Intersection(Box<Solid>, Box<Solid>),
    /// Region of the first solid not covered by the second
    Subtraction(Box<Solid>, Box<Solid>),
}

impl Solid {
    /// Primitive left at the origin
    pub fn new(shape: Shape) -> Self {
        Self::placed(shape, Isometry3::identity())
    }

    /// Primitive under a rigid transform
    pub fn placed(shape: Shape, pose: Isometry3<f64>) -> Self {
        Self::Placed { shape, pose }
    }

    /// Apply a further rigid transform to the whole expression
    pub fn transformed(self, transform: &Isometry3<f64>) -> Self {
        match self {
            Self::Placed { shape, pose } => Self::Placed {
                shape,
                pose: transform * pose,
            },
            Self::Intersection(a, b) => Self::Intersection(
                Box::new(a.transformed(transform)),
                Box::new(b.transformed(transform)),
            ),
            Self::Subtraction(a, b) => Self::Subtraction(
                Box::new(a.transformed(transform)),
                Box::new(b.transformed(transform)),
            ),
        }
    }

    /// Boolean intersection
    pub fn intersect(self, other: Solid) -> Self {
        Self::Intersection(Box::new(self), Box::new(other))
    }

    /// Boolean subtraction
    pub fn subtract(self, other: Solid) -> Self {
        Self::Subtraction(Box::new(self), Box::new(other))
    }

    /// Point containment, boundaries included
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        match self {
            Self::Placed { shape, pose } => shape.contains(&pose.inverse_transform_point(p)),
            Self::Intersection(a, b) => a.contains(p) && b.contains(p),
            Self::Subtraction(a, b) => a.contains(p) && !b.contains(p),
        }
    }

    /// Bounding box, `None` when the solid is provably empty
    pub fn bounds(&self) -> Option<Aabb> {
        match self {
            Self::Placed { shape, pose } => Some(shape.local_bounds().transformed(pose)),
            Self::Intersection(a, b) => a.bounds()?.intersection(&b.bounds()?),
            Self::Subtraction(a, _) => a.bounds(),
        }
    }

    /// Cubic volume of the expression
    ///
    /// Exact for axis-aligned box expressions, otherwise estimated with
    /// [LATTICE_SAMPLES] points per axis.
    pub fn cubic_volume(&self) -> f64 {
        match self.boxes() {
            Some(boxes) => boxes.iter().map(|b| b.volume()).sum(),
            None => self.estimate_cubic_volume(LATTICE_SAMPLES),
        }
    }

    /// Midpoint lattice estimate of the cubic volume
    ///
    /// Samples `n^3` cell centres of the bounding box. Regions that cover the
    /// whole bounding box come out exact.
    pub fn estimate_cubic_volume(&self, samples_per_axis: usize) -> f64 {
        let Some(bounds) = self.bounds() else {
            return 0.0;
        };
        let n = samples_per_axis.max(1);
        let step = [0, 1, 2].map(|axis| (bounds.max[axis] - bounds.min[axis]) / n as f64);
        let at = |axis: usize, i: usize| bounds.min[axis] + (i as f64 + 0.5) * step[axis];

        let inside = iproduct!(0..n, 0..n, 0..n)
            .filter(|&(i, j, k)| self.contains(&Point3::new(at(0, i), at(1, j), at(2, k))))
            .count();

        if inside == n * n * n {
            bounds.volume()
        } else {
            bounds.volume() * inside as f64 / (n * n * n) as f64
        }
    }

    /// Exact decomposition into disjoint axis-aligned boxes, if one exists
    fn boxes(&self) -> Option<Vec<Aabb>> {
        match self {
            Self::Placed {
                shape: Shape::Box { half_lengths },
                pose,
            } => {
                let aabb = aligned_box(half_lengths, pose)?;
                Some(if aabb.is_empty() { vec![] } else { vec![aabb] })
            }
            Self::Placed { .. } => None,
            Self::Intersection(a, b) => {
                let (a, b) = (a.boxes()?, b.boxes()?);
                Some(
                    iproduct!(&a, &b)
                        .filter_map(|(x, y)| x.intersection(y))
                        .collect(),
                )
            }
            Self::Subtraction(a, b) => {
                let mut pieces = a.boxes()?;
                for cut in b.boxes()? {
                    pieces = pieces.iter().flat_map(|p| p.subtract(&cut)).collect();
                }
                Some(pieces)
            }
        }
    }
}

/// Axis-aligned box for a box primitive, if its rotation only permutes axes
fn aligned_box(half_lengths: &[f64; 3], pose: &Isometry3<f64>) -> Option<Aabb> {
    let rotation = pose.rotation.to_rotation_matrix();
    let m = rotation.matrix();

    let mut half = [0.0; 3];
    for (row, h) in half.iter_mut().enumerate() {
        for (col, length) in half_lengths.iter().enumerate() {
            let v = m[(row, col)];
            if (v.abs() - 1.0).abs() < 1e-12 {
                *h += length;
            } else if v.abs() >= 1e-12 {
                return None;
            }
        }
    }

    let c = pose.translation.vector;
    Some(Aabb::new(
        [c[0] - half[0], c[1] - half[1], c[2] - half[2]],
        [c[0] + half[0], c[1] + half[1], c[2] + half[2]],
    ))
}
