//! Partial overlap of a dosel with the voxels it covers
//!
//! # Details
//!
//! Along each axis the dosel covers `[min, max)` in voxel units. The voxels
//! between `round(min)` and `round(max) - 1` are the nominal range, and the
//! boundary voxels are either whole (aligned) or split.
//!
//! A boundary is split when its fractional part is above
//! [ALIGNMENT_TOLERANCE]. Rounding to the nearest integer means a split lower
//! boundary with a fractional part `>= 0.5` belongs to the voxel *before* the
//! nominal range, and a split upper boundary with a fractional part `< 0.5`
//! belongs to the voxel *after* it. Those exact half-open comparisons are
//! what keeps neighbouring dosels from leaving gaps or counting a voxel
//! twice, so they must not be relaxed.
//!
//! | Lower split | Upper split | Voxels and weights                          |
//! | ----------- | ----------- | ------------------------------------------- |
//! | no          | no          | `x: 1`                                      |
//! | `f >= 0.5`  | -           | `x-1: 1-f`, `x: 1`                          |
//! | `f < 0.5`   | -           | `x: 1-f`                                    |
//! | -           | `g < 0.5`   | `x: 1`, `x+1: g`                            |
//! | -           | `g >= 0.5`  | `x: g`                                      |
//!
//! When both boundaries land on the same nominal voxel the two rules combine,
//! and if both fall inside a single voxel the weight is simply `g - f`.
//!
//! The three axes are independent, so the weight of voxel `(x, y, z)` is the
//! product of the three axis weights.

// internal modules
use crate::error::{Error, Result};
use crate::grid::DoselBounds;
use crate::utils::fractional;

// external crates
use itertools::iproduct;

/// Fractional parts below this are treated as aligned to a voxel boundary
pub const ALIGNMENT_TOLERANCE: f64 = 1e-8;

/// Split threshold deciding which neighbour a boundary voxel belongs to
const HALF: f64 = 0.5;

/// Unchecked per-axis voxel indices and overlap weights
///
/// Returns the ordered `(voxel index, weight)` pairs covering `[min, max)`.
/// The weights always sum to `max - min`. Indices are signed since nothing
/// here knows the size of the grid, see [OverlapWeights::resolve] for the
/// checked version.
///
/// ```rust
/// # use doselmass::grid::axis_weights;
/// // fully aligned, one whole voxel
/// assert_eq!(axis_weights(2.0, 3.0), vec![(2, 1.0)]);
///
/// // split over two voxels
/// assert_eq!(axis_weights(0.25, 1.25), vec![(0, 0.75), (1, 0.25)]);
/// ```
pub fn axis_weights(min: f64, max: f64) -> Vec<(i64, f64)> {
    let lo = min.round() as i64;
    let hi = max.round() as i64;

    let f_min = fractional(min);
    let f_max = fractional(max);
    let split_low = f_min > ALIGNMENT_TOLERANCE;
    let split_high = f_max > ALIGNMENT_TOLERANCE;

    let mut weights = Vec::with_capacity((hi - lo).max(0) as usize + 2);

    for x in lo..hi {
        let is_min = x == lo && split_low;
        let is_max = x == hi - 1 && split_high;

        match (is_min, is_max) {
            (true, true) => {
                if f_min >= HALF && f_max < HALF {
                    weights.push((x - 1, 1.0 - f_min));
                    weights.push((x, 1.0));
                    weights.push((x + 1, f_max));
                } else if f_min >= HALF {
                    weights.push((x - 1, 1.0 - f_min));
                    weights.push((x, f_max));
                } else if f_max < HALF {
                    weights.push((x, 1.0 - f_min));
                    weights.push((x + 1, f_max));
                } else {
                    // both boundaries inside voxel x
                    weights.push((x, f_max - f_min));
                }
            }
            (true, false) => {
                if f_min >= HALF {
                    weights.push((x - 1, 1.0 - f_min));
                    weights.push((x, 1.0));
                } else {
                    weights.push((x, 1.0 - f_min));
                }
            }
            (false, true) => {
                if f_max < HALF {
                    weights.push((x, 1.0));
                    weights.push((x + 1, f_max));
                } else {
                    weights.push((x, f_max));
                }
            }
            (false, false) => weights.push((x, 1.0)),
        }
    }

    weights
}

/// Per-axis voxel overlap of a single dosel
///
/// Every index is guaranteed to be inside the voxel grid it was resolved
/// against.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapWeights {
    /// Ordered `(voxel index, weight)` pairs for x, y, and z
    pub axes: [Vec<(usize, f64)>; 3],
}

impl OverlapWeights {
    /// Resolve the covered voxels of dosel `index` against a voxel resolution
    ///
    /// Fails if the dosel reaches outside of the voxel grid on any axis, as
    /// that means the grids are inconsistent with the declared resolution.
    pub fn resolve(index: usize, bounds: &DoselBounds, resolution: [usize; 3]) -> Result<Self> {
        let mut axes: [Vec<(usize, f64)>; 3] = Default::default();

        for axis in 0..3 {
            let (min, max) = (bounds.min[axis], bounds.max[axis]);
            let voxels = resolution[axis];
            let outside = || Error::DoselOutsideVoxelGrid {
                index,
                axis,
                min,
                max,
                voxels,
            };

            if min < -ALIGNMENT_TOLERANCE || max > voxels as f64 + ALIGNMENT_TOLERANCE {
                return Err(outside());
            }

            axes[axis] = axis_weights(min, max)
                .into_iter()
                .map(|(x, w)| match usize::try_from(x) {
                    Ok(x) if x < voxels => Ok((x, w)),
                    _ => Err(outside()),
                })
                .collect::<Result<Vec<(usize, f64)>>>()?;
        }

        Ok(Self { axes })
    }

    /// Sum of the weights along one axis, should always be `max - min`
    pub fn axis_sum(&self, axis: usize) -> f64 {
        self.axes[axis].iter().map(|(_, w)| w).sum()
    }

    /// Number of voxels contributing to the dosel
    pub fn len(&self) -> usize {
        self.axes.iter().map(|a| a.len()).product()
    }

    /// True if no voxel contributes at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every covered voxel with the product of its three axis weights
    pub fn iter(&self) -> impl Iterator<Item = ([usize; 3], f64)> + '_ {
        iproduct!(&self.axes[0], &self.axes[1], &self.axes[2])
            .map(|(&(x, wx), &(y, wy), &(z, wz))| ([x, y, z], wx * wy * wz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Small deterministic generator, keeps the fuzzing reproducible
    struct TestRng {
        state: u64,
    }

    impl TestRng {
        fn new(seed: u64) -> Self {
            Self { state: seed }
        }

        fn next_f64(&mut self) -> f64 {
            self.state = self
                .state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.state >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    fn total(weights: &[(i64, f64)]) -> f64 {
        weights.iter().map(|(_, w)| w).sum()
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(3.0, 4.0)]
    #[case(0.0, 2.0)]
    fn aligned_voxels_are_whole(#[case] min: f64, #[case] max: f64) {
        let weights = axis_weights(min, max);
        assert!(weights.iter().all(|(_, w)| *w == 1.0));
        assert_eq!(weights.len(), (max - min) as usize);
        assert_eq!(weights[0].0, min as i64);
    }

    #[rstest]
    #[case(0.25, 1.25, vec![(0, 0.75), (1, 0.25)])]
    #[case(0.75, 1.75, vec![(0, 0.25), (1, 0.75)])]
    #[case(0.5, 1.5, vec![(0, 0.5), (1, 0.5)])]
    #[case(0.75, 2.25, vec![(0, 0.25), (1, 1.0), (2, 0.25)])]
    #[case(0.25, 2.75, vec![(0, 0.75), (1, 1.0), (2, 0.75)])]
    #[case(0.5, 2.0, vec![(0, 0.5), (1, 1.0)])]
    #[case(1.0, 2.5, vec![(1, 1.0), (2, 0.5)])]
    #[case(0.25, 0.75, vec![(0, 0.5)])]
    fn split_voxels(#[case] min: f64, #[case] max: f64, #[case] expected: Vec<(i64, f64)>) {
        assert_eq!(axis_weights(min, max), expected);
    }

    #[test]
    fn two_voxel_split_sums_to_one() {
        for f in [0.1, 0.25, 0.4, 0.5, 0.6, 0.9] {
            let (min, max) = (3.0 + f, 4.0 + f);
            let weights = axis_weights(min, max);
            assert_eq!(weights.len(), 2);
            assert_eq!(weights[0], (3, 1.0 - fractional(min)));
            assert_eq!(weights[1], (4, fractional(max)));
            assert!((total(&weights) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn weights_cover_the_exact_extent() {
        let mut rng = TestRng::new(42);
        for _ in 0..10_000 {
            let width = 1.0 + 4.0 * rng.next_f64();
            let min = 10.0 * rng.next_f64();
            let max = min + width;
            let weights = axis_weights(min, max);

            assert!(
                (total(&weights) - (max - min)).abs() < 1e-9,
                "[{min}, {max}) gave {weights:?}"
            );

            // ordered, contiguous, never repeating a voxel
            for pair in weights.windows(2) {
                assert_eq!(pair[1].0, pair[0].0 + 1, "[{min}, {max}) gave {weights:?}");
            }
            assert!(weights.iter().all(|(_, w)| *w > 0.0 && *w <= 1.0));
        }
    }

    #[test]
    fn neighbouring_dosels_share_voxels_without_overlap() {
        // 3 dosels of 1.5 voxels covering [0.25, 4.75)
        let mut coverage = [0.0; 6];
        for d in 0..3 {
            let min = 0.25 + 1.5 * d as f64;
            for (x, w) in axis_weights(min, min + 1.5) {
                coverage[x as usize] += w;
            }
        }
        assert_eq!(coverage, [0.75, 1.0, 1.0, 1.0, 0.75, 0.0]);
    }

    #[test]
    fn resolve_aligned() {
        let bounds = DoselBounds {
            min: [0.0, 1.0, 2.0],
            max: [1.0, 2.0, 3.0],
        };
        let overlap = OverlapWeights::resolve(0, &bounds, [3, 3, 3]).unwrap();
        assert_eq!(overlap.len(), 1);
        assert_eq!(overlap.iter().collect::<Vec<_>>(), vec![([0, 1, 2], 1.0)]);
    }

    #[test]
    fn resolve_products() {
        let bounds = DoselBounds {
            min: [0.5, 0.0, 0.0],
            max: [1.5, 1.0, 2.0],
        };
        let overlap = OverlapWeights::resolve(0, &bounds, [2, 2, 2]).unwrap();
        let weights = overlap.iter().collect::<Vec<_>>();
        assert_eq!(
            weights,
            vec![
                ([0, 0, 0], 0.5),
                ([0, 0, 1], 0.5),
                ([1, 0, 0], 0.5),
                ([1, 0, 1], 0.5)
            ]
        );
        assert_eq!(overlap.axis_sum(0), 1.0);
        assert_eq!(overlap.axis_sum(2), 2.0);
    }

    #[rstest]
    #[case([-0.5, 0.0, 0.0], [0.5, 1.0, 1.0])]
    #[case([1.5, 0.0, 0.0], [2.5, 1.0, 1.0])]
    #[case([0.0, 0.0, 1.25], [1.0, 1.0, 2.25])]
    fn resolve_outside_grid(#[case] min: [f64; 3], #[case] max: [f64; 3]) {
        let bounds = DoselBounds { min, max };
        let result = OverlapWeights::resolve(3, &bounds, [2, 2, 2]);
        assert!(matches!(
            result,
            Err(Error::DoselOutsideVoxelGrid { index: 3, .. })
        ));
    }
}
