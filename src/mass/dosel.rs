//! Memoised per-dosel results

// standard library
use std::collections::BTreeMap;

// internal modules
use crate::mass::Reconstruction;

// external crates
use serde::Serialize;

/// Everything known about a single dosel
///
/// Mass and volume stay `None` until the dosel is reconstructed. Energy is
/// only ever written by the caller and accumulates for the whole session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoselResult {
    /// Total reconstructed mass
    pub mass: Option<f64>,
    /// Total reconstructed cubic volume
    pub cubic_volume: Option<f64>,
    /// Cubic volume of every sub-volume touching the dosel
    pub partial_volumes: BTreeMap<String, f64>,
    /// Mass of every sub-volume touching the dosel
    pub partial_masses: BTreeMap<String, f64>,
    /// Deposited energy per sub-volume
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub energy: BTreeMap<String, f64>,
}

impl DoselResult {
    /// Whether the dosel has been reconstructed yet
    pub fn is_computed(&self) -> bool {
        self.mass.is_some()
    }

    /// Store a reconstruction, the first entry for a repeated name is kept
    pub fn store(&mut self, reconstruction: Reconstruction) {
        self.mass = Some(reconstruction.mass);
        self.cubic_volume = Some(reconstruction.cubic_volume);
        for partial in reconstruction.partials {
            self.partial_volumes
                .entry(partial.name.clone())
                .or_insert(partial.cubic_volume);
            self.partial_masses
                .entry(partial.name)
                .or_insert(partial.mass);
        }
    }

    /// Add energy to a sub-volume, creating it on first use
    pub fn accumulate(&mut self, name: &str, energy: f64) {
        *self.energy.entry(name.to_string()).or_insert(0.0) += energy;
    }

    /// Sub-volume with the largest deposited energy
    ///
    /// Only strictly positive totals count, and ties go to the first name in
    /// lexical order.
    pub fn max_energy(&self) -> Option<(&str, f64)> {
        self.energy
            .iter()
            .fold(None, |best: Option<(&str, f64)>, (name, &e)| match best {
                Some((_, max)) if e <= max => best,
                _ if e > 0.0 => Some((name.as_str(), e)),
                _ => best,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mass::PartialContribution;

    #[test]
    fn duplicate_names_keep_the_first() {
        let mut dosel = DoselResult::default();
        assert!(!dosel.is_computed());

        dosel.store(Reconstruction {
            mass: 3.0,
            cubic_volume: 2.0,
            partials: vec![
                PartialContribution {
                    name: "cell".to_string(),
                    cubic_volume: 1.0,
                    mass: 1.0,
                },
                PartialContribution {
                    name: "cell".to_string(),
                    cubic_volume: 1.0,
                    mass: 2.0,
                },
            ],
        });

        assert!(dosel.is_computed());
        assert_eq!(dosel.partial_masses.len(), 1);
        assert_eq!(dosel.partial_masses["cell"], 1.0);
    }

    #[test]
    fn accumulate_and_maximum() {
        let mut dosel = DoselResult::default();
        assert_eq!(dosel.max_energy(), None);

        dosel.accumulate("b", 1.0);
        dosel.accumulate("a", 0.5);
        dosel.accumulate("a", 0.5);
        dosel.accumulate("c", 0.25);

        assert_eq!(dosel.energy["a"], 1.0);
        assert_eq!(dosel.max_energy(), Some(("a", 1.0)));

        dosel.accumulate("c", 2.0);
        assert_eq!(dosel.max_energy(), Some(("c", 2.25)));
    }

    #[test]
    fn zero_energy_has_no_maximum() {
        let mut dosel = DoselResult::default();
        dosel.accumulate("a", 0.0);
        assert_eq!(dosel.max_energy(), None);
    }
}
