//! Walker Delta constellation layout
//!
//! Derives one element set per satellite from global shell parameters.
//! Every satellite shares eccentricity, argument of perigee, inclination,
//! mean motion and epoch; only RAAN and mean anomaly vary.
//!
//! ## Formulas
//!
//! For orbit `o ∈ 1..=O` and slot `s ∈ 1..=S`:
//!
//! ```text
//! catalog        = (o - 1)·S + s
//! mean_anomaly   = ((360/S) · s · (1 + f/O)) mod 360
//! mean_motion    = rev_per_day · 360 / 1440          (deg/min)
//! raan           = (360/O) · o
//! ```
//!
//! `f` is an unconstrained integer phase factor. Only the literal formula
//! above is applied; no Walker `T/P/F` range is assumed for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{OrbitalError, Result};

const DEGREES_PER_REV: f64 = 360.0;
const MINUTES_PER_DAY: f64 = 1440.0;

/// Global shell parameters for a homogeneous constellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationSpec {
    pub name: String,
    /// Number of orbital planes (O)
    pub orbit_count: i64,
    /// Satellites per plane (S)
    pub sats_per_orbit: i64,
    /// Phase factor (f)
    pub phase_factor: i64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub inclination_deg: f64,
    pub mean_motion_rev_per_day: f64,
    pub epoch: DateTime<Utc>,
}

/// Orbital elements for one satellite of the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteElementSet {
    /// Plane index, 1-based
    pub orbit_index: u32,
    /// Slot within the plane, 1-based
    pub slot_index: u32,
    /// Unique in `1..=O·S`
    pub catalog_number: u32,
    pub raan_deg: f64,
    /// Reduced into `[0, 360)`
    pub mean_anomaly_deg: f64,
    pub mean_motion_deg_per_min: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub inclination_deg: f64,
    pub epoch: DateTime<Utc>,
}

impl SatelliteElementSet {
    /// Satellite name within a constellation: `<constellation>_<orbit>_<slot>`
    pub fn name(&self, constellation: &str) -> String {
        format!("{}_{}_{}", constellation, self.orbit_index, self.slot_index)
    }

    pub fn mean_motion_rev_per_day(&self) -> f64 {
        self.mean_motion_deg_per_min * MINUTES_PER_DAY / DEGREES_PER_REV
    }
}

/// Walker Delta geometry: O planes of S satellites with phase factor f.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkerDelta {
    planes: u32,
    sats_per_plane: u32,
    phasing: i64,
}

impl WalkerDelta {
    /// Validate plane and slot counts.
    ///
    /// Both counts must be positive and `O·S` must fit a catalog number.
    pub fn new(planes: i64, sats_per_plane: i64, phasing: i64) -> Result<Self> {
        let mut problems = Vec::new();
        if planes <= 0 {
            problems.push(format!("orbit count must be >= 1, got {}", planes));
        }
        if sats_per_plane <= 0 {
            problems.push(format!(
                "satellites per orbit must be >= 1, got {}",
                sats_per_plane
            ));
        }
        if !problems.is_empty() {
            return Err(OrbitalError::Layout(problems.join("; ")));
        }

        let planes = u32::try_from(planes)
            .map_err(|_| OrbitalError::Layout(format!("orbit count {} too large", planes)))?;
        let sats_per_plane = u32::try_from(sats_per_plane).map_err(|_| {
            OrbitalError::Layout(format!("satellites per orbit {} too large", sats_per_plane))
        })?;
        if planes.checked_mul(sats_per_plane).is_none() {
            return Err(OrbitalError::Layout(format!(
                "{} x {} satellites exceeds the catalog number range",
                planes, sats_per_plane
            )));
        }

        Ok(Self {
            planes,
            sats_per_plane,
            phasing,
        })
    }

    pub fn from_spec(spec: &ConstellationSpec) -> Result<Self> {
        Self::new(spec.orbit_count, spec.sats_per_orbit, spec.phase_factor)
    }

    pub fn planes(&self) -> u32 {
        self.planes
    }

    pub fn satellites_per_plane(&self) -> u32 {
        self.sats_per_plane
    }

    pub fn total_satellites(&self) -> u32 {
        self.planes * self.sats_per_plane
    }

    pub fn plane_spacing_deg(&self) -> f64 {
        DEGREES_PER_REV / self.planes as f64
    }

    pub fn in_plane_spacing_deg(&self) -> f64 {
        DEGREES_PER_REV / self.sats_per_plane as f64
    }

    pub fn catalog_number(&self, orbit_index: u32, slot_index: u32) -> u32 {
        (orbit_index - 1) * self.sats_per_plane + slot_index
    }

    pub fn raan_deg(&self, orbit_index: u32) -> f64 {
        self.plane_spacing_deg() * orbit_index as f64
    }

    pub fn mean_anomaly_deg(&self, slot_index: u32) -> f64 {
        let phase = 1.0 + self.phasing as f64 / self.planes as f64;
        let angle = (self.in_plane_spacing_deg() * slot_index as f64 * phase)
            .rem_euclid(DEGREES_PER_REV);
        // rem_euclid can round a tiny negative product up to exactly 360
        if angle >= DEGREES_PER_REV {
            0.0
        } else {
            angle
        }
    }

    /// Element sets for the whole shell, orbit-major then slot.
    pub fn generate(&self, spec: &ConstellationSpec) -> Vec<SatelliteElementSet> {
        let mean_motion_deg_per_min =
            spec.mean_motion_rev_per_day * DEGREES_PER_REV / MINUTES_PER_DAY;

        let mut sets = Vec::with_capacity(self.total_satellites() as usize);
        for orbit_index in 1..=self.planes {
            let raan_deg = self.raan_deg(orbit_index);
            for slot_index in 1..=self.sats_per_plane {
                sets.push(SatelliteElementSet {
                    orbit_index,
                    slot_index,
                    catalog_number: self.catalog_number(orbit_index, slot_index),
                    raan_deg,
                    mean_anomaly_deg: self.mean_anomaly_deg(slot_index),
                    mean_motion_deg_per_min,
                    eccentricity: spec.eccentricity,
                    arg_perigee_deg: spec.arg_perigee_deg,
                    inclination_deg: spec.inclination_deg,
                    epoch: spec.epoch,
                });
            }
        }
        sets
    }
}

/// Lay out every satellite of `spec`; fails before producing anything when
/// the plane or slot count is not positive.
pub fn layout(spec: &ConstellationSpec) -> Result<Vec<SatelliteElementSet>> {
    let walker = WalkerDelta::from_spec(spec)?;
    let sets = walker.generate(spec);
    tracing::debug!(
        constellation = %spec.name,
        planes = walker.planes(),
        per_plane = walker.satellites_per_plane(),
        "laid out {} satellites",
        sets.len()
    );
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn spec(orbits: i64, per_orbit: i64, f: i64) -> ConstellationSpec {
        ConstellationSpec {
            name: "test".to_string(),
            orbit_count: orbits,
            sats_per_orbit: per_orbit,
            phase_factor: f,
            eccentricity: 0.0001,
            arg_perigee_deg: 90.0,
            inclination_deg: 53.0,
            mean_motion_rev_per_day: 15.06,
            epoch: Utc.with_ymd_and_hms(2023, 2, 24, 11, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_three_by_two_shell() {
        let sets = layout(&spec(3, 2, 0)).unwrap();
        assert_eq!(sets.len(), 6);

        let catalog: Vec<u32> = sets.iter().map(|s| s.catalog_number).collect();
        assert_eq!(catalog, vec![1, 2, 3, 4, 5, 6]);

        let order: Vec<(u32, u32)> = sets.iter().map(|s| (s.orbit_index, s.slot_index)).collect();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 1), (2, 2), (3, 1), (3, 2)]);

        let raans: Vec<f64> = sets.iter().map(|s| s.raan_deg).collect();
        assert_eq!(raans, vec![120.0, 120.0, 240.0, 240.0, 360.0, 360.0]);

        // f = 0: slot 1 sits at 180 deg, slot 2 wraps to 0
        for set in &sets {
            let expected = if set.slot_index == 1 { 180.0 } else { 0.0 };
            assert!((set.mean_anomaly_deg - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_shared_elements_copied() {
        let spec = spec(2, 3, 1);
        for set in layout(&spec).unwrap() {
            assert_eq!(set.eccentricity, spec.eccentricity);
            assert_eq!(set.arg_perigee_deg, spec.arg_perigee_deg);
            assert_eq!(set.inclination_deg, spec.inclination_deg);
            assert_eq!(set.epoch, spec.epoch);
            assert!((set.mean_motion_deg_per_min - 15.06 * 0.25).abs() < 1e-12);
            assert!((set.mean_motion_rev_per_day() - 15.06).abs() < 1e-12);
        }
    }

    #[test]
    fn test_phase_factor_shifts_mean_anomaly() {
        // (360/4) * 1 * (1 + 1/2) = 135
        let walker = WalkerDelta::new(2, 4, 1).unwrap();
        assert!((walker.mean_anomaly_deg(1) - 135.0).abs() < 1e-12);
        // (360/4) * 3 * 1.5 = 405 -> 45
        assert!((walker.mean_anomaly_deg(3) - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_phase_factor_reduced() {
        // (360/4) * 1 * (1 - 3/1) = -180 -> 180
        let walker = WalkerDelta::new(1, 4, -3).unwrap();
        assert!((walker.mean_anomaly_deg(1) - 180.0).abs() < 1e-12);
    }

    #[test]
    fn test_satellite_names() {
        let sets = layout(&spec(2, 2, 0)).unwrap();
        let names: Vec<String> = sets.iter().map(|s| s.name("starlink")).collect();
        assert_eq!(
            names,
            vec!["starlink_1_1", "starlink_1_2", "starlink_2_1", "starlink_2_2"]
        );
    }

    #[test]
    fn test_non_positive_counts_rejected() {
        assert!(matches!(layout(&spec(0, 2, 0)), Err(OrbitalError::Layout(_))));
        assert!(matches!(layout(&spec(3, 0, 0)), Err(OrbitalError::Layout(_))));
        assert!(matches!(layout(&spec(-1, -1, 0)), Err(OrbitalError::Layout(_))));
    }

    #[test]
    fn test_catalog_overflow_rejected() {
        assert!(matches!(
            WalkerDelta::new(100_000, 100_000, 0),
            Err(OrbitalError::Layout(_))
        ));
    }

    proptest! {
        #[test]
        fn fuzz_catalog_numbers_are_bijective(orbits in 1i64..40, per_orbit in 1i64..40, f in -50i64..50) {
            let sets = layout(&spec(orbits, per_orbit, f)).unwrap();
            let total = (orbits * per_orbit) as usize;
            prop_assert_eq!(sets.len(), total);

            let unique: HashSet<u32> = sets.iter().map(|s| s.catalog_number).collect();
            prop_assert_eq!(unique.len(), total);
            prop_assert!(unique.iter().all(|&c| c >= 1 && c as usize <= total));
        }

        #[test]
        fn fuzz_raan_spacing(orbits in 1i64..60, per_orbit in 1i64..5) {
            let walker = WalkerDelta::new(orbits, per_orbit, 0).unwrap();
            let spacing = 360.0 / orbits as f64;
            for o in 1..orbits as u32 {
                let diff = walker.raan_deg(o + 1) - walker.raan_deg(o);
                prop_assert!((diff - spacing).abs() < 1e-9);
            }
            let last = walker.raan_deg(orbits as u32).rem_euclid(360.0);
            prop_assert!(last < 1e-9 || (360.0 - last) < 1e-9);
        }

        #[test]
        fn fuzz_mean_anomaly_in_range(orbits in 1i64..100, per_orbit in 1i64..100, f in -1000i64..1000) {
            let walker = WalkerDelta::new(orbits, per_orbit, f).unwrap();
            for s in 1..=per_orbit as u32 {
                let m = walker.mean_anomaly_deg(s);
                prop_assert!((0.0..360.0).contains(&m), "mean anomaly {} out of range", m);
            }
        }
    }
}
