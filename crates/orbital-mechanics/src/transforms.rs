//! TEME → Earth-fixed transform and the batched propagation seam
//!
//! SGP4 positions are in the True Equator Mean Equinox frame. Rotating
//! about the z axis by Greenwich mean sidereal time gives the pseudo
//! Earth-fixed frame; polar motion is neglected (metre level).

use std::f64::consts::TAU;

use nalgebra::{Rotation3, Vector3};

use crate::propagation::SatelliteRecord;
use crate::timescale::{TimeGrid, TimeScale};
use crate::{OrbitalError, Result};

const J2000_JD: f64 = 2_451_545.0;
const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

/// Greenwich mean sidereal time (IAU-82), radians in `[0, 2π)`.
pub fn gmst_radians(jd_ut1: f64) -> f64 {
    let t = (jd_ut1 - J2000_JD) / DAYS_PER_JULIAN_CENTURY;
    let seconds = -6.2e-6 * t * t * t
        + 0.093104 * t * t
        + (876_600.0 * 3600.0 + 8_640_184.812866) * t
        + 67_310.54841;
    // 240 sidereal seconds per degree
    (seconds / 240.0).to_radians().rem_euclid(TAU)
}

/// Rotation taking TEME vectors into the Earth-fixed frame.
pub fn teme_to_earth_fixed(gmst: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), -gmst)
}

/// Positions for `satellites × instants`, row-major by satellite.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMatrix {
    instants: usize,
    data: Vec<Vector3<f64>>,
}

impl PositionMatrix {
    pub fn from_rows(rows: Vec<Vec<Vector3<f64>>>, instants: usize) -> Result<Self> {
        let mut data = Vec::with_capacity(rows.len() * instants);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != instants {
                return Err(OrbitalError::Propagation {
                    satellite: format!("row {}", i),
                    instant: row.len(),
                    reason: format!("expected {} samples per satellite", instants),
                });
            }
            data.extend(row);
        }
        Ok(Self { instants, data })
    }

    pub fn satellites(&self) -> usize {
        if self.instants == 0 {
            0
        } else {
            self.data.len() / self.instants
        }
    }

    pub fn instants(&self) -> usize {
        self.instants
    }

    pub fn row(&self, satellite: usize) -> &[Vector3<f64>] {
        let start = satellite * self.instants;
        &self.data[start..start + self.instants]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Vector3<f64>]> {
        self.data.chunks(self.instants.max(1))
    }
}

/// Propagates many satellites across a whole grid in one call.
pub trait BatchPropagator {
    /// Earth-fixed km positions, one row per record in input order.
    fn propagate_batch(&self, records: &[&SatelliteRecord], grid: &TimeGrid)
        -> Result<PositionMatrix>;
}

/// SGP4 in TEME followed by the GMST rotation.
#[derive(Debug, Clone, Copy)]
pub struct EarthFixedPropagator<'a> {
    timescale: &'a TimeScale,
}

impl<'a> EarthFixedPropagator<'a> {
    pub fn new(timescale: &'a TimeScale) -> Self {
        Self { timescale }
    }
}

impl BatchPropagator for EarthFixedPropagator<'_> {
    fn propagate_batch(
        &self,
        records: &[&SatelliteRecord],
        grid: &TimeGrid,
    ) -> Result<PositionMatrix> {
        // Earth rotation depends only on the instant; compute it once per column
        let rotations: Vec<Rotation3<f64>> = grid
            .instants()
            .iter()
            .map(|t| teme_to_earth_fixed(gmst_radians(self.timescale.ut1_jd(t))))
            .collect();

        let mut data = Vec::with_capacity(records.len() * grid.len());
        for record in records {
            for (i, (instant, rotation)) in grid.instants().iter().zip(&rotations).enumerate() {
                let minutes = record.minutes_since_epoch(instant);
                let teme = record.position_teme(minutes).map_err(|e| {
                    OrbitalError::Propagation {
                        satellite: record.name().to_string(),
                        instant: i,
                        reason: format!("{:?} after {:.3} min", e, minutes),
                    }
                })?;
                data.push(rotation * teme);
            }
        }

        Ok(PositionMatrix {
            instants: grid.len(),
            data,
        })
    }
}
