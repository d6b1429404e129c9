//! Batched Earth-fixed position sampling
//!
//! One bulk propagator call covers every satellite over every grid instant.
//! The result is checked for non-finite coordinates (decayed or unstable
//! orbits) before it is accepted.
//!
//! ## Output format
//!
//! ```text
//! [whole, fraction] [whole, fraction] ...
//! <satellite name>
//! [x, y, z] [x, y, z] ...
//! <satellite name>
//! ...
//! ```

use std::fmt;
use std::io::{self, Write};

use nalgebra::Vector3;

use crate::constellation::Constellation;
use crate::propagation::SatelliteRecord;
use crate::timescale::{Instant, TimeGrid};
use crate::transforms::BatchPropagator;
use crate::{OrbitalError, Result};

/// Earth-fixed km positions of one satellite, aligned with the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteTrack {
    pub name: String,
    pub positions: Vec<Vector3<f64>>,
}

impl SatelliteTrack {
    /// Smallest and largest geocentric distance over the track, km.
    pub fn radius_range_km(&self) -> Option<(f64, f64)> {
        self.positions.iter().map(|p| p.norm()).fold(None, |acc, r| match acc {
            None => Some((r, r)),
            Some((lo, hi)) => Some((lo.min(r), hi.max(r))),
        })
    }
}

/// Sampled positions for a whole constellation.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub instants: Vec<Instant>,
    pub tracks: Vec<SatelliteTrack>,
}

impl fmt::Display for PositionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.instants {
            write!(f, "[{}, {}] ", t.whole, t.tt_fraction)?;
        }
        writeln!(f)?;
        for track in &self.tracks {
            writeln!(f, "{}", track.name)?;
            for p in &track.positions {
                write!(f, "[{}, {}, {}] ", p.x, p.y, p.z)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl PositionReport {
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "{}", self)?;
        out.flush()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Overall geocentric distance range across every track, km.
    pub fn radius_range_km(&self) -> Option<(f64, f64)> {
        self.tracks
            .iter()
            .filter_map(SatelliteTrack::radius_range_km)
            .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
    }
}

/// Samples a constellation through a [`BatchPropagator`].
pub struct PositionSampler<'a, P: BatchPropagator> {
    propagator: &'a P,
}

impl<'a, P: BatchPropagator> PositionSampler<'a, P> {
    pub fn new(propagator: &'a P) -> Self {
        Self { propagator }
    }

    pub fn sample(&self, constellation: &Constellation, grid: &TimeGrid) -> Result<PositionReport> {
        let records: Vec<&SatelliteRecord> = constellation.records().iter().collect();
        let matrix = self.propagator.propagate_batch(&records, grid)?;

        if matrix.satellites() != records.len() && !grid.is_empty() {
            return Err(OrbitalError::Propagation {
                satellite: constellation.name().to_string(),
                instant: 0,
                reason: format!(
                    "propagator returned {} rows for {} satellites",
                    matrix.satellites(),
                    records.len()
                ),
            });
        }

        if matrix.instants() != grid.len() {
            return Err(OrbitalError::Propagation {
                satellite: constellation.name().to_string(),
                instant: matrix.instants(),
                reason: format!(
                    "propagator returned {} samples per satellite for {} grid instants",
                    matrix.instants(),
                    grid.len()
                ),
            });
        }

        let mut tracks = Vec::with_capacity(records.len());
        for (s, record) in records.iter().enumerate() {
            let positions = if grid.is_empty() {
                Vec::new()
            } else {
                matrix.row(s).to_vec()
            };
            if let Some((i, p)) = positions
                .iter()
                .enumerate()
                .find(|(_, p)| !p.iter().all(|c| c.is_finite()))
            {
                let t = grid.instants()[i];
                return Err(OrbitalError::Propagation {
                    satellite: record.name().to_string(),
                    instant: i,
                    reason: format!(
                        "non-finite position [{}, {}, {}] at [{}, {}]",
                        p.x, p.y, p.z, t.whole, t.tt_fraction
                    ),
                });
            }
            tracks.push(SatelliteTrack {
                name: record.name().to_string(),
                positions,
            });
        }

        tracing::debug!(
            satellites = tracks.len(),
            instants = grid.len(),
            "sampled Earth-fixed positions"
        );
        Ok(PositionReport {
            instants: grid.instants().to_vec(),
            tracks,
        })
    }
}
