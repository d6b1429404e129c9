//! Orbital Mechanics Library
//!
//! Synthetic Walker Delta constellations: per-satellite element layout, SGP4
//! record initialization, NORAD two-line element encoding, and batched
//! Earth-fixed position sampling over a uniform time grid.
//!
//! # Pipeline
//!
//! ```text
//! ConstellationSpec ──► walker::layout ──► [SatelliteElementSet; O·S]
//!                                               │
//!                                               ▼
//!                          Constellation::initialize (SGP4 records)
//!                             │                          │
//!                             ▼                          ▼
//!                    TleEncoder::encode        PositionSampler::sample
//!                             │                 (TimeGrid + BatchPropagator)
//!                             ▼                          ▼
//!                       TleDocument                PositionReport
//! ```

use thiserror::Error;

pub mod constellation;
pub mod propagation;
pub mod sampler;
pub mod timescale;
pub mod tle;
pub mod transforms;
pub mod walker;

pub use constellation::Constellation;
pub use propagation::{SatelliteRecord, REFERENCE_EPOCH_JD};
pub use sampler::{PositionReport, PositionSampler, SatelliteTrack};
pub use timescale::{Instant, TimeGrid, TimeScale};
pub use tle::{TleDocument, TleEncoder, TleEntry};
pub use transforms::{BatchPropagator, EarthFixedPropagator, PositionMatrix};
pub use walker::{ConstellationSpec, SatelliteElementSet, WalkerDelta};

#[derive(Error, Debug)]
pub enum OrbitalError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid constellation layout: {0}")]
    Layout(String),
    #[error("Propagator rejected elements for {satellite}: {reason}")]
    Initialization { satellite: String, reason: String },
    #[error("TLE checksum failed: {0}")]
    Checksum(String),
    #[error("Propagation failed for {satellite} at instant {instant}: {reason}")]
    Propagation {
        satellite: String,
        instant: usize,
        reason: String,
    },
    #[error("TLE field overflow: {0}")]
    FieldOverflow(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;
