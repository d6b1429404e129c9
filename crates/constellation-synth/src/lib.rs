//! Constellation Synthesizer
//!
//! Builds a Walker Delta constellation from a JSON configuration file and
//! writes its TLE set and sampled Earth-fixed positions.
//!
//! # Configuration keys
//!
//! | Key | Type | Meaning |
//! |-----|------|---------|
//! | `name` | string | Constellation name, prefix of every satellite name |
//! | `num_orbits` | int | Orbital planes (O) |
//! | `num_sats_per_orbits` | int | Satellites per plane (S) |
//! | `f` | int | Phase factor |
//! | `ecco` | float | Eccentricity |
//! | `argpo` | float | Argument of perigee, deg |
//! | `inclo` | float | Inclination, deg |
//! | `mean_motion_loop_per_day` | float | Mean motion, rev/day |
//! | `epoch` | timestamp, optional | Element epoch (defaults to `startTime`) |
//! | `startTime`, `endTime` | timestamp | Sampling window |
//! | `timescale` | int | Sampling interval, ms |
//! | `tle_save` | bool | Write the TLE file |
//! | `position_save` | bool | Write the position file |

use std::io;
use std::path::PathBuf;

use orbital_mechanics::OrbitalError;
use thiserror::Error;

pub mod config;
pub mod pipeline;
pub mod sink;

pub use config::{load_config, parse_config, SynthConfig};
pub use pipeline::{run, RunSummary};
pub use sink::{FileSink, MemorySink, OutputSink};

#[derive(Error, Debug)]
pub enum SynthError {
    #[error(transparent)]
    Orbital(#[from] OrbitalError),
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SynthError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SynthError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SynthError>;
