//! One synthesis run: layout → initialize → encode TLEs → sample positions

use std::path::PathBuf;

use orbital_mechanics::{
    Constellation, EarthFixedPropagator, PositionSampler, TimeGrid, TimeScale, TleEncoder,
    REFERENCE_EPOCH_JD,
};
use tracing::{info, warn};

use crate::config::SynthConfig;
use crate::sink::OutputSink;
use crate::Result;

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub satellites: usize,
    pub grid_points: usize,
    pub tle_path: Option<PathBuf>,
    pub position_path: Option<PathBuf>,
    /// Geocentric distance range over all samples, km
    pub radius_range_km: Option<(f64, f64)>,
}

/// Execute a run against `sink`. The constellation is initialized once and
/// shared by both outputs.
pub fn run(
    config: &SynthConfig,
    timescale: &TimeScale,
    sink: &mut dyn OutputSink,
) -> Result<RunSummary> {
    let constellation =
        Constellation::from_spec(&config.constellation, timescale, REFERENCE_EPOCH_JD)?;
    let mut summary = RunSummary {
        satellites: constellation.len(),
        ..RunSummary::default()
    };

    if !config.tle_save && !config.position_save {
        warn!("Neither tle_save nor position_save is set; nothing will be written");
    }

    if config.tle_save {
        let document = TleEncoder.encode(&constellation)?;
        summary.tle_path = Some(sink.write_tles(constellation.name(), &document)?);
    }

    if config.position_save {
        let grid = TimeGrid::build(
            timescale,
            config.start_time,
            config.end_time,
            config.interval_ms,
        )?;
        let propagator = EarthFixedPropagator::new(timescale);
        let report = PositionSampler::new(&propagator).sample(&constellation, &grid)?;

        summary.grid_points = grid.len();
        summary.radius_range_km = report.radius_range_km();
        if let Some((lo, hi)) = summary.radius_range_km {
            info!("Geocentric radius {:.1} .. {:.1} km", lo, hi);
        }
        summary.position_path = Some(sink.write_positions(&report)?);
    }

    Ok(summary)
}
