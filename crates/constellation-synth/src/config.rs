//! Configuration loading and validation
//!
//! The whole document is checked once; every missing or malformed key is
//! reported together in a single configuration error.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use orbital_mechanics::{ConstellationSpec, OrbitalError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{Result, SynthError};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub constellation: ConstellationSpec,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Sampling interval, ms
    pub interval_ms: i64,
    pub tle_save: bool,
    pub position_save: bool,
}

/// Raw document; every key optional so all problems can be collected.
#[derive(Debug, Deserialize)]
struct RawConfig {
    name: Option<Value>,
    num_orbits: Option<Value>,
    num_sats_per_orbits: Option<Value>,
    f: Option<Value>,
    ecco: Option<Value>,
    argpo: Option<Value>,
    inclo: Option<Value>,
    mean_motion_loop_per_day: Option<Value>,
    epoch: Option<Value>,
    #[serde(rename = "startTime")]
    start_time: Option<Value>,
    #[serde(rename = "endTime")]
    end_time: Option<Value>,
    timescale: Option<Value>,
    tle_save: Option<Value>,
    position_save: Option<Value>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// Parse a timestamp: `YYYY-M-D HH:MM:SS[.fff]`, the same with a `T`
/// separator, or RFC 3339. Naive timestamps are UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Default)]
struct Checker {
    problems: Vec<String>,
}

impl Checker {
    fn require(&mut self, key: &str, value: Option<Value>) -> Option<Value> {
        if value.is_none() {
            self.problems.push(format!("`{}` is missing", key));
        }
        value
    }

    fn string(&mut self, key: &str, value: Option<Value>) -> Option<String> {
        match self.require(key, value)? {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            other => {
                self.problems
                    .push(format!("`{}` must be a non-empty string, got {}", key, other));
                None
            }
        }
    }

    fn integer(&mut self, key: &str, value: Option<Value>) -> Option<i64> {
        let value = self.require(key, value)?;
        let parsed = value.as_i64();
        if parsed.is_none() {
            self.problems
                .push(format!("`{}` must be an integer, got {}", key, value));
        }
        parsed
    }

    fn float(&mut self, key: &str, value: Option<Value>) -> Option<f64> {
        let value = self.require(key, value)?;
        match value.as_f64() {
            Some(v) if v.is_finite() => Some(v),
            _ => {
                self.problems
                    .push(format!("`{}` must be a number, got {}", key, value));
                None
            }
        }
    }

    fn boolean(&mut self, key: &str, value: Option<Value>) -> Option<bool> {
        let value = self.require(key, value)?;
        let parsed = value.as_bool();
        if parsed.is_none() {
            self.problems
                .push(format!("`{}` must be true or false, got {}", key, value));
        }
        parsed
    }

    fn timestamp(&mut self, key: &str, value: Option<Value>) -> Option<DateTime<Utc>> {
        let value = self.require(key, value)?;
        let parsed = value.as_str().and_then(parse_timestamp);
        if parsed.is_none() {
            self.problems.push(format!(
                "`{}` must be a timestamp like \"2023-02-24 11:30:00\", got {}",
                key, value
            ));
        }
        parsed
    }
}

/// Parse and validate a JSON configuration document.
pub fn parse_config(text: &str) -> std::result::Result<SynthConfig, OrbitalError> {
    let raw: RawConfig = serde_json::from_str(text)
        .map_err(|e| OrbitalError::Config(format!("not a valid JSON object: {}", e)))?;

    for key in raw.extra.keys() {
        warn!("Ignoring unknown configuration key `{}`", key);
    }

    let mut check = Checker::default();
    let name = check.string("name", raw.name);
    let num_orbits = check.integer("num_orbits", raw.num_orbits);
    let num_sats = check.integer("num_sats_per_orbits", raw.num_sats_per_orbits);
    let f = check.integer("f", raw.f);
    let ecco = check.float("ecco", raw.ecco);
    let argpo = check.float("argpo", raw.argpo);
    let inclo = check.float("inclo", raw.inclo);
    let mean_motion = check.float("mean_motion_loop_per_day", raw.mean_motion_loop_per_day);
    let start_time = check.timestamp("startTime", raw.start_time);
    let end_time = check.timestamp("endTime", raw.end_time);
    let epoch = match raw.epoch {
        Some(value) => check.timestamp("epoch", Some(value)),
        None => start_time,
    };
    let interval_ms = check.integer("timescale", raw.timescale);
    let tle_save = check.boolean("tle_save", raw.tle_save);
    let position_save = check.boolean("position_save", raw.position_save);

    if let Some(ms) = interval_ms.filter(|ms| *ms <= 0) {
        check
            .problems
            .push(format!("`timescale` must be a positive number of ms, got {}", ms));
    }
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end < start {
            check
                .problems
                .push(format!("`endTime` {} precedes `startTime` {}", end, start));
        }
    }

    match (
        name,
        num_orbits,
        num_sats,
        f,
        ecco,
        argpo,
        inclo,
        mean_motion,
        epoch,
        start_time,
        end_time,
        interval_ms,
        tle_save,
        position_save,
    ) {
        (
            Some(name),
            Some(orbit_count),
            Some(sats_per_orbit),
            Some(phase_factor),
            Some(eccentricity),
            Some(arg_perigee_deg),
            Some(inclination_deg),
            Some(mean_motion_rev_per_day),
            Some(epoch),
            Some(start_time),
            Some(end_time),
            Some(interval_ms),
            Some(tle_save),
            Some(position_save),
        ) if check.problems.is_empty() => Ok(SynthConfig {
            constellation: ConstellationSpec {
                name,
                orbit_count,
                sats_per_orbit,
                phase_factor,
                eccentricity,
                arg_perigee_deg,
                inclination_deg,
                mean_motion_rev_per_day,
                epoch,
            },
            start_time,
            end_time,
            interval_ms,
            tle_save,
            position_save,
        }),
        _ => Err(OrbitalError::Config(check.problems.join("; "))),
    }
}

/// Read and validate the configuration file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<SynthConfig> {
    let path = path.as_ref();
    info!("Loading configuration from {:?}", path);

    let text = fs::read_to_string(path).map_err(|e| SynthError::io(path, e))?;
    let config = parse_config(&text)?;

    info!(
        "Constellation {}: {} orbits x {} satellites, f = {}",
        config.constellation.name,
        config.constellation.orbit_count,
        config.constellation.sats_per_orbit,
        config.constellation.phase_factor
    );
    Ok(config)
}
