//! SGP4 record initialization
//!
//! Turns one [`SatelliteElementSet`] into a propagator-ready
//! [`SatelliteRecord`] using the WGS-72 geopotential and the IAU sidereal
//! time model (SGP4 "improved" mode). Drag and mean-motion derivatives are
//! zero for synthetic satellites.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use nalgebra::Vector3;

use crate::timescale::{Instant, UNIX_EPOCH_JD};
use crate::tle::TleFields;
use crate::walker::SatelliteElementSet;
use crate::{OrbitalError, Result};

/// Julian date of 1949-12-31 00:00, the origin SGP4 counts epoch days from.
pub const REFERENCE_EPOCH_JD: f64 = 2_433_281.5;

const J2000_JD: f64 = 2_451_545.0;
const DAYS_PER_JULIAN_YEAR: f64 = 365.25;
const MINUTES_PER_DAY: f64 = 1440.0;
/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Initialized SGP4 state for one satellite. Immutable once built.
pub struct SatelliteRecord {
    name: String,
    elements: SatelliteElementSet,
    epoch: Instant,
    epoch_days: f64,
    reference_epoch_jd: f64,
    constants: sgp4::Constants,
}

impl fmt::Debug for SatelliteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SatelliteRecord")
            .field("name", &self.name)
            .field("catalog_number", &self.elements.catalog_number)
            .field("epoch_days", &self.epoch_days)
            .finish_non_exhaustive()
    }
}

impl SatelliteRecord {
    /// Initialize from an element set whose epoch is `epoch`.
    ///
    /// `reference_epoch_jd` is the propagator's epoch origin; pass
    /// [`REFERENCE_EPOCH_JD`] for standard SGP4 day counts. Angles are
    /// converted from degrees to radians before they reach SGP4.
    pub fn from_elements(
        name: impl Into<String>,
        elements: &SatelliteElementSet,
        epoch: Instant,
        reference_epoch_jd: f64,
    ) -> Result<Self> {
        let name = name.into();
        check_elements(&name, elements)?;

        let epoch_days = (epoch.whole - reference_epoch_jd) + epoch.tt_fraction;
        let epoch_years = (epoch_days + reference_epoch_jd - J2000_JD) / DAYS_PER_JULIAN_YEAR;

        let rejected = |reason: String| OrbitalError::Initialization {
            satellite: name.clone(),
            reason,
        };

        let orbit_0 = sgp4::Orbit::from_kozai_elements(
            &sgp4::WGS72,
            elements.inclination_deg.to_radians(),
            elements.raan_deg.to_radians(),
            elements.eccentricity,
            elements.arg_perigee_deg.to_radians(),
            elements.mean_anomaly_deg.to_radians(),
            elements.mean_motion_deg_per_min.to_radians(),
        )
        .map_err(|e| rejected(format!("{:?}", e)))?;

        let constants = sgp4::Constants::new(
            sgp4::WGS72,
            sgp4::iau_epoch_to_sidereal_time,
            epoch_years,
            0.0,
            orbit_0,
        )
        .map_err(|e| rejected(format!("{:?}", e)))?;

        Ok(Self {
            name,
            elements: elements.clone(),
            epoch,
            epoch_days,
            reference_epoch_jd,
            constants,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn catalog_number(&self) -> u32 {
        self.elements.catalog_number
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Days since the reference epoch
    pub fn epoch_days(&self) -> f64 {
        self.epoch_days
    }

    pub fn minutes_since_epoch(&self, at: &Instant) -> f64 {
        at.days_since(&self.epoch) * MINUTES_PER_DAY
    }

    /// TEME position in km `minutes` after epoch.
    pub fn position_teme(
        &self,
        minutes: f64,
    ) -> std::result::Result<Vector3<f64>, sgp4::Error> {
        self.constants
            .propagate(minutes)
            .map(|prediction| Vector3::from(prediction.position))
    }

    /// NORAD fields for the TLE exporter.
    pub fn tle_fields(&self) -> Result<TleFields> {
        let (epoch_year, epoch_day) =
            calendar_epoch(self.epoch_days, self.reference_epoch_jd).ok_or_else(|| {
                OrbitalError::FieldOverflow(format!(
                    "{}: epoch {} days is outside the calendar range",
                    self.name, self.epoch_days
                ))
            })?;

        Ok(TleFields {
            catalog_number: self.elements.catalog_number,
            classification: 'U',
            international_designator: String::new(),
            epoch_year,
            epoch_day,
            mean_motion_dot: 0.0,
            mean_motion_ddot: 0.0,
            drag_term: 0.0,
            ephemeris_type: 0,
            element_number: 0,
            inclination_deg: self.elements.inclination_deg,
            raan_deg: self.elements.raan_deg,
            eccentricity: self.elements.eccentricity,
            arg_perigee_deg: self.elements.arg_perigee_deg,
            mean_anomaly_deg: self.elements.mean_anomaly_deg,
            mean_motion_rev_per_day: self.elements.mean_motion_rev_per_day(),
            revolution_number: 0,
        })
    }
}

fn check_elements(name: &str, elements: &SatelliteElementSet) -> Result<()> {
    let reject = |reason: String| {
        Err(OrbitalError::Initialization {
            satellite: name.to_string(),
            reason,
        })
    };

    if !(0.0..1.0).contains(&elements.eccentricity) {
        return reject(format!(
            "eccentricity {} outside [0, 1)",
            elements.eccentricity
        ));
    }
    if !(elements.mean_motion_deg_per_min.is_finite() && elements.mean_motion_deg_per_min > 0.0) {
        return reject(format!(
            "mean motion {} deg/min must be positive",
            elements.mean_motion_deg_per_min
        ));
    }
    let angles = [
        ("inclination", elements.inclination_deg),
        ("raan", elements.raan_deg),
        ("argument of perigee", elements.arg_perigee_deg),
        ("mean anomaly", elements.mean_anomaly_deg),
    ];
    for (label, value) in angles {
        if !value.is_finite() {
            return reject(format!("{} is not finite", label));
        }
    }
    Ok(())
}

/// Two-digit year and fractional day-of-year (1.0 = Jan 1 00:00) for an
/// epoch given in days since `reference_epoch_jd`.
pub fn calendar_epoch(epoch_days: f64, reference_epoch_jd: f64) -> Option<(u32, f64)> {
    let days_since_unix = (reference_epoch_jd - UNIX_EPOCH_JD) + epoch_days;
    if !days_since_unix.is_finite() {
        return None;
    }
    let whole = days_since_unix.floor();
    let fraction = days_since_unix - whole;

    let ce_days = i32::try_from(whole as i64 + UNIX_EPOCH_DAYS_FROM_CE).ok()?;
    let date = NaiveDate::from_num_days_from_ce_opt(ce_days)?;
    let year = u32::try_from(date.year().rem_euclid(100)).ok()?;
    Some((year, date.ordinal() as f64 + fraction))
}
