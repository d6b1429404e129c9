//! Time scales and the sampling grid
//!
//! Calendar timestamps (UTC) are carried into Terrestrial Time and kept as a
//! `(whole, tt_fraction)` pair: `whole` is the Julian date of the UTC
//! calendar day's midnight and `tt_fraction` the TT day fraction on top of
//! it. Splitting the Julian date this way keeps sub-millisecond precision
//! that a single `f64` near 2.46e6 would lose.
//!
//! A [`TimeScale`] owns the leap-second table and is created once per run,
//! then passed by reference to whatever needs time conversions.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{OrbitalError, Result};

pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// TT − TAI, seconds
pub const TT_MINUS_TAI: f64 = 32.184;

/// TAI − UTC steps: (UTC unix seconds at which the offset takes effect, offset seconds)
const LEAP_SECONDS: [(i64, f64); 28] = [
    (63_072_000, 10.0),    // 1972-01-01
    (78_796_800, 11.0),    // 1972-07-01
    (94_694_400, 12.0),    // 1973-01-01
    (126_230_400, 13.0),   // 1974-01-01
    (157_766_400, 14.0),   // 1975-01-01
    (189_302_400, 15.0),   // 1976-01-01
    (220_924_800, 16.0),   // 1977-01-01
    (252_460_800, 17.0),   // 1978-01-01
    (283_996_800, 18.0),   // 1979-01-01
    (315_532_800, 19.0),   // 1980-01-01
    (362_793_600, 20.0),   // 1981-07-01
    (394_329_600, 21.0),   // 1982-07-01
    (425_865_600, 22.0),   // 1983-07-01
    (489_024_000, 23.0),   // 1985-07-01
    (567_993_600, 24.0),   // 1988-01-01
    (631_152_000, 25.0),   // 1990-01-01
    (662_688_000, 26.0),   // 1991-01-01
    (709_948_800, 27.0),   // 1992-07-01
    (741_484_800, 28.0),   // 1993-07-01
    (773_020_800, 29.0),   // 1994-07-01
    (820_454_400, 30.0),   // 1996-01-01
    (867_715_200, 31.0),   // 1997-07-01
    (915_148_800, 32.0),   // 1999-01-01
    (1_136_073_600, 33.0), // 2006-01-01
    (1_230_768_000, 34.0), // 2009-01-01
    (1_341_100_800, 35.0), // 2012-07-01
    (1_435_708_800, 36.0), // 2015-07-01
    (1_483_228_800, 37.0), // 2017-01-01
];

/// A point in Terrestrial Time as a split Julian date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Instant {
    pub whole: f64,
    pub tt_fraction: f64,
}

impl Instant {
    /// Days elapsed from `earlier` to `self`, differencing each half separately.
    pub fn days_since(&self, earlier: &Instant) -> f64 {
        (self.whole - earlier.whole) + (self.tt_fraction - earlier.tt_fraction)
    }
}

/// UTC → TAI → TT conversion context.
#[derive(Debug, Clone)]
pub struct TimeScale {
    leap_seconds: Vec<(i64, f64)>,
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TimeScale {
    /// Leap-second table current through 2017-01-01 (TAI − UTC = 37 s).
    pub fn builtin() -> Self {
        Self {
            leap_seconds: LEAP_SECONDS.to_vec(),
        }
    }

    /// Custom table of `(unix seconds, TAI − UTC)`; sorted on construction.
    pub fn with_leap_seconds(mut table: Vec<(i64, f64)>) -> Self {
        table.sort_by_key(|(at, _)| *at);
        Self {
            leap_seconds: table,
        }
    }

    /// TAI − UTC in seconds at a UTC unix time.
    ///
    /// Times before the first table entry use the first offset.
    pub fn tai_minus_utc(&self, unix_seconds: i64) -> f64 {
        let idx = self
            .leap_seconds
            .partition_point(|(at, _)| *at <= unix_seconds);
        match idx {
            0 => self.leap_seconds.first().map_or(0.0, |(_, offset)| *offset),
            i => self.leap_seconds[i - 1].1,
        }
    }

    /// TT − UTC in seconds at a UTC unix time.
    pub fn tt_minus_utc(&self, unix_seconds: i64) -> f64 {
        self.tai_minus_utc(unix_seconds) + TT_MINUS_TAI
    }

    pub fn from_calendar(&self, t: DateTime<Utc>) -> Instant {
        let days_since_unix = t.timestamp().div_euclid(86_400);
        let whole = UNIX_EPOCH_JD + days_since_unix as f64;

        let seconds_of_day = t.num_seconds_from_midnight() as f64
            + f64::from(t.nanosecond() % 1_000_000_000) / 1e9;
        let tt_fraction = (seconds_of_day + self.tt_minus_utc(t.timestamp())) / SECONDS_PER_DAY;

        Instant { whole, tt_fraction }
    }

    /// UT1 Julian date of an instant, taking UT1 = UTC.
    pub fn ut1_jd(&self, instant: &Instant) -> f64 {
        let tt_unix = (instant.whole - UNIX_EPOCH_JD) * SECONDS_PER_DAY
            + instant.tt_fraction * SECONDS_PER_DAY;
        // One refinement is enough: the table only steps by whole seconds
        let guess = (tt_unix - TT_MINUS_TAI).floor() as i64;
        let offset = self.tt_minus_utc(guess - self.tai_minus_utc(guess) as i64);
        instant.whole + instant.tt_fraction - offset / SECONDS_PER_DAY
    }

    /// `n` evenly spaced instants from `start` to `end` inclusive.
    ///
    /// Each half of the split date is interpolated on its own; the last
    /// instant is exactly `end`. `n == 1` yields only `start`.
    pub fn linspace(&self, start: &Instant, end: &Instant, n: usize) -> Vec<Instant> {
        match n {
            0 => Vec::new(),
            1 => vec![*start],
            _ => {
                let steps = (n - 1) as f64;
                let whole_step = (end.whole - start.whole) / steps;
                let fraction_step = (end.tt_fraction - start.tt_fraction) / steps;
                let mut instants: Vec<Instant> = (0..n - 1)
                    .map(|i| Instant {
                        whole: start.whole + whole_step * i as f64,
                        tt_fraction: start.tt_fraction + fraction_step * i as f64,
                    })
                    .collect();
                instants.push(*end);
                instants
            }
        }
    }
}

/// Uniform sample instants between two timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    instants: Vec<Instant>,
}

impl TimeGrid {
    /// Build the grid for `[start, end]` at `interval_ms`.
    ///
    /// The point count is `floor(span_ms / interval_ms)`, but never less
    /// than one: a span shorter than the interval yields just `start`.
    pub fn build(
        timescale: &TimeScale,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_ms: i64,
    ) -> Result<Self> {
        if interval_ms <= 0 {
            return Err(OrbitalError::Config(format!(
                "sampling interval must be positive, got {} ms",
                interval_ms
            )));
        }
        let span_ms = end.signed_duration_since(start).num_milliseconds();
        if span_ms < 0 {
            return Err(OrbitalError::Config(format!(
                "end time {} precedes start time {}",
                end, start
            )));
        }

        let count = usize::try_from(span_ms / interval_ms)
            .map_err(|_| OrbitalError::Config(format!("{} grid points is too many", span_ms / interval_ms)))?
            .max(1);

        let t1 = timescale.from_calendar(start);
        let t2 = timescale.from_calendar(end);
        let instants = timescale.linspace(&t1, &t2, count);

        tracing::debug!(
            points = instants.len(),
            interval_ms,
            "built time grid {} .. {}",
            start,
            end
        );
        Ok(Self { instants })
    }

    pub fn instants(&self) -> &[Instant] {
        &self.instants
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }
}
