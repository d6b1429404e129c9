//! NORAD Two-Line Element encoding
//!
//! Produces byte-exact 69-column TLE lines: columns 0–67 are the payload and
//! column 68 is the modulo-10 checksum.
//!
//! ## Column layout
//!
//! ```text
//! 1 NNNNNC IIIIIIII YYDDD.DDDDDDDD ±.NNNNNNNN ±NNNNN±N ±NNNNN±N E NNNNK
//! 2 NNNNN III.IIII RRR.RRRR EEEEEEE PPP.PPPP MMM.MMMM NN.NNNNNNNNRRRRRK
//! ```
//!
//! The encoder exports raw lines from a record, replaces columns 7–17 of
//! line 1 with a fixed unclassified designator, re-checksums line 1 and
//! verifies both lines before they are emitted.

use std::fmt;
use std::io::{self, Write};

use crate::constellation::Constellation;
use crate::propagation::SatelliteRecord;
use crate::{OrbitalError, Result};

/// Payload width of a TLE line
pub const PAYLOAD_LEN: usize = 68;
/// Payload plus checksum digit
pub const LINE_LEN: usize = 69;
/// Replaces columns 7–17 of line 1 (classification + international designator)
pub const PLACEHOLDER_DESIGNATOR: &str = "U 00000ABC ";

const DESIGNATOR_START: usize = 7;
const DESIGNATOR_END: usize = 18;
/// Alpha-5 leading letters for 10..=33 (I and O are skipped)
const ALPHA5_LETTERS: &[u8; 24] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const MAX_ALPHA5_CATALOG: u32 = 339_999;

/// Checksum contribution rule: digits count their value, '-' counts one,
/// everything else counts zero.
pub fn checksum_digit(text: &str) -> u32 {
    let sum: u32 = text
        .chars()
        .map(|c| match c {
            '0'..='9' => c as u32 - '0' as u32,
            '-' => 1,
            _ => 0,
        })
        .sum();
    sum % 10
}

/// Checksum of an exact 68-character payload.
pub fn checksum(payload: &str) -> Result<u32> {
    if payload.len() != PAYLOAD_LEN {
        return Err(OrbitalError::Checksum(format!(
            "payload must have exactly {} characters, got {}: {:?}",
            PAYLOAD_LEN,
            payload.len(),
            payload
        )));
    }
    Ok(checksum_digit(payload))
}

/// Check that `line` is 69 ASCII characters whose last digit matches the
/// checksum of the first 68.
pub fn verify_line(line: &str) -> Result<()> {
    if line.len() != LINE_LEN || !line.is_ascii() {
        return Err(OrbitalError::Checksum(format!(
            "line must be {} ASCII characters, got {}:\n  {}",
            LINE_LEN,
            line.len(),
            line
        )));
    }
    let (payload, embedded) = line.split_at(PAYLOAD_LEN);
    let expected = checksum(payload)?;
    match embedded.chars().next().and_then(|c| c.to_digit(10)) {
        Some(digit) if digit == expected => Ok(()),
        _ => Err(OrbitalError::Checksum(format!(
            "embedded checksum {:?} does not match computed {}:\n  {}",
            embedded, expected, line
        ))),
    }
}

/// Raw NORAD fields, in TLE units (degrees, rev/day).
#[derive(Debug, Clone, PartialEq)]
pub struct TleFields {
    pub catalog_number: u32,
    pub classification: char,
    pub international_designator: String,
    /// Two-digit year
    pub epoch_year: u32,
    /// Day of year with fraction, 1.0 = Jan 1 00:00
    pub epoch_day: f64,
    /// First derivative of mean motion / 2 (rev/day²)
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion / 6 (rev/day³)
    pub mean_motion_ddot: f64,
    /// B* drag term (1/earth radii)
    pub drag_term: f64,
    pub ephemeris_type: u8,
    pub element_number: u32,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    pub mean_motion_rev_per_day: f64,
    pub revolution_number: u32,
}

/// Catalog number field: five digits, or Alpha-5 above 99999.
pub fn format_catalog_number(catalog: u32) -> Result<String> {
    match catalog {
        0..=99_999 => Ok(format!("{:05}", catalog)),
        100_000..=MAX_ALPHA5_CATALOG => {
            let letter = ALPHA5_LETTERS[(catalog / 10_000 - 10) as usize] as char;
            Ok(format!("{}{:04}", letter, catalog % 10_000))
        }
        _ => Err(OrbitalError::FieldOverflow(format!(
            "catalog number {} exceeds the Alpha-5 range",
            catalog
        ))),
    }
}

/// `±.NNNNNNNN` with the leading zero dropped.
fn format_mean_motion_dot(value: f64) -> String {
    let sign = if value < 0.0 { '-' } else { ' ' };
    let digits = format!("{:.8}", value.abs());
    let digits = digits.strip_prefix('0').unwrap_or(&digits);
    format!("{}{}", sign, digits)
}

/// `±NNNNN±E`: mantissa with an assumed leading decimal point.
///
/// A zero exponent is written with `zero_exponent_sign`, matching the
/// conventional `00000-0` / `00000+0` spellings of the two fields.
fn format_implied_decimal(value: f64, zero_exponent_sign: char) -> String {
    let sign = if value < 0.0 { '-' } else { ' ' };
    let magnitude = value.abs();
    if magnitude == 0.0 {
        return format!("{}00000{}0", sign, zero_exponent_sign);
    }

    let mut exponent = magnitude.log10().floor() as i32 + 1;
    let mut mantissa = (magnitude / 10f64.powi(exponent) * 1e5).round() as u64;
    if mantissa >= 100_000 {
        mantissa /= 10;
        exponent += 1;
    }
    let exponent_sign = match exponent {
        0 => zero_exponent_sign,
        e if e < 0 => '-',
        _ => '+',
    };
    format!("{}{:05}{}{}", sign, mantissa, exponent_sign, exponent.abs())
}

/// `EEEEEEE`: eccentricity with the leading "0." dropped.
fn format_eccentricity(value: f64) -> String {
    let text = format!("{:.7}", value);
    match text.strip_prefix("0.") {
        Some(digits) => digits.to_string(),
        None => text,
    }
}

fn with_checksum(payload: String) -> String {
    let digit = checksum_digit(&payload);
    format!("{}{}", payload, digit)
}

/// Render both lines, each with its own checksum appended.
///
/// Field overflows show up as lines longer than 69 characters; the encoder
/// rejects them during verification.
pub fn export_tle(fields: &TleFields) -> Result<(String, String)> {
    let catalog = format_catalog_number(fields.catalog_number)?;

    let payload1 = format!(
        "1 {}{} {:<8} {:02}{:012.8} {} {} {} {} {:>4}",
        catalog,
        fields.classification,
        fields.international_designator,
        fields.epoch_year,
        fields.epoch_day,
        format_mean_motion_dot(fields.mean_motion_dot),
        format_implied_decimal(fields.mean_motion_ddot, '-'),
        format_implied_decimal(fields.drag_term, '+'),
        fields.ephemeris_type,
        fields.element_number,
    );
    let payload2 = format!(
        "2 {} {:8.4} {:8.4} {} {:8.4} {:8.4} {:11.8}{:>5}",
        catalog,
        fields.inclination_deg,
        fields.raan_deg,
        format_eccentricity(fields.eccentricity),
        fields.arg_perigee_deg,
        fields.mean_anomaly_deg,
        fields.mean_motion_rev_per_day,
        fields.revolution_number,
    );

    Ok((with_checksum(payload1), with_checksum(payload2)))
}

/// Overwrite the designator columns of line 1 and re-checksum it.
pub fn apply_placeholder_designator(line1: &str) -> Result<String> {
    if line1.len() != LINE_LEN || !line1.is_ascii() {
        return Err(OrbitalError::Checksum(format!(
            "line 1 must be {} ASCII characters before patching, got {}:\n  {}",
            LINE_LEN,
            line1.len(),
            line1
        )));
    }
    let payload = format!(
        "{}{}{}",
        &line1[..DESIGNATOR_START],
        PLACEHOLDER_DESIGNATOR,
        &line1[DESIGNATOR_END..PAYLOAD_LEN]
    );
    let digit = checksum(&payload)?;
    Ok(format!("{}{}", payload, digit))
}

/// One satellite's block in a TLE file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleEntry {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

/// Encoded TLEs for a whole constellation, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TleDocument {
    pub entries: Vec<TleEntry>,
}

/// Three lines per satellite: name, line 1, line 2.
impl fmt::Display for TleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry.name)?;
            writeln!(f, "{}", entry.line1)?;
            writeln!(f, "{}", entry.line2)?;
        }
        Ok(())
    }
}

impl TleDocument {
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "{}", self)?;
        out.flush()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Exports, patches and verifies TLEs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TleEncoder;

impl TleEncoder {
    pub fn encode_record(&self, record: &SatelliteRecord) -> Result<TleEntry> {
        let fields = record.tle_fields()?;
        let (raw1, raw2) = export_tle(&fields)?;
        finish_lines(record.name(), &raw1, &raw2)
    }

    /// Encode every satellite; the first failure aborts the whole document.
    pub fn encode(&self, constellation: &Constellation) -> Result<TleDocument> {
        let entries = constellation
            .records()
            .iter()
            .map(|record| self.encode_record(record))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            constellation = constellation.name(),
            "encoded {} TLE sets",
            entries.len()
        );
        Ok(TleDocument { entries })
    }
}

/// Check the exported lines against their own checksums, then patch the
/// designator into line 1 and check the result again.
fn finish_lines(name: &str, raw1: &str, raw2: &str) -> Result<TleEntry> {
    let with_name = |e: OrbitalError| match e {
        OrbitalError::Checksum(detail) => {
            OrbitalError::Checksum(format!("{}: {}", name, detail))
        }
        other => other,
    };

    verify_line(raw1).map_err(with_name)?;
    verify_line(raw2).map_err(with_name)?;
    let line1 = apply_placeholder_designator(raw1).map_err(with_name)?;
    verify_line(&line1).map_err(with_name)?;

    Ok(TleEntry {
        name: name.to_string(),
        line1,
        line2: raw2.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::REFERENCE_EPOCH_JD;
    use crate::timescale::TimeScale;
    use crate::walker::ConstellationSpec;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    const ISS_LINE1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn iss_fields() -> TleFields {
        TleFields {
            catalog_number: 25544,
            classification: 'U',
            international_designator: "98067A".to_string(),
            epoch_year: 8,
            epoch_day: 264.51782528,
            mean_motion_dot: -0.00002182,
            mean_motion_ddot: 0.0,
            drag_term: -0.11606e-4,
            ephemeris_type: 0,
            element_number: 292,
            inclination_deg: 51.6416,
            raan_deg: 247.4627,
            eccentricity: 0.0006703,
            arg_perigee_deg: 130.5360,
            mean_anomaly_deg: 325.0288,
            mean_motion_rev_per_day: 15.72125391,
            revolution_number: 56353,
        }
    }

    fn shell(name: &str, mean_motion_rev_per_day: f64) -> Constellation {
        let spec = ConstellationSpec {
            name: name.to_string(),
            orbit_count: 3,
            sats_per_orbit: 2,
            phase_factor: 0,
            eccentricity: 0.0001,
            arg_perigee_deg: 90.0,
            inclination_deg: 53.0,
            mean_motion_rev_per_day,
            epoch: Utc.with_ymd_and_hms(2023, 2, 24, 11, 30, 0).unwrap(),
        };
        Constellation::from_spec(&spec, &TimeScale::builtin(), REFERENCE_EPOCH_JD).unwrap()
    }

    fn constellation() -> Constellation {
        shell("walker", 15.06)
    }

    #[test]
    fn test_checksum_examples() {
        assert_eq!(checksum(&"0".repeat(68)).unwrap(), 0);

        // digits summing to 37 plus one '-'
        let mut payload = String::from("9999-1");
        payload.push_str(&" ".repeat(62));
        assert_eq!(checksum(&payload).unwrap(), 8);

        assert_eq!(checksum(&ISS_LINE1[..68]).unwrap(), 7);
        assert_eq!(checksum(&ISS_LINE2[..68]).unwrap(), 7);
    }

    #[test]
    fn test_checksum_requires_68_characters() {
        assert!(matches!(checksum("1 25544U"), Err(OrbitalError::Checksum(_))));
        assert!(matches!(checksum(ISS_LINE1), Err(OrbitalError::Checksum(_))));
    }

    #[test]
    fn test_verify_line() {
        assert!(verify_line(ISS_LINE1).is_ok());
        assert!(verify_line(ISS_LINE2).is_ok());

        let mut corrupted = ISS_LINE1[..68].to_string();
        corrupted.push('3');
        let err = verify_line(&corrupted).unwrap_err();
        assert!(err.to_string().contains(&corrupted));

        assert!(verify_line(&ISS_LINE1[..60]).is_err());
    }

    #[test]
    fn test_export_reproduces_iss_lines() {
        let (line1, line2) = export_tle(&iss_fields()).unwrap();
        assert_eq!(line1, ISS_LINE1);
        assert_eq!(line2, ISS_LINE2);
    }

    #[test]
    fn test_implied_decimal_fields() {
        assert_eq!(format_implied_decimal(0.0, '-'), " 00000-0");
        assert_eq!(format_implied_decimal(0.0, '+'), " 00000+0");
        assert_eq!(format_implied_decimal(-0.11606e-4, '+'), "-11606-4");
        assert_eq!(format_implied_decimal(0.34123e-3, '+'), " 34123-3");
    }

    #[test]
    fn test_catalog_number_field() {
        assert_eq!(format_catalog_number(1).unwrap(), "00001");
        assert_eq!(format_catalog_number(99_999).unwrap(), "99999");
        assert_eq!(format_catalog_number(100_000).unwrap(), "A0000");
        assert_eq!(format_catalog_number(180_001).unwrap(), "J0001");
        assert_eq!(format_catalog_number(339_999).unwrap(), "Z9999");
        assert!(matches!(
            format_catalog_number(340_000),
            Err(OrbitalError::FieldOverflow(_))
        ));
    }

    #[test]
    fn test_placeholder_designator() {
        let patched = apply_placeholder_designator(ISS_LINE1).unwrap();
        assert_eq!(patched.len(), LINE_LEN);
        assert_eq!(&patched[7..18], PLACEHOLDER_DESIGNATOR);
        assert_eq!(&patched[..7], &ISS_LINE1[..7]);
        assert_eq!(&patched[18..68], &ISS_LINE1[18..68]);
        assert!(verify_line(&patched).is_ok());
    }

    #[test]
    fn test_encode_walker_shell() {
        let doc = TleEncoder.encode(&constellation()).unwrap();
        assert_eq!(doc.len(), 6);

        let first = &doc.entries[0];
        assert_eq!(first.name, "walker_1_1");
        assert_eq!(
            first.line1,
            "1 00001U 00000ABC 23055.47996741  .00000000  00000-0  00000+0 0    05"
        );
        assert_eq!(
            first.line2,
            "2 00001  53.0000 120.0000 0001000  90.0000 180.0000 15.06000000    05"
        );

        let last = &doc.entries[5];
        assert_eq!(last.name, "walker_3_2");
        assert_eq!(
            last.line2,
            "2 00006  53.0000 360.0000 0001000  90.0000   0.0000 15.06000000    07"
        );

        for entry in &doc.entries {
            assert_eq!(entry.line1.len(), LINE_LEN);
            assert_eq!(entry.line2.len(), LINE_LEN);
            assert!(verify_line(&entry.line1).is_ok());
            assert!(verify_line(&entry.line2).is_ok());
        }
    }

    #[test]
    fn test_encoded_lines_parse_back() {
        let doc = TleEncoder.encode(&constellation()).unwrap();
        for entry in &doc.entries {
            let parsed = sgp4::Elements::from_tle(
                Some(entry.name.clone()),
                entry.line1.as_bytes(),
                entry.line2.as_bytes(),
            )
            .unwrap();
            assert!((parsed.inclination - 53.0).abs() < 1e-4);
            assert!((parsed.mean_motion - 15.06).abs() < 1e-8);
        }
    }

    #[test]
    fn test_render_layout() {
        let doc = TleEncoder.encode(&constellation()).unwrap();
        let text = doc.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 18);
        assert_eq!(lines[0], "walker_1_1");
        assert_eq!(lines[3], "walker_1_2");

        let mut buffer = Vec::new();
        doc.write_to(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), text);
    }

    #[test]
    fn test_overflowing_field_rejected() {
        let mut fields = iss_fields();
        fields.mean_motion_rev_per_day = 123.0;
        let (_, line2) = export_tle(&fields).unwrap();
        let err = verify_line(&line2).unwrap_err();
        assert!(err.to_string().contains(&line2));
    }

    #[test]
    fn test_exported_line1_checked_before_patching() {
        // Patching re-checksums line 1, so a bad exported digit must be caught first
        let mut corrupted = ISS_LINE1[..68].to_string();
        corrupted.push('3');
        assert!(apply_placeholder_designator(&corrupted).is_ok());

        match finish_lines("iss_1_1", &corrupted, ISS_LINE2) {
            Err(OrbitalError::Checksum(msg)) => {
                assert!(msg.starts_with("iss_1_1: "), "{}", msg);
                assert!(msg.contains(&corrupted), "{}", msg);
            }
            other => panic!("expected checksum error, got {:?}", other),
        }

        let entry = finish_lines("iss_1_1", ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(&entry.line1[7..18], PLACEHOLDER_DESIGNATOR);
        assert_eq!(entry.line2, ISS_LINE2);
    }

    #[test]
    fn test_encoder_reports_satellite_and_line() {
        // Three-digit mean motion widens line 2 past 69 columns
        let fast = shell("p", 150.0);
        let (_, raw2) = export_tle(&fast.records()[0].tle_fields().unwrap()).unwrap();
        assert_eq!(raw2.len(), LINE_LEN + 1);

        match TleEncoder.encode(&fast) {
            Err(OrbitalError::Checksum(msg)) => {
                assert!(msg.starts_with("p_1_1: "), "{}", msg);
                assert!(msg.contains(&raw2), "{}", msg);
            }
            other => panic!("expected checksum error, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn fuzz_checksum_is_deterministic(payload in "[0-9A-Z .+-]{68}") {
            let first = checksum(&payload).unwrap();
            prop_assert!(first < 10);
            prop_assert_eq!(first, checksum(&payload).unwrap());

            let line = format!("{}{}", payload, first);
            prop_assert!(verify_line(&line).is_ok());
        }
    }
}
