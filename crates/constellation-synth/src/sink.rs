//! Output destinations for TLE and position files
//!
//! Layout under the output root:
//!
//! ```text
//! tles/<stamp>_<name>.txt
//! positions/<stamp>/position.txt
//! ```
//!
//! `<stamp>` is the local start time of the run, `%Y-%m-%d_%H-%M-%S`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use orbital_mechanics::{PositionReport, TleDocument};
use tracing::info;

use crate::{Result, SynthError};

pub const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Somewhere to put the artifacts of one run.
pub trait OutputSink {
    /// Store the TLE document of constellation `name`; returns its location.
    fn write_tles(&mut self, name: &str, document: &TleDocument) -> Result<PathBuf>;

    /// Store the sampled positions; returns their location.
    fn write_positions(&mut self, report: &PositionReport) -> Result<PathBuf>;
}

/// Writes timestamped text files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
    stamp: String,
}

impl FileSink {
    /// Stamp the run with the current local time.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_stamp(root, Local::now().format(STAMP_FORMAT).to_string())
    }

    pub fn with_stamp(root: impl Into<PathBuf>, stamp: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            stamp: stamp.into(),
        }
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn tle_path(&self, name: &str) -> PathBuf {
        self.root
            .join("tles")
            .join(format!("{}_{}.txt", self.stamp, name))
    }

    pub fn position_path(&self) -> PathBuf {
        self.root
            .join("positions")
            .join(&self.stamp)
            .join("position.txt")
    }

    fn create(path: &Path) -> Result<BufWriter<File>> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| SynthError::io(dir, e))?;
        }
        let file = File::create(path).map_err(|e| SynthError::io(path, e))?;
        Ok(BufWriter::new(file))
    }
}

impl OutputSink for FileSink {
    fn write_tles(&mut self, name: &str, document: &TleDocument) -> Result<PathBuf> {
        let path = self.tle_path(name);
        let mut writer = Self::create(&path)?;
        document
            .write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| SynthError::io(&path, e))?;
        info!("Wrote {} TLE sets to {:?}", document.len(), path);
        Ok(path)
    }

    fn write_positions(&mut self, report: &PositionReport) -> Result<PathBuf> {
        let path = self.position_path();
        let mut writer = Self::create(&path)?;
        report
            .write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| SynthError::io(&path, e))?;
        info!(
            "Wrote {} tracks x {} instants to {:?}",
            report.tracks.len(),
            report.instants.len(),
            path
        );
        Ok(path)
    }
}

/// Keeps rendered artifacts in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub tles: Option<String>,
    pub positions: Option<String>,
}

impl OutputSink for MemorySink {
    fn write_tles(&mut self, name: &str, document: &TleDocument) -> Result<PathBuf> {
        self.tles = Some(document.render());
        Ok(PathBuf::from("tles").join(format!("{}.txt", name)))
    }

    fn write_positions(&mut self, report: &PositionReport) -> Result<PathBuf> {
        self.positions = Some(report.render());
        Ok(PathBuf::from("positions").join("position.txt"))
    }
}
