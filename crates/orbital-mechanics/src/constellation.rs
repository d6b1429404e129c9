//! Ordered `name → SatelliteRecord` collection for one constellation

use crate::propagation::SatelliteRecord;
use crate::timescale::TimeScale;
use crate::walker::{layout, ConstellationSpec, SatelliteElementSet};
use crate::Result;

/// Initialized satellites in generation order (orbit-major, then slot).
#[derive(Debug)]
pub struct Constellation {
    name: String,
    records: Vec<SatelliteRecord>,
}

impl Constellation {
    /// Initialize one record per element set. Any rejected satellite aborts
    /// the whole batch.
    pub fn initialize(
        name: impl Into<String>,
        element_sets: &[SatelliteElementSet],
        timescale: &TimeScale,
        reference_epoch_jd: f64,
    ) -> Result<Self> {
        let name = name.into();
        let records = element_sets
            .iter()
            .map(|elements| {
                let epoch = timescale.from_calendar(elements.epoch);
                SatelliteRecord::from_elements(
                    elements.name(&name),
                    elements,
                    epoch,
                    reference_epoch_jd,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(constellation = %name, "initialized {} satellites", records.len());
        Ok(Self { name, records })
    }

    /// Lay out and initialize the shell described by `spec`.
    pub fn from_spec(
        spec: &ConstellationSpec,
        timescale: &TimeScale,
        reference_epoch_jd: f64,
    ) -> Result<Self> {
        let element_sets = layout(spec)?;
        Self::initialize(&spec.name, &element_sets, timescale, reference_epoch_jd)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[SatelliteRecord] {
        &self.records
    }

    pub fn get(&self, satellite: &str) -> Option<&SatelliteRecord> {
        self.records.iter().find(|r| r.name() == satellite)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
