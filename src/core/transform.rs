use indexmap::IndexMap;
use tracing::debug;

use crate::config::constants::CO2EQ_INDICATOR;
use crate::data::mappings_loader::MappingTables;
use crate::models::record::{ProcessedRecord, RawRecord};
use crate::models::scenario;

#[derive(Debug)]
pub enum TransformError {
    EmptyInput,
    NonFiniteValue { scenario: String, sector: String, year: u32 },
    UnmappedSector(String),
    UnmappedGas(String),
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformError::EmptyInput => write!(f, "raw export contains no data rows"),
            TransformError::NonFiniteValue { scenario, sector, year } => {
                write!(f, "non-finite value for {}/{}/{}", scenario, sector, year)
            }
            TransformError::UnmappedSector(s) => {
                write!(f, "no sector-group mapping for sector '{}'", s)
            }
            TransformError::UnmappedGas(g) => write!(f, "no GWP mapping for gas '{}'", g),
        }
    }
}

impl std::error::Error for TransformError {}

struct GroupTotals {
    sector_group: String,
    value: f64,
    co2eq: f64,
}

/// Aggregates validated gas rows into one CO2-equivalent record per
/// `(scenario, sector, year)` group and joins the scenario metadata.
///
/// Groups come out in first-appearance order, so byte-identical input
/// yields byte-identical output. Every sector and gas must resolve through
/// the mapping tables; an unresolved key aborts the whole run.
pub fn transform(
    raw: &[RawRecord],
    mappings: &MappingTables,
) -> Result<Vec<ProcessedRecord>, TransformError> {
    if raw.is_empty() {
        return Err(TransformError::EmptyInput);
    }

    let mut groups: IndexMap<(String, String, u32), GroupTotals> = IndexMap::new();
    for record in raw {
        if !record.value.is_finite() {
            return Err(TransformError::NonFiniteValue {
                scenario: record.scenario.clone(),
                sector: record.sector.clone(),
                year: record.year,
            });
        }
        let sector_group = mappings
            .sector_group(&record.sector)
            .ok_or_else(|| TransformError::UnmappedSector(record.sector.clone()))?;
        let factor = mappings
            .gwp(&record.indicator)
            .ok_or_else(|| TransformError::UnmappedGas(record.indicator.clone()))?;

        let key = (record.scenario.clone(), record.sector.clone(), record.year);
        let totals = groups.entry(key).or_insert_with(|| GroupTotals {
            sector_group: sector_group.to_string(),
            value: 0.0,
            co2eq: 0.0,
        });
        totals.value += record.value;
        totals.co2eq += record.value * factor;
    }

    let mut processed = Vec::with_capacity(groups.len());
    for ((scenario_code, sector, year), totals) in groups {
        let family = scenario::scenario_family(&scenario_code);
        let group = scenario::scenario_group(family).to_string();
        let growth = scenario::economic_growth(&scenario_code).to_string();
        let budget = scenario::carbon_budget(&scenario_code);
        processed.push(ProcessedRecord {
            scenario: scenario_code,
            sector,
            sector_group: totals.sector_group,
            year,
            indicator: CO2EQ_INDICATOR.to_string(),
            value: totals.value,
            co2eq: totals.co2eq,
            scenario_family: family.to_string(),
            scenario_group: group,
            economic_growth: growth,
            carbon_budget: budget,
        });
    }

    debug!(
        input_rows = raw.len(),
        output_rows = processed.len(),
        "aggregated gas rows to CO2eq"
    );
    Ok(processed)
}
