//! Shared dataset fixture for chart table tests. Built through the real
//! transform so the rows carry the same metadata the generators see in
//! production runs.

use crate::core::dataset::Dataset;
use crate::core::transform::transform;
use crate::data::mappings_loader::MappingTables;
use crate::models::record::RawRecord;

/// Scenario codes covered by [`fixture_dataset`], in first-appearance order.
pub const FIXTURE_SCENARIOS: [&str; 5] = ["REF-RG", "PAM1-075-RG", "PAM2-095-LG", "PAM4", "HCARB-HG"];

/// Years covered by [`fixture_dataset`], ascending.
pub const FIXTURE_YEARS: [u32; 4] = [2025, 2030, 2040, 2050];

fn fixture_mappings() -> MappingTables {
    MappingTables::from_pairs(
        &[
            ("Power", "Power"),
            ("Industry", "Industry"),
            ("Road Transport", "Transport"),
            ("Rail Transport", "Transport"),
        ],
        &[("CO2", 1.0), ("CH4", 28.0)],
    )
}

/// Five scenarios spanning the WEM, PAM, and High Carbon families, four
/// sectors folding into three groups, and four years including every
/// milestone year. Values are distinct per cell so ordering bugs show up.
pub fn fixture_dataset() -> Dataset {
    let mappings = fixture_mappings();
    // Start levels paired with FIXTURE_SCENARIOS by position.
    let bases = [60.0, 52.0, 56.0, 48.0, 66.0];
    let mut raw = Vec::new();
    for (s, (scenario, base)) in FIXTURE_SCENARIOS.into_iter().zip(bases).enumerate() {
        for (y, year) in FIXTURE_YEARS.into_iter().enumerate() {
            for (g, sector) in ["Power", "Industry", "Road Transport", "Rail Transport"]
                .into_iter()
                .enumerate()
            {
                raw.push(RawRecord {
                    scenario: scenario.to_string(),
                    sector: sector.to_string(),
                    indicator: "CO2".to_string(),
                    year,
                    value: base - 3.0 * y as f64 + g as f64 + 0.25 * s as f64,
                });
                raw.push(RawRecord {
                    scenario: scenario.to_string(),
                    sector: sector.to_string(),
                    indicator: "CH4".to_string(),
                    year,
                    value: 0.5,
                });
            }
        }
    }
    let records = transform(&raw, &mappings).expect("fixture rows transform cleanly");
    Dataset::new(records)
}

/// Fixture restricted to rows of a single scenario, for single-series charts.
pub fn fixture_scenario(code: &str) -> Dataset {
    let full = fixture_dataset();
    full.filter(|r| r.scenario == code)
}
