use std::fs::{self, File};
use std::hash::Hash;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use polars::prelude::*;
use tracing::info;

use crate::config::constants::{PROCESSED_CSV, PROCESSED_PARQUET};
use crate::models::record::{budget_label, ProcessedRecord};

/// The processed emissions dataset, held in transform output order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ProcessedRecord>,
}

impl Dataset {
    pub fn new(records: Vec<ProcessedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ProcessedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All modeled years, ascending.
    pub fn years(&self) -> Vec<u32> {
        let mut years: Vec<u32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Scenario codes in first-appearance order.
    pub fn scenarios(&self) -> Vec<String> {
        self.distinct(|r| &r.scenario)
    }

    /// Scenario families in first-appearance order.
    pub fn families(&self) -> Vec<String> {
        self.distinct(|r| &r.scenario_family)
    }

    /// Sector groups in first-appearance order.
    pub fn sector_groups(&self) -> Vec<String> {
        self.distinct(|r| &r.sector_group)
    }

    fn distinct<F: Fn(&ProcessedRecord) -> &String>(&self, get: F) -> Vec<String> {
        let mut seen: IndexSet<String> = IndexSet::new();
        for record in &self.records {
            seen.insert(get(record).clone());
        }
        seen.into_iter().collect()
    }

    /// Grouped CO2eq sum keyed by the caller's extractor, in dataset order.
    pub fn sum_co2eq_by<K, F>(&self, key: F) -> IndexMap<K, f64>
    where
        K: Hash + Eq,
        F: Fn(&ProcessedRecord) -> K,
    {
        let mut totals: IndexMap<K, f64> = IndexMap::new();
        for record in &self.records {
            *totals.entry(key(record)).or_insert(0.0) += record.co2eq;
        }
        totals
    }

    /// Records passing the predicate, cloned into a new dataset.
    pub fn filter<F: Fn(&ProcessedRecord) -> bool>(&self, keep: F) -> Dataset {
        Dataset::new(self.records.iter().filter(|r| keep(r)).cloned().collect())
    }

    /// Writes both serializations under `dir`, each to a temporary sibling
    /// first and renamed into place, so a failed run never leaves a partial
    /// artifact at the final path.
    pub fn persist(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating processed-data directory {}", dir.display()))?;
        let csv_path = dir.join(PROCESSED_CSV);
        let parquet_path = dir.join(PROCESSED_PARQUET);

        write_atomic(&csv_path, |tmp| self.write_csv(tmp))?;
        write_atomic(&parquet_path, |tmp| self.write_parquet(tmp))?;

        info!(
            rows = self.records.len(),
            csv = %csv_path.display(),
            parquet = %parquet_path.display(),
            "persisted processed dataset"
        );
        Ok((csv_path, parquet_path))
    }

    /// Reads the row-oriented serialization back into typed records.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening processed dataset {}", path.display()))?;
        let mut records = Vec::new();
        for (idx, result) in reader.deserialize::<ProcessedRecord>().enumerate() {
            let record =
                result.with_context(|| format!("row {} of {}", idx + 1, path.display()))?;
            records.push(record);
        }
        Ok(Self::new(records))
    }

    fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_parquet(&self, path: &Path) -> Result<()> {
        let n = self.records.len();
        let mut scenarios = Vec::with_capacity(n);
        let mut sectors = Vec::with_capacity(n);
        let mut sector_groups = Vec::with_capacity(n);
        let mut years = Vec::with_capacity(n);
        let mut indicators = Vec::with_capacity(n);
        let mut values = Vec::with_capacity(n);
        let mut co2eqs = Vec::with_capacity(n);
        let mut families = Vec::with_capacity(n);
        let mut groups = Vec::with_capacity(n);
        let mut growths = Vec::with_capacity(n);
        let mut budgets = Vec::with_capacity(n);
        for r in &self.records {
            scenarios.push(r.scenario.clone());
            sectors.push(r.sector.clone());
            sector_groups.push(r.sector_group.clone());
            years.push(r.year);
            indicators.push(r.indicator.clone());
            values.push(r.value);
            co2eqs.push(r.co2eq);
            families.push(r.scenario_family.clone());
            groups.push(r.scenario_group.clone());
            growths.push(r.economic_growth.clone());
            budgets.push(budget_label(r.carbon_budget));
        }

        let mut df = DataFrame::new(vec![
            Series::new("Scenario", scenarios),
            Series::new("Sector", sectors),
            Series::new("SectorGroup", sector_groups),
            Series::new("Year", years),
            Series::new("Indicator", indicators),
            Series::new("Value", values),
            Series::new("CO2eq", co2eqs),
            Series::new("ScenarioFamily", families),
            Series::new("ScenarioGroup", groups),
            Series::new("EconomicGrowth", growths),
            Series::new("CarbonBudget", budgets),
        ])
        .context("assembling processed dataframe")?;

        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        ParquetWriter::new(file)
            .finish(&mut df)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

fn write_atomic(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let tmp = tmp_sibling(path);
    if let Err(err) = write(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path).with_context(|| format!("moving {} into place", path.display()))?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    fn record(scenario: &str, sector: &str, year: u32, co2eq: f64) -> ProcessedRecord {
        use crate::models::scenario;

        let family = scenario::scenario_family(scenario);
        ProcessedRecord {
            scenario: scenario.to_string(),
            sector: sector.to_string(),
            sector_group: sector.to_string(),
            year,
            indicator: "CO2eq".to_string(),
            value: co2eq,
            co2eq,
            scenario_family: family.to_string(),
            scenario_group: scenario::scenario_group(family).to_string(),
            economic_growth: scenario::economic_growth(scenario).to_string(),
            carbon_budget: scenario::carbon_budget(scenario),
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            record("REF-RG", "Power", 2030, 100.25),
            record("REF-RG", "Power", 2040, 90.5),
            record("PAM1-075-RG", "Power", 2030, 80.0),
            record("PAM1-075-RG", "Transport", 2030, 20.0),
        ])
    }

    #[test]
    fn csv_round_trip_preserves_records_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = dataset();
        let (csv_path, _) = source.persist(dir.path()).unwrap();
        let loaded = Dataset::load(&csv_path).unwrap();
        assert_eq!(loaded.records(), source.records());
    }

    #[test]
    fn parquet_carries_the_same_rows() {
        let dir = tempfile::tempdir().unwrap();
        let source = dataset();
        let (_, parquet_path) = source.persist(dir.path()).unwrap();
        let df = ParquetReader::new(File::open(parquet_path).unwrap())
            .finish()
            .unwrap();
        assert_eq!(df.height(), source.len());
        let names: Vec<&str> = df.get_column_names();
        assert_eq!(names[0], "Scenario");
        assert_eq!(names[10], "CarbonBudget");
    }

    #[test]
    fn failed_write_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");
        let result = write_atomic(&target, |tmp| {
            fs::write(tmp, b"partial")?;
            Err(anyhow!("disk full"))
        });
        assert!(result.is_err());
        assert!(!target.exists());
        assert!(!tmp_sibling(&target).exists());
    }

    #[test]
    fn successful_write_lands_at_final_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");
        write_atomic(&target, |tmp| {
            fs::write(tmp, b"rows")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"rows");
        assert!(!tmp_sibling(&target).exists());
    }

    #[test]
    fn grouped_sums_keep_dataset_order() {
        let totals = dataset().sum_co2eq_by(|r| r.scenario.clone());
        let keys: Vec<&String> = totals.keys().collect();
        assert_eq!(keys, ["REF-RG", "PAM1-075-RG"]);
        assert_eq!(totals["REF-RG"], 190.75);
        assert_eq!(totals["PAM1-075-RG"], 100.0);
    }

    #[test]
    fn years_sorted_and_distinct_helpers() {
        let data = dataset();
        assert_eq!(data.years(), [2030, 2040]);
        assert_eq!(data.scenarios(), ["REF-RG", "PAM1-075-RG"]);
        assert_eq!(data.families(), ["WEM", "PAM1"]);
        let budget_only = data.filter(|r| r.carbon_budget.is_some());
        assert_eq!(budget_only.len(), 2);
    }
}
