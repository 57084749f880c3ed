use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use indexmap::IndexMap;
use tracing::debug;

pub const SECTORS_FILE: &str = "sectors.csv";
pub const GASES_FILE: &str = "gases.csv";

#[derive(Debug)]
pub enum MappingsLoadError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    MissingTable(String),
    MissingColumn { table: String, column: String },
    DuplicateKey { table: String, key: String },
    EmptyValue { table: String, key: String },
    BadFactor { gas: String, value: String },
}

impl From<std::io::Error> for MappingsLoadError {
    fn from(err: std::io::Error) -> Self {
        MappingsLoadError::IoError(err)
    }
}

impl From<csv::Error> for MappingsLoadError {
    fn from(err: csv::Error) -> Self {
        MappingsLoadError::CsvError(err)
    }
}

impl std::fmt::Display for MappingsLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingsLoadError::IoError(e) => write!(f, "IO error: {}", e),
            MappingsLoadError::CsvError(e) => write!(f, "CSV error: {}", e),
            MappingsLoadError::MissingTable(t) => write!(f, "mapping table '{}' not found", t),
            MappingsLoadError::MissingColumn { table, column } => {
                write!(f, "mapping table '{}' is missing column '{}'", table, column)
            }
            MappingsLoadError::DuplicateKey { table, key } => {
                write!(f, "duplicate key '{}' in mapping table '{}'", key, table)
            }
            MappingsLoadError::EmptyValue { table, key } => {
                write!(f, "key '{}' in mapping table '{}' has an empty value", key, table)
            }
            MappingsLoadError::BadFactor { gas, value } => {
                write!(f, "gas '{}' has invalid GWP factor '{}'", gas, value)
            }
        }
    }
}

impl std::error::Error for MappingsLoadError {}

/// The analyst's mapping workbook, consumed as one CSV sheet per table.
/// Both tables preserve file order.
#[derive(Debug, Clone, Default)]
pub struct MappingTables {
    sector_groups: IndexMap<String, String>,
    gwp_factors: IndexMap<String, f64>,
}

impl MappingTables {
    /// Loads `sectors.csv` and `gases.csv` from the workbook directory.
    pub fn load(dir: &Path) -> Result<Self, MappingsLoadError> {
        let sector_groups = load_pairs(&dir.join(SECTORS_FILE), "Sector", "SectorGroup")?;
        let gas_text = load_pairs(&dir.join(GASES_FILE), "Gas", "Gwp")?;

        let mut gwp_factors = IndexMap::new();
        for (gas, text) in gas_text {
            let factor: f64 = text.parse().map_err(|_| MappingsLoadError::BadFactor {
                gas: gas.clone(),
                value: text.clone(),
            })?;
            if !factor.is_finite() || factor < 0.0 {
                return Err(MappingsLoadError::BadFactor { gas, value: text });
            }
            gwp_factors.insert(gas, factor);
        }

        debug!(
            sectors = sector_groups.len(),
            gases = gwp_factors.len(),
            "loaded mapping tables"
        );
        Ok(Self { sector_groups, gwp_factors })
    }

    /// Builds tables programmatically, preserving slice order.
    pub fn from_pairs(sectors: &[(&str, &str)], gases: &[(&str, f64)]) -> Self {
        Self {
            sector_groups: sectors
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            gwp_factors: gases.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    pub fn sector_group(&self, sector: &str) -> Option<&str> {
        self.sector_groups.get(sector).map(String::as_str)
    }

    pub fn gwp(&self, gas: &str) -> Option<f64> {
        self.gwp_factors.get(gas).copied()
    }

    pub fn sectors(&self) -> impl Iterator<Item = &str> {
        self.sector_groups.keys().map(String::as_str)
    }

    pub fn gases(&self) -> impl Iterator<Item = &str> {
        self.gwp_factors.keys().map(String::as_str)
    }
}

fn load_pairs(
    path: &Path,
    key_column: &str,
    value_column: &str,
) -> Result<IndexMap<String, String>, MappingsLoadError> {
    let table = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !path.exists() {
        return Err(MappingsLoadError::MissingTable(table));
    }

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let index_of = |column: &str| -> Result<usize, MappingsLoadError> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| MappingsLoadError::MissingColumn {
                table: table.clone(),
                column: column.to_string(),
            })
    };
    let key_idx = index_of(key_column)?;
    let value_idx = index_of(value_column)?;

    let mut pairs = IndexMap::new();
    for result in reader.records() {
        let record = result?;
        let key = record.get(key_idx).unwrap_or("").to_string();
        if key.is_empty() {
            // Exported sheets carry blank padding rows.
            continue;
        }
        let value = record.get(value_idx).unwrap_or("").to_string();
        if value.is_empty() {
            return Err(MappingsLoadError::EmptyValue { table, key });
        }
        if pairs.insert(key.clone(), value).is_some() {
            return Err(MappingsLoadError::DuplicateKey { table, key });
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_workbook(dir: &Path, sectors: &str, gases: &str) {
        std::fs::write(dir.join(SECTORS_FILE), sectors).unwrap();
        std::fs::write(dir.join(GASES_FILE), gases).unwrap();
    }

    #[test]
    fn loads_tables_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        write_workbook(
            dir.path(),
            "Sector,SectorGroup\nPower,Power\nWaste,All others\nTransport,Transport\n",
            "Gas,Gwp\nCO2,1\nCH4,28\nN2O,265\n",
        );
        let tables = MappingTables::load(dir.path()).unwrap();
        let sectors: Vec<&str> = tables.sectors().collect();
        assert_eq!(sectors, ["Power", "Waste", "Transport"]);
        assert_eq!(tables.sector_group("Waste"), Some("All others"));
        assert_eq!(tables.gwp("CH4"), Some(28.0));
        assert_eq!(tables.gwp("SF6"), None);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_workbook(
            dir.path(),
            "Sector,SectorGroup\nPower,Power\nPower,Industry\n",
            "Gas,Gwp\nCO2,1\n",
        );
        let err = MappingTables::load(dir.path()).unwrap_err();
        match err {
            MappingsLoadError::DuplicateKey { table, key } => {
                assert_eq!(table, SECTORS_FILE);
                assert_eq!(key, "Power");
            }
            other => panic!("expected DuplicateKey, got {:?}", other),
        }
    }

    #[test]
    fn missing_sheet_is_named() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SECTORS_FILE), "Sector,SectorGroup\nPower,Power\n")
            .unwrap();
        let err = MappingTables::load(dir.path()).unwrap_err();
        assert!(matches!(err, MappingsLoadError::MissingTable(t) if t == GASES_FILE));
    }

    #[test]
    fn bad_gwp_factor_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_workbook(
            dir.path(),
            "Sector,SectorGroup\nPower,Power\n",
            "Gas,Gwp\nCH4,notanumber\n",
        );
        let err = MappingTables::load(dir.path()).unwrap_err();
        assert!(matches!(err, MappingsLoadError::BadFactor { gas, .. } if gas == "CH4"));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_workbook(
            dir.path(),
            "Sector,SectorGroup\nPower,Power\n,\n",
            "Gas,Gwp\nCO2,1\n",
        );
        let tables = MappingTables::load(dir.path()).unwrap();
        assert_eq!(tables.sectors().count(), 1);
    }
}
