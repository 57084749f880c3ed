use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::config::constants::{EPS_SENTINEL, YEAR_MAX, YEAR_MIN};
use crate::models::record::RawRecord;

pub const REQUIRED_COLUMNS: [&str; 5] = ["Scenario", "Sector", "Indicator", "Year", "Value"];

#[derive(Debug)]
pub enum RawLoadError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    MissingColumn(String),
    DataQuality { line: u64, reason: String },
}

impl From<std::io::Error> for RawLoadError {
    fn from(err: std::io::Error) -> Self {
        RawLoadError::IoError(err)
    }
}

impl From<csv::Error> for RawLoadError {
    fn from(err: csv::Error) -> Self {
        RawLoadError::CsvError(err)
    }
}

impl std::fmt::Display for RawLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawLoadError::IoError(e) => write!(f, "IO error: {}", e),
            RawLoadError::CsvError(e) => write!(f, "CSV error: {}", e),
            RawLoadError::MissingColumn(c) => {
                write!(f, "raw export is missing required column '{}'", c)
            }
            RawLoadError::DataQuality { line, reason } => {
                write!(f, "data quality error at line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for RawLoadError {}

/// Loads the raw delimited model export, validating the schema row by row.
/// Any `null`, empty, or non-numeric value aborts the load; the solver
/// sentinel `Eps` is coerced to zero.
pub fn load_raw_export(path: &Path) -> Result<Vec<RawRecord>, RawLoadError> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let mut columns = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| RawLoadError::MissingColumn(name.to_string()))?;
    }
    let [scenario_col, sector_col, indicator_col, year_col, value_col] = columns;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let field = |idx: usize, name: &str| -> Result<&str, RawLoadError> {
            match record.get(idx) {
                Some(text) if !text.is_empty() => Ok(text),
                _ => Err(RawLoadError::DataQuality {
                    line,
                    reason: format!("empty '{}' field", name),
                }),
            }
        };

        let scenario = field(scenario_col, "Scenario")?;
        let sector = field(sector_col, "Sector")?;
        let indicator = field(indicator_col, "Indicator")?;

        let year_text = field(year_col, "Year")?;
        let year: u32 = year_text.parse().map_err(|_| RawLoadError::DataQuality {
            line,
            reason: format!("year '{}' is not an integer", year_text),
        })?;
        if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
            return Err(RawLoadError::DataQuality {
                line,
                reason: format!("year {} outside {}..{}", year, YEAR_MIN, YEAR_MAX),
            });
        }

        let value = parse_value(record.get(value_col).unwrap_or(""), line)?;

        records.push(RawRecord {
            scenario: scenario.to_string(),
            sector: sector.to_string(),
            indicator: indicator.to_string(),
            year,
            value,
        });
    }

    debug!(rows = records.len(), "loaded raw export");
    Ok(records)
}

fn parse_value(text: &str, line: u64) -> Result<f64, RawLoadError> {
    if text.is_empty() {
        return Err(RawLoadError::DataQuality {
            line,
            reason: "empty 'Value' field".to_string(),
        });
    }
    if text.eq_ignore_ascii_case("null") {
        return Err(RawLoadError::DataQuality {
            line,
            reason: "'Value' is the literal null".to_string(),
        });
    }
    // The upstream solver writes 'Eps' where the basis holds an
    // epsilon-sized value.
    if text == EPS_SENTINEL {
        return Ok(0.0);
    }
    let value: f64 = text.parse().map_err(|_| RawLoadError::DataQuality {
        line,
        reason: format!("value '{}' is not numeric", text),
    })?;
    // f64 parsing accepts NaN and the infinity spellings; downstream
    // aggregation needs finite quantities.
    if !value.is_finite() {
        return Err(RawLoadError::DataQuality {
            line,
            reason: format!("value '{}' is not finite", text),
        });
    }
    Ok(value)
}
