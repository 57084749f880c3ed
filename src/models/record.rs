use serde::{Deserialize, Serialize};

use crate::config::constants::NO_BUDGET_LABEL;

/// One row of the raw model export after schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub scenario: String,
    pub sector: String,
    pub indicator: String,
    pub year: u32,
    pub value: f64,
}

/// One aggregated CO2-equivalent row of the processed dataset.
///
/// Field order is the column order of the CSV serialization; the Parquet
/// serialization carries the same columns under the same names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessedRecord {
    pub scenario: String,
    pub sector: String,
    pub sector_group: String,
    pub year: u32,
    pub indicator: String,
    pub value: f64,
    #[serde(rename = "CO2eq")]
    pub co2eq: f64,
    pub scenario_family: String,
    pub scenario_group: String,
    pub economic_growth: String,
    #[serde(with = "budget_column")]
    pub carbon_budget: Option<f64>,
}

/// Serialized form of an optional carbon budget. Absence is the literal
/// `NoBudget`, never an empty cell.
pub fn budget_label(budget: Option<f64>) -> String {
    match budget {
        Some(gt) => format!("{}", gt),
        None => NO_BUDGET_LABEL.to_string(),
    }
}

mod budget_column {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::config::constants::NO_BUDGET_LABEL;

    pub fn serialize<S: Serializer>(budget: &Option<f64>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&super::budget_label(*budget))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
        let raw = String::deserialize(de)?;
        if raw == NO_BUDGET_LABEL {
            return Ok(None);
        }
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid carbon budget '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProcessedRecord {
        ProcessedRecord {
            scenario: "PAM1-075-RG".to_string(),
            sector: "Power".to_string(),
            sector_group: "Power".to_string(),
            year: 2030,
            indicator: "CO2eq".to_string(),
            value: 105.0,
            co2eq: 225.0,
            scenario_family: "PAM1".to_string(),
            scenario_group: "PAM".to_string(),
            economic_growth: "Reference".to_string(),
            carbon_budget: Some(7.5),
        }
    }

    #[test]
    fn csv_columns_and_budget_label() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(sample()).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Scenario,Sector,SectorGroup,Year,Indicator,Value,CO2eq,\
             ScenarioFamily,ScenarioGroup,EconomicGrowth,CarbonBudget"
        );
        assert_eq!(
            lines.next().unwrap(),
            "PAM1-075-RG,Power,Power,2030,CO2eq,105.0,225.0,PAM1,PAM,Reference,7.5"
        );
    }

    #[test]
    fn no_budget_round_trips() {
        let mut record = sample();
        record.carbon_budget = None;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&record).unwrap();
        let bytes = writer.into_inner().unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("NoBudget"));

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let parsed: ProcessedRecord = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn budget_labels() {
        assert_eq!(budget_label(Some(7.5)), "7.5");
        assert_eq!(budget_label(Some(8.0)), "8");
        assert_eq!(budget_label(None), "NoBudget");
    }
}
