use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Top-level configuration for both pipeline stages. Every field has a
/// default, so a missing config file means "run with defaults" while a
/// malformed one is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub project: String,
    pub paths: PathsConfig,
    pub charts: ChartsConfig,
    pub output: OutputConfig,
    pub style: StyleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_export: PathBuf,
    pub mappings_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub out_base: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Chart names to run; empty means the full catalogue.
    pub include: Vec<String>,
    /// Chart names removed from the selection.
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub formats: Vec<ImageFormat>,
    /// Resolution tiers in declaration order, e.g. `dev` and `report`.
    pub resolutions: IndexMap<String, Resolution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub font_family: String,
    pub base_font_px: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            project: "emreport".to_string(),
            paths: PathsConfig::default(),
            charts: ChartsConfig::default(),
            output: OutputConfig::default(),
            style: StyleConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_export: PathBuf::from("data/raw/model_export.csv"),
            mappings_dir: PathBuf::from("data/mappings"),
            processed_dir: PathBuf::from("data/processed"),
            out_base: PathBuf::from("outputs/charts_and_data"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        let mut resolutions = IndexMap::new();
        resolutions.insert("dev".to_string(), Resolution { width: 1200, height: 800 });
        resolutions.insert("report".to_string(), Resolution { width: 2400, height: 1600 });
        Self { formats: vec![ImageFormat::Png], resolutions }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self { font_family: "sans-serif".to_string(), base_font_px: 14 }
    }
}

impl ReportConfig {
    /// Reads the YAML config at `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.output.formats.is_empty() {
            bail!("config declares no output formats");
        }
        if self.output.resolutions.is_empty() {
            bail!("config declares no resolution tiers");
        }
        for (tier, res) in &self.output.resolutions {
            if res.width == 0 || res.height == 0 {
                bail!("resolution tier '{}' has a zero dimension", tier);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_both_tiers() {
        let config = ReportConfig::default();
        let tiers: Vec<&String> = config.output.resolutions.keys().collect();
        assert_eq!(tiers, ["dev", "report"]);
        assert_eq!(config.output.resolutions["report"].width, 2400);
        assert_eq!(config.output.formats, vec![ImageFormat::Png]);
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = r#"
project: quarterly
charts:
  exclude: [budget_lines]
output:
  formats: [png, svg]
"#;
        let config: ReportConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.project, "quarterly");
        assert_eq!(config.charts.exclude, ["budget_lines"]);
        assert_eq!(config.output.formats, vec![ImageFormat::Png, ImageFormat::Svg]);
        // Untouched sections keep their defaults.
        assert_eq!(config.paths.mappings_dir, PathBuf::from("data/mappings"));
        assert_eq!(config.output.resolutions.len(), 2);
    }

    #[test]
    fn custom_tiers_replace_defaults() {
        let yaml = r#"
output:
  resolutions:
    thumb: { width: 300, height: 200 }
"#;
        let config: ReportConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.output.resolutions.len(), 1);
        assert_eq!(
            config.output.resolutions["thumb"],
            Resolution { width: 300, height: 200 }
        );
    }

    #[test]
    fn zero_dimension_rejected() {
        let yaml = r#"
output:
  resolutions:
    dev: { width: 0, height: 800 }
"#;
        let config: ReportConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig::load(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config.project, "emreport");
    }
}
