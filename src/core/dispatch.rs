//! Chart run orchestration. Each selected chart renders into its own
//! directory, a failure in one never stops the others, and the whole run
//! is summarised in a machine-readable report next to the outputs.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info};

use crate::charts::context::ChartContext;
use crate::charts::registry::ChartSpec;
use crate::config::constants::{DATA_EXTRACT_FILE, GALLERY_DIR, RUN_REPORT_FILE};
use crate::config::report_config::{OutputConfig, ReportConfig};
use crate::core::dataset::Dataset;

/// Terminal state of one chart in a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartStatus {
    /// Generator returned cleanly and every contracted output exists.
    Rendered { images: Vec<String> },
    /// Generator returned an error; its directory may hold partial files.
    Failed { error: String },
    /// Generator returned cleanly but left contracted outputs missing.
    ContractViolation { missing: Vec<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartOutcome {
    pub chart: String,
    pub audience: &'static str,
    #[serde(flatten)]
    pub status: ChartStatus,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
    pub charts_total: usize,
    pub charts_rendered: usize,
    pub charts_failed: usize,
    pub charts_incomplete: usize,
    pub outcomes: Vec<ChartOutcome>,
}

impl RunReport {
    /// True when the run produced nothing usable at all. A single rendered
    /// chart keeps the run a (partial) success.
    pub fn all_failed(&self) -> bool {
        self.charts_total > 0 && self.charts_rendered == 0
    }
}

/// Runs every chart in `charts` against the dataset, refreshes the
/// gallery, and writes the run report under the output root.
pub fn run(
    charts: &[&ChartSpec],
    dataset: &Dataset,
    config: &ReportConfig,
    parallel: bool,
) -> Result<RunReport> {
    let started_at = Utc::now();
    let clock = Instant::now();
    let out_root = config.paths.out_base.clone();
    fs::create_dir_all(&out_root)
        .with_context(|| format!("creating output root {}", out_root.display()))?;

    let outcomes = if parallel {
        run_parallel(charts, dataset, config)
    } else {
        run_sequential(charts, dataset, config)
    };

    sync_gallery(&out_root, &outcomes, &config.output)?;

    let report = RunReport {
        started_at,
        elapsed_seconds: clock.elapsed().as_secs_f64(),
        charts_total: outcomes.len(),
        charts_rendered: count(&outcomes, |s| matches!(s, ChartStatus::Rendered { .. })),
        charts_failed: count(&outcomes, |s| matches!(s, ChartStatus::Failed { .. })),
        charts_incomplete: count(&outcomes, |s| {
            matches!(s, ChartStatus::ContractViolation { .. })
        }),
        outcomes,
    };
    write_report(&out_root, &report)?;
    Ok(report)
}

fn count(outcomes: &[ChartOutcome], pred: impl Fn(&ChartStatus) -> bool) -> usize {
    outcomes.iter().filter(|o| pred(&o.status)).count()
}

fn run_sequential(
    charts: &[&ChartSpec],
    dataset: &Dataset,
    config: &ReportConfig,
) -> Vec<ChartOutcome> {
    let bar = progress_bar(charts.len() as u64);
    let mut outcomes = Vec::with_capacity(charts.len());
    for chart in charts {
        bar.set_message(chart.name);
        outcomes.push(run_one(chart, dataset, config));
        bar.inc(1);
    }
    bar.finish_with_message("done");
    outcomes
}

// No shared bar here; `run_one` logs per chart and concurrent bar
// updates would interleave.
fn run_parallel(
    charts: &[&ChartSpec],
    dataset: &Dataset,
    config: &ReportConfig,
) -> Vec<ChartOutcome> {
    let slots: Mutex<Vec<(usize, ChartOutcome)>> = Mutex::new(Vec::with_capacity(charts.len()));
    charts.par_iter().enumerate().for_each(|(idx, chart)| {
        let outcome = run_one(chart, dataset, config);
        slots.lock().push((idx, outcome));
    });

    let mut collected = slots.into_inner();
    collected.sort_by_key(|(idx, _)| *idx);
    collected.into_iter().map(|(_, outcome)| outcome).collect()
}

/// One chart, start to finish: a clean directory, the generator, then the
/// output contract check. Never propagates the generator's error.
fn run_one(chart: &ChartSpec, dataset: &Dataset, config: &ReportConfig) -> ChartOutcome {
    let chart_dir = config.paths.out_base.join(chart.name);
    let result = prepare_chart_dir(&chart_dir).and_then(|()| {
        let ctx = ChartContext::new(
            chart_dir.clone(),
            config.output.clone(),
            config.style.clone(),
        );
        (chart.generate)(dataset, &ctx)
    });

    let status = match result {
        Err(err) => {
            error!("chart {} failed: {:#}", chart.name, err);
            ChartStatus::Failed {
                error: format!("{:#}", err),
            }
        }
        Ok(()) => match verify_contract(&chart_dir, &config.output) {
            Ok(images) => {
                info!("chart {} rendered {} images", chart.name, images.len());
                ChartStatus::Rendered { images }
            }
            Err(missing) => {
                error!(
                    "chart {} left outputs missing: {}",
                    chart.name,
                    missing.join("; ")
                );
                ChartStatus::ContractViolation { missing }
            }
        },
    };
    ChartOutcome {
        chart: chart.name.to_string(),
        audience: chart.audience.as_str(),
        status,
    }
}

/// Stale outputs from earlier runs never leak into this one.
fn prepare_chart_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("clearing {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
}

/// Checks the chart directory against the output contract: at least one
/// image per configured tier plus the data extract. Returns the image file
/// names found, or what is missing.
fn verify_contract(chart_dir: &Path, output: &OutputConfig) -> Result<Vec<String>, Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    if let Ok(entries) = fs::read_dir(chart_dir) {
        for entry in entries.flatten() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    let mut images = Vec::new();
    let mut missing = Vec::new();
    for tier in output.resolutions.keys() {
        let mut found = false;
        for format in &output.formats {
            let suffix = format!("_{}.{}", tier, format.extension());
            for name in names.iter().filter(|n| n.ends_with(&suffix)) {
                images.push(name.clone());
                found = true;
            }
        }
        if !found {
            missing.push(format!("no image for tier '{}'", tier));
        }
    }
    if !names.iter().any(|n| n == DATA_EXTRACT_FILE) {
        missing.push(format!("missing {}", DATA_EXTRACT_FILE));
    }

    if missing.is_empty() {
        Ok(images)
    } else {
        Err(missing)
    }
}

/// Copies every rendered image into `gallery/<tier>/`, one flat directory
/// per tier for fast side-by-side review. Later runs overwrite earlier
/// copies of the same file name.
fn sync_gallery(out_root: &Path, outcomes: &[ChartOutcome], output: &OutputConfig) -> Result<()> {
    for tier in output.resolutions.keys() {
        let tier_dir = out_root.join(GALLERY_DIR).join(tier);
        fs::create_dir_all(&tier_dir)
            .with_context(|| format!("creating gallery tier {}", tier_dir.display()))?;
    }

    for outcome in outcomes {
        let images = match &outcome.status {
            ChartStatus::Rendered { images } => images,
            _ => continue,
        };
        for image in images {
            for tier in output.resolutions.keys() {
                let belongs = output
                    .formats
                    .iter()
                    .any(|f| image.ends_with(&format!("_{}.{}", tier, f.extension())));
                if belongs {
                    let src = out_root.join(&outcome.chart).join(image);
                    let dst = out_root.join(GALLERY_DIR).join(tier).join(image);
                    fs::copy(&src, &dst)
                        .with_context(|| format!("copying {} into the gallery", src.display()))?;
                    break;
                }
            }
        }
    }
    Ok(())
}

fn write_report(out_root: &Path, report: &RunReport) -> Result<()> {
    let path = out_root.join(RUN_REPORT_FILE);
    let json = serde_json::to_string_pretty(report).context("serializing the run report")?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!("run report written to {}", path.display());
    Ok(())
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("valid progress template")
            .progress_chars("=> "),
    );
    bar
}

/// Operator-facing digest of a run, printed after the report is written.
pub fn print_summary(report: &RunReport) {
    println!("=== Chart Run Summary ===");
    println!(
        "{} charts: {} rendered, {} failed, {} incomplete ({:.1}s)",
        report.charts_total,
        report.charts_rendered,
        report.charts_failed,
        report.charts_incomplete,
        report.elapsed_seconds
    );
    for outcome in &report.outcomes {
        match &outcome.status {
            ChartStatus::Rendered { images } => {
                println!("  [ok]      {} ({} images)", outcome.chart, images.len());
            }
            ChartStatus::ContractViolation { missing } => {
                println!("  [partial] {}: {}", outcome.chart, missing.join("; "));
            }
            ChartStatus::Failed { error } => {
                println!("  [failed]  {}: {}", outcome.chart, error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::charts::registry::Audience;
    use crate::config::report_config::{ImageFormat, Resolution};

    fn generator_ok(_: &Dataset, ctx: &ChartContext) -> Result<()> {
        for target in ctx.targets("fig") {
            fs::write(&target.path, b"img")?;
        }
        ctx.write_extract(&["A"], &[vec!["1".to_string()]])
    }

    fn generator_failing(_: &Dataset, _: &ChartContext) -> Result<()> {
        anyhow::bail!("synthetic generator error")
    }

    fn generator_no_images(_: &Dataset, ctx: &ChartContext) -> Result<()> {
        ctx.write_extract(&["A"], &[])
    }

    fn spec(name: &'static str, generate: fn(&Dataset, &ChartContext) -> Result<()>) -> ChartSpec {
        ChartSpec {
            name,
            title: name,
            audience: Audience::Results,
            generate,
        }
    }

    fn test_config(out_base: &Path) -> ReportConfig {
        let mut config = ReportConfig::default();
        config.paths.out_base = out_base.to_path_buf();
        config.output.formats = vec![ImageFormat::Png];
        let mut resolutions = IndexMap::new();
        resolutions.insert("dev".to_string(), Resolution { width: 64, height: 48 });
        config.output.resolutions = resolutions;
        config
    }

    #[test]
    fn one_failure_never_stops_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let charts = [
            spec("alpha", generator_ok),
            spec("broken", generator_failing),
            spec("gamma", generator_ok),
        ];
        let refs: Vec<&ChartSpec> = charts.iter().collect();

        let report = run(&refs, &Dataset::new(Vec::new()), &config, false).unwrap();
        assert_eq!(report.charts_total, 3);
        assert_eq!(report.charts_rendered, 2);
        assert_eq!(report.charts_failed, 1);
        assert!(!report.all_failed());

        let names: Vec<&str> = report.outcomes.iter().map(|o| o.chart.as_str()).collect();
        assert_eq!(names, ["alpha", "broken", "gamma"]);
        assert!(dir.path().join("gamma").join("fig_dev.png").exists());
    }

    #[test]
    fn missing_images_surface_as_a_contract_violation() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let charts = [spec("quiet", generator_no_images)];
        let refs: Vec<&ChartSpec> = charts.iter().collect();

        let report = run(&refs, &Dataset::new(Vec::new()), &config, false).unwrap();
        assert_eq!(report.charts_incomplete, 1);
        match &report.outcomes[0].status {
            ChartStatus::ContractViolation { missing } => {
                assert!(missing.iter().any(|m| m.contains("tier 'dev'")), "{:?}", missing);
            }
            other => panic!("expected a contract violation, got {:?}", other),
        }
    }

    #[test]
    fn all_failed_only_when_nothing_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let charts = [spec("broken", generator_failing)];
        let refs: Vec<&ChartSpec> = charts.iter().collect();

        let report = run(&refs, &Dataset::new(Vec::new()), &config, false).unwrap();
        assert!(report.all_failed());
    }

    #[test]
    fn parallel_report_keeps_registry_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let charts = [
            spec("a", generator_ok),
            spec("b", generator_ok),
            spec("c", generator_ok),
            spec("d", generator_ok),
        ];
        let refs: Vec<&ChartSpec> = charts.iter().collect();

        let report = run(&refs, &Dataset::new(Vec::new()), &config, true).unwrap();
        let names: Vec<&str> = report.outcomes.iter().map(|o| o.chart.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn rerun_clears_stale_chart_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let stale = dir.path().join("alpha").join("leftover.png");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"old").unwrap();

        let charts = [spec("alpha", generator_ok)];
        let refs: Vec<&ChartSpec> = charts.iter().collect();
        run(&refs, &Dataset::new(Vec::new()), &config, false).unwrap();

        assert!(!stale.exists());
        assert!(dir.path().join("alpha").join("fig_dev.png").exists());
    }

    #[test]
    fn gallery_and_report_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let charts = [spec("alpha", generator_ok)];
        let refs: Vec<&ChartSpec> = charts.iter().collect();

        run(&refs, &Dataset::new(Vec::new()), &config, false).unwrap();

        assert!(dir
            .path()
            .join(GALLERY_DIR)
            .join("dev")
            .join("fig_dev.png")
            .exists());
        let report = fs::read_to_string(dir.path().join(RUN_REPORT_FILE)).unwrap();
        assert!(report.contains("\"status\": \"rendered\""), "{}", report);
        assert!(report.contains("\"audience\": \"results\""), "{}", report);
    }
}
