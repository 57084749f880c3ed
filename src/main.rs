use std::path::Path;

use anyhow::{bail, Context as _, Result};
use clap::Parser;

use emreport::charts::registry;
use emreport::cli::cli::{Args, Command};
use emreport::config::constants::PROCESSED_CSV;
use emreport::config::report_config::ReportConfig;
use emreport::core::dataset::Dataset;
use emreport::core::dispatch;
use emreport::core::transform::transform;
use emreport::data::mappings_loader::MappingTables;
use emreport::data::raw_loader::load_raw_export;
use emreport::utils::logging;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging();

    match args.command() {
        Command::Dataset { config } => build_dataset(config),
        Command::Charts {
            config,
            parallel,
            charts,
        } => build_charts(config, *parallel, charts),
    }
}

fn build_dataset(config_path: &Path) -> Result<()> {
    let config = ReportConfig::load(config_path)?;
    println!("Emissions Report Builder - dataset");
    println!("Raw export: {}", config.paths.raw_export.display());

    let raw = load_raw_export(&config.paths.raw_export)
        .with_context(|| format!("loading {}", config.paths.raw_export.display()))?;
    let mappings = MappingTables::load(&config.paths.mappings_dir).with_context(|| {
        format!(
            "loading mapping tables from {}",
            config.paths.mappings_dir.display()
        )
    })?;
    let records = transform(&raw, &mappings).context("transforming the raw export")?;
    let dataset = Dataset::new(records);
    let (csv_path, parquet_path) = dataset.persist(&config.paths.processed_dir)?;

    println!("{} raw rows -> {} processed rows", raw.len(), dataset.len());
    println!("written {}", csv_path.display());
    println!("written {}", parquet_path.display());
    Ok(())
}

fn build_charts(config_path: &Path, parallel: bool, names: &[String]) -> Result<()> {
    let config = ReportConfig::load(config_path)?;
    let processed = config.paths.processed_dir.join(PROCESSED_CSV);
    let dataset = Dataset::load(&processed).with_context(|| {
        format!(
            "loading {}; run the dataset step first",
            processed.display()
        )
    })?;

    let catalogue = registry::builtin();
    let selected = registry::select(&catalogue, &config.charts, names)?;
    if selected.is_empty() {
        println!("no charts selected; nothing to do");
        return Ok(());
    }
    println!("Emissions Report Builder - charts");
    println!("{} charts over {} dataset rows", selected.len(), dataset.len());

    let report = dispatch::run(&selected, &dataset, &config, parallel)?;
    dispatch::print_summary(&report);
    if report.all_failed() {
        bail!("all {} charts failed", report.charts_total);
    }
    Ok(())
}
