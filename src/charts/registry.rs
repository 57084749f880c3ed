use anyhow::{bail, Result};

use super::{methodology, results};
use crate::charts::context::ChartContext;
use crate::config::report_config::ChartsConfig;
use crate::core::dataset::Dataset;

/// Which report section a chart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Methodology,
    Results,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Methodology => "methodology",
            Audience::Results => "results",
        }
    }
}

pub type GeneratorFn = fn(&Dataset, &ChartContext) -> Result<()>;

/// One registered chart: a stable snake_case name (also the output
/// directory name), its audience, and the generator function.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub audience: Audience,
    pub generate: GeneratorFn,
}

/// The full chart catalogue. Every generator unit registers here and
/// nowhere else; adding a chart means adding a `register` call.
pub fn builtin() -> Vec<ChartSpec> {
    let mut charts = Vec::new();
    methodology::scenario_matrix::register(&mut charts);
    methodology::carbon_budget_ladder::register(&mut charts);
    methodology::coverage_by_family::register(&mut charts);
    results::total_emissions::register(&mut charts);
    results::family_bands::register(&mut charts);
    results::sector_breakdown::register(&mut charts);
    results::milestone_bars::register(&mut charts);
    results::budget_lines::register(&mut charts);
    results::budget_scatter::register(&mut charts);
    assert_unique(&charts);
    charts
}

fn assert_unique(charts: &[ChartSpec]) {
    let mut seen = std::collections::HashSet::new();
    for chart in charts {
        assert!(seen.insert(chart.name), "duplicate chart name '{}'", chart.name);
    }
}

/// Applies the configured include/exclude filter, or the explicit CLI
/// names when given. Registry order is preserved; an unknown name is an
/// operator error, not an empty selection.
pub fn select<'a>(
    all: &'a [ChartSpec],
    config: &ChartsConfig,
    cli_names: &[String],
) -> Result<Vec<&'a ChartSpec>> {
    for name in cli_names.iter().chain(&config.include).chain(&config.exclude) {
        if !all.iter().any(|c| c.name == name) {
            bail!(
                "unknown chart '{}'; registered charts: {}",
                name,
                all.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
            );
        }
    }

    if !cli_names.is_empty() {
        // Explicitly named charts run even if the config excludes them.
        return Ok(all
            .iter()
            .filter(|c| cli_names.iter().any(|n| n == c.name))
            .collect());
    }

    Ok(all
        .iter()
        .filter(|c| config.include.is_empty() || config.include.iter().any(|n| n == c.name))
        .filter(|c| !config.exclude.iter().any(|n| n == c.name))
        .collect())
}
