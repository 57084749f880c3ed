//! Stacked sector-group areas for the baseline scenario. Shows where the
//! emissions in the with-existing-measures pathway actually come from.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::charts::context::{draw_empty, ChartContext};
use crate::charts::registry::{Audience, ChartSpec};
use crate::charts::style::{palette_color, value_axis, TierStyle};
use crate::core::dataset::Dataset;
use crate::render_targets;

const NAME: &str = "sector_breakdown";
const TITLE: &str = "Baseline emissions by sector group";

pub fn register(charts: &mut Vec<ChartSpec>) {
    charts.push(ChartSpec {
        name: NAME,
        title: TITLE,
        audience: Audience::Results,
        generate,
    });
}

struct Table {
    scenario: String,
    groups: Vec<String>,
    years: Vec<u32>,
    /// `levels[g][y]` holds the cumulative total through group `g` at year
    /// `years[y]`, so adjacent levels bound each group's painted band.
    levels: Vec<Vec<f64>>,
}

/// The WEM-family scenario that appears first, or the first scenario at all
/// when no baseline run is present.
fn baseline_scenario(dataset: &Dataset) -> Option<String> {
    dataset
        .records()
        .iter()
        .find(|r| r.scenario_family == "WEM")
        .or_else(|| dataset.records().first())
        .map(|r| r.scenario.clone())
}

fn build_table(dataset: &Dataset) -> Option<Table> {
    let scenario = baseline_scenario(dataset)?;
    let subset = dataset.filter(|r| r.scenario == scenario);
    let groups = subset.sector_groups();
    let years = subset.years();
    let totals = subset.sum_co2eq_by(|r| (r.sector_group.clone(), r.year));

    let mut levels = vec![vec![0.0; years.len()]; groups.len()];
    for (g, group) in groups.iter().enumerate() {
        for (y, year) in years.iter().enumerate() {
            let own = totals.get(&(group.clone(), *year)).copied().unwrap_or(0.0);
            let below = if g == 0 { 0.0 } else { levels[g - 1][y] };
            levels[g][y] = below + own;
        }
    }
    Some(Table { scenario, groups, years, levels })
}

fn generate(dataset: &Dataset, ctx: &ChartContext) -> Result<()> {
    match build_table(dataset) {
        None => {
            render_targets!(ctx, NAME, |area, style| draw_empty(
                &area,
                style,
                TITLE,
                "no processed rows"
            ));
            ctx.write_extract(&["Scenario", "SectorGroup", "Year", "CO2eq"], &[])
        }
        Some(table) => {
            render_targets!(ctx, NAME, |area, style| draw(&area, style, &table));
            write_extract(ctx, &table)
        }
    }
}

fn draw<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    style: &TierStyle,
    table: &Table,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    let top = table
        .levels
        .last()
        .map(|level| level.iter().copied().fold(0.0, f64::max))
        .unwrap_or(0.0);
    let (x_range, y_range) = value_axis(
        f64::from(*table.years.first().unwrap_or(&0)),
        f64::from(*table.years.last().unwrap_or(&0)),
        0.0,
        top,
    );

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{} ({})", TITLE, table.scenario), style.title_font())
        .margin(style.margin())
        .x_label_area_size(style.x_label_area())
        .y_label_area_size(style.y_label_area())
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("CO2eq (kt)")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font())
        .x_label_formatter(&|year| format!("{}", *year as i64))
        .light_line_style(&WHITE.mix(0.0))
        .draw()?;

    // Paint the tallest cumulative level first so each lower level leaves
    // exactly its own band visible. Legend order then matches the stack
    // top-to-bottom.
    for (g, group) in table.groups.iter().enumerate().rev() {
        let color = palette_color(g);
        chart
            .draw_series(AreaSeries::new(
                table
                    .years
                    .iter()
                    .zip(&table.levels[g])
                    .map(|(year, level)| (f64::from(*year), *level)),
                0.0,
                color.filled(),
            ))?
            .label(group.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK.mix(0.3))
        .label_font(style.legend_font())
        .draw()?;
    Ok(())
}

fn write_extract(ctx: &ChartContext, table: &Table) -> Result<()> {
    let mut rows = Vec::new();
    for (g, group) in table.groups.iter().enumerate() {
        for (y, year) in table.years.iter().enumerate() {
            let below = if g == 0 { 0.0 } else { table.levels[g - 1][y] };
            let own = table.levels[g][y] - below;
            rows.push(vec![
                table.scenario.clone(),
                group.clone(),
                year.to_string(),
                format!("{}", own),
            ]);
        }
    }
    ctx.write_extract(&["Scenario", "SectorGroup", "Year", "CO2eq"], &rows)
}
