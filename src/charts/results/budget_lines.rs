//! Emission pathways for the scenarios holding a low carbon budget. Eight
//! gigatonnes and under is the policy-relevant end of the ladder.

use anyhow::Result;
use indexmap::IndexMap;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::charts::context::{draw_empty, ChartContext};
use crate::charts::registry::{Audience, ChartSpec};
use crate::charts::style::{palette_color, value_axis, TierStyle};
use crate::config::constants::LOW_BUDGET_MAX_GT;
use crate::core::dataset::Dataset;
use crate::models::record::budget_label;
use crate::render_targets;

const NAME: &str = "budget_lines";
const TITLE: &str = "Low carbon budget pathways";

pub fn register(charts: &mut Vec<ChartSpec>) {
    charts.push(ChartSpec {
        name: NAME,
        title: TITLE,
        audience: Audience::Results,
        generate,
    });
}

struct BudgetSeries {
    scenario: String,
    budget_gt: f64,
    points: Vec<(u32, f64)>,
}

struct Table {
    series: Vec<BudgetSeries>,
}

fn build_table(dataset: &Dataset) -> Table {
    let mut budget_of: IndexMap<String, Option<f64>> = IndexMap::new();
    for record in dataset.records() {
        budget_of
            .entry(record.scenario.clone())
            .or_insert(record.carbon_budget);
    }
    let totals = dataset.sum_co2eq_by(|r| (r.scenario.clone(), r.year));

    let mut series = Vec::new();
    for (scenario, budget) in &budget_of {
        let budget_gt = match budget {
            Some(gt) if *gt <= LOW_BUDGET_MAX_GT => *gt,
            _ => continue,
        };
        let mut points: Vec<(u32, f64)> = totals
            .iter()
            .filter(|((code, _), _)| code == scenario)
            .map(|((_, year), co2eq)| (*year, *co2eq))
            .collect();
        points.sort_unstable_by_key(|(year, _)| *year);
        series.push(BudgetSeries {
            scenario: scenario.clone(),
            budget_gt,
            points,
        });
    }
    Table { series }
}

fn generate(dataset: &Dataset, ctx: &ChartContext) -> Result<()> {
    let table = build_table(dataset);
    if table.series.is_empty() {
        render_targets!(ctx, NAME, |area, style| draw_empty(
            &area,
            style,
            TITLE,
            "no scenarios within the low-budget range"
        ));
    } else {
        render_targets!(ctx, NAME, |area, style| draw(&area, style, &table));
    }
    write_extract(ctx, &table)
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
    let (x_range, y_range) = axis_ranges(table);

    let mut chart = ChartBuilder::on(area)
        .caption(TITLE, style.title_font())
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

    let stroke = style.stroke_width();
    for (i, series) in table.series.iter().enumerate() {
        let color = palette_color(i);
        let label = format!(
            "{} ({} Gt)",
            series.scenario,
            budget_label(Some(series.budget_gt))
        );
        chart
            .draw_series(LineSeries::new(
                series
                    .points
                    .iter()
                    .map(|(year, co2eq)| (f64::from(*year), *co2eq)),
                color.stroke_width(stroke),
            ))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(stroke))
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

fn axis_ranges(table: &Table) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut year_lo = u32::MAX;
    let mut year_hi = u32::MIN;
    let mut y_lo = f64::INFINITY;
    let mut y_hi = f64::NEG_INFINITY;
    for series in &table.series {
        for (year, co2eq) in &series.points {
            year_lo = year_lo.min(*year);
            year_hi = year_hi.max(*year);
            y_lo = y_lo.min(*co2eq);
            y_hi = y_hi.max(*co2eq);
        }
    }
    value_axis(f64::from(year_lo), f64::from(year_hi), y_lo, y_hi)
}

fn write_extract(ctx: &ChartContext, table: &Table) -> Result<()> {
    let mut rows = Vec::new();
    for series in &table.series {
        for (year, co2eq) in &series.points {
            rows.push(vec![
                series.scenario.clone(),
                budget_label(Some(series.budget_gt)),
                year.to_string(),
                format!("{}", co2eq),
            ]);
        }
    }
    ctx.write_extract(&["Scenario", "CarbonBudgetGt", "Year", "CO2eq"], &rows)
}
