//! Cumulative emissions against the assigned carbon budget, one marker per
//! budgeted scenario. The parity line separates pathways that stay inside
//! their budget from those that blow through it.

use anyhow::Result;
use indexmap::IndexMap;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::charts::context::{draw_empty, ChartContext};
use crate::charts::registry::{Audience, ChartSpec};
use crate::charts::style::{growth_color, TierStyle};
use crate::config::constants::KT_PER_GT;
use crate::core::dataset::Dataset;
use crate::render_targets;

const NAME: &str = "budget_scatter";
const TITLE: &str = "Cumulative emissions vs carbon budget";

pub fn register(charts: &mut Vec<ChartSpec>) {
    charts.push(ChartSpec {
        name: NAME,
        title: TITLE,
        audience: Audience::Results,
        generate,
    });
}

struct ScatterPoint {
    scenario: String,
    growth: String,
    budget_gt: f64,
    cumulative_gt: f64,
}

struct Table {
    points: Vec<ScatterPoint>,
}

fn build_table(dataset: &Dataset) -> Table {
    let mut by_scenario: IndexMap<String, (String, Option<f64>, f64)> = IndexMap::new();
    for record in dataset.records() {
        let entry = by_scenario
            .entry(record.scenario.clone())
            .or_insert_with(|| (record.economic_growth.clone(), record.carbon_budget, 0.0));
        entry.2 += record.co2eq;
    }
    let points = by_scenario
        .into_iter()
        .filter_map(|(scenario, (growth, budget, cumulative_kt))| {
            budget.map(|budget_gt| ScatterPoint {
                scenario,
                growth,
                budget_gt,
                cumulative_gt: cumulative_kt / KT_PER_GT,
            })
        })
        .collect();
    Table { points }
}

fn generate(dataset: &Dataset, ctx: &ChartContext) -> Result<()> {
    let table = build_table(dataset);
    if table.points.is_empty() {
        render_targets!(ctx, NAME, |area, style| draw_empty(
            &area,
            style,
            TITLE,
            "no scenarios carry a carbon budget"
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
    let x_top = table
        .points
        .iter()
        .map(|p| p.budget_gt)
        .fold(0.0, f64::max);
    let y_top = table
        .points
        .iter()
        .map(|p| p.cumulative_gt)
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .caption(TITLE, style.title_font())
        .margin(style.margin())
        .x_label_area_size(style.x_label_area())
        .y_label_area_size(style.y_label_area())
        .build_cartesian_2d(
            0.0..(x_top * 1.12).max(1.0),
            0.0..(y_top * 1.12).max(1.0),
        )?;

    chart
        .configure_mesh()
        .x_desc("Carbon budget (Gt)")
        .y_desc("Cumulative CO2eq (Gt)")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font())
        .light_line_style(&WHITE.mix(0.0))
        .draw()?;

    let parity = x_top.max(y_top) * 1.12;
    chart
        .draw_series(LineSeries::new(
            [(0.0, 0.0), (parity, parity)],
            BLACK.mix(0.35).stroke_width(style.thin_stroke()),
        ))?
        .label("Budget parity")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], BLACK.mix(0.35).stroke_width(1)));

    let marker = style.marker_size();
    let mut growths: Vec<String> = Vec::new();
    for point in &table.points {
        if !growths.contains(&point.growth) {
            growths.push(point.growth.clone());
        }
    }
    for growth in &growths {
        let color = growth_color(growth);
        chart
            .draw_series(
                table
                    .points
                    .iter()
                    .filter(|p| &p.growth == growth)
                    .map(|p| Circle::new((p.budget_gt, p.cumulative_gt), marker, color.filled())),
            )?
            .label(growth.as_str())
            .legend(move |(x, y)| Circle::new((x + 9, y), marker.min(5), color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK.mix(0.3))
        .label_font(style.legend_font())
        .draw()?;
    Ok(())
}

fn write_extract(ctx: &ChartContext, table: &Table) -> Result<()> {
    let rows: Vec<Vec<String>> = table
        .points
        .iter()
        .map(|p| {
            vec![
                p.scenario.clone(),
                p.growth.clone(),
                format!("{}", p.budget_gt),
                format!("{}", p.cumulative_gt),
            ]
        })
        .collect();
    ctx.write_extract(
        &["Scenario", "EconomicGrowth", "CarbonBudgetGt", "CumulativeCO2eqGt"],
        &rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_fixtures::fixture_dataset;

    #[test]
    fn only_budgeted_scenarios_become_points() {
        let table = build_table(&fixture_dataset());
        let codes: Vec<&str> = table.points.iter().map(|p| p.scenario.as_str()).collect();
        assert_eq!(codes, ["PAM1-075-RG", "PAM2-095-LG"]);
    }

    #[test]
    fn cumulative_sums_every_row_of_the_scenario() {
        let dataset = fixture_dataset();
        let table = build_table(&dataset);
        let point = table
            .points
            .iter()
            .find(|p| p.scenario == "PAM1-075-RG")
            .unwrap();
        let expected: f64 = dataset
            .records()
            .iter()
            .filter(|r| r.scenario == "PAM1-075-RG")
            .map(|r| r.co2eq)
            .sum();
        assert_eq!(point.cumulative_gt, expected / KT_PER_GT);
        assert_eq!(point.growth, "Reference");
    }
}
